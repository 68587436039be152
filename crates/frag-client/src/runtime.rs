//! Environment-specific runtime seam.

use async_trait::async_trait;
use frag_core::{RenderError, RenderOptions};
use frag_streaming::ByteStream;

/// Environment-specific pair of operations the render pipeline depends on.
///
/// One implementation exists per host environment, injected at composition
/// time: an interactive host backs [`embedded_payload`] with its document,
/// a headless host always answers `None`.
///
/// [`embedded_payload`]: RuntimeAdapter::embedded_payload
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    /// Renderable content produced from a payload.
    type Content: Send + Sync + 'static;

    /// Look up a payload embedded in the host document under `key`.
    ///
    /// `None` means "not embedded", including on hosts with no document at
    /// all, and is never an error.
    fn embedded_payload(&self, key: &str) -> Option<ByteStream>;

    /// Convert a payload stream into renderable content.
    ///
    /// `options` carries the server callback and manifest from the context,
    /// forwarded opaquely.
    async fn render_payload(
        &self,
        payload: ByteStream,
        options: RenderOptions,
    ) -> Result<Self::Content, RenderError>;
}

/// Parse the inline payload convention: the textual content of a document
/// element, holding a JSON array of byte values. A literal `null` means no
/// payload was embedded.
pub fn parse_inline_payload(text: &str) -> Result<Option<Vec<u8>>, RenderError> {
    serde_json::from_str::<Option<Vec<u8>>>(text)
        .map_err(|e| RenderError::Decoding(e.to_string()))
}

/// Emit `bytes` in the inline payload convention, ready to embed in a host
/// document under the payload's cache key.
pub fn inline_payload_json(bytes: &[u8]) -> String {
    serde_json::to_string(bytes).unwrap_or_else(|_| "null".to_string())
}
