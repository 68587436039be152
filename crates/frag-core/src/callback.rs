//! Opaque collaborators forwarded to the runtime's render operation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RenderError;

/// Callback rendered content uses to call back into the server.
///
/// The core never invokes this itself; it is carried through the context
/// and handed to the runtime adapter untouched.
#[async_trait]
pub trait ServerCallback: Send + Sync {
    /// Invoke the server-side function `id` with `args`.
    async fn call(&self, id: &str, args: Value) -> Result<Value, RenderError>;
}

/// Options forwarded opaquely to the runtime's render operation.
#[derive(Clone, Default)]
pub struct RenderOptions {
    /// Optional callback for content that calls back into the server.
    pub call_server: Option<Arc<dyn ServerCallback>>,
    /// Optional manifest consulted while decoding the payload.
    pub ssr_manifest: Option<Arc<Value>>,
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("call_server", &self.call_server.is_some())
            .field("ssr_manifest", &self.ssr_manifest.is_some())
            .finish()
    }
}
