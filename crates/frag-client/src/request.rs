//! Fragment request identity.

use frag_core::RenderError;
use serde::Serialize;
use serde_json::Value;

/// A fragment request: the remote `type` to render plus its props.
///
/// Props are held as JSON values so two requests can be compared by value
/// when a mount decides whether it needs a fresh attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentRequest {
    /// Identifies which fragment the server should render.
    #[serde(rename = "type")]
    pub fragment_type: String,
    /// Props forwarded to the server-side renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
}

impl FragmentRequest {
    /// Request for `fragment_type` with no props.
    pub fn new(fragment_type: impl Into<String>) -> Self {
        Self {
            fragment_type: fragment_type.into(),
            props: None,
        }
    }

    /// Attach props from any serializable value.
    ///
    /// Conversion goes through `serde_json::Value`, whose object maps are
    /// key-ordered, so structurally equal props produce an identical
    /// identity no matter how the caller's own maps iterate.
    pub fn with_props<P: Serialize>(mut self, props: &P) -> Result<Self, RenderError> {
        let value =
            serde_json::to_value(props).map_err(|e| RenderError::Encoding(e.to_string()))?;
        self.props = Some(value);
        Ok(self)
    }

    /// Attach already-converted props.
    pub fn with_props_value(mut self, props: Value) -> Self {
        self.props = Some(props);
        self
    }

    /// Encode this request into its identity string.
    ///
    /// The identity doubles as the request body and the cache key, so the
    /// encoding is deterministic for structurally equal requests. Exposed
    /// as a future because prop serialization may involve asynchronous
    /// sub-serialization.
    pub async fn encode(&self) -> Result<String, RenderError> {
        serde_json::to_string(self).map_err(|e| RenderError::Encoding(e.to_string()))
    }
}
