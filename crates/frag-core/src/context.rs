//! Hierarchical render context.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::PayloadCache;
use crate::callback::{RenderOptions, ServerCallback};
use crate::error::RenderError;

/// Configuration visible to a render attempt.
///
/// A context is an immutable snapshot consumed by one attempt. Child
/// contexts are produced with [`RenderContext::merge`]: fields set on the
/// override win, everything else inherits from the parent. Contexts are
/// plain values threaded through the composition tree; there is no ambient
/// lookup or global state.
#[derive(Clone)]
pub struct RenderContext {
    /// Payload cache shared by every mount using this context.
    pub cache: PayloadCache,
    /// Endpoint that renders fragments; the encoded identity is POSTed here.
    pub endpoint: String,
    /// Forwarded to the runtime's render operation.
    pub call_server: Option<Arc<dyn ServerCallback>>,
    /// Forwarded to the runtime's render operation.
    pub ssr_manifest: Option<Arc<Value>>,
}

impl RenderContext {
    /// The default root context: empty cache, no endpoint.
    pub fn root() -> Self {
        Self {
            cache: PayloadCache::new(),
            endpoint: String::new(),
            call_server: None,
            ssr_manifest: None,
        }
    }

    /// Root context pointed at `endpoint`.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::root()
        }
    }

    /// Produce a child context. Fields present on `overrides` win; absent
    /// fields inherit from `self`.
    pub fn merge(&self, overrides: ContextOverride) -> RenderContext {
        RenderContext {
            cache: overrides.cache.unwrap_or_else(|| self.cache.clone()),
            endpoint: overrides.endpoint.unwrap_or_else(|| self.endpoint.clone()),
            call_server: overrides.call_server.or_else(|| self.call_server.clone()),
            ssr_manifest: overrides.ssr_manifest.or_else(|| self.ssr_manifest.clone()),
        }
    }

    /// Endpoint check performed when a render attempt begins.
    pub fn require_endpoint(&self) -> Result<&str, RenderError> {
        if self.endpoint.is_empty() {
            return Err(RenderError::Configuration(
                "no endpoint configured".to_string(),
            ));
        }
        Ok(&self.endpoint)
    }

    /// Options forwarded to the runtime's render operation.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            call_server: self.call_server.clone(),
            ssr_manifest: self.ssr_manifest.clone(),
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("cache", &self.cache)
            .field("endpoint", &self.endpoint)
            .field("call_server", &self.call_server.is_some())
            .field("ssr_manifest", &self.ssr_manifest.is_some())
            .finish()
    }
}

/// Partial context applied on top of a parent with [`RenderContext::merge`].
#[derive(Default)]
pub struct ContextOverride {
    /// Replacement cache, if set.
    pub cache: Option<PayloadCache>,
    /// Replacement endpoint, if set.
    pub endpoint: Option<String>,
    /// Replacement server callback, if set.
    pub call_server: Option<Arc<dyn ServerCallback>>,
    /// Replacement manifest, if set.
    pub ssr_manifest: Option<Arc<Value>>,
}

impl ContextOverride {
    /// An override that sets nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache.
    pub fn with_cache(mut self, cache: PayloadCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the server callback.
    pub fn with_call_server(mut self, callback: Arc<dyn ServerCallback>) -> Self {
        self.call_server = Some(callback);
        self
    }

    /// Set the manifest.
    pub fn with_ssr_manifest(mut self, manifest: Arc<Value>) -> Self {
        self.ssr_manifest = Some(manifest);
        self
    }
}
