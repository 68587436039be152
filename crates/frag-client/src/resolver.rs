//! Payload source resolution.

use std::sync::Arc;

use frag_core::{PayloadCache, RenderError};
use frag_streaming::ByteStream;

use crate::runtime::RuntimeAdapter;
use crate::transport::PayloadTransport;

/// Resolves a payload stream for a cache key, cheapest source first.
///
/// Exactly one source is consulted per call: the memory cache replays with
/// no I/O at all, a document-embedded payload costs a local read, and only
/// a double miss reaches the network. A failed network request propagates;
/// there is no fourth source.
pub struct PayloadResolver<R, T> {
    cache: PayloadCache,
    runtime: Arc<R>,
    transport: Arc<T>,
    endpoint: String,
}

impl<R: RuntimeAdapter, T: PayloadTransport> PayloadResolver<R, T> {
    /// Resolver over one attempt's context snapshot.
    pub fn new(
        cache: PayloadCache,
        runtime: Arc<R>,
        transport: Arc<T>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            runtime,
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Return a fresh single-use stream for `key`.
    pub async fn resolve(&self, key: &str) -> Result<ByteStream, RenderError> {
        if let Some(bytes) = self.cache.get(key) {
            tracing::debug!(key = %key, source = "cache", "payload resolved");
            return Ok(ByteStream::from_bytes(bytes.to_vec()));
        }

        if let Some(stream) = self.runtime.embedded_payload(key) {
            tracing::debug!(key = %key, source = "document", "payload resolved");
            return Ok(stream);
        }

        tracing::debug!(key = %key, source = "network", "payload requested");
        self.transport.post(&self.endpoint, key).await
    }
}
