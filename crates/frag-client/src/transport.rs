//! Outbound payload transport.

use async_trait::async_trait;
use frag_core::RenderError;
use frag_streaming::ByteStream;
use futures::StreamExt;

/// Transport that fetches a rendered payload from an endpoint.
///
/// The request shape is deliberately bare: a POST whose body is the encoded
/// request identity and whose response body is the payload stream. No
/// headers, status-code handling, retries, or timeouts; policy like that
/// belongs to the embedder, layered behind this trait.
#[async_trait]
pub trait PayloadTransport: Send + Sync {
    /// POST `body` to `endpoint` and return the response body stream.
    async fn post(&self, endpoint: &str, body: &str) -> Result<ByteStream, RenderError>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Transport with a fresh client.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Transport over a preconfigured client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PayloadTransport for HttpTransport {
    async fn post(&self, endpoint: &str, body: &str) -> Result<ByteStream, RenderError> {
        let response = self
            .http
            .post(endpoint)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| RenderError::Transport(e.to_string()))
        });
        Ok(ByteStream::new(chunks))
    }
}
