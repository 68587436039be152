//! Single-consumption byte streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use frag_core::RenderError;
use futures::stream::{self, BoxStream, Stream, StreamExt};

/// Chunk yielded by a [`ByteStream`].
pub type Chunk = Result<Vec<u8>, RenderError>;

/// A single-consumption stream of byte chunks.
///
/// Payloads arrive as one of these regardless of source: a cache replay, a
/// document-embedded payload, or a network response body. A stream can be
/// read once; split it with [`crate::tee`] before handing it to more than
/// one consumer.
pub struct ByteStream {
    inner: BoxStream<'static, Chunk>,
}

impl ByteStream {
    /// Wrap any chunk stream.
    pub fn new(stream: impl Stream<Item = Chunk> + Send + 'static) -> Self {
        Self {
            inner: stream.boxed(),
        }
    }

    /// A stream replaying `bytes` as a single chunk.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(stream::iter([Ok(bytes.into())]))
    }

    /// A stream yielding the given chunks in order.
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self::new(stream::iter(chunks.into_iter().map(Ok)))
    }

    /// A stream that ends immediately.
    pub fn empty() -> Self {
        Self::new(stream::empty())
    }
}

impl Stream for ByteStream {
    type Item = Chunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ByteStream")
    }
}
