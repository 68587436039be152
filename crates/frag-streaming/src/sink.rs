//! Byte accumulation.

use std::pin::Pin;
use std::task::{Context, Poll};

use frag_core::RenderError;
use futures::{Sink, StreamExt};

use crate::stream::ByteStream;

/// Write-only sink that appends every chunk it receives, in arrival order,
/// into one growing buffer.
///
/// The buffer is handed out only through [`ByteSink::into_bytes`], once the
/// caller has decided the upstream is complete; there are no partial reads
/// during accumulation.
#[derive(Debug, Default)]
pub struct ByteSink {
    data: Vec<u8>,
}

impl ByteSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the sink, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Sink<Vec<u8>> for ByteSink {
    type Error = RenderError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, chunk: Vec<u8>) -> Result<(), Self::Error> {
        self.get_mut().data.extend_from_slice(&chunk);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Drain `stream` to completion and return the accumulated bytes.
///
/// A mid-stream failure propagates and the partially accumulated bytes are
/// discarded with the sink.
pub async fn accumulate(stream: ByteStream) -> Result<Vec<u8>, RenderError> {
    let mut sink = ByteSink::new();
    stream.forward(&mut sink).await?;
    Ok(sink.into_bytes())
}
