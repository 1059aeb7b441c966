//! Request body sources.
//!
//! A request double carries its body either as a re-readable [`Bytes`]
//! buffer or as a single-pass [`ByteStream`]. Tests that need to feed a
//! body incrementally can use a [`BodyChannel`]:
//!
//! ```
//! use testhost_core::body::{BodyChannel, read_to_bytes};
//!
//! # tokio_test::block_on(async {
//! let (channel, sender) = BodyChannel::new();
//!
//! tokio::spawn(async move {
//!     sender.send("Hello, ").await.ok();
//!     sender.send("World!").await.ok();
//!     sender.close();
//! });
//!
//! let body = read_to_bytes(Box::pin(channel)).await.unwrap();
//! assert_eq!(&body[..], b"Hello, World!");
//! # });
//! ```

use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, stream};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Single-pass body stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'static>>;

/// A stream that yields `bytes` once, or nothing if it is empty.
pub fn bytes_stream(bytes: Bytes) -> ByteStream {
    if bytes.is_empty() {
        empty_stream()
    } else {
        Box::pin(stream::once(async move { Ok(bytes) }))
    }
}

/// A stream that ends immediately.
pub fn empty_stream() -> ByteStream {
    Box::pin(stream::empty())
}

/// Box any byte stream whose errors convert into [`Error`].
pub fn into_byte_stream<S, B, E>(source: S) -> ByteStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: Into<Bytes>,
    E: Into<Error>,
{
    Box::pin(source.map(|chunk| chunk.map(Into::into).map_err(Into::into)))
}

/// Drain a stream into one buffer.
pub async fn read_to_bytes(mut stream: ByteStream) -> Result<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}

// ============================================================================
// Body Channel
// ============================================================================

enum BodyChunk {
    Bytes(Bytes),
    Error(String),
}

/// Receiving half of a channel-backed body source.
///
/// The stream ends when every [`BodyChannelSender`] has been dropped or
/// closed.
pub struct BodyChannel {
    receiver: mpsc::Receiver<BodyChunk>,
}

/// Sending half of a [`BodyChannel`].
pub struct BodyChannelSender {
    sender: mpsc::Sender<BodyChunk>,
    bytes_sent: Arc<AtomicU64>,
}

impl BodyChannel {
    /// Create a channel with the default buffer size (16 chunks).
    pub fn new() -> (Self, BodyChannelSender) {
        Self::with_buffer_size(16)
    }

    pub fn with_buffer_size(size: usize) -> (Self, BodyChannelSender) {
        let (sender, receiver) = mpsc::channel(size.max(1));
        (
            Self { receiver },
            BodyChannelSender {
                sender,
                bytes_sent: Arc::new(AtomicU64::new(0)),
            },
        )
    }
}

impl Stream for BodyChannel {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(BodyChunk::Bytes(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(Some(BodyChunk::Error(message))) => {
                Poll::Ready(Some(Err(Error::Io(std::io::Error::other(message)))))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl BodyChannelSender {
    /// Send a chunk of body bytes.
    pub async fn send(&self, data: impl Into<Bytes>) -> Result<()> {
        let bytes = data.into();
        let len = bytes.len() as u64;
        self.sender
            .send(BodyChunk::Bytes(bytes))
            .await
            .map_err(|_| closed_error())?;
        self.bytes_sent.fetch_add(len, Ordering::Relaxed);
        Ok(())
    }

    /// Make the reader observe an I/O error.
    pub async fn send_error(&self, message: impl Into<String>) -> Result<()> {
        self.sender
            .send(BodyChunk::Error(message.into()))
            .await
            .map_err(|_| closed_error())
    }

    /// End the body.
    pub fn close(self) {}

    /// Total bytes sent so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Check if the reader has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

fn closed_error() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "body reader was dropped",
    ))
}
