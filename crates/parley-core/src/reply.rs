//! Streaming reply ingestion.
//!
//! `/api/chat/stream` answers with a chunked plain-text body; the fragments
//! concatenated in arrival order form the assistant's reply. `ReplyStream`
//! turns that byte stream into incremental text events. There is no framing
//! to interpret: chunks are opaque, never reordered or deduplicated.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};

/// Raw byte stream of a reply response body.
pub type ReplyByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Identifies the send a reply belongs to.
///
/// The session controller compares tickets when a reply finishes; a ticket
/// minted before a session switch no longer matches and its result is
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTicket(pub(crate) u64);

/// Events emitted while a reply streams in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// A new fragment arrived. `text` is the fragment, not the total.
    Delta { text: String },
    /// The stream ended normally. `text` is the full accumulated reply.
    Completed { text: String },
}

enum IngestState {
    Streaming,
    /// Body exhausted; the terminal `Completed` has not been emitted yet.
    Finished,
    Done,
}

/// Ingestor for one in-flight assistant reply.
///
/// Yields one `Delta` per received chunk and a terminal `Completed`. A
/// transport failure mid-stream yields a terminal error instead, and the
/// caller's error path discards the text accumulated so far. After
/// `abandon()` (or cancellation of the shared token) no further events are
/// yielded -- that is how an orphaned stream is silenced while the
/// underlying connection may still be draining.
pub struct ReplyStream {
    inner: ReplyByteStream,
    ticket: ReplyTicket,
    cancel: CancellationToken,
    /// Accumulated reply text.
    text: String,
    /// Trailing bytes of a UTF-8 sequence split across chunk boundaries.
    partial: Vec<u8>,
    state: IngestState,
}

impl std::fmt::Debug for ReplyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyStream")
            .field("ticket", &self.ticket)
            .field("cancel", &self.cancel)
            .field("text", &self.text)
            .field("partial", &self.partial)
            .finish_non_exhaustive()
    }
}

impl ReplyStream {
    pub(crate) fn new(inner: ReplyByteStream, ticket: ReplyTicket, cancel: CancellationToken) -> Self {
        Self {
            inner,
            ticket,
            cancel,
            text: String::new(),
            partial: Vec::new(),
            state: IngestState::Streaming,
        }
    }

    pub fn ticket(&self) -> ReplyTicket {
        self.ticket
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Stops the stream: no further events are yielded.
    pub fn abandon(&self) {
        self.cancel.cancel();
    }

    pub fn is_abandoned(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Decodes the maximal valid UTF-8 prefix of the pending bytes, keeping
    /// an incomplete trailing sequence for the next chunk.
    fn take_decoded(&mut self) -> String {
        match std::str::from_utf8(&self.partial) {
            Ok(decoded) => {
                let decoded = decoded.to_string();
                self.partial.clear();
                decoded
            }
            Err(err) if err.error_len().is_none() => {
                // Chunk boundary split a code point; hold the tail back.
                let valid = err.valid_up_to();
                let decoded = String::from_utf8_lossy(&self.partial[..valid]).into_owned();
                self.partial.drain(..valid);
                decoded
            }
            Err(_) => {
                // Genuinely invalid bytes; decode lossily rather than stall.
                let decoded = String::from_utf8_lossy(&self.partial).into_owned();
                self.partial.clear();
                decoded
            }
        }
    }
}

impl Stream for ReplyStream {
    type Item = ClientResult<ReplyEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.cancel.is_cancelled() || matches!(this.state, IngestState::Done) {
                return Poll::Ready(None);
            }

            if matches!(this.state, IngestState::Finished) {
                this.state = IngestState::Done;
                return Poll::Ready(Some(Ok(ReplyEvent::Completed {
                    text: this.text.clone(),
                })));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.partial.extend_from_slice(&chunk);
                    let fragment = this.take_decoded();
                    if fragment.is_empty() {
                        // Chunk ended inside a code point; wait for the rest.
                        continue;
                    }
                    this.text.push_str(&fragment);
                    return Poll::Ready(Some(Ok(ReplyEvent::Delta { text: fragment })));
                }
                Poll::Ready(Some(Err(err))) => {
                    this.state = IngestState::Done;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.state = IngestState::Finished;
                    if !this.partial.is_empty() {
                        // Malformed trailing bytes at end of stream.
                        let tail = String::from_utf8_lossy(&this.partial).into_owned();
                        this.partial.clear();
                        this.text.push_str(&tail);
                        return Poll::Ready(Some(Ok(ReplyEvent::Delta { text: tail })));
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    /// Helper to create a mock byte stream from string chunks.
    fn mock_byte_stream(chunks: &[&str]) -> ReplyByteStream {
        let items: Vec<Result<Bytes, ClientError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect();
        Box::pin(futures_util::stream::iter(items))
    }

    fn reply_stream(inner: ReplyByteStream) -> ReplyStream {
        ReplyStream::new(inner, ReplyTicket(1), CancellationToken::new())
    }

    #[tokio::test]
    async fn yields_one_delta_per_chunk_then_completed() {
        let mut stream = reply_stream(mock_byte_stream(&["Hel", "lo!"]));

        let mut events = Vec::new();
        while let Some(result) = stream.next().await {
            events.push(result.expect("Expected valid event"));
        }

        assert_eq!(
            events,
            vec![
                ReplyEvent::Delta {
                    text: "Hel".to_string()
                },
                ReplyEvent::Delta {
                    text: "lo!".to_string()
                },
                ReplyEvent::Completed {
                    text: "Hello!".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_body_completes_with_empty_text() {
        let mut stream = reply_stream(mock_byte_stream(&[]));

        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            ReplyEvent::Completed {
                text: String::new()
            }
        );
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn utf8_split_across_chunks_decodes_losslessly() {
        // 👋 = F0 9F 91 8B (4 bytes); split it in the middle.
        let bytes = "Hello 👋 world".as_bytes();
        let emoji_start = bytes
            .windows(4)
            .position(|w| w == [0xF0, 0x9F, 0x91, 0x8B])
            .expect("emoji not found");
        let split_point = emoji_start + 2;

        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::copy_from_slice(&bytes[..split_point])),
            Ok(Bytes::copy_from_slice(&bytes[split_point..])),
        ];
        let mut stream = reply_stream(Box::pin(futures_util::stream::iter(chunks)));

        // First chunk decodes only up to the split.
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            ReplyEvent::Delta {
                text: "Hello ".to_string()
            }
        );
        // Second chunk completes the emoji without replacement characters.
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            ReplyEvent::Delta {
                text: "👋 world".to_string()
            }
        );
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            ReplyEvent::Completed {
                text: "Hello 👋 world".to_string()
            }
        );
    }

    #[tokio::test]
    async fn abandoned_stream_yields_nothing() {
        let mut stream = reply_stream(mock_byte_stream(&["never", "seen"]));
        stream.abandon();

        assert!(stream.is_abandoned());
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn abandon_mid_stream_suppresses_remaining_events() {
        let mut stream = reply_stream(mock_byte_stream(&["first", "second"]));

        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            ReplyEvent::Delta {
                text: "first".to_string()
            }
        );
        stream.abandon();
        assert!(stream.next().await.is_none());
        // The partial text is still inspectable for the caller's cleanup.
        assert_eq!(stream.text(), "first");
    }

    #[tokio::test]
    async fn transport_error_is_terminal() {
        let items: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"par")),
            Err(ClientError::transport("connection reset")),
        ];
        let mut stream = reply_stream(Box::pin(futures_util::stream::iter(items)));

        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            ReplyEvent::Delta {
                text: "par".to_string()
            }
        );
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind, crate::error::ClientErrorKind::Transport);
        // No Completed after an error.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_trailing_bytes_decode_lossily_at_end() {
        let items: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"ok ")),
            // Truncated 4-byte sequence that never gets its tail.
            Ok(Bytes::from_static(&[0xF0, 0x9F])),
        ];
        let mut stream = reply_stream(Box::pin(futures_util::stream::iter(items)));

        let mut events = Vec::new();
        while let Some(result) = stream.next().await {
            events.push(result.expect("Expected valid event"));
        }

        let ReplyEvent::Completed { text } = events.last().unwrap() else {
            panic!("Expected terminal Completed");
        };
        assert!(text.starts_with("ok "));
        assert!(text.contains('\u{FFFD}'));
    }
}
