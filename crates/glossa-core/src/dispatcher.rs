//! Reply delivery with size-limited chunking.
//!
//! The [`ReplyDispatcher`] turns a batch of [`Reply`] payloads into ordered
//! sends. Payloads longer than the transport limit are cut into fixed-width
//! chunks; every send is awaited before the next is issued, so chunk and
//! payload order are preserved within one batch.
//!
//! Delivery is best-effort. A failed send is logged, the rest of that
//! payload is dropped, and the dispatcher moves on to the next payload.

use tracing::{debug, instrument, warn};

use crate::adapter::BoxedSender;
use crate::message::{ChatId, Reply};

/// Default maximum length of one outbound message, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;

/// Splits `text` into consecutive slices of at most `max_len` characters.
///
/// Slicing is fixed-width and ignores word boundaries. Lengths count
/// Unicode scalar values, so a code point is never cut in half. An empty
/// string yields no chunks.
///
/// # Panics
///
/// Panics if `max_len` is zero.
pub fn split_chunks(text: &str, max_len: usize) -> Vec<&str> {
    assert!(max_len > 0, "chunk length must be positive");

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_len {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Summary of one delivered batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Number of chunks successfully sent.
    pub sent_chunks: usize,
    /// Number of payloads that hit at least one failed send.
    pub failed_payloads: usize,
}

impl DeliveryReport {
    /// Returns `true` if every payload was delivered in full.
    pub fn is_complete(&self) -> bool {
        self.failed_payloads == 0
    }
}

/// Sends reply batches through a [`MessageSender`](crate::adapter::MessageSender).
#[derive(Clone)]
pub struct ReplyDispatcher {
    sender: BoxedSender,
    max_message_len: usize,
}

impl ReplyDispatcher {
    /// Creates a dispatcher using [`DEFAULT_MAX_MESSAGE_LEN`].
    pub fn new(sender: BoxedSender) -> Self {
        Self {
            sender,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }

    /// Sets the per-send length limit. Zero is treated as one.
    pub fn max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len.max(1);
        self
    }

    /// Returns the per-send length limit.
    pub fn limit(&self) -> usize {
        self.max_message_len
    }

    /// Delivers `replies` to `chat_id`, in order.
    #[instrument(level = "debug", skip_all, fields(chat_id = %chat_id, payloads = replies.len()))]
    pub async fn deliver(&self, chat_id: ChatId, replies: &[Reply]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (index, reply) in replies.iter().enumerate() {
            let chunks = split_chunks(&reply.text, self.max_message_len);
            if chunks.is_empty() {
                debug!(payload = index, "Skipping empty payload");
                continue;
            }

            for (part, chunk) in chunks.iter().enumerate() {
                match self.sender.send(chat_id, chunk, reply.options).await {
                    Ok(()) => report.sent_chunks += 1,
                    Err(e) => {
                        warn!(
                            chat_id = %chat_id,
                            payload = index,
                            chunk = part,
                            chunks = chunks.len(),
                            error = %e,
                            "Failed to send reply chunk, skipping rest of payload"
                        );
                        report.failed_payloads += 1;
                        break;
                    }
                }
            }
        }

        debug!(
            sent_chunks = report.sent_chunks,
            failed_payloads = report.failed_payloads,
            "Delivery finished"
        );
        report
    }
}

impl std::fmt::Debug for ReplyDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyDispatcher")
            .field("max_message_len", &self.max_message_len)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapter::MessageSender;
    use crate::error::{TransportError, TransportResult};
    use crate::message::SendOptions;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every send; fails sends whose text contains `fail_on`.
    #[derive(Default)]
    pub(crate) struct RecordingSender {
        pub(crate) sent: Mutex<Vec<(ChatId, String, SendOptions)>>,
        pub(crate) fail_on: Option<&'static str>,
    }

    impl RecordingSender {
        pub(crate) fn failing_on(marker: &'static str) -> Self {
            Self {
                sent: Mutex::default(),
                fail_on: Some(marker),
            }
        }

        pub(crate) fn texts(&self) -> Vec<String> {
            self.sent.lock().iter().map(|(_, t, _)| t.clone()).collect()
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(
            &self,
            chat_id: ChatId,
            text: &str,
            options: SendOptions,
        ) -> TransportResult<()> {
            if self.fail_on.is_some_and(|m| text.contains(m)) {
                return Err(TransportError::SendFailed("boom".into()));
            }
            self.sent.lock().push((chat_id, text.to_string(), options));
            Ok(())
        }
    }

    #[test]
    fn test_split_short_text_single_chunk() {
        assert_eq!(split_chunks("hello", 10), vec!["hello"]);
        assert_eq!(split_chunks("hello", 5), vec!["hello"]);
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_chunks("", 4).is_empty());
    }

    #[test]
    fn test_split_round_trip() {
        let limit = 7;
        for len in [8usize, 14, 15, 100, 4097] {
            let text: String = (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect();
            let chunks = split_chunks(&text, limit);
            assert_eq!(chunks.concat(), text);
            assert_eq!(chunks.len(), len.div_ceil(limit));
            assert!(chunks.iter().all(|c| c.chars().count() <= limit));
        }
    }

    #[test]
    fn test_split_respects_multibyte_chars() {
        let text = "αβγδε";
        let chunks = split_chunks(text, 2);
        assert_eq!(chunks, vec!["αβ", "γδ", "ε"]);
    }

    #[tokio::test]
    async fn test_deliver_chunks_in_order() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = ReplyDispatcher::new(sender.clone()).max_message_len(4);

        let report = dispatcher
            .deliver(ChatId(1), &[Reply::markup("abcdefghij"), Reply::plain("xy")])
            .await;

        assert_eq!(report.sent_chunks, 4);
        assert!(report.is_complete());
        assert_eq!(sender.texts(), vec!["abcd", "efgh", "ij", "xy"]);

        let sent = sender.sent.lock();
        assert_eq!(sent[0].2, SendOptions::MARKUP);
        assert_eq!(sent[3].2, SendOptions::PLAIN);
    }

    #[tokio::test]
    async fn test_failed_payload_does_not_abort_batch() {
        let sender = Arc::new(RecordingSender::failing_on("bad"));
        let dispatcher = ReplyDispatcher::new(sender.clone());

        let report = dispatcher
            .deliver(
                ChatId(9),
                &[
                    Reply::plain("first"),
                    Reply::plain("bad one"),
                    Reply::plain("third"),
                ],
            )
            .await;

        assert_eq!(report.sent_chunks, 2);
        assert_eq!(report.failed_payloads, 1);
        assert_eq!(sender.texts(), vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_failed_chunk_skips_rest_of_payload() {
        let sender = Arc::new(RecordingSender::failing_on("X"));
        let dispatcher = ReplyDispatcher::new(sender.clone()).max_message_len(3);

        let report = dispatcher
            .deliver(ChatId(9), &[Reply::plain("abcXefghi"), Reply::plain("ok")])
            .await;

        assert_eq!(sender.texts(), vec!["abc", "ok"]);
        assert_eq!(report.failed_payloads, 1);
    }
}
