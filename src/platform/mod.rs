pub mod telegram;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub use teloxide::types::ChatId;

/// Errors raised by an outbound call to the messaging provider.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The provider answered but refused the call.
    #[error("Telegram API error: {0}")]
    Api(String),

    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be parsed.
    #[error("malformed response: {0}")]
    InvalidResponse(String),

    /// A button or photo URL was not a valid URL.
    #[error("invalid url '{0}'")]
    InvalidUrl(String),
}

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub text: String,
}

/// One entry of a `getUpdates` batch.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundUpdate {
    pub update_id: u32,
    /// `None` for updates that carry no text message.
    pub message: Option<IncomingMessage>,
}

/// Keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    /// Persistent reply keyboard, one inner vec per row of button labels.
    Keyboard(Vec<Vec<&'static str>>),
    /// Single inline button that opens the mini app.
    WebApp { text: String, url: String },
}

/// Outbound and inbound calls to the messaging provider.
///
/// One call is one request; nothing is retried here. Callers decide whether a
/// failure is swallowed, logged, or acted on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-poll for updates with an id of at least `offset`.
    async fn get_updates(
        &self,
        offset: i32,
        timeout_secs: u32,
    ) -> Result<Vec<InboundUpdate>, TransportError>;

    /// Send an HTML-formatted message.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError>;

    /// Send a photo by URL with an HTML-formatted caption.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError>;

    /// Drop any registered webhook so long polling receives updates.
    async fn delete_webhook(&self) -> Result<(), TransportError>;

    /// Send `text` as a photo caption when an image is available, falling
    /// back to a plain message if the photo is rejected.
    async fn send_media(
        &self,
        chat_id: ChatId,
        photo_url: Option<&str>,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError> {
        if let Some(url) = photo_url {
            match self.send_photo(chat_id, url, text, markup).await {
                Ok(()) => return Ok(()),
                Err(e) => debug!("sendPhoto to {} failed, sending text instead: {}", chat_id, e),
            }
        }
        self.send_message(chat_id, text, markup).await
    }
}

/// Offset for the next poll: one past the highest update id seen, never
/// moving backwards.
pub fn next_offset(current: i32, updates: &[InboundUpdate]) -> i32 {
    updates
        .iter()
        .map(|u| i64::from(u.update_id) + 1)
        .max()
        .map(|next| next.min(i64::from(i32::MAX)) as i32)
        .map_or(current, |next| next.max(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::RecordingTransport;

    fn update(id: u32) -> InboundUpdate {
        InboundUpdate {
            update_id: id,
            message: None,
        }
    }

    #[test]
    fn test_next_offset_is_max_plus_one() {
        let batch = vec![update(10), update(12), update(11)];
        assert_eq!(next_offset(0, &batch), 13);
    }

    #[test]
    fn test_next_offset_empty_batch_keeps_current() {
        assert_eq!(next_offset(42, &[]), 42);
    }

    #[test]
    fn test_next_offset_never_goes_backwards() {
        assert_eq!(next_offset(100, &[update(5)]), 100);
    }

    #[tokio::test]
    async fn test_send_media_falls_back_to_text() {
        let transport = RecordingTransport::new();
        transport.fail_photos();
        transport
            .send_media(ChatId(1), Some("https://img.example/a.jpg"), "caption", None)
            .await
            .unwrap();
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, ChatId(1));
        assert_eq!(sent[0].photo, None);
        assert_eq!(sent[0].text, "caption");
    }

    #[tokio::test]
    async fn test_send_media_prefers_photo() {
        let transport = RecordingTransport::new();
        transport
            .send_media(ChatId(1), Some("https://img.example/a.jpg"), "caption", None)
            .await
            .unwrap();
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].photo.as_deref(), Some("https://img.example/a.jpg"));
    }
}
