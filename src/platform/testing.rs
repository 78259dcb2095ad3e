//! In-memory transport used by the unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{ChatId, InboundUpdate, IncomingMessage, Markup, Transport, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub photo: Option<String>,
    pub markup: Option<Markup>,
}

enum Poll {
    Updates(Vec<InboundUpdate>),
    Error,
    Panic,
}

#[derive(Default)]
struct Inner {
    sent: Vec<SentMessage>,
    failing_chats: HashSet<ChatId>,
    panicking_chats: HashSet<ChatId>,
    fail_photos: bool,
    script: VecDeque<Poll>,
    offsets: Vec<i32>,
    stop_when_drained: Option<watch::Sender<bool>>,
}

/// Records every outbound call and replays scripted `getUpdates` batches.
#[derive(Default)]
pub struct RecordingTransport {
    inner: Mutex<Inner>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `chat_id` fails with a transport error.
    pub fn fail_chat(&self, chat_id: ChatId) {
        self.inner.lock().unwrap().failing_chats.insert(chat_id);
    }

    /// Every send to `chat_id` panics.
    pub fn panic_chat(&self, chat_id: ChatId) {
        self.inner.lock().unwrap().panicking_chats.insert(chat_id);
    }

    pub fn fail_photos(&self) {
        self.inner.lock().unwrap().fail_photos = true;
    }

    /// Queue one `getUpdates` answer.
    pub fn push_updates(&self, updates: Vec<InboundUpdate>) {
        self.inner.lock().unwrap().script.push_back(Poll::Updates(updates));
    }

    /// Queue one failing `getUpdates` call.
    pub fn push_poll_error(&self) {
        self.inner.lock().unwrap().script.push_back(Poll::Error);
    }

    /// Queue one `getUpdates` call that panics.
    pub fn push_poll_panic(&self) {
        self.inner.lock().unwrap().script.push_back(Poll::Panic);
    }

    /// Flip `stop` once every scripted batch has been delivered.
    pub fn stop_when_drained(&self, stop: watch::Sender<bool>) {
        self.inner.lock().unwrap().stop_when_drained = Some(stop);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    pub fn offsets(&self) -> Vec<i32> {
        self.inner.lock().unwrap().offsets.clone()
    }

    fn record(
        &self,
        chat_id: ChatId,
        text: &str,
        photo: Option<&str>,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.panicking_chats.contains(&chat_id) {
            drop(inner);
            panic!("send to chat {chat_id} blew up");
        }
        if inner.failing_chats.contains(&chat_id) {
            return Err(TransportError::Api("Forbidden: bot was blocked by the user".into()));
        }
        if photo.is_some() && inner.fail_photos {
            return Err(TransportError::Api("Bad Request: wrong file identifier".into()));
        }
        inner.sent.push(SentMessage {
            chat_id,
            text: text.to_string(),
            photo: photo.map(str::to_string),
            markup: markup.cloned(),
        });
        Ok(())
    }
}

/// Shorthand for a text update in tests.
pub fn text_update(update_id: u32, chat_id: i64, text: &str) -> InboundUpdate {
    InboundUpdate {
        update_id,
        message: Some(IncomingMessage {
            chat_id: ChatId(chat_id),
            text: text.to_string(),
        }),
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get_updates(
        &self,
        offset: i32,
        _timeout_secs: u32,
    ) -> Result<Vec<InboundUpdate>, TransportError> {
        let next = {
            let mut inner = self.inner.lock().unwrap();
            inner.offsets.push(offset);
            let next = inner.script.pop_front();
            if next.is_none() {
                if let Some(stop) = inner.stop_when_drained.take() {
                    let _ = stop.send(true);
                }
            }
            next
        };

        match next {
            Some(Poll::Updates(updates)) => Ok(updates
                .into_iter()
                .filter(|u| i64::from(u.update_id) >= i64::from(offset))
                .collect()),
            Some(Poll::Error) => Err(TransportError::Network("connection reset".into())),
            Some(Poll::Panic) => panic!("getUpdates blew up"),
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError> {
        self.record(chat_id, text, None, markup)
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError> {
        self.record(chat_id, caption, Some(photo_url), markup)
    }

    async fn delete_webhook(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
