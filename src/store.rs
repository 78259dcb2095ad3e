//! In-memory registry of subscribed chats and per-chat keyword alerts.
//!
//! Both the poll loop and the broadcast timer touch this, so every operation
//! takes the lock for the duration of one call and never across an `.await`.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::platform::ChatId;

#[derive(Debug, Default)]
struct Inner {
    subscribers: BTreeSet<ChatId>,
    /// Keywords in insertion order, no duplicates.
    alerts: HashMap<ChatId, Vec<String>>,
}

/// Result of adding a keyword alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAdded {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

/// Trim and lowercase a keyword before it is stored or looked up.
pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // No operation can leave the maps half-updated, so a poisoned lock
        // still guards consistent data.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns `true` if the chat was not subscribed before.
    pub fn subscribe(&self, chat_id: ChatId) -> bool {
        self.lock().subscribers.insert(chat_id)
    }

    /// Returns `true` if the chat was subscribed.
    pub fn unsubscribe(&self, chat_id: ChatId) -> bool {
        self.lock().subscribers.remove(&chat_id)
    }

    /// Snapshot of the subscribers, in chat id order.
    pub fn list_subscribers(&self) -> Vec<ChatId> {
        self.lock().subscribers.iter().copied().collect()
    }

    /// `keyword` must already be normalized and non-empty.
    pub fn add_alert(&self, chat_id: ChatId, keyword: &str) -> AlertAdded {
        let mut inner = self.lock();
        let keywords = inner.alerts.entry(chat_id).or_default();
        if keywords.iter().any(|k| k == keyword) {
            AlertAdded::AlreadyPresent
        } else {
            keywords.push(keyword.to_string());
            AlertAdded::Added
        }
    }

    /// Returns `false`, leaving the store untouched, when the chat has no
    /// such alert.
    pub fn remove_alert(&self, chat_id: ChatId, keyword: &str) -> bool {
        let mut inner = self.lock();
        let Some(keywords) = inner.alerts.get_mut(&chat_id) else {
            return false;
        };
        let Some(pos) = keywords.iter().position(|k| k == keyword) else {
            return false;
        };
        keywords.remove(pos);
        if keywords.is_empty() {
            inner.alerts.remove(&chat_id);
        }
        true
    }

    /// Keywords for one chat, oldest first.
    pub fn list_alerts(&self, chat_id: ChatId) -> Vec<String> {
        self.lock()
            .alerts
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every chat with at least one alert, in chat id order.
    pub fn all_alerts(&self) -> Vec<(ChatId, Vec<String>)> {
        let inner = self.lock();
        let mut all: Vec<_> = inner
            .alerts
            .iter()
            .filter(|(_, keywords)| !keywords.is_empty())
            .map(|(chat, keywords)| (*chat, keywords.clone()))
            .collect();
        all.sort_by_key(|(chat, _)| *chat);
        all
    }

    pub fn has_alerts(&self) -> bool {
        self.lock().alerts.values().any(|k| !k.is_empty())
    }
}
