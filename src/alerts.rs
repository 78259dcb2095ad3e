//! Keyword alert matching.
//!
//! Every pass re-notifies for keywords that still match; nothing remembers
//! which items a chat has already been told about.

use tracing::{debug, warn};

use crate::bot::AppState;
use crate::feeds::{CatalogEntry, FeedItem, FeedSnapshot, Post, Source, Story, Trend};
use crate::platform::ChatId;
use crate::render;

/// The item that tripped a keyword.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit<'a> {
    Google(&'a Trend),
    Reddit(&'a Post),
    HackerNews(&'a Story),
    Catalog(&'a CatalogEntry),
}

impl Hit<'_> {
    pub fn source(&self) -> Source {
        match self {
            Hit::Google(_) => Source::GoogleTrends,
            Hit::Reddit(_) => Source::Reddit,
            Hit::HackerNews(_) => Source::HackerNews,
            Hit::Catalog(_) => Source::Catalog,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification<'a> {
    pub chat_id: ChatId,
    pub keyword: String,
    pub hit: Hit<'a>,
}

fn first_match<'a, T: FeedItem>(items: &'a [T], keyword: &str) -> Option<&'a T> {
    items.iter().find(|item| item.matches(keyword))
}

/// For each (chat, keyword) pair, the first matching item of every source.
///
/// Only rising catalog entries are considered.
pub fn scan<'a>(
    snapshot: &'a FeedSnapshot,
    alerts: &[(ChatId, Vec<String>)],
) -> Vec<Notification<'a>> {
    let rising: Vec<&'a CatalogEntry> = snapshot
        .catalog
        .iter()
        .copied()
        .filter(|e| e.rising)
        .collect();

    let mut out = Vec::new();
    for (chat_id, keywords) in alerts {
        for keyword in keywords.iter().filter(|k| !k.is_empty()) {
            let hits = [
                first_match(&snapshot.trends, keyword).map(Hit::Google),
                first_match(&snapshot.posts, keyword).map(Hit::Reddit),
                first_match(&snapshot.stories, keyword).map(Hit::HackerNews),
                first_match(&rising, keyword).map(|e| Hit::Catalog(*e)),
            ];
            out.extend(hits.into_iter().flatten().map(|hit| Notification {
                chat_id: *chat_id,
                keyword: keyword.clone(),
                hit,
            }));
        }
    }
    out
}

/// Send every notification. Failures are logged and skipped; returns the
/// number delivered.
pub async fn notify(state: &AppState, notifications: &[Notification<'_>]) -> usize {
    let button = render::web_app_button("📱 View in Tracker", state.webapp_url());
    let mut delivered = 0;

    for n in notifications {
        let transport = &state.transport;
        let result = match n.hit {
            Hit::Google(trend) => {
                transport
                    .send_message(n.chat_id, &render::alert_google(&n.keyword, trend), None)
                    .await
            }
            Hit::Reddit(post) => {
                transport
                    .send_media(
                        n.chat_id,
                        post.preview.as_deref(),
                        &render::alert_reddit(&n.keyword, post),
                        None,
                    )
                    .await
            }
            Hit::HackerNews(story) => {
                transport
                    .send_message(n.chat_id, &render::alert_hackernews(&n.keyword, story), None)
                    .await
            }
            Hit::Catalog(entry) => {
                transport
                    .send_message(n.chat_id, &render::alert_catalog(entry), button.as_ref())
                    .await
            }
        };

        match result {
            Ok(()) => {
                debug!(chat = %n.chat_id, keyword = %n.keyword, source = %n.hit.source(), "Alert sent");
                delivered += 1;
            }
            Err(e) => {
                warn!(chat = %n.chat_id, keyword = %n.keyword, error = %e, "Alert send failed");
            }
        }
    }
    delivered
}
