//! Digest delivery and the scheduled broadcast pass.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::alerts;
use crate::bot::AppState;
use crate::feeds::{catalog, FeedSnapshot};
use crate::platform::{ChatId, TransportError};
use crate::render;

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Send one chat the full digest built from `snapshot`.
///
/// Stops at the first failed send.
pub async fn send_digest(
    state: &AppState,
    chat_id: ChatId,
    snapshot: &FeedSnapshot,
) -> Result<(), TransportError> {
    let transport = &state.transport;
    let feeds = &state.config.feeds;
    let pacing = &state.config.broadcast;

    if feeds.google_trends.enabled {
        if snapshot.trends.is_empty() {
            transport
                .send_message(chat_id, &render::source_unavailable("Google Trends"), None)
                .await?;
        } else {
            let text = render::google_trends(&snapshot.trends, &feeds.google_trends.geo, Utc::now());
            let picture = snapshot.trends.iter().find_map(|t| t.picture.as_deref());
            transport.send_media(chat_id, picture, &text, None).await?;
        }
        pause(pacing.section_pacing_ms).await;
    }

    if feeds.reddit.enabled {
        if snapshot.posts.is_empty() {
            transport
                .send_message(chat_id, &render::source_unavailable("Reddit trends"), None)
                .await?;
        } else {
            transport
                .send_message(chat_id, render::reddit_header(), None)
                .await?;
            for post in &snapshot.posts {
                transport
                    .send_media(chat_id, post.image(), &render::reddit_post(post), None)
                    .await?;
                pause(pacing.item_pacing_ms).await;
            }
        }
        pause(pacing.section_pacing_ms).await;
    }

    if feeds.hackernews.enabled {
        let text = if snapshot.stories.is_empty() {
            render::source_unavailable("Hacker News")
        } else {
            render::hackernews(&snapshot.stories)
        };
        transport.send_message(chat_id, &text, None).await?;
        pause(pacing.section_pacing_ms).await;
    }

    if !snapshot.catalog.is_empty() {
        let hottest = catalog::top(None, 5);
        transport
            .send_message(chat_id, &render::hot_catalog(&hottest), None)
            .await?;
    }

    let button = render::web_app_button(render::BTN_APP, state.webapp_url());
    transport
        .send_message(
            chat_id,
            &render::digest_footer(pacing.interval_secs),
            button.as_ref(),
        )
        .await
}

/// Outcome of one broadcast pass.
#[derive(Debug, Default, PartialEq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: Vec<ChatId>,
    pub alerts_sent: usize,
}

/// One scheduled pass: fetch every source once, send each subscriber a
/// digest, then run alert matching over the same items.
///
/// Returns `None` when skipped, either because a pass is already running or
/// because nobody would receive anything.
pub async fn run_broadcast(state: &AppState) -> Option<BroadcastReport> {
    let Some(_guard) = state.try_begin_broadcast() else {
        info!("Broadcast already in progress, skipping this run");
        return None;
    };

    let subscribers = state.registry.list_subscribers();
    if subscribers.is_empty() && !state.registry.has_alerts() {
        debug!("No subscribers or alerts, skipping broadcast");
        return None;
    }

    info!("Broadcasting to {} subscriber(s)...", subscribers.len());
    let snapshot = state.feeds.snapshot().await;
    let mut report = BroadcastReport::default();

    for chat_id in subscribers {
        match send_digest(state, chat_id, &snapshot).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(chat = %chat_id, error = %e, "Broadcast failed, dropping subscriber");
                state.registry.unsubscribe(chat_id);
                report.dropped.push(chat_id);
            }
        }
        pause(state.config.broadcast.chat_pacing_ms).await;
    }

    let notifications = alerts::scan(&snapshot, &state.registry.all_alerts());
    report.alerts_sent = alerts::notify(state, &notifications).await;

    info!(
        "Broadcast finished: {} delivered, {} dropped, {} alert(s) sent",
        report.delivered,
        report.dropped.len(),
        report.alerts_sent
    );
    Some(report)
}
