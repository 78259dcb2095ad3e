//! Routes an inbound message to exactly one handler.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, error, info};

use crate::bot::AppState;
use crate::broadcast::send_digest;
use crate::feeds::catalog::{self, Category};
use crate::platform::{ChatId, IncomingMessage};
use crate::render;
use crate::store::{normalize_keyword, AlertAdded};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    Trends,
    Google,
    Reddit,
    HackerNews,
    Rising,
    Category(Category),
    Subscribe,
    Unsubscribe,
    App,
    MyAlerts,
    /// Normalized keyword, possibly empty.
    Alert(String),
    RemoveAlert(String),
    Unknown,
}

/// Command text and button label pairs, matched exactly.
static TABLE: &[(&str, Option<&str>, Command)] = &[
    ("/start", None, Command::Start),
    ("/help", None, Command::Help),
    ("/trends", Some(render::BTN_LIVE), Command::Trends),
    ("/google", Some(render::BTN_GOOGLE), Command::Google),
    ("/reddit", Some(render::BTN_REDDIT), Command::Reddit),
    ("/hn", Some(render::BTN_HACKERNEWS), Command::HackerNews),
    ("/rising", Some(render::BTN_RISING), Command::Rising),
    ("/animals", Some(render::BTN_ANIMALS), Command::Category(Category::Animals)),
    ("/memes", Some(render::BTN_MEMES), Command::Category(Category::Memes)),
    ("/toys", Some(render::BTN_TOYS), Command::Category(Category::Toys)),
    ("/viral", Some(render::BTN_VIRAL), Command::Category(Category::Viral)),
    ("/subscribe", Some(render::BTN_SUBSCRIBE), Command::Subscribe),
    ("/unsubscribe", Some(render::BTN_UNSUBSCRIBE), Command::Unsubscribe),
    ("/app", Some(render::BTN_APP), Command::App),
    ("/myalerts", Some(render::BTN_ALERTS), Command::MyAlerts),
];

/// `Some(rest)` when `text` is `command` alone or followed by whitespace.
fn argument<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(command)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some((_, _, command)) = TABLE
            .iter()
            .find(|(cmd, button, _)| *cmd == text || *button == Some(text))
        {
            return command.clone();
        }
        if let Some(rest) = argument(text, "/alert") {
            return Command::Alert(normalize_keyword(rest));
        }
        if let Some(rest) = argument(text, "/removealert") {
            return Command::RemoveAlert(normalize_keyword(rest));
        }
        Command::Unknown
    }
}

/// Handle one message. Handler failures, panics included, are logged here and
/// never reach the poll loop.
pub async fn dispatch(state: &AppState, message: &IncomingMessage) {
    let command = Command::parse(&message.text);
    debug!(chat = %message.chat_id, ?command, "Dispatching message");

    match AssertUnwindSafe(handle(state, message.chat_id, command))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Handler error for chat {}: {:#}", message.chat_id, e),
        Err(_) => error!("Handler panicked for chat {}", message.chat_id),
    }
}

async fn reply(state: &AppState, chat_id: ChatId, text: &str) -> Result<()> {
    state.transport.send_message(chat_id, text, None).await?;
    Ok(())
}

async fn handle(state: &AppState, chat_id: ChatId, command: Command) -> Result<()> {
    let transport = &state.transport;
    let interval = state.config.broadcast.interval_secs;

    match command {
        Command::Start => {
            if state.registry.subscribe(chat_id) {
                info!("Chat {} subscribed via /start", chat_id);
            }
            transport
                .send_message(chat_id, &render::welcome(interval), Some(&render::main_keyboard()))
                .await?;
        }
        Command::Help => {
            transport
                .send_message(chat_id, &render::help(), Some(&render::main_keyboard()))
                .await?;
        }
        Command::Trends => {
            reply(state, chat_id, render::digest_header()).await?;
            let snapshot = state.feeds.snapshot().await;
            if snapshot.is_empty() {
                reply(state, chat_id, render::UNAVAILABLE).await?;
            } else {
                send_digest(state, chat_id, &snapshot).await?;
            }
        }
        Command::Google => {
            reply(state, chat_id, &render::fetching("Google Trends")).await?;
            let trends = state.feeds.google_trends().await;
            if trends.is_empty() {
                return reply(state, chat_id, render::UNAVAILABLE).await;
            }
            let text = render::google_trends(&trends, &state.config.feeds.google_trends.geo, Utc::now());
            let picture = trends.iter().find_map(|t| t.picture.as_deref());
            transport.send_media(chat_id, picture, &text, None).await?;
        }
        Command::Reddit => {
            reply(state, chat_id, &render::fetching("Reddit TikTok trends")).await?;
            let posts = state.feeds.reddit().await;
            if posts.is_empty() {
                return reply(state, chat_id, render::UNAVAILABLE).await;
            }
            let pacing = Duration::from_millis(state.config.broadcast.item_pacing_ms);
            for post in &posts {
                transport
                    .send_media(chat_id, post.image(), &render::reddit_post(post), None)
                    .await?;
                tokio::time::sleep(pacing).await;
            }
        }
        Command::HackerNews => {
            reply(state, chat_id, &render::fetching("Hacker News")).await?;
            let stories = state.feeds.hackernews().await;
            if stories.is_empty() {
                return reply(state, chat_id, render::UNAVAILABLE).await;
            }
            reply(state, chat_id, &render::hackernews(&stories)).await?;
        }
        Command::Rising => {
            let button = render::web_app_button("📱 See Full Dashboard", state.webapp_url());
            transport
                .send_message(chat_id, &render::rising(&catalog::rising()), button.as_ref())
                .await?;
        }
        Command::Category(category) => {
            let entries = catalog::top(Some(category), 3);
            let button = render::web_app_button("📱 See All in App", state.webapp_url());
            transport
                .send_message(chat_id, &render::category(category, &entries), button.as_ref())
                .await?;
        }
        Command::Subscribe => {
            state.registry.subscribe(chat_id);
            reply(state, chat_id, &render::subscribed(interval)).await?;
        }
        Command::Unsubscribe => {
            state.registry.unsubscribe(chat_id);
            reply(state, chat_id, render::unsubscribed()).await?;
        }
        Command::App => {
            let url = state.webapp_url();
            let button = render::web_app_button("📱 Open TrendPulse Tracker", url);
            transport
                .send_message(chat_id, render::open_app(url.is_some()), button.as_ref())
                .await?;
        }
        Command::MyAlerts => {
            let keywords = state.registry.list_alerts(chat_id);
            reply(state, chat_id, &render::my_alerts(&keywords)).await?;
        }
        Command::Alert(keyword) => {
            if keyword.is_empty() {
                return reply(state, chat_id, render::alert_usage()).await;
            }
            let added = state.registry.add_alert(chat_id, &keyword);
            let active = state.registry.list_alerts(chat_id);
            let text = match added {
                AlertAdded::Added => {
                    info!("Chat {} added alert '{}'", chat_id, keyword);
                    render::alert_added(&keyword, &active)
                }
                AlertAdded::AlreadyPresent => render::alert_exists(&keyword, &active),
            };
            reply(state, chat_id, &text).await?;

            if state.config.feeds.catalog.enabled {
                let matches = catalog::search(&keyword);
                if !matches.is_empty() {
                    reply(state, chat_id, &render::alert_catalog_matches(&keyword, &matches)).await?;
                }
            }
        }
        Command::RemoveAlert(keyword) => {
            if keyword.is_empty() {
                return reply(state, chat_id, render::removealert_usage()).await;
            }
            let text = if state.registry.remove_alert(chat_id, &keyword) {
                render::alert_removed(&keyword)
            } else {
                render::alert_not_found(&keyword)
            };
            reply(state, chat_id, &text).await?;
        }
        Command::Unknown => {
            transport
                .send_message(chat_id, render::unknown(), Some(&render::main_keyboard()))
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing;
    use crate::platform::Markup;

    fn message(chat_id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: ChatId(chat_id),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_parse_commands_and_buttons() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("  /help "), Command::Help);
        assert_eq!(Command::parse(render::BTN_LIVE), Command::Trends);
        assert_eq!(Command::parse("/trends"), Command::Trends);
        assert_eq!(Command::parse(render::BTN_ALERTS), Command::MyAlerts);
        assert_eq!(
            Command::parse("/viral"),
            Command::Category(Category::Viral)
        );
        assert_eq!(Command::parse("/Start"), Command::Unknown);
        assert_eq!(Command::parse("hello"), Command::Unknown);
    }

    #[test]
    fn test_parse_alert_arguments() {
        assert_eq!(Command::parse("/alert  Cat Yoga "), Command::Alert("cat yoga".into()));
        assert_eq!(Command::parse("/alert"), Command::Alert(String::new()));
        assert_eq!(Command::parse("/alert\ncat"), Command::Alert("cat".into()));
        assert_eq!(Command::parse("/alertcat"), Command::Unknown);
        assert_eq!(Command::parse("/removealert CAT"), Command::RemoveAlert("cat".into()));
    }

    #[tokio::test]
    async fn test_start_subscribes_and_shows_keyboard() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(1, "/start")).await;

        assert_eq!(state.registry.list_subscribers(), vec![ChatId(1)]);
        let sent = transport.sent_to(ChatId(1));
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("Welcome to TrendPulse Live"));
        assert_eq!(sent[0].markup, Some(render::main_keyboard()));
    }

    #[tokio::test]
    async fn test_subscribe_then_unsubscribe() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(1, render::BTN_SUBSCRIBE)).await;
        assert_eq!(state.registry.list_subscribers(), vec![ChatId(1)]);
        dispatch(&state, &message(1, "/unsubscribe")).await;
        assert!(state.registry.list_subscribers().is_empty());
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_alert_without_keyword_shows_usage() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(1, "/alert   ")).await;
        assert!(state.registry.list_alerts(ChatId(1)).is_empty());
        assert_eq!(transport.sent()[0].text, render::alert_usage());
    }

    #[tokio::test]
    async fn test_alert_reports_catalog_matches() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(42, "/alert cat")).await;

        assert_eq!(state.registry.list_alerts(ChatId(42)), vec!["cat"]);
        let sent = transport.sent_to(ChatId(42));
        assert_eq!(sent.len(), 2);
        assert!(sent[0].text.contains("Alert set for <b>\"cat\"</b>"));
        assert!(sent[1].text.contains("Cat Yoga Challenge"));
    }

    #[tokio::test]
    async fn test_duplicate_alert_kept_once() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(1, "/alert zzz")).await;
        dispatch(&state, &message(1, "/alert ZZZ")).await;
        assert_eq!(state.registry.list_alerts(ChatId(1)), vec!["zzz"]);
        assert!(transport.sent()[1].text.contains("already have an alert"));
    }

    #[tokio::test]
    async fn test_removealert_not_found_leaves_store() {
        let (state, transport) = testing::state();
        state.registry.add_alert(ChatId(1), "dog");
        dispatch(&state, &message(1, "/removealert cat")).await;

        assert_eq!(state.registry.list_alerts(ChatId(1)), vec!["dog"]);
        assert_eq!(transport.sent()[0].text, render::alert_not_found("cat"));

        dispatch(&state, &message(1, "/removealert dog")).await;
        assert!(state.registry.list_alerts(ChatId(1)).is_empty());
    }

    #[tokio::test]
    async fn test_empty_fetch_replies_unavailable() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(1, "/google")).await;
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].text, render::UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_category_lists_top_three() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(1, render::BTN_ANIMALS)).await;
        let text = &transport.sent()[0].text;
        assert!(text.starts_with("📂 <b>TOP ANIMALS TRENDS</b>"));
        assert_eq!(text.matches("📂 Category:").count(), 3);
    }

    #[tokio::test]
    async fn test_app_with_webapp_url_sends_button() {
        let mut config = testing::state().0.config.clone();
        config.telegram.webapp_url = "https://tracker.example".into();
        let (state, transport) = testing::with_config(config);

        dispatch(&state, &message(1, "/app")).await;
        assert!(matches!(
            &transport.sent()[0].markup,
            Some(Markup::WebApp { url, .. }) if url == "https://tracker.example"
        ));
    }

    #[tokio::test]
    async fn test_unknown_text_gets_menu() {
        let (state, transport) = testing::state();
        dispatch(&state, &message(1, "what is trending?")).await;
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, render::unknown());
        assert_eq!(sent[0].markup, Some(render::main_keyboard()));
    }

    #[tokio::test]
    async fn test_handler_error_is_contained() {
        let (state, transport) = testing::state();
        transport.fail_chat(ChatId(9));
        dispatch(&state, &message(9, "/help")).await;
        dispatch(&state, &message(10, "/help")).await;
        assert_eq!(transport.sent_to(ChatId(10)).len(), 1);
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let (state, transport) = testing::state();
        transport.panic_chat(ChatId(9));

        dispatch(&state, &message(9, "/subscribe")).await;
        dispatch(&state, &message(10, "/help")).await;

        assert!(transport.sent_to(ChatId(9)).is_empty());
        assert_eq!(state.registry.list_subscribers(), vec![ChatId(9)]);
        assert_eq!(transport.sent_to(ChatId(10)).len(), 1);
    }
}
