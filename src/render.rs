//! HTML message templates and keyboards.
//!
//! Everything here is pure string building. Feed text is escaped before it is
//! embedded, since every message is sent with HTML parse mode.

use chrono::{DateTime, Utc};
use teloxide::utils::html::escape;

use crate::feeds::catalog::Category;
use crate::feeds::{CatalogEntry, Post, Story, Trend};
use crate::platform::Markup;

pub const BTN_LIVE: &str = "🔥 Live Trends Now";
pub const BTN_GOOGLE: &str = "📈 Google Trends";
pub const BTN_REDDIT: &str = "🎵 TikTok Reddit";
pub const BTN_HACKERNEWS: &str = "🟧 Hacker News";
pub const BTN_RISING: &str = "🚀 Rising Fast";
pub const BTN_ANIMALS: &str = "🐾 Animals";
pub const BTN_MEMES: &str = "😂 Memes";
pub const BTN_TOYS: &str = "🧸 Toys";
pub const BTN_VIRAL: &str = "📊 Viral Trends";
pub const BTN_SUBSCRIBE: &str = "⏰ Subscribe Hourly";
pub const BTN_UNSUBSCRIBE: &str = "🔕 Unsubscribe";
pub const BTN_APP: &str = "📱 Open Full Tracker";
pub const BTN_ALERTS: &str = "🔔 My Alerts";

pub const UNAVAILABLE: &str = "⚠️ Unavailable right now, try again shortly.";

pub fn main_keyboard() -> Markup {
    Markup::Keyboard(vec![
        vec![BTN_LIVE, BTN_GOOGLE],
        vec![BTN_REDDIT, BTN_HACKERNEWS],
        vec![BTN_RISING, BTN_VIRAL],
        vec![BTN_ANIMALS, BTN_MEMES],
        vec![BTN_TOYS, BTN_ALERTS],
        vec![BTN_SUBSCRIBE, BTN_UNSUBSCRIBE],
        vec![BTN_APP, "/help"],
    ])
}

/// Inline mini-app button, only when a web-app URL is configured.
pub fn web_app_button(text: &str, url: Option<&str>) -> Option<Markup> {
    url.map(|url| Markup::WebApp {
        text: text.to_string(),
        url: url.to_string(),
    })
}

/// `1234567` -> `1,234,567`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn every(interval_secs: u64) -> String {
    match interval_secs {
        3600 => "1 hour".to_string(),
        s if s % 3600 == 0 => format!("{} hours", s / 3600),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{s} seconds"),
    }
}

pub fn welcome(interval_secs: u64) -> String {
    format!(
        "🚀 <b>Welcome to TrendPulse Live!</b>\n\n\
         I send you real trending content every {}:\n\
         📈 <b>Google Trends</b> — what the world is searching\n\
         🎵 <b>Reddit TikTok</b> — viral videos &amp; images with links\n\
         🟧 <b>Hacker News</b> — what tech is reading\n\n\
         You're now <b>subscribed to scheduled updates</b> ✅\n\n\
         Tap <b>{}</b> for an instant digest!",
        every(interval_secs),
        BTN_LIVE
    )
}

pub fn help() -> String {
    "<b>TrendPulse Commands</b>\n\n\
     /trends — Fresh trend digest now\n\
     /google — Google Trends only\n\
     /reddit — Reddit TikTok only\n\
     /hn — Hacker News front page\n\
     /rising — Trends rising fast\n\
     /animals, /memes, /toys, /viral — Top picks by category\n\
     /subscribe — Scheduled updates on\n\
     /unsubscribe — Scheduled updates off\n\
     /alert cat — Alert when \"cat\" trends\n\
     /myalerts — Your active alerts\n\
     /removealert cat — Remove an alert\n\
     /app — Open the full tracker"
        .to_string()
}

pub fn unknown() -> &'static str {
    "❓ I didn't understand that. Use the menu below or type /help."
}

pub fn subscribed(interval_secs: u64) -> String {
    format!(
        "✅ <b>Subscribed!</b> You'll get a trend digest every {}.\n\nUse /unsubscribe to stop.",
        every(interval_secs)
    )
}

pub fn unsubscribed() -> &'static str {
    "🔕 <b>Unsubscribed.</b> No more scheduled updates.\n\nUse /subscribe to turn back on."
}

pub fn open_app(configured: bool) -> &'static str {
    if configured {
        "📱 <b>Open TrendPulse</b>\n\nTap below to launch the full interactive tracker."
    } else {
        "📱 The full tracker is not available on this bot."
    }
}

pub fn alert_usage() -> &'static str {
    "⚠️ Usage: <code>/alert [keyword]</code>\nExample: <code>/alert cat</code>"
}

pub fn removealert_usage() -> &'static str {
    "⚠️ Usage: <code>/removealert [keyword]</code>"
}

fn code_list(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| format!("<code>{}</code>", escape(k)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn alert_added(keyword: &str, active: &[String]) -> String {
    format!(
        "🔔 Alert set for <b>\"{}\"</b>!\n\nI'll notify you whenever a trend matches this keyword.\n\nYour active alerts: {}",
        escape(keyword),
        code_list(active)
    )
}

pub fn alert_exists(keyword: &str, active: &[String]) -> String {
    format!(
        "🔔 You already have an alert for <b>\"{}\"</b>.\n\nYour active alerts: {}",
        escape(keyword),
        code_list(active)
    )
}

pub fn alert_catalog_matches(keyword: &str, matches: &[&CatalogEntry]) -> String {
    let lines: Vec<_> = matches
        .iter()
        .map(|e| format!("{} {} — 🔥 {}", e.emoji, escape(e.title), e.heat))
        .collect();
    format!(
        "✅ <b>{} existing trend(s) match \"{}\":</b>\n\n{}",
        matches.len(),
        escape(keyword),
        lines.join("\n")
    )
}

pub fn alert_removed(keyword: &str) -> String {
    format!("✅ Alert for <b>\"{}\"</b> removed.", escape(keyword))
}

pub fn alert_not_found(keyword: &str) -> String {
    format!("⚠️ No alert found for <b>\"{}\"</b>.", escape(keyword))
}

pub fn my_alerts(keywords: &[String]) -> String {
    if keywords.is_empty() {
        return "🔔 <b>Your Alerts</b>\n\nYou have no alerts set.\n\n\
                Use <code>/alert [keyword]</code> to set one.\nExample: <code>/alert cat</code>"
            .to_string();
    }
    let lines: Vec<_> = keywords
        .iter()
        .enumerate()
        .map(|(i, k)| format!("{}. <code>{}</code>", i + 1, escape(k)))
        .collect();
    format!(
        "🔔 <b>Your Active Alerts</b>\n\n{}\n\nUse <code>/removealert [keyword]</code> to remove one.",
        lines.join("\n")
    )
}

pub fn fetching(what: &str) -> String {
    format!("⏳ Fetching {what}...")
}

pub fn google_trends(trends: &[Trend], geo: &str, now: DateTime<Utc>) -> String {
    let mut msg = format!("📈 <b>GOOGLE TRENDS — Trending in {}</b>\n\n", escape(geo));
    for (i, t) in trends.iter().enumerate() {
        msg.push_str(&format!(
            "<b>{}. {}</b>\n🔍 {} searches\n",
            i + 1,
            escape(&t.title),
            escape(&t.traffic)
        ));
        if let (Some(title), Some(url)) = (&t.news_title, &t.news_url) {
            msg.push_str(&format!("📰 <a href=\"{}\">{}</a>\n", escape(url), escape(title)));
        }
        msg.push('\n');
    }
    msg.push_str(&format!(
        "<i>Updated: {}</i>",
        now.format("%a, %d %b %Y %H:%M:%S GMT")
    ));
    msg
}

pub fn reddit_header() -> &'static str {
    "🎵 <b>TIKTOK TRENDS — Hot on Reddit</b>\n\nSending top posts with links 👇"
}

pub fn reddit_post(post: &Post) -> String {
    let mut caption = format!(
        "🔥 <b>{}</b>\n\n📊 {} upvotes • r/{}\n🔗 <a href=\"{}\">View on Reddit</a>",
        escape(&post.title),
        thousands(post.score),
        escape(&post.subreddit),
        escape(&post.url)
    );
    if let Some(external) = post.external_url.as_deref().filter(|u| *u != post.url) {
        caption.push_str(&format!("\n🎬 <a href=\"{}\">View Content</a>", escape(external)));
    }
    caption
}

pub fn hackernews(stories: &[Story]) -> String {
    let mut msg = String::from("🟧 <b>HACKER NEWS — Front Page</b>\n\n");
    for (i, s) in stories.iter().enumerate() {
        let link = s.url.clone().unwrap_or_else(|| s.comments_url());
        msg.push_str(&format!(
            "<b>{}.</b> <a href=\"{}\">{}</a>\n⬆️ {} points • 💬 <a href=\"{}\">{} comments</a> • by {}\n\n",
            i + 1,
            escape(&link),
            escape(&s.title),
            thousands(s.score),
            escape(&s.comments_url()),
            thousands(s.comments),
            escape(&s.by)
        ));
    }
    msg.trim_end().to_string()
}

pub fn hot_catalog(entries: &[&CatalogEntry]) -> String {
    let lines: Vec<_> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "<b>{}.</b> {} {} — 🔥 {} | 👁 {}{}",
                i + 1,
                e.emoji,
                escape(e.title),
                e.heat,
                e.views,
                if e.rising { " 📈" } else { "" }
            )
        })
        .collect();
    format!("🔥 <b>TOP {} HOTTEST TRENDS RIGHT NOW</b>\n\n{}", entries.len(), lines.join("\n"))
}

pub fn rising(entries: &[&CatalogEntry]) -> String {
    let blocks: Vec<_> = entries
        .iter()
        .map(|e| {
            format!(
                "{} <b>{}</b> [{}]\n🔥 Heat: {} | 👁 {}\n{}",
                e.emoji,
                escape(e.title),
                e.category.as_str(),
                e.heat,
                e.views,
                e.tags.iter().take(2).copied().collect::<Vec<_>>().join(" ")
            )
        })
        .collect();
    format!("🚀 <b>RISING FAST — Watch These Now</b>\n\n{}", blocks.join("\n\n"))
}

/// Full card for one catalog entry.
pub fn catalog_entry(e: &CatalogEntry) -> String {
    format!(
        "{} <b>{}</b>\n\
         📂 Category: <code>{}</code>\n\
         🔥 Heat: <b>{}/100</b>\n\
         👁 Views: <b>{}</b>  ❤️ Likes: <b>{}</b>  🔁 Shares: <b>{}</b>\n\
         📝 {}\n\
         🏷 {}",
        e.emoji,
        escape(e.title),
        e.category.as_str(),
        e.heat,
        e.views,
        e.likes,
        e.shares,
        escape(e.description),
        e.tags.join("  ")
    )
}

pub fn category(category: Category, entries: &[&CatalogEntry]) -> String {
    let cards: Vec<_> = entries.iter().map(|e| catalog_entry(e)).collect();
    format!(
        "📂 <b>TOP {} TRENDS</b>\n\n{}",
        category.as_str().to_uppercase(),
        cards.join("\n\n─────────────────\n\n")
    )
}

pub fn digest_header() -> &'static str {
    "🔄 <b>Fetching live trends...</b>"
}

pub fn source_unavailable(source: &str) -> String {
    format!("⚠️ {source} unavailable right now.")
}

pub fn digest_footer(interval_secs: u64) -> String {
    format!(
        "✅ <b>Done!</b> Next auto-update in <b>{}</b>\n💡 Tap <b>{}</b> anytime for a fresh update",
        every(interval_secs),
        BTN_LIVE
    )
}

pub fn alert_google(keyword: &str, trend: &Trend) -> String {
    let mut msg = format!(
        "🔔 <b>ALERT: \"{}\" is trending on Google!</b>\n\n<b>{}</b> — {} searches",
        escape(keyword),
        escape(&trend.title),
        escape(&trend.traffic)
    );
    if let Some(url) = &trend.news_url {
        let title = trend.news_title.as_deref().unwrap_or(url);
        msg.push_str(&format!("\n📰 <a href=\"{}\">{}</a>", escape(url), escape(title)));
    }
    msg
}

pub fn alert_reddit(keyword: &str, post: &Post) -> String {
    format!(
        "🔔 <b>ALERT: \"{}\" trending on Reddit!</b>\n\n<b>{}</b>\n📊 {} upvotes\n🔗 <a href=\"{}\">View Post</a>",
        escape(keyword),
        escape(&post.title),
        thousands(post.score),
        escape(&post.url)
    )
}

pub fn alert_hackernews(keyword: &str, story: &Story) -> String {
    format!(
        "🔔 <b>ALERT: \"{}\" is on Hacker News!</b>\n\n<b>{}</b>\n⬆️ {} points\n💬 <a href=\"{}\">Discussion</a>",
        escape(keyword),
        escape(&story.title),
        thousands(story.score),
        escape(&story.comments_url())
    )
}

pub fn alert_catalog(entry: &CatalogEntry) -> String {
    format!(
        "🔔 <b>TREND ALERT MATCH!</b>\n\n{}\n\n<i>This matched one of your keywords.</i>",
        catalog_entry(entry)
    )
}
