use std::sync::LazyLock;

use regex::Regex;

use super::{decode_entities, merge_unique, FeedClient, FeedItem, FetchError};
use crate::config::GoogleTrendsConfig;

static ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item>(.*?)</item>").expect("Invalid item regex"));

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<title>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</title>").expect("Invalid title regex")
});

static TRAFFIC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<ht:approx_traffic>(.*?)</ht:approx_traffic>").expect("Invalid traffic regex")
});

static NEWS_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<ht:news_item_title>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</ht:news_item_title>")
        .expect("Invalid news title regex")
});

static NEWS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<ht:news_item_url>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</ht:news_item_url>")
        .expect("Invalid news url regex")
});

static PICTURE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ht:picture>(.*?)</ht:picture>").expect("Invalid picture regex"));

/// One trending search.
#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub title: String,
    /// Approximate search volume as published, e.g. `200K+`.
    pub traffic: String,
    pub news_title: Option<String>,
    pub news_url: Option<String>,
    pub picture: Option<String>,
}

impl FeedItem for Trend {
    fn title(&self) -> &str {
        &self.title
    }

    fn popularity(&self) -> i64 {
        parse_traffic(&self.traffic)
    }
}

/// `"200K+"` -> 200_000, `"2M+"` -> 2_000_000, anything else -> 0.
/// Saturates at `i64::MAX`.
fn parse_traffic(raw: &str) -> i64 {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('+')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let (digits, multiplier) = match cleaned.chars().last() {
        Some('K') | Some('k') => (&cleaned[..cleaned.len() - 1], 1_000),
        Some('M') | Some('m') => (&cleaned[..cleaned.len() - 1], 1_000_000),
        _ => (cleaned.as_str(), 1),
    };
    digits
        .parse::<i64>()
        .map(|n| n.saturating_mul(multiplier))
        .unwrap_or(0)
}

fn capture(regex: &Regex, block: &str) -> Option<String> {
    regex
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|s| !s.is_empty())
}

/// Extract trends from the daily trends RSS document, ranked by traffic
/// with repeated titles dropped.
pub fn parse(body: &str, cap: usize) -> Result<Vec<Trend>, FetchError> {
    if !body.contains("<rss") && !body.contains("<channel") {
        return Err(FetchError::Parse("not an RSS document".into()));
    }

    let trends: Vec<Trend> = ITEM_REGEX
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .filter_map(|block| {
            let block = block.as_str();
            Some(Trend {
                title: capture(&TITLE_REGEX, block)?,
                traffic: capture(&TRAFFIC_REGEX, block).unwrap_or_else(|| "N/A".to_string()),
                news_title: capture(&NEWS_TITLE_REGEX, block),
                news_url: capture(&NEWS_URL_REGEX, block),
                picture: capture(&PICTURE_REGEX, block),
            })
        })
        .collect();
    Ok(merge_unique([trends], cap))
}

pub async fn fetch(client: &FeedClient, config: &GoogleTrendsConfig) -> Result<Vec<Trend>, FetchError> {
    let body = client
        .get_text(&config.url, &[("geo", config.geo.clone())])
        .await?;
    parse(&body, config.max_items)
}
