//! Read-only collectors for the trend sources.
//!
//! Each fetcher reports failures as a [`FetchError`] internally. The public
//! [`FeedClient`] methods collapse a failure to an empty list and log it, so
//! callers only ever see "items" or "nothing".

pub mod catalog;
pub mod google_trends;
pub mod hackernews;
pub mod reddit;

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FeedsConfig;

pub use catalog::CatalogEntry;
pub use google_trends::Trend;
pub use hackernews::Story;
pub use reddit::Post;

/// Why a feed produced no items.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Connection failure, timeout, or too many redirects.
    #[error("request failed: {0}")]
    Network(String),

    #[error("unexpected payload: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    GoogleTrends,
    Reddit,
    HackerNews,
    Catalog,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::GoogleTrends => write!(f, "google_trends"),
            Source::Reddit => write!(f, "reddit"),
            Source::HackerNews => write!(f, "hackernews"),
            Source::Catalog => write!(f, "catalog"),
        }
    }
}

/// Common view over the per-source item types.
pub trait FeedItem {
    fn title(&self) -> &str;

    /// Heat, score, or traffic, used to rank merged lists.
    fn popularity(&self) -> i64;

    /// Case-insensitive substring match of `keyword` against the item.
    fn matches(&self, keyword: &str) -> bool {
        self.title()
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    }
}

impl<T: FeedItem + ?Sized> FeedItem for &T {
    fn title(&self) -> &str {
        (**self).title()
    }

    fn popularity(&self) -> i64 {
        (**self).popularity()
    }

    fn matches(&self, keyword: &str) -> bool {
        (**self).matches(keyword)
    }
}

/// Merge batches in order, keep the first item for each title, then rank by
/// popularity (stable, descending) and keep at most `cap` items.
pub fn merge_unique<T: FeedItem>(batches: impl IntoIterator<Item = Vec<T>>, cap: usize) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut merged: Vec<T> = batches
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.title().to_string()))
        .collect();
    merged.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
    merged.truncate(cap);
    merged
}

/// Everything fetched for one digest or broadcast pass.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub trends: Vec<Trend>,
    pub posts: Vec<Post>,
    pub stories: Vec<Story>,
    pub catalog: Vec<&'static CatalogEntry>,
}

impl FeedSnapshot {
    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
            && self.posts.is_empty()
            && self.stories.is_empty()
            && self.catalog.is_empty()
    }
}

/// Shared HTTP client for all feed sources.
pub struct FeedClient {
    http: reqwest::Client,
    config: FeedsConfig,
}

impl FeedClient {
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .context("Failed to build feed HTTP client")?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// GET `url` and return the body of a 200 response.
    pub(crate) async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json, application/rss+xml, */*")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.text().await?),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            status => Err(FetchError::Status(status.as_u16())),
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    pub async fn google_trends(&self) -> Vec<Trend> {
        if !self.config.google_trends.enabled {
            return Vec::new();
        }
        collapse(
            Source::GoogleTrends,
            google_trends::fetch(self, &self.config.google_trends).await,
        )
    }

    pub async fn reddit(&self) -> Vec<Post> {
        if !self.config.reddit.enabled {
            return Vec::new();
        }
        collapse(Source::Reddit, reddit::fetch(self, &self.config.reddit).await)
    }

    pub async fn hackernews(&self) -> Vec<Story> {
        if !self.config.hackernews.enabled {
            return Vec::new();
        }
        collapse(
            Source::HackerNews,
            hackernews::fetch(self, &self.config.hackernews).await,
        )
    }

    pub fn catalog(&self) -> Vec<&'static CatalogEntry> {
        if !self.config.catalog.enabled {
            return Vec::new();
        }
        catalog::CATALOG.iter().collect()
    }

    /// Fetch every enabled source at once.
    pub async fn snapshot(&self) -> FeedSnapshot {
        let (trends, posts, stories) =
            tokio::join!(self.google_trends(), self.reddit(), self.hackernews());
        FeedSnapshot {
            trends,
            posts,
            stories,
            catalog: self.catalog(),
        }
    }
}

fn collapse<T>(source: Source, result: Result<Vec<T>, FetchError>) -> Vec<T> {
    match result {
        Ok(items) => {
            debug!("{} returned {} item(s)", source, items.len());
            items
        }
        Err(e) => {
            warn!(source = %source, error = %e, "Feed fetch failed");
            Vec::new()
        }
    }
}

/// Decode the handful of XML entities that show up in feed text.
pub(crate) fn decode_entities(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, i64);

    impl FeedItem for Item {
        fn title(&self) -> &str {
            self.0
        }
        fn popularity(&self) -> i64 {
            self.1
        }
    }

    #[test]
    fn test_merge_keeps_first_duplicate() {
        let merged = merge_unique(
            vec![
                vec![Item("Same title", 5), Item("Other", 1)],
                vec![Item("Same title", 900)],
            ],
            10,
        );
        assert_eq!(merged, vec![Item("Same title", 5), Item("Other", 1)]);
    }

    #[test]
    fn test_merge_sorts_then_truncates() {
        let merged = merge_unique(
            vec![
                vec![Item("a", 1), Item("b", 30)],
                vec![Item("c", 20), Item("d", 40)],
            ],
            3,
        );
        let titles: Vec<_> = merged.iter().map(|i| i.0).collect();
        assert_eq!(titles, vec!["d", "b", "c"]);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        assert!(Item("Cat Yoga Challenge", 0).matches("cat"));
        assert!(Item("cat yoga", 0).matches("YOGA"));
        assert!(!Item("Dog Outfit", 0).matches("cat"));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry &quot;live&quot;"), "Tom & Jerry \"live\"");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[tokio::test]
    async fn test_disabled_sources_are_empty() {
        let mut config = FeedsConfig::default();
        config.google_trends.enabled = false;
        config.reddit.enabled = false;
        let client = FeedClient::new(&config).unwrap();
        let snapshot = client.snapshot().await;
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_enabled_in_snapshot() {
        let mut config = FeedsConfig::default();
        config.google_trends.enabled = false;
        config.reddit.enabled = false;
        config.catalog.enabled = true;
        let client = FeedClient::new(&config).unwrap();
        let snapshot = client.snapshot().await;
        assert_eq!(snapshot.catalog.len(), catalog::CATALOG.len());
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        use axum::{response::Redirect, routing::get, Router};

        let router = Router::new().route("/loop", get(|| async { Redirect::temporary("/loop") }));
        let base = test_server::serve(router).await;
        let client = FeedClient::new(&FeedsConfig::default()).unwrap();
        let err = client
            .get_text(&format!("{base}/loop"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_slow_source_is_cut_off() {
        use axum::{routing::get, Router};
        use std::time::Instant;

        let router = Router::new().route(
            "/rss",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "<rss><channel></channel></rss>"
            }),
        );
        let base = test_server::serve(router).await;

        let mut config = FeedsConfig::default();
        config.timeout_secs = 1;
        config.google_trends.url = format!("{base}/rss");
        let client = FeedClient::new(&config).unwrap();

        let started = Instant::now();
        let err = client
            .get_text(&config.google_trends.url, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        assert!(started.elapsed() < Duration::from_millis(2500));

        let started = Instant::now();
        assert!(client.google_trends().await.is_empty());
        assert!(started.elapsed() < Duration::from_millis(2500));
    }
}
