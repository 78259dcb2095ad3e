use serde::Deserialize;
use tracing::warn;

use super::{decode_entities, merge_unique, FeedClient, FeedItem, FetchError};
use crate::config::RedditConfig;

/// One hot post from a subreddit.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    /// Link to the comments page on reddit.
    pub url: String,
    pub score: i64,
    pub preview: Option<String>,
    pub thumbnail: Option<String>,
    /// Link target of the post, if it points somewhere else.
    pub external_url: Option<String>,
    pub subreddit: String,
}

impl Post {
    /// Best image to attach: full preview first, thumbnail second.
    pub fn image(&self) -> Option<&str> {
        self.preview.as_deref().or(self.thumbnail.as_deref())
    }
}

impl FeedItem for Post {
    fn title(&self) -> &str {
        &self.title
    }

    fn popularity(&self) -> i64 {
        self.score
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    title: String,
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    stickied: bool,
    preview: Option<Preview>,
    thumbnail: Option<String>,
    url: Option<String>,
    #[serde(default)]
    subreddit: String,
}

#[derive(Debug, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

#[derive(Debug, Deserialize)]
struct PreviewImage {
    source: ImageSource,
}

#[derive(Debug, Deserialize)]
struct ImageSource {
    url: String,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        let url = format!("https://reddit.com{}", raw.permalink);
        let preview = raw
            .preview
            .and_then(|p| p.images.into_iter().next())
            .map(|img| decode_entities(&img.source.url));
        let thumbnail = raw.thumbnail.filter(|t| t.starts_with("http"));
        let external_url = raw.url.filter(|u| !u.is_empty());
        Post {
            title: raw.title,
            url,
            score: raw.score,
            preview,
            thumbnail,
            external_url,
            subreddit: raw.subreddit,
        }
    }
}

/// Parse a `hot.json` listing, dropping stickied posts.
pub fn parse(body: &str) -> Result<Vec<Post>, FetchError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(listing
        .data
        .children
        .into_iter()
        .map(|c| c.data)
        .filter(|p| !p.stickied)
        .map(Post::from)
        .collect())
}

pub async fn fetch_subreddit(
    client: &FeedClient,
    config: &RedditConfig,
    subreddit: &str,
) -> Result<Vec<Post>, FetchError> {
    let url = format!(
        "{}/r/{}/hot.json",
        config.base_url.trim_end_matches('/'),
        subreddit
    );
    let body = client
        .get_text(&url, &[("limit", config.per_subreddit.to_string())])
        .await?;
    parse(&body)
}

/// Fetch every configured subreddit in turn and merge the results.
///
/// A failing subreddit is skipped; the fetch only fails when all of them do.
pub async fn fetch(client: &FeedClient, config: &RedditConfig) -> Result<Vec<Post>, FetchError> {
    let mut batches = Vec::new();
    let mut first_error = None;

    for subreddit in &config.subreddits {
        match fetch_subreddit(client, config, subreddit).await {
            Ok(posts) => batches.push(posts),
            Err(e) => {
                warn!(subreddit = %subreddit, error = %e, "Subreddit fetch failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if batches.is_empty() => Err(e),
        _ => Ok(merge_unique(batches, config.max_items)),
    }
}
