use futures::future::join_all;
use serde::Deserialize;
use tracing::debug;

use super::{merge_unique, FeedClient, FeedItem, FetchError};
use crate::config::HackerNewsConfig;

/// One front-page story.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub score: i64,
    /// Article link; `None` for Ask/Show posts without one.
    pub url: Option<String>,
    pub by: String,
    pub comments: i64,
}

impl Story {
    pub fn comments_url(&self) -> String {
        format!("https://news.ycombinator.com/item?id={}", self.id)
    }
}

impl FeedItem for Story {
    fn title(&self) -> &str {
        &self.title
    }

    fn popularity(&self) -> i64 {
        self.score
    }
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: u64,
    #[serde(rename = "type", default)]
    kind: String,
    title: Option<String>,
    #[serde(default)]
    score: i64,
    url: Option<String>,
    #[serde(default)]
    by: String,
    #[serde(default)]
    descendants: i64,
    #[serde(default)]
    dead: bool,
    #[serde(default)]
    deleted: bool,
}

impl RawItem {
    fn into_story(self, min_score: i64) -> Option<Story> {
        if self.kind != "story" || self.dead || self.deleted || self.score < min_score {
            return None;
        }
        Some(Story {
            id: self.id,
            title: self.title.filter(|t| !t.is_empty())?,
            score: self.score,
            url: self.url,
            by: self.by,
            comments: self.descendants,
        })
    }
}

/// Keep live stories above `min_score`, best first.
pub fn parse_items(bodies: &[String], min_score: i64, cap: usize) -> Vec<Story> {
    let stories = bodies
        .iter()
        .filter_map(|body| serde_json::from_str::<Option<RawItem>>(body).ok().flatten())
        .filter_map(|item| item.into_story(min_score))
        .collect();
    merge_unique([stories], cap)
}

pub async fn fetch(
    client: &FeedClient,
    config: &HackerNewsConfig,
) -> Result<Vec<Story>, FetchError> {
    let base = config.base_url.trim_end_matches('/');
    let ids: Vec<u64> = client
        .get_json(&format!("{base}/topstories.json"), &[])
        .await?;

    let lookups = ids.iter().take(config.scan_depth).map(|id| {
        let url = format!("{base}/item/{id}.json");
        async move {
            match client.get_text(&url, &[]).await {
                Ok(body) => Some(body),
                Err(e) => {
                    debug!("Skipping story {}: {}", id, e);
                    None
                }
            }
        }
    });
    let bodies: Vec<String> = join_all(lookups).await.into_iter().flatten().collect();

    Ok(parse_items(&bodies, config.min_score, config.max_items))
}
