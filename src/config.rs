use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Mini app opened by the "Open Full Tracker" buttons. Buttons are
    /// omitted when this is empty.
    #[serde(default)]
    pub webapp_url: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BroadcastConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
    /// Pause between two subscribers during a broadcast.
    #[serde(default = "default_chat_pacing")]
    pub chat_pacing_ms: u64,
    /// Pause between two posts inside one digest.
    #[serde(default = "default_item_pacing")]
    pub item_pacing_ms: u64,
    /// Pause between two digest sections.
    #[serde(default = "default_section_pacing")]
    pub section_pacing_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedsConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default)]
    pub google_trends: GoogleTrendsConfig,
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub hackernews: HackerNewsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleTrendsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_google_url")]
    pub url: String,
    #[serde(default = "default_geo")]
    pub geo: String,
    #[serde(default = "default_google_cap")]
    pub max_items: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reddit_url")]
    pub base_url: String,
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,
    #[serde(default = "default_reddit_limit")]
    pub per_subreddit: usize,
    #[serde(default = "default_reddit_cap")]
    pub max_items: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HackerNewsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_hn_url")]
    pub base_url: String,
    /// How many of the top story ids are looked up per fetch.
    #[serde(default = "default_hn_scan")]
    pub scan_depth: usize,
    #[serde(default = "default_hn_min_score")]
    pub min_score: i64,
    #[serde(default = "default_hn_cap")]
    pub max_items: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Built-in sample trends, for running without live feeds.
    #[serde(default)]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_poll_timeout() -> u32 {
    30
}

fn default_retry_delay() -> u64 {
    5
}

fn default_port() -> u16 {
    3000
}

fn default_interval() -> u64 {
    60 * 60
}

fn default_startup_delay() -> u64 {
    5
}

fn default_chat_pacing() -> u64 {
    1000
}

fn default_item_pacing() -> u64 {
    800
}

fn default_section_pacing() -> u64 {
    1500
}

fn default_user_agent() -> String {
    "TrendPulseBot/1.0 (Telegram Bot)".to_string()
}

fn default_fetch_timeout() -> u64 {
    15
}

fn default_max_redirects() -> usize {
    5
}

fn default_google_url() -> String {
    "https://trends.google.com/trending/rss".to_string()
}

fn default_geo() -> String {
    "US".to_string()
}

fn default_google_cap() -> usize {
    5
}

fn default_reddit_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_subreddits() -> Vec<String> {
    ["TikTokTrends", "tiktok", "blowup", "viral"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_reddit_limit() -> usize {
    3
}

fn default_reddit_cap() -> usize {
    6
}

fn default_hn_url() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}

fn default_hn_scan() -> usize {
    30
}

fn default_hn_min_score() -> i64 {
    100
}

fn default_hn_cap() -> usize {
    5
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            webapp_url: String::new(),
            poll_timeout_secs: default_poll_timeout(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            startup_delay_secs: default_startup_delay(),
            chat_pacing_ms: default_chat_pacing(),
            item_pacing_ms: default_item_pacing(),
            section_pacing_ms: default_section_pacing(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            google_trends: GoogleTrendsConfig::default(),
            reddit: RedditConfig::default(),
            hackernews: HackerNewsConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for GoogleTrendsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_google_url(),
            geo: default_geo(),
            max_items: default_google_cap(),
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_reddit_url(),
            subreddits: default_subreddits(),
            per_subreddit: default_reddit_limit(),
            max_items: default_reddit_cap(),
        }
    }
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_hn_url(),
            scan_depth: default_hn_scan(),
            min_score: default_hn_min_score(),
            max_items: default_hn_cap(),
        }
    }
}

impl BroadcastConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

impl Config {
    /// Load the config file if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// `TOKEN`, `WEBAPP_URL` and `PORT` win over the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(url) = lookup("WEBAPP_URL") {
            self.telegram.webapp_url = url.trim().to_string();
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            anyhow::bail!("Bot token not set. Set the TOKEN environment variable or [telegram] bot_token.");
        }
        if self.broadcast.interval_secs == 0 {
            anyhow::bail!("[broadcast] interval_secs must be greater than zero");
        }
        Ok(())
    }

    /// The mini app URL, if one is configured.
    pub fn webapp_url(&self) -> Option<&str> {
        let url = self.telegram.webapp_url.as_str();
        (!url.is_empty()).then_some(url)
    }
}
