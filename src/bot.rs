use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::feeds::FeedClient;
use crate::platform::Transport;
use crate::store::Registry;

/// Shared application state, owned jointly by the poll loop and the
/// broadcast timer.
pub struct AppState {
    pub config: Config,
    pub transport: Arc<dyn Transport>,
    pub feeds: FeedClient,
    pub registry: Registry,
    broadcast: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let feeds = FeedClient::new(&config.feeds)?;
        Ok(Self {
            config,
            transport,
            feeds,
            registry: Registry::new(),
            broadcast: Mutex::new(()),
        })
    }

    pub fn webapp_url(&self) -> Option<&str> {
        self.config.webapp_url()
    }

    /// Claim the broadcast slot; `None` while another pass holds it.
    pub fn try_begin_broadcast(&self) -> Option<MutexGuard<'_, ()>> {
        self.broadcast.try_lock().ok()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::platform::testing::RecordingTransport;

    /// State with every live feed off, the catalog on and no pacing delays.
    pub fn state() -> (Arc<AppState>, Arc<RecordingTransport>) {
        let mut config = Config::default();
        config.telegram.bot_token = "test-token".into();
        config.telegram.retry_delay_secs = 0;
        config.broadcast.chat_pacing_ms = 0;
        config.broadcast.item_pacing_ms = 0;
        config.broadcast.section_pacing_ms = 0;
        config.feeds.google_trends.enabled = false;
        config.feeds.reddit.enabled = false;
        config.feeds.hackernews.enabled = false;
        config.feeds.catalog.enabled = true;
        with_config(config)
    }

    pub fn with_config(config: Config) -> (Arc<AppState>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let state = AppState::new(config, transport.clone()).unwrap();
        (Arc::new(state), transport)
    }
}
