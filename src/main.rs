mod alerts;
mod bot;
mod broadcast;
mod config;
mod dispatch;
mod feeds;
mod health;
mod platform;
mod render;
mod scheduler;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::platform::telegram::TelegramTransport;
use crate::platform::Transport;
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,trendpulse=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("trendpulse.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Broadcast interval: {}s", config.broadcast.interval_secs);
    info!("  Web app: {}", config.webapp_url().unwrap_or("(none)"));
    info!(
        "  Feeds: google_trends={} reddit={} hackernews={} catalog={}",
        config.feeds.google_trends.enabled,
        config.feeds.reddit.enabled,
        config.feeds.hackernews.enabled,
        config.feeds.catalog.enabled
    );

    let transport = Arc::new(TelegramTransport::new(
        &config.telegram.bot_token,
        config.telegram.poll_timeout_secs,
    )?);
    transport
        .delete_webhook()
        .await
        .context("Failed to delete webhook; long polling cannot start")?;
    info!("Webhook cleared, using long polling");

    let port = config.server.port;
    let state = Arc::new(AppState::new(config, transport)?);
    let (stop_tx, stop_rx) = watch::channel(false);

    let health_stop = stop_rx.clone();
    let health = tokio::spawn(async move {
        if let Err(e) = health::serve(port, health_stop).await {
            error!("{:#}", e);
        }
    });

    let mut scheduler = Scheduler::new().await?;
    scheduler.add_broadcast(state.clone()).await?;
    scheduler.start().await?;

    let poller = tokio::spawn(scheduler::poller::run(state.clone(), stop_rx));
    info!("Bot is running. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down...");

    let _ = stop_tx.send(true);
    scheduler.shutdown().await?;
    if let Err(e) = poller.await {
        error!("Poll loop ended abnormally: {}", e);
    }
    if let Err(e) = health.await {
        error!("Liveness server ended abnormally: {}", e);
    }

    Ok(())
}
