//! Liveness endpoint for hosting platforms.

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

const BODY: &str = "TrendPulse Live ✅";

/// Answers 200 with a fixed body on every path.
pub fn router() -> Router {
    Router::new().fallback(|| async { BODY })
}

/// Serve the liveness endpoint until `stop` flips.
pub async fn serve(port: u16, mut stop: watch::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind liveness port {}", port))?;
    info!("Liveness endpoint listening on port {}", port);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            let _ = stop.wait_for(|stopped| *stopped).await;
        })
        .await
        .context("Liveness server failed")
}
