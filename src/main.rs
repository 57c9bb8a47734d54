//! quakeml-watch — polls a QuakeML feed and logs entity changes.
//!
//! Config comes from `$QUAKEML_CONFIG_PATH` or `config/quakeml.{toml,json}`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quakeml_feed::config::load_config_default;
use quakeml_feed::scheduler::spawn_polling;
use quakeml_feed::{EntityHandler, FeedManager, QuakeMlFeed, ReqwestTransport, StatusUpdate};

struct LoggingHandler;

#[async_trait]
impl EntityHandler for LoggingHandler {
    async fn create(&self, external_id: &str) {
        tracing::info!(target: "entities", %external_id, "created");
    }
    async fn update(&self, external_id: &str) {
        tracing::debug!(target: "entities", %external_id, "updated");
    }
    async fn remove(&self, external_id: &str) {
        tracing::info!(target: "entities", %external_id, "removed");
    }
    async fn status(&self, status: &StatusUpdate) {
        tracing::info!(
            target: "entities",
            status = %status.status,
            total = status.total,
            last_timestamp = ?status.last_timestamp,
            "status"
        );
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quakeml_feed=info,quakeml_watch=info,entities=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default()?;
    let transport = Arc::new(ReqwestTransport::new());
    let feed = QuakeMlFeed::from_config(transport, &cfg);
    tracing::info!(%feed, interval_secs = cfg.poll_interval_secs, "starting feed watcher");

    let manager = FeedManager::new(feed, Box::new(LoggingHandler));
    let poller = spawn_polling(manager, Duration::from_secs(cfg.poll_interval_secs.max(1)));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    poller.abort();
    Ok(())
}
