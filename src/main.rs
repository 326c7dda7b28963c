use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod api;
mod cache;
mod config;
mod error;
mod models;
mod upstream;

use api::AppState;
use cache::{spawn_refresher, MatchCache};
use config::Config;
use upstream::{HttpMatchSource, MatchSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let source = HttpMatchSource::new(&config.upstream_url, config.upstream_timeout())?;
    info!(
        "Upstream '{}': {} (timeout={:?})",
        source.name(),
        source.url(),
        config.upstream_timeout()
    );

    let cache = MatchCache::new(Arc::new(source), config.cache_duration());
    info!("Match cache ready (freshness window={:?})", cache.window());

    match config.refresh_interval() {
        Some(interval) => {
            spawn_refresher(cache.clone(), interval);
        }
        None => info!("Background refresher disabled; refreshing on expired reads only"),
    }

    let app = api::router(AppState { cache });
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
