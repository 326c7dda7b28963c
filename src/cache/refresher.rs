use rand::Rng;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::MatchCache;

/// Keeps the snapshot warm so pollers rarely wait on the upstream.
///
/// Each tick goes through the same coalesced path as expired reads, so a
/// tick that lands during a reader-triggered fetch just joins it. Failures
/// are logged; the loop keeps going.
pub fn spawn_refresher(cache: MatchCache, interval: Duration) -> JoinHandle<()> {
    let max_jitter_ms = (interval.as_millis() / 10) as u64;

    tokio::spawn(async move {
        info!("Background refresher started (interval={:?})", interval);
        loop {
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter_ms));
            tokio::time::sleep(interval + jitter).await;

            match cache.background_refresh().await {
                Ok(status) => debug!("Background refresh: {}", status),
                Err(e) => warn!("Background refresh failed: {}", e),
            }
        }
    })
}
