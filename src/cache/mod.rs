//! In-memory live-match cache in front of the upstream odds feed.
//!
//! Pollers hit this cache every few seconds; the upstream is only contacted
//! once the snapshot is older than the freshness window. A snapshot is an
//! immutable value swapped behind a lock, so readers always see `data` and
//! its timestamp from the same generation.
//!
//! Upstream degradation never erases good data: transport failures and
//! malformed payloads fall back to the last snapshot, and an empty listing
//! is treated as a glitch rather than "no matches".

pub mod diff;
pub mod refresher;
pub mod validation;

pub use refresher::spawn_refresher;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{CacheError, UpstreamError};
use crate::models::Match;
use crate::upstream::MatchSource;
use diff::same_matches;
use validation::validate_matches;

/// How a response was produced. Advisory only; exposed as `X-Cache-Status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheStatus {
    /// Served from a fresh snapshot
    Hit,
    /// First snapshot created from upstream
    Miss,
    /// Upstream data differed; snapshot replaced
    Updated,
    /// Upstream data identical; only the timestamp moved
    RefreshedTimestamp,
    /// Upstream failed; served the previous snapshot
    Fallback,
    /// Upstream returned `[]`; served the previous snapshot
    StaleEmptyUpstream,
    /// Upstream returned `[]` and nothing is cached
    EmptyUpstream,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Updated => "UPDATED",
            CacheStatus::RefreshedTimestamp => "REFRESHED_TIMESTAMP",
            CacheStatus::Fallback => "FALLBACK",
            CacheStatus::StaleEmptyUpstream => "STALE_EMPTY_UPSTREAM",
            CacheStatus::EmptyUpstream => "EMPTY_UPSTREAM",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted generation of match data.
#[derive(Debug)]
pub struct Snapshot {
    pub data: Arc<Vec<Match>>,
    /// Monotonic acceptance time, drives expiry
    fetched_at: Instant,
    /// Wall-clock acceptance time, for reporting
    pub accepted_at: DateTime<Utc>,
}

impl Snapshot {
    fn new(data: Arc<Vec<Match>>) -> Self {
        Snapshot {
            data,
            fetched_at: Instant::now(),
            accepted_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

/// Result of a `read()`.
#[derive(Debug, Clone)]
pub struct CacheRead {
    pub data: Arc<Vec<Match>>,
    pub status: CacheStatus,
    pub age: Duration,
    /// Time left before the served snapshot expires (zero once stale)
    pub remaining: Duration,
}

impl CacheRead {
    fn from_snapshot(snapshot: &Snapshot, status: CacheStatus, window: Duration) -> Self {
        let age = snapshot.age();
        CacheRead {
            data: Arc::clone(&snapshot.data),
            status,
            age,
            remaining: window.saturating_sub(age),
        }
    }

    fn empty(status: CacheStatus) -> Self {
        CacheRead {
            data: Arc::new(Vec::new()),
            status,
            age: Duration::ZERO,
            remaining: Duration::ZERO,
        }
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }
}

/// Result of a `force_refresh()`.
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub status: CacheStatus,
    pub old_count: usize,
    pub new_count: usize,
    /// Age of the snapshot that was current before the refresh
    pub old_age: Option<Duration>,
    pub data: Arc<Vec<Match>>,
    pub timestamp: DateTime<Utc>,
}

/// Result of a `manual_set()`.
#[derive(Debug, Clone)]
pub struct ManualSetSummary {
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time view of the cache for monitoring; never touches upstream.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub has_data: bool,
    pub count: usize,
    /// Matches currently in play
    pub live: usize,
    pub age_seconds: Option<u64>,
    pub remaining_seconds: u64,
    pub fresh: bool,
    pub cache_duration_seconds: u64,
    pub accepted_at: Option<DateTime<Utc>>,
}

/// Outcome of applying one upstream fetch to the store.
#[derive(Debug, Clone)]
enum Refreshed {
    Stored {
        status: CacheStatus,
        snapshot: Arc<Snapshot>,
    },
    Empty,
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Refreshed, UpstreamError>>>;

/// Thread-safe live-match cache. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct MatchCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    source: Arc<dyn MatchSource>,
    window: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    /// Read-triggered refresh currently talking to upstream, if any
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl MatchCache {
    pub fn new(source: Arc<dyn MatchSource>, window: Duration) -> Self {
        MatchCache {
            inner: Arc::new(CacheInner {
                source,
                window,
                snapshot: RwLock::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    async fn current(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.read().await.clone()
    }

    /// Serve match data, refreshing from upstream once the snapshot expires.
    ///
    /// Only fails when upstream is unusable and nothing has ever been cached.
    pub async fn read(&self) -> Result<CacheRead, CacheError> {
        let window = self.inner.window;

        if let Some(snapshot) = self.current().await {
            if snapshot.age() < window {
                debug!(
                    "Cache HIT: {} matches, age={:?}",
                    snapshot.data.len(),
                    snapshot.age()
                );
                return Ok(CacheRead::from_snapshot(&snapshot, CacheStatus::Hit, window));
            }
        }

        match self.refresh_coalesced().await {
            Ok(Refreshed::Stored { status, snapshot }) => {
                Ok(CacheRead::from_snapshot(&snapshot, status, window))
            }
            Ok(Refreshed::Empty) => match self.current().await {
                Some(snapshot) => Ok(CacheRead::from_snapshot(
                    &snapshot,
                    CacheStatus::StaleEmptyUpstream,
                    window,
                )),
                None => Ok(CacheRead::empty(CacheStatus::EmptyUpstream)),
            },
            Err(e) => match self.current().await {
                Some(snapshot) => {
                    warn!(
                        "Serving FALLBACK snapshot ({} matches, age={:?}): {}",
                        snapshot.data.len(),
                        snapshot.age(),
                        e
                    );
                    Ok(CacheRead::from_snapshot(
                        &snapshot,
                        CacheStatus::Fallback,
                        window,
                    ))
                }
                None => Err(CacheError::Upstream(e)),
            },
        }
    }

    /// Fetch from upstream now, regardless of freshness.
    ///
    /// Unlike `read()`, failures are returned to the caller. The existing
    /// snapshot is left untouched in that case.
    pub async fn force_refresh(&self) -> Result<RefreshSummary, CacheError> {
        let previous = self.current().await;
        let old_count = previous.as_ref().map_or(0, |s| s.data.len());
        let old_age = previous.as_ref().map(|s| s.age());

        info!(
            "Force refresh requested (current: {} matches, age={:?})",
            old_count, old_age
        );

        let refreshed = self.refresh_now().await.map_err(|e| {
            warn!("Force refresh failed: {}", e);
            CacheError::Upstream(e)
        })?;

        let (status, data) = match refreshed {
            Refreshed::Stored { status, snapshot } => (status, Arc::clone(&snapshot.data)),
            Refreshed::Empty => match self.current().await {
                Some(snapshot) => (CacheStatus::StaleEmptyUpstream, Arc::clone(&snapshot.data)),
                None => (CacheStatus::EmptyUpstream, Arc::new(Vec::new())),
            },
        };

        Ok(RefreshSummary {
            status,
            old_count,
            new_count: data.len(),
            old_age,
            data,
            timestamp: Utc::now(),
        })
    }

    /// Overwrite the snapshot with caller-supplied data.
    ///
    /// The payload must pass the same shape check as upstream data and must
    /// not be empty. No diffing: a manual override always replaces.
    pub async fn manual_set(&self, raw: &Value) -> Result<ManualSetSummary, CacheError> {
        let matches = validate_matches(raw).map_err(|e| {
            warn!("Manual override rejected: {}", e);
            CacheError::BadInput(e.to_string())
        })?;
        if matches.is_empty() {
            warn!("Manual override rejected: empty match list");
            return Err(CacheError::BadInput("match list must not be empty".into()));
        }

        let snapshot = Arc::new(Snapshot::new(Arc::new(matches)));
        let summary = ManualSetSummary {
            count: snapshot.data.len(),
            timestamp: snapshot.accepted_at,
        };
        *self.inner.snapshot.write().await = Some(snapshot);

        info!("Manual override stored {} matches", summary.count);
        Ok(summary)
    }

    /// Refresh through the shared in-flight slot and report what happened.
    /// Used by the background refresher.
    pub async fn background_refresh(&self) -> Result<CacheStatus, CacheError> {
        match self.refresh_coalesced().await? {
            Refreshed::Stored { status, .. } => Ok(status),
            Refreshed::Empty => {
                if self.current().await.is_some() {
                    Ok(CacheStatus::StaleEmptyUpstream)
                } else {
                    Ok(CacheStatus::EmptyUpstream)
                }
            }
        }
    }

    pub async fn info(&self) -> CacheInfo {
        let window = self.inner.window;
        let snapshot = self.current().await;
        let age = snapshot.as_ref().map(|s| s.age());
        CacheInfo {
            has_data: snapshot.is_some(),
            count: snapshot.as_ref().map_or(0, |s| s.data.len()),
            live: snapshot
                .as_ref()
                .map_or(0, |s| s.data.iter().filter(|m| m.is_live()).count()),
            age_seconds: age.map(|a| a.as_secs()),
            remaining_seconds: age.map_or(0, |a| window.saturating_sub(a).as_secs()),
            fresh: age.is_some_and(|a| a < window),
            cache_duration_seconds: window.as_secs(),
            accepted_at: snapshot.as_ref().map(|s| s.accepted_at),
        }
    }

    /// Join the in-flight refresh if there is one, otherwise start it.
    /// Concurrent readers of an expired cache share one upstream call.
    async fn refresh_coalesced(&self) -> Result<Refreshed, UpstreamError> {
        let fut = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(running) => {
                    debug!("Joining in-flight upstream refresh");
                    running.clone()
                }
                None => {
                    let this = self.clone();
                    let fresh = async move { this.refresh_now().await }.boxed().shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let result = fut.clone().await;

        let mut slot = self.inner.in_flight.lock().await;
        if slot.as_ref().is_some_and(|running| running.ptr_eq(&fut)) {
            *slot = None;
        }
        result
    }

    /// One upstream fetch, validated and merged into the store.
    async fn refresh_now(&self) -> Result<Refreshed, UpstreamError> {
        let source = &self.inner.source;
        let raw = source.fetch_matches().await.map_err(|e| {
            warn!("Upstream '{}' fetch failed: {}", source.name(), e);
            e
        })?;

        let matches = validate_matches(&raw).map_err(|e| {
            warn!("Upstream '{}' payload rejected: {}", source.name(), e);
            UpstreamError::Invalid(e)
        })?;

        if matches.is_empty() {
            warn!(
                "Upstream '{}' returned an empty match list; keeping existing data",
                source.name()
            );
            return Ok(Refreshed::Empty);
        }

        let mut slot = self.inner.snapshot.write().await;
        let (status, data) = match slot.as_ref() {
            None => (CacheStatus::Miss, Arc::new(matches)),
            Some(prev) if same_matches(&prev.data, &matches) => {
                (CacheStatus::RefreshedTimestamp, Arc::clone(&prev.data))
            }
            Some(_) => (CacheStatus::Updated, Arc::new(matches)),
        };
        let snapshot = Arc::new(Snapshot::new(data));
        *slot = Some(Arc::clone(&snapshot));
        drop(slot);

        match status {
            CacheStatus::RefreshedTimestamp => debug!(
                "Upstream data unchanged ({} matches); freshness renewed",
                snapshot.data.len()
            ),
            _ => info!("Cache {}: stored {} matches", status, snapshot.data.len()),
        }

        Ok(Refreshed::Stored { status, snapshot })
    }
}
