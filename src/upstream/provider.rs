use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;

/// Trait that every upstream match feed must implement.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Fetch the current match listing as a raw JSON document.
    ///
    /// Shape validation is left to the cache so upstream and manual
    /// payloads go through the same rules.
    async fn fetch_matches(&self) -> Result<Value, UpstreamError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
