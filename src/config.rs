use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Caching proxy for live cricket match odds
#[derive(Parser, Debug, Clone)]
#[command(name = "live-match-cache", version, about)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Base URL of the upstream odds API
    #[arg(long, env = "UPSTREAM_API_URL", default_value = "http://localhost:9000")]
    pub upstream_url: String,

    /// How long a snapshot is served before upstream is consulted again (seconds)
    #[arg(long, env = "CACHE_DURATION_SECS", default_value = "300")]
    pub cache_duration_secs: u64,

    /// Upstream request timeout (seconds)
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "10")]
    pub upstream_timeout_secs: u64,

    /// Background refresh interval in seconds (0 disables the refresher)
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "0")]
    pub refresh_interval_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = url::Url::parse(&self.upstream_url)
            .map_err(|e| anyhow::anyhow!("upstream_url is not a valid URL: {}", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("upstream_url must use http or https, got '{}'", url.scheme());
        }
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("listen_addr '{}' is not a socket address", self.listen_addr);
        }
        if self.cache_duration_secs == 0 {
            anyhow::bail!("cache_duration_secs must be positive");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("upstream_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.cache_duration_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}
