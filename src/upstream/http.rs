use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::provider::MatchSource;
use crate::error::UpstreamError;

/// Match-listing path on the odds provider.
pub const MATCHES_PATH: &str = "/cricket/matches";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Upstream feed backed by the third-party odds REST API.
pub struct HttpMatchSource {
    http: Client,
    url: String,
}

impl HttpMatchSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpMatchSource {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), MATCHES_PATH),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MatchSource for HttpMatchSource {
    fn name(&self) -> &str {
        "odds-api"
    }

    async fn fetch_matches(&self) -> Result<Value, UpstreamError> {
        debug!("Fetching matches from {}", self.url);

        let resp = self
            .http
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&self.url, e))?;

        if !resp.status().is_success() {
            return Err(UpstreamError::Status {
                status: resp.status().as_u16(),
                url: self.url.clone(),
            });
        }

        // Body decode failures surface as MalformedJson via `from_reqwest`.
        resp.json::<Value>()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&self.url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn source(server: &MockServer) -> HttpMatchSource {
        HttpMatchSource::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let s = HttpMatchSource::new("http://odds.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(s.url(), "http://odds.local/cricket/matches");
    }

    #[tokio::test]
    async fn test_fetch_returns_json_body() {
        let server = MockServer::start().await;
        let body = json!([{
            "matchId": "a",
            "status": "Live",
            "home": { "id": "h" },
            "away": { "id": "w" },
        }]);
        Mock::given(method("GET"))
            .and(path(MATCHES_PATH))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let value = source(&server).fetch_matches().await.unwrap();
        assert_eq!(value, body);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MATCHES_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source(&server).fetch_matches().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 503, .. }));
        assert_eq!(err.kind(), "TransportError");
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MATCHES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = source(&server).fetch_matches().await.unwrap_err();
        assert!(matches!(err, UpstreamError::MalformedJson { .. }));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MATCHES_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let s = HttpMatchSource::new(&server.uri(), Duration::from_millis(100)).unwrap();
        let err = s.fetch_matches().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_connection_error() {
        // Nothing listens on port 9 of localhost in the test environment.
        let s = HttpMatchSource::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = s.fetch_matches().await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::Connection { .. } | UpstreamError::Timeout { .. }
        ));
    }
}
