use thiserror::Error;

/// Why a candidate payload was rejected by the shape check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payload is not a JSON array")]
    NotAnArray,

    #[error("element {index}: {reason}")]
    BadElement { index: usize, reason: String },

    #[error("element {index} could not be decoded: {message}")]
    Decode { index: usize, message: String },
}

/// Failure to obtain a usable payload from the upstream provider.
///
/// `Clone` because a single coalesced fetch hands the same outcome to every
/// reader that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out: {url}")]
    Timeout { url: String },

    #[error("upstream unreachable: {url} - {message}")]
    Connection { url: String, message: String },

    #[error("upstream returned HTTP {status}: {url}")]
    Status { status: u16, url: String },

    #[error("upstream returned malformed JSON: {message} (URL: {url})")]
    MalformedJson { url: String, message: String },

    #[error("upstream payload failed validation: {0}")]
    Invalid(#[from] ValidationError),
}

impl UpstreamError {
    /// Short machine-readable label for the downstream error body.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Invalid(_) => "ValidationError",
            _ => "TransportError",
        }
    }

    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            UpstreamError::MalformedJson {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            UpstreamError::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Operation-level error returned by the cache.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Upstream failed and there was no snapshot to fall back to (read), or
    /// the failure is surfaced by design (force refresh).
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Caller-supplied data was rejected by a manual override.
    #[error("bad input: {0}")]
    BadInput(String),
}

impl CacheError {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Upstream(e) => e.kind(),
            CacheError::BadInput(_) => "BadInput",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let timeout = UpstreamError::Timeout {
            url: "http://x".into(),
        };
        assert_eq!(timeout.kind(), "TransportError");

        let invalid = UpstreamError::from(ValidationError::NotAnArray);
        assert_eq!(invalid.kind(), "ValidationError");
        assert_eq!(CacheError::from(invalid).kind(), "ValidationError");
        assert_eq!(CacheError::BadInput("empty".into()).kind(), "BadInput");
    }

    #[test]
    fn test_error_messages() {
        let err = UpstreamError::Status {
            status: 503,
            url: "http://odds/cricket/matches".into(),
        };
        assert_eq!(
            err.to_string(),
            "upstream returned HTTP 503: http://odds/cricket/matches"
        );
        let bad = ValidationError::BadElement {
            index: 2,
            reason: "missing string matchId".into(),
        };
        assert_eq!(bad.to_string(), "element 2: missing string matchId");
    }
}
