//! Error types for the downloader module.

use thiserror::Error;

/// Classified download failure.
///
/// The classification is what drives candidate lifecycle policy:
/// - `Network` retries on the next scheduled run, without bound;
/// - `Http` retries up to the configured attempt bound, then Broken;
/// - `Content` marks the candidate Broken immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout, or interrupted transfer.
    #[error("network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success HTTP status.
    #[error("http status {status}")]
    Http { status: u16 },

    /// The response is not a usable video payload.
    #[error("invalid content: {0}")]
    Content(String),
}

impl FetchError {
    /// Short label for the failure kind, used in reasons and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Http { .. } => "http",
            FetchError::Content(_) => "content",
        }
    }

    /// Failure reason string as persisted on the candidate record.
    pub fn reason(&self) -> String {
        match self {
            FetchError::Network(msg) => format!("NetworkError:{}", msg),
            FetchError::Http { status } => format!("HttpError:{}", status),
            FetchError::Content(msg) => format!("ContentError:{}", msg),
        }
    }

    /// True when no amount of retrying can help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, FetchError::Content(_))
    }
}

/// Media probe failure.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to spawn probe: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("probe exited with failure: {0}")]
    Failed(String),

    #[error("failed to parse probe output: {0}")]
    Parse(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("probe timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_format() {
        assert_eq!(FetchError::Http { status: 404 }.reason(), "HttpError:404");
        assert_eq!(
            FetchError::Network("timeout".to_string()).reason(),
            "NetworkError:timeout"
        );
        assert_eq!(
            FetchError::Content("empty body".to_string()).reason(),
            "ContentError:empty body"
        );
    }

    #[test]
    fn test_permanence() {
        assert!(FetchError::Content("x".into()).is_permanent());
        assert!(!FetchError::Network("x".into()).is_permanent());
        assert!(!FetchError::Http { status: 500 }.is_permanent());
    }
}
