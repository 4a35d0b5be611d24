//! Error types for loading records.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a record array from a source.
///
/// Raised at the store boundary only; the engine itself never fails.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("payload from {origin} is not valid JSON: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("payload from {origin} is a JSON {found}, expected an array of records")]
    NotAnArray { origin: String, found: &'static str },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |code| FetchError::Status {
            url: "http://localhost".to_string(),
            status: code,
            body: String::new(),
        };

        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!FetchError::NotAnArray {
            origin: "test".to_string(),
            found: "object",
        }
        .is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::NotAnArray {
            origin: "data.json".to_string(),
            found: "object",
        };
        assert_eq!(
            err.to_string(),
            "payload from data.json is a JSON object, expected an array of records"
        );
    }
}
