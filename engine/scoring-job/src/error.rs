//! Error types for the scoring job

use persistence::PersistenceError;
use thiserror::Error;

/// Result type alias for job operations
pub type Result<T> = std::result::Result<T, JobError>;

/// Errors returned by the upstream stats provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Connection, timeout or other transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP status {status} from {endpoint}")]
    HttpStatus {
        endpoint: String,
        status: u16,
    },

    /// The response envelope carried a non-200 `statusCode`
    #[error("Provider rejected request to {endpoint} with statusCode {status_code}")]
    Rejected {
        endpoint: String,
        status_code: i64,
    },

    /// The response body could not be decoded
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode {
        endpoint: String,
        message: String,
    },
}

impl ProviderError {
    /// Transport and HTTP-status failures are worth retrying; the provider
    /// answering with a rejection or an unreadable body is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus { .. })
    }
}

/// Fatal job errors. Anything that reaches `main` as a `JobError` ends the run.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl JobError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let http = ProviderError::HttpStatus {
            endpoint: "getNFLGamesForPlayer".into(),
            status: 503,
        };
        assert!(http.is_retryable());

        let rejected = ProviderError::Rejected {
            endpoint: "getNFLGamesForPlayer".into(),
            status_code: 400,
        };
        assert!(!rejected.is_retryable());

        let decode = ProviderError::Decode {
            endpoint: "x".into(),
            message: "eof".into(),
        };
        assert!(!decode.is_retryable());
    }
}
