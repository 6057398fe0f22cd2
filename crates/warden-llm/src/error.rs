//! Transport and analysis error types.

use std::time::Duration;

use thiserror::Error;

/// Failures of a single model call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP transport error (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The endpoint returned 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The response body was not the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The transport could not reach the model for another reason.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    /// Whether one more attempt could plausibly succeed.
    ///
    /// Network failures, 5xx, 408 and 429 are transient. Credential
    /// rejections, other 4xx, and undecodable bodies are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => {
                err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
            }
            Self::Api { status, .. } => *status >= 500 || *status == 408,
            Self::RateLimited { .. } | Self::Unavailable(_) => true,
            Self::Decode(_) => false,
        }
    }
}

/// Outcome classes of an analysis call, after retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// An attempt exceeded its deadline. Not retried.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// A transient failure persisted through the retry.
    #[error("model unavailable after retry: {0}")]
    Transient(String),

    /// A failure that retrying cannot fix.
    #[error("model call failed: {0}")]
    Fatal(String),
}
