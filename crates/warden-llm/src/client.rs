//! The analysis client: one model call with a deadline and a single retry.

use std::time::Duration;

use tracing::{debug, warn};
use warden_config::ModelConfig;
use warden_core::enums::PromptVersion;
use warden_core::request::AnalysisRequest;

use crate::error::{AnalysisError, TransportError};
use crate::transport::ModelTransport;

/// First attempt plus one retry.
const MAX_ATTEMPTS: u32 = 2;

/// Uninterpreted reply text, tagged with the prompt version it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub text: String,
    pub version: PromptVersion,
    /// Attempts it took, `1` or `2`.
    pub attempts: u32,
}

enum AttemptError {
    TimedOut,
    Failed(TransportError),
}

/// Calls the model for an [`AnalysisRequest`].
///
/// Every attempt is bounded by `timeout`; a timed-out attempt is not retried.
/// A transient failure is retried once after `retry_backoff`.
#[derive(Debug)]
pub struct AnalysisClient<T> {
    transport: T,
    timeout: Duration,
    retry_backoff: Duration,
}

impl<T: ModelTransport> AnalysisClient<T> {
    #[must_use]
    pub const fn new(transport: T, timeout: Duration, retry_backoff: Duration) -> Self {
        Self {
            transport,
            timeout,
            retry_backoff,
        }
    }

    /// Client using the deadline and backoff from the `[model]` section.
    #[must_use]
    pub const fn from_config(transport: T, config: &ModelConfig) -> Self {
        Self::new(transport, config.timeout(), config.retry_backoff())
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, request: &AnalysisRequest) -> Result<String, AttemptError> {
        let call = self
            .transport
            .invoke(&request.system_prompt, &request.user_prompt);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(AttemptError::Failed),
            Err(_) => Err(AttemptError::TimedOut),
        }
    }

    /// Send the request and return the raw reply text.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Timeout`] when an attempt exceeds the deadline.
    /// - [`AnalysisError::Transient`] when a transient failure repeats on retry.
    /// - [`AnalysisError::Fatal`] for credential, client-side, decode failures
    ///   and for a reply that is empty or whitespace.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<RawReply, AnalysisError> {
        let mut attempt = 1;
        loop {
            debug!(attempt, version = %request.version, "calling model");
            match self.attempt(request).await {
                Ok(text) if text.trim().is_empty() => {
                    warn!(attempt, "model returned an empty reply");
                    return Err(AnalysisError::Fatal("empty reply".to_string()));
                }
                Ok(text) => {
                    debug!(attempt, reply_bytes = text.len(), "model replied");
                    return Ok(RawReply {
                        text,
                        version: request.version,
                        attempts: attempt,
                    });
                }
                Err(AttemptError::TimedOut) => {
                    warn!(attempt, timeout = ?self.timeout, "model call timed out");
                    return Err(AnalysisError::Timeout(self.timeout));
                }
                Err(AttemptError::Failed(error)) if error.is_transient() => {
                    if attempt >= MAX_ATTEMPTS {
                        warn!(attempt, %error, "transient model failure persisted");
                        return Err(AnalysisError::Transient(error.to_string()));
                    }
                    warn!(
                        attempt,
                        %error,
                        backoff = ?self.retry_backoff,
                        "transient model failure, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                    attempt += 1;
                }
                Err(AttemptError::Failed(error)) => {
                    warn!(attempt, %error, "model call failed");
                    return Err(AnalysisError::Fatal(error.to_string()));
                }
            }
        }
    }
}
