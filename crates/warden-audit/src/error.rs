//! Lifecycle error types.

use thiserror::Error;
use warden_core::enums::AuditStatus;
use warden_report::PromptError;

use crate::validation::ValidationError;

/// Errors returned to callers of the lifecycle manager.
///
/// Analysis failures are not errors here: they are recorded on the audit as
/// `analysis_failed` and the audit is returned.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The contract source was rejected before anything was stored or sent.
    #[error(transparent)]
    InvalidInput(#[from] PromptError),

    /// The audit is not in a state that allows the operation.
    #[error("audit {id} is {status}, cannot {operation}")]
    InvalidState {
        id: String,
        status: AuditStatus,
        operation: &'static str,
    },

    #[error("audit not found: {0}")]
    NotFound(String),

    /// The validation capability answered with a negative acknowledgement.
    #[error("validation declined for audit {0}")]
    ValidationDeclined(String),

    /// The validation capability could not be reached or answered garbage.
    #[error("validation request failed: {0}")]
    Validation(#[from] ValidationError),

    /// The audit store failed.
    #[error("audit store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuditError {
    pub(crate) fn store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(error))
    }
}
