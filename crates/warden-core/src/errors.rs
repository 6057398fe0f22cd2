//! Cross-cutting error types for Warden.
//!
//! Domain-specific errors (`DatabaseError`, `AnalysisError`, `AuditError`, ...)
//! are defined in their respective crates. Everything converges on
//! `anyhow::Error` in `warden-cli`.

use thiserror::Error;

/// Errors raised by the core value types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, range, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
