//! Database error types for warden-db.

use thiserror::Error;

/// Errors from the audit store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A column held data that does not map back onto an audit.
    #[error("bad audit row: {0}")]
    Query(String),

    /// An embedded migration failed to apply.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A statement that always yields a row yielded none.
    #[error("query returned no rows")]
    NoResult,

    /// The row or the requested transition breaks the audit state machine.
    #[error("invalid audit state: {0}")]
    InvalidState(String),

    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// A report column could not be encoded as JSON.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
