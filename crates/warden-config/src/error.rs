//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the config shape.
    #[error("failed to load warden config: {0}")]
    Figment(#[from] figment::Error),

    /// A field parsed but holds a value the model API would reject.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
