//! Prompt and parse error types.

use thiserror::Error;

/// Rejections raised before any request is sent. Both variants are invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("invalid input: contract source is empty")]
    EmptySource,

    #[error("invalid input: contract source is {len} bytes, limit is {max}")]
    SourceTooLarge { len: usize, max: usize },
}

/// Failures turning a model reply into a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The reply could not be segmented with the selected grammar.
    #[error("unparseable model reply: {reason}")]
    Unparseable { reason: String },
}
