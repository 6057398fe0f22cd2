//! # warden-report
//!
//! The text protocol spoken with the language model.
//!
//! The model's reply has no enforced schema, so it is treated as a versioned
//! grammar: a [`PromptVersion`] selects both the section headers the prompt
//! asks for and the [`Grammar`] the reply is segmented with.
//!
//! - [`PromptBuilder`] renders a deterministic [`AnalysisRequest`] for a contract.
//! - [`parse`] turns the raw reply into an [`AnalysisReport`] plus non-fatal
//!   [`ParseWarning`]s, or fails with [`ParseError::Unparseable`].
//!
//! Both are pure: no I/O, no clock, no randomness.
//!
//! [`PromptVersion`]: warden_core::enums::PromptVersion
//! [`AnalysisRequest`]: warden_core::request::AnalysisRequest
//! [`AnalysisReport`]: warden_core::report::AnalysisReport

mod error;
pub mod grammar;
pub mod parser;
pub mod prompt;

pub use error::{ParseError, PromptError};
pub use grammar::{Grammar, Section};
pub use parser::{ParseWarning, ParsedReport, parse};
pub use prompt::PromptBuilder;
