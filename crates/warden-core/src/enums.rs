//! Status and classification enums for Warden.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `AuditStatus` provides `allowed_next_states()` to enforce valid transitions
//! at the application layer; the store enforces them again with conditional
//! updates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AuditStatus
// ---------------------------------------------------------------------------

/// Status of an audit through its review lifecycle.
///
/// ```text
/// submitted → analyzing → analyzed → validated
///                       → analysis_failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Submitted,
    Analyzing,
    Analyzed,
    AnalysisFailed,
    Validated,
}

impl AuditStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Submitted => &[Self::Analyzing],
            Self::Analyzing => &[Self::Analyzed, Self::AnalysisFailed],
            Self::Analyzed => &[Self::Validated],
            Self::AnalysisFailed | Self::Validated => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Terminal states have no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_next_states().is_empty()
    }

    /// Whether an analysis report is attached in this state.
    #[must_use]
    pub const fn has_report(self) -> bool {
        matches!(self, Self::Analyzed | Self::Validated)
    }

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Analyzing => "analyzing",
            Self::Analyzed => "analyzed",
            Self::AnalysisFailed => "analysis_failed",
            Self::Validated => "validated",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a reported vulnerability.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Recognize a severity token, case-insensitively. Only the three exact
    /// level names are recognized.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("high") {
            Some(Self::High)
        } else if token.eq_ignore_ascii_case("medium") {
            Some(Self::Medium)
        } else if token.eq_ignore_ascii_case("low") {
            Some(Self::Low)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PromptVersion
// ---------------------------------------------------------------------------

/// Version tag pairing a rendered prompt with the grammar used to parse its reply.
///
/// Changing the section headers a prompt asks for requires a new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromptVersion {
    V1,
}

impl PromptVersion {
    /// The version new requests are rendered with.
    pub const CURRENT: Self = Self::V1;

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
        }
    }
}

impl fmt::Display for PromptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
