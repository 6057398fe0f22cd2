//! Analysis report value types.
//!
//! An `AnalysisReport` is produced by the report parser and consumed once by
//! the lifecycle manager, which persists it together with the `analyzed`
//! transition.

use std::borrow::Cow;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Severity;
use crate::errors::CoreError;

/// A single security finding reported for the analyzed contract.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub location: String,
    pub description: String,
}

/// A gas optimization suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GasOptimization {
    #[serde(rename = "type")]
    pub kind: String,
    pub suggestion: String,
}

/// Overall security score: `0..=100`, or `-1` when the reply carried no usable score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct SecurityScore(i32);

impl SecurityScore {
    /// Sentinel meaning "unscored".
    pub const UNSCORED: Self = Self(-1);

    /// Highest possible score.
    pub const MAX: i32 = 100;

    /// Build a score in `0..=100`. Returns `None` outside that range.
    #[must_use]
    pub fn new(value: i32) -> Option<Self> {
        (0..=Self::MAX).contains(&value).then_some(Self(value))
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn is_scored(self) -> bool {
        self.0 >= 0
    }
}

impl TryFrom<i32> for SecurityScore {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value == Self::UNSCORED.0 {
            return Ok(Self::UNSCORED);
        }
        Self::new(value).ok_or_else(|| {
            CoreError::Validation(format!("security score {value} is outside 0..=100"))
        })
    }
}

impl From<SecurityScore> for i32 {
    fn from(score: SecurityScore) -> Self {
        score.0
    }
}

impl fmt::Display for SecurityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scored() {
            write!(f, "{}/100", self.0)
        } else {
            f.write_str("unscored")
        }
    }
}

impl JsonSchema for SecurityScore {
    fn schema_name() -> Cow<'static, str> {
        "SecurityScore".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "integer",
            "minimum": -1,
            "maximum": 100
        })
    }
}

/// Structured result of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AnalysisReport {
    pub vulnerabilities: Vec<Vulnerability>,
    pub gas_optimizations: Vec<GasOptimization>,
    pub security_score: SecurityScore,
}

impl AnalysisReport {
    /// Highest severity among the reported vulnerabilities.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.vulnerabilities.iter().map(|v| v.severity).max()
    }

    /// Number of vulnerabilities at the given severity.
    #[must_use]
    pub fn count_at(&self, severity: Severity) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}
