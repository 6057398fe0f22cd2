use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuditStatus, PromptVersion};
use crate::report::AnalysisReport;

/// One security-review unit tracking a contract through its lifecycle.
///
/// `report` is `None` until the audit reaches `analyzed` and is never
/// replaced afterwards. `contract_source` is the exact text that was analyzed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Audit {
    pub id: String,
    pub owner_id: String,
    pub contract_source: String,
    pub status: AuditStatus,
    pub report: Option<AnalysisReport>,
    pub prompt_version: Option<PromptVersion>,
    #[serde(default)]
    pub analysis_warnings: Vec<String>,
    pub failure_reason: Option<String>,
    pub externally_validated: bool,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl Audit {
    /// A fresh audit in `submitted` state.
    #[must_use]
    pub fn submitted(id: String, owner_id: String, contract_source: String) -> Self {
        Self {
            id,
            owner_id,
            contract_source,
            status: AuditStatus::Submitted,
            report: None,
            prompt_version: None,
            analysis_warnings: Vec::new(),
            failure_reason: None,
            externally_validated: false,
            created_at: Utc::now(),
            analyzed_at: None,
            validated_at: None,
        }
    }
}
