//! Persistence contract for audits.
//!
//! The lifecycle manager only needs create/read plus a handful of conditional
//! transitions. Every transition is a compare-and-set against the stored
//! status: it applies only when the row is still in the expected state and
//! reports whether it did, so racing callers cannot both win.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::entities::Audit;
use crate::enums::{AuditStatus, PromptVersion};
use crate::report::AnalysisReport;

/// Everything persisted together with the `analyzing → analyzed` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub report: AnalysisReport,
    pub prompt_version: PromptVersion,
    pub warnings: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

pub trait AuditStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert a new audit in `submitted` state and return it.
    fn create_audit(
        &self,
        owner_id: &str,
        contract_source: &str,
    ) -> impl Future<Output = Result<Audit, Self::Error>> + Send;

    /// Fetch an audit by ID. `Ok(None)` when absent.
    fn get_audit(&self, id: &str)
    -> impl Future<Output = Result<Option<Audit>, Self::Error>> + Send;

    /// All audits of one owner, newest first.
    fn list_audits_by_owner(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<Audit>, Self::Error>> + Send;

    /// Move `id` from `from` to `to` if it is still in `from`.
    fn update_audit_status(
        &self,
        id: &str,
        from: AuditStatus,
        to: AuditStatus,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Attach the report and move `analyzing → analyzed` in one atomic update.
    fn update_audit_result(
        &self,
        id: &str,
        record: &AnalysisRecord,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Record an error summary and move `analyzing → analysis_failed`.
    fn fail_analysis(
        &self,
        id: &str,
        reason: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Flag external validation and move `analyzed → validated`.
    fn set_validated(
        &self,
        id: &str,
        validated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
