//! Audit repository: the `AuditStore` contract over the `audits` table.
//!
//! Every transition is a single conditional `UPDATE ... WHERE id = ? AND
//! status = ?`; the affected-row count tells the caller whether it won.

use chrono::{DateTime, Utc};
use tracing::debug;

use warden_core::entities::Audit;
use warden_core::enums::AuditStatus;
use warden_core::ids::PREFIX_AUDIT;
use warden_core::report::{AnalysisReport, SecurityScore};
use warden_core::store::{AnalysisRecord, AuditStore};

use crate::WardenDb;
use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_datetime, to_json,
};

const SELECT_COLS: &str = "id, owner_id, contract_source, status, vulnerabilities, \
     gas_optimizations, security_score, prompt_version, analysis_warnings, failure_reason, \
     externally_validated, created_at, analyzed_at, validated_at";

fn row_to_audit(row: &libsql::Row) -> Result<Audit, DatabaseError> {
    let id = row.get::<String>(0)?;

    let vulnerabilities = get_opt_string(row, 4)?;
    let gas_optimizations = get_opt_string(row, 5)?;
    let security_score = row.get::<Option<i64>>(6)?;
    let report = match (vulnerabilities, gas_optimizations, security_score) {
        (Some(vulns), Some(gas), Some(score)) => Some(AnalysisReport {
            vulnerabilities: parse_json(&vulns, "vulnerabilities")?,
            gas_optimizations: parse_json(&gas, "gas_optimizations")?,
            security_score: parse_score(score)?,
        }),
        (None, None, None) => None,
        _ => {
            return Err(DatabaseError::InvalidState(format!(
                "audit {id} has partial analysis results"
            )));
        }
    };

    Ok(Audit {
        owner_id: row.get::<String>(1)?,
        contract_source: row.get::<String>(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        report,
        prompt_version: get_opt_string(row, 7)?
            .map(|v| parse_enum(&v))
            .transpose()?,
        analysis_warnings: parse_json(&row.get::<String>(8)?, "analysis_warnings")?,
        failure_reason: get_opt_string(row, 9)?,
        externally_validated: row.get::<i64>(10)? != 0,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        analyzed_at: parse_optional_datetime(get_opt_string(row, 12)?.as_deref())?,
        validated_at: parse_optional_datetime(get_opt_string(row, 13)?.as_deref())?,
        id,
    })
}

fn parse_score(raw: i64) -> Result<SecurityScore, DatabaseError> {
    i32::try_from(raw)
        .ok()
        .and_then(|v| SecurityScore::try_from(v).ok())
        .ok_or_else(|| DatabaseError::Query(format!("security_score {raw} out of range")))
}

impl WardenDb {
    /// Run a `SELECT {SELECT_COLS}` query bound to one text parameter.
    async fn query_audits(&self, sql: &str, param: &str) -> Result<Vec<Audit>, DatabaseError> {
        let mut rows = self.conn().query(sql, [param]).await?;
        let mut audits = Vec::new();
        while let Some(row) = rows.next().await? {
            audits.push(row_to_audit(&row)?);
        }
        Ok(audits)
    }
}

impl AuditStore for WardenDb {
    type Error = DatabaseError;

    async fn create_audit(
        &self,
        owner_id: &str,
        contract_source: &str,
    ) -> Result<Audit, DatabaseError> {
        let id = self.generate_id(PREFIX_AUDIT).await?;
        let audit = Audit::submitted(id, owner_id.to_string(), contract_source.to_string());

        self.conn()
            .execute(
                "INSERT INTO audits (id, owner_id, contract_source, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    audit.id.as_str(),
                    owner_id,
                    contract_source,
                    audit.status.as_str(),
                    audit.created_at.to_rfc3339()
                ],
            )
            .await?;

        debug!(audit_id = %audit.id, owner_id, "audit created");
        Ok(audit)
    }

    async fn get_audit(&self, id: &str) -> Result<Option<Audit>, DatabaseError> {
        let mut audits = self
            .query_audits(&format!("SELECT {SELECT_COLS} FROM audits WHERE id = ?1"), id)
            .await?;
        Ok(audits.pop())
    }

    async fn list_audits_by_owner(&self, owner_id: &str) -> Result<Vec<Audit>, DatabaseError> {
        self.query_audits(
            &format!(
                "SELECT {SELECT_COLS} FROM audits WHERE owner_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ),
            owner_id,
        )
        .await
    }

    async fn update_audit_status(
        &self,
        id: &str,
        from: AuditStatus,
        to: AuditStatus,
    ) -> Result<bool, DatabaseError> {
        if !from.can_transition_to(to) {
            return Err(DatabaseError::InvalidState(format!(
                "illegal audit transition {from} -> {to}"
            )));
        }
        let changed = self
            .conn()
            .execute(
                "UPDATE audits SET status = ?3 WHERE id = ?1 AND status = ?2",
                libsql::params![id, from.as_str(), to.as_str()],
            )
            .await?;
        debug!(audit_id = id, %from, %to, applied = changed == 1, "status transition");
        Ok(changed == 1)
    }

    async fn update_audit_result(
        &self,
        id: &str,
        record: &AnalysisRecord,
    ) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE audits SET
                    status = ?2,
                    vulnerabilities = ?3,
                    gas_optimizations = ?4,
                    security_score = ?5,
                    prompt_version = ?6,
                    analysis_warnings = ?7,
                    analyzed_at = ?8,
                    failure_reason = NULL
                 WHERE id = ?1 AND status = ?9",
                libsql::params![
                    id,
                    AuditStatus::Analyzed.as_str(),
                    to_json(&record.report.vulnerabilities)?,
                    to_json(&record.report.gas_optimizations)?,
                    i64::from(record.report.security_score.value()),
                    record.prompt_version.as_str(),
                    to_json(&record.warnings)?,
                    record.analyzed_at.to_rfc3339(),
                    AuditStatus::Analyzing.as_str()
                ],
            )
            .await?;
        Ok(changed == 1)
    }

    async fn fail_analysis(&self, id: &str, reason: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE audits SET status = ?2, failure_reason = ?3 WHERE id = ?1 AND status = ?4",
                libsql::params![
                    id,
                    AuditStatus::AnalysisFailed.as_str(),
                    reason,
                    AuditStatus::Analyzing.as_str()
                ],
            )
            .await?;
        Ok(changed == 1)
    }

    async fn set_validated(
        &self,
        id: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE audits SET status = ?2, externally_validated = 1, validated_at = ?3
                 WHERE id = ?1 AND status = ?4",
                libsql::params![
                    id,
                    AuditStatus::Validated.as_str(),
                    validated_at.to_rfc3339(),
                    AuditStatus::Analyzed.as_str()
                ],
            )
            .await?;
        Ok(changed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use warden_core::enums::{PromptVersion, Severity};
    use warden_core::report::{GasOptimization, Vulnerability};

    async fn test_db() -> WardenDb {
        WardenDb::open_local(":memory:").await.unwrap()
    }

    fn record() -> AnalysisRecord {
        AnalysisRecord {
            report: AnalysisReport {
                vulnerabilities: vec![Vulnerability {
                    kind: "reentrancy".into(),
                    severity: Severity::High,
                    location: "withdraw()".into(),
                    description: "external call before state update".into(),
                }],
                gas_optimizations: vec![GasOptimization {
                    kind: "loop".into(),
                    suggestion: "Cache array length".into(),
                }],
                security_score: SecurityScore::new(85).unwrap(),
            },
            prompt_version: PromptVersion::V1,
            warnings: vec!["optimization section missing from reply".into()],
            analyzed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let db = test_db().await;
        let created = db.create_audit("owner-1", "contract A {}").await.unwrap();
        assert!(warden_core::ids::is_valid_id(PREFIX_AUDIT, &created.id));
        let fetched = db.get_audit(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn missing_audit_is_none() {
        let db = test_db().await;
        assert_eq!(db.get_audit("aud-00000000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn status_cas_only_applies_once() {
        let db = test_db().await;
        let audit = db.create_audit("owner-1", "contract A {}").await.unwrap();
        let first = db
            .update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
            .await
            .unwrap();
        let second = db
            .update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
            .await
            .unwrap();
        assert!(first);
        assert!(!second);
    }

    #[rstest]
    #[case(AuditStatus::Submitted, AuditStatus::Validated)]
    #[case(AuditStatus::Submitted, AuditStatus::Analyzed)]
    #[case(AuditStatus::Analyzed, AuditStatus::Submitted)]
    #[case(AuditStatus::AnalysisFailed, AuditStatus::Analyzing)]
    #[case(AuditStatus::Validated, AuditStatus::Analyzed)]
    #[tokio::test]
    async fn illegal_transition_is_rejected(#[case] from: AuditStatus, #[case] to: AuditStatus) {
        let db = test_db().await;
        let audit = db.create_audit("owner-1", "contract A {}").await.unwrap();
        let err = db.update_audit_status(&audit.id, from, to).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));

        let stored = db.get_audit(&audit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AuditStatus::Submitted);
    }

    #[tokio::test]
    async fn result_is_stored_with_analyzed() {
        let db = test_db().await;
        let audit = db.create_audit("owner-1", "contract A {}").await.unwrap();
        // Result only lands from `analyzing`.
        assert!(!db.update_audit_result(&audit.id, &record()).await.unwrap());

        db.update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
            .await
            .unwrap();
        let record = record();
        assert!(db.update_audit_result(&audit.id, &record).await.unwrap());

        let stored = db.get_audit(&audit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AuditStatus::Analyzed);
        assert_eq!(stored.report, Some(record.report));
        assert_eq!(stored.prompt_version, Some(PromptVersion::V1));
        assert_eq!(stored.analysis_warnings, record.warnings);
        assert_eq!(stored.analyzed_at, Some(record.analyzed_at));
    }

    #[tokio::test]
    async fn failure_records_reason_without_results() {
        let db = test_db().await;
        let audit = db.create_audit("owner-1", "contract A {}").await.unwrap();
        db.update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
            .await
            .unwrap();
        assert!(db.fail_analysis(&audit.id, "model call timed out after 60s").await.unwrap());
        assert!(!db.fail_analysis(&audit.id, "again").await.unwrap());

        let stored = db.get_audit(&audit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AuditStatus::AnalysisFailed);
        assert_eq!(stored.failure_reason.as_deref(), Some("model call timed out after 60s"));
        assert_eq!(stored.report, None);
    }

    #[tokio::test]
    async fn validation_requires_analyzed() {
        let db = test_db().await;
        let audit = db.create_audit("owner-1", "contract A {}").await.unwrap();
        assert!(!db.set_validated(&audit.id, Utc::now()).await.unwrap());

        db.update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
            .await
            .unwrap();
        db.update_audit_result(&audit.id, &record()).await.unwrap();
        assert!(db.set_validated(&audit.id, Utc::now()).await.unwrap());

        let stored = db.get_audit(&audit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AuditStatus::Validated);
        assert!(stored.externally_validated);
        assert!(stored.validated_at.is_some());
        assert!(stored.report.is_some());
    }

    #[tokio::test]
    async fn list_is_per_owner_newest_first() {
        let db = test_db().await;
        let a = db.create_audit("owner-1", "contract A {}").await.unwrap();
        let b = db.create_audit("owner-1", "contract B {}").await.unwrap();
        db.create_audit("owner-2", "contract C {}").await.unwrap();

        let ids: Vec<String> = db
            .list_audits_by_owner("owner-1")
            .await
            .unwrap()
            .into_iter()
            .map(|audit| audit.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert!(db.list_audits_by_owner("nobody").await.unwrap().is_empty());
    }
}
