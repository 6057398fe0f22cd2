//! Schema guards and on-disk persistence for the audit store.

use chrono::Utc;
use pretty_assertions::assert_eq;
use warden_core::enums::{AuditStatus, PromptVersion};
use warden_core::report::{AnalysisReport, SecurityScore};
use warden_core::store::{AnalysisRecord, AuditStore};
use warden_db::WardenDb;

async fn analyzed(db: &WardenDb) -> String {
    let audit = db.create_audit("owner-1", "contract Vault {}").await.unwrap();
    db.update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
        .await
        .unwrap();
    let record = AnalysisRecord {
        report: AnalysisReport {
            vulnerabilities: vec![],
            gas_optimizations: vec![],
            security_score: SecurityScore::UNSCORED,
        },
        prompt_version: PromptVersion::V1,
        warnings: vec![],
        analyzed_at: Utc::now(),
    };
    assert!(db.update_audit_result(&audit.id, &record).await.unwrap());
    audit.id
}

#[tokio::test]
async fn contract_source_cannot_be_edited() {
    let db = WardenDb::open_local(":memory:").await.unwrap();
    let audit = db.create_audit("owner-1", "contract Vault {}").await.unwrap();
    let result = db
        .conn()
        .execute(
            "UPDATE audits SET contract_source = 'contract Evil {}' WHERE id = ?1",
            [audit.id.as_str()],
        )
        .await;
    assert!(result.is_err());
    let stored = db.get_audit(&audit.id).await.unwrap().unwrap();
    assert_eq!(stored.contract_source, "contract Vault {}");
}

#[tokio::test]
async fn validation_cannot_be_reverted() {
    let db = WardenDb::open_local(":memory:").await.unwrap();
    let id = analyzed(&db).await;
    assert!(db.set_validated(&id, Utc::now()).await.unwrap());

    let result = db
        .conn()
        .execute(
            "UPDATE audits SET externally_validated = 0, status = 'analyzed', validated_at = NULL
             WHERE id = ?1",
            [id.as_str()],
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn partial_results_are_rejected_by_schema() {
    let db = WardenDb::open_local(":memory:").await.unwrap();
    let audit = db.create_audit("owner-1", "contract Vault {}").await.unwrap();
    let result = db
        .conn()
        .execute(
            "UPDATE audits SET status = 'analyzed', vulnerabilities = '[]' WHERE id = ?1",
            [audit.id.as_str()],
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unscored_report_roundtrips() {
    let db = WardenDb::open_local(":memory:").await.unwrap();
    let id = analyzed(&db).await;
    let stored = db.get_audit(&id).await.unwrap().unwrap();
    assert_eq!(
        stored.report.map(|r| r.security_score),
        Some(SecurityScore::UNSCORED)
    );
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.db");
    let path = path.to_str().unwrap();

    let id = {
        let db = WardenDb::open_local(path).await.unwrap();
        analyzed(&db).await
    };

    let db = WardenDb::open_local(path).await.unwrap();
    let stored = db.get_audit(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, AuditStatus::Analyzed);
    assert_eq!(stored.owner_id, "owner-1");
}
