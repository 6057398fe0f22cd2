//! In-process audit store.
//!
//! Holds audits in a mutex-guarded map with the same compare-and-set
//! semantics as the database store. Used by tests and by callers that do not
//! need persistence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use warden_core::entities::Audit;
use warden_core::enums::AuditStatus;
use warden_core::ids::PREFIX_AUDIT;
use warden_core::store::{AnalysisRecord, AuditStore};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("illegal audit transition {from} -> {to}")]
    IllegalTransition { from: AuditStatus, to: AuditStatus },

    /// Injected by [`MemoryAuditStore::failing_result_writes`].
    #[error("result write rejected")]
    WriteRejected,
}

#[derive(Debug, Default)]
struct State {
    next_seq: u32,
    audits: HashMap<String, (u32, Audit)>,
}

#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    state: Mutex<State>,
    reject_result_writes: AtomicBool,
}

impl MemoryAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `update_audit_result` always fails.
    #[must_use]
    pub fn failing_result_writes() -> Self {
        let store = Self::default();
        store.reject_result_writes.store(true, Ordering::SeqCst);
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `update` to audit `id` if it is currently in `from`.
    fn transition(&self, id: &str, from: AuditStatus, update: impl FnOnce(&mut Audit)) -> bool {
        let mut state = self.lock();
        match state.audits.get_mut(id) {
            Some((_, audit)) if audit.status == from => {
                update(audit);
                true
            }
            _ => false,
        }
    }
}

impl AuditStore for MemoryAuditStore {
    type Error = MemoryStoreError;

    async fn create_audit(
        &self,
        owner_id: &str,
        contract_source: &str,
    ) -> Result<Audit, Self::Error> {
        let mut state = self.lock();
        state.next_seq += 1;
        let seq = state.next_seq;
        let id = format!("{PREFIX_AUDIT}-{seq:08x}");
        let audit = Audit::submitted(id.clone(), owner_id.to_string(), contract_source.to_string());
        state.audits.insert(id, (seq, audit.clone()));
        Ok(audit)
    }

    async fn get_audit(&self, id: &str) -> Result<Option<Audit>, Self::Error> {
        Ok(self.lock().audits.get(id).map(|(_, audit)| audit.clone()))
    }

    async fn list_audits_by_owner(&self, owner_id: &str) -> Result<Vec<Audit>, Self::Error> {
        let state = self.lock();
        let mut owned: Vec<&(u32, Audit)> = state
            .audits
            .values()
            .filter(|(_, audit)| audit.owner_id == owner_id)
            .collect();
        owned.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(owned.into_iter().map(|(_, audit)| audit.clone()).collect())
    }

    async fn update_audit_status(
        &self,
        id: &str,
        from: AuditStatus,
        to: AuditStatus,
    ) -> Result<bool, Self::Error> {
        if !from.can_transition_to(to) {
            return Err(MemoryStoreError::IllegalTransition { from, to });
        }
        Ok(self.transition(id, from, |audit| audit.status = to))
    }

    async fn update_audit_result(
        &self,
        id: &str,
        record: &AnalysisRecord,
    ) -> Result<bool, Self::Error> {
        if self.reject_result_writes.load(Ordering::SeqCst) {
            return Err(MemoryStoreError::WriteRejected);
        }
        Ok(self.transition(id, AuditStatus::Analyzing, |audit| {
            audit.status = AuditStatus::Analyzed;
            audit.report = Some(record.report.clone());
            audit.prompt_version = Some(record.prompt_version);
            audit.analysis_warnings.clone_from(&record.warnings);
            audit.analyzed_at = Some(record.analyzed_at);
            audit.failure_reason = None;
        }))
    }

    async fn fail_analysis(&self, id: &str, reason: &str) -> Result<bool, Self::Error> {
        Ok(self.transition(id, AuditStatus::Analyzing, |audit| {
            audit.status = AuditStatus::AnalysisFailed;
            audit.failure_reason = Some(reason.to_string());
        }))
    }

    async fn set_validated(
        &self,
        id: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<bool, Self::Error> {
        Ok(self.transition(id, AuditStatus::Analyzed, |audit| {
            audit.status = AuditStatus::Validated;
            audit.externally_validated = true;
            audit.validated_at = Some(validated_at);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn ids_are_sequential_and_well_formed() {
        let store = MemoryAuditStore::new();
        let a = store.create_audit("o", "contract A {}").await.unwrap();
        let b = store.create_audit("o", "contract B {}").await.unwrap();
        assert_eq!(a.id, "aud-00000001");
        assert_eq!(b.id, "aud-00000002");
        assert!(warden_core::ids::is_valid_id(PREFIX_AUDIT, &b.id));
    }

    #[tokio::test]
    async fn cas_rejects_stale_state() {
        let store = MemoryAuditStore::new();
        let audit = store.create_audit("o", "contract A {}").await.unwrap();
        assert!(
            store
                .update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_audit_status(&audit.id, AuditStatus::Submitted, AuditStatus::Analyzing)
                .await
                .unwrap()
        );
        assert!(!store.set_validated(&audit.id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn illegal_transition_is_an_error() {
        let store = MemoryAuditStore::new();
        let audit = store.create_audit("o", "contract A {}").await.unwrap();
        let err = store
            .update_audit_status(&audit.id, AuditStatus::Analyzed, AuditStatus::Submitted)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryStoreError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn lists_newest_first_per_owner() {
        let store = MemoryAuditStore::new();
        store.create_audit("alice", "contract A {}").await.unwrap();
        store.create_audit("bob", "contract B {}").await.unwrap();
        store.create_audit("alice", "contract C {}").await.unwrap();
        let sources: Vec<String> = store
            .list_audits_by_owner("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.contract_source)
            .collect();
        assert_eq!(sources, vec!["contract C {}", "contract A {}"]);
    }
}
