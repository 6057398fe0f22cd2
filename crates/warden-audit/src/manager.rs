//! The audit lifecycle manager.
//!
//! Owns the `submitted → analyzing → analyzed | analysis_failed → validated`
//! state machine. Each transition is a compare-and-set on the store, so of two
//! callers racing to analyze or validate the same audit exactly one wins.

use chrono::Utc;
use tracing::{debug, info, warn};

use warden_core::entities::Audit;
use warden_core::enums::{AuditStatus, PromptVersion};
use warden_core::store::{AnalysisRecord, AuditStore};
use warden_llm::{AnalysisClient, ModelTransport};
use warden_report::{ParsedReport, PromptBuilder};

use crate::error::AuditError;
use crate::validation::ValidationCapability;

/// Longest failure summary kept on an audit, in characters.
const MAX_FAILURE_REASON: usize = 240;

/// Coordinates prompt building, the model call, reply parsing and persistence.
pub struct AuditManager<S, T, V> {
    store: S,
    builder: PromptBuilder,
    client: AnalysisClient<T>,
    validator: V,
}

fn summarize(reason: &str) -> String {
    let reason = reason.trim();
    match reason.char_indices().nth(MAX_FAILURE_REASON) {
        Some((cut, _)) => format!("{}...", &reason[..cut]),
        None => reason.to_string(),
    }
}

impl<S, T, V> AuditManager<S, T, V>
where
    S: AuditStore,
    T: ModelTransport,
    V: ValidationCapability,
{
    pub const fn new(
        store: S,
        builder: PromptBuilder,
        client: AnalysisClient<T>,
        validator: V,
    ) -> Self {
        Self {
            store,
            builder,
            client,
            validator,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn client(&self) -> &AnalysisClient<T> {
        &self.client
    }

    #[must_use]
    pub const fn validator(&self) -> &V {
        &self.validator
    }

    async fn load(&self, id: &str) -> Result<Audit, AuditError> {
        self.store
            .get_audit(id)
            .await
            .map_err(AuditError::store)?
            .ok_or_else(|| AuditError::NotFound(id.to_string()))
    }

    async fn invalid_state(&self, id: &str, operation: &'static str) -> AuditError {
        match self.load(id).await {
            Ok(current) => AuditError::InvalidState {
                id: id.to_string(),
                status: current.status,
                operation,
            },
            Err(err) => err,
        }
    }

    /// Create an audit and analyze it before returning.
    ///
    /// The source is checked before anything is stored, so rejected input
    /// leaves no trace. The returned audit is `analyzed` or `analysis_failed`.
    ///
    /// # Errors
    ///
    /// [`AuditError::InvalidInput`] for empty or oversized source; store
    /// failures as [`AuditError::Store`].
    pub async fn submit_audit(
        &self,
        owner_id: &str,
        contract_source: &str,
    ) -> Result<Audit, AuditError> {
        self.builder.validate(contract_source)?;
        let audit = self
            .store
            .create_audit(owner_id, contract_source)
            .await
            .map_err(AuditError::store)?;
        info!(audit_id = %audit.id, owner_id, bytes = contract_source.len(), "audit submitted");
        self.analyze_audit(&audit.id).await
    }

    /// Run the analysis of a `submitted` audit.
    ///
    /// # Errors
    ///
    /// [`AuditError::InvalidState`] unless the audit is `submitted` and this
    /// call wins the move to `analyzing`; [`AuditError::NotFound`];
    /// [`AuditError::InvalidInput`] if the stored source no longer fits the
    /// configured limit.
    pub async fn analyze_audit(&self, id: &str) -> Result<Audit, AuditError> {
        let audit = self.load(id).await?;
        if audit.status != AuditStatus::Submitted {
            return Err(AuditError::InvalidState {
                id: id.to_string(),
                status: audit.status,
                operation: "analyze",
            });
        }
        let request = self.builder.build(&audit.contract_source)?;

        let won = self
            .store
            .update_audit_status(id, AuditStatus::Submitted, AuditStatus::Analyzing)
            .await
            .map_err(AuditError::store)?;
        if !won {
            debug!(audit_id = id, "lost the race to start analysis");
            return Err(self.invalid_state(id, "analyze").await);
        }
        info!(audit_id = id, version = %request.version, "analysis started");

        let outcome = match self.client.analyze(&request).await {
            Ok(reply) => warden_report::parse(&reply.text, reply.version)
                .map(|parsed| (parsed, reply.version))
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };

        match outcome {
            Ok((parsed, version)) => self.record_success(id, parsed, version).await,
            Err(reason) => self.record_failure(id, &reason).await,
        }
    }

    async fn record_success(
        &self,
        id: &str,
        parsed: ParsedReport,
        prompt_version: PromptVersion,
    ) -> Result<Audit, AuditError> {
        for warning in &parsed.warnings {
            warn!(audit_id = id, %warning, "reply parsed with warning");
        }
        let record = AnalysisRecord {
            report: parsed.report,
            prompt_version,
            warnings: parsed.warnings.iter().map(ToString::to_string).collect(),
            analyzed_at: Utc::now(),
        };

        match self.store.update_audit_result(id, &record).await {
            Ok(true) => {
                info!(
                    audit_id = id,
                    vulnerabilities = record.report.vulnerabilities.len(),
                    score = %record.report.security_score,
                    "analysis recorded"
                );
                self.load(id).await
            }
            Ok(false) => Err(self.invalid_state(id, "record analysis").await),
            Err(err) => {
                // Leave the audit in a determinate state if we still can.
                let reason = summarize(&format!("failed to store analysis result: {err}"));
                if let Err(mark_err) = self.store.fail_analysis(id, &reason).await {
                    warn!(audit_id = id, error = %mark_err, "could not mark analysis failed");
                }
                Err(AuditError::store(err))
            }
        }
    }

    async fn record_failure(&self, id: &str, reason: &str) -> Result<Audit, AuditError> {
        let reason = summarize(reason);
        let marked = self
            .store
            .fail_analysis(id, &reason)
            .await
            .map_err(AuditError::store)?;
        if !marked {
            return Err(self.invalid_state(id, "record failure").await);
        }
        warn!(audit_id = id, %reason, "analysis failed");
        self.load(id).await
    }

    /// Move an `analyzed` audit to `validated` after a positive
    /// acknowledgement. Already-validated audits are returned unchanged.
    ///
    /// # Errors
    ///
    /// [`AuditError::InvalidState`] unless the audit is `analyzed` or
    /// `validated`; [`AuditError::ValidationDeclined`] on a negative
    /// acknowledgement, leaving the audit untouched.
    pub async fn validate_audit(&self, id: &str) -> Result<Audit, AuditError> {
        let audit = self.load(id).await?;
        match audit.status {
            AuditStatus::Validated => {
                debug!(audit_id = id, "already validated");
                return Ok(audit);
            }
            AuditStatus::Analyzed => {}
            status => {
                return Err(AuditError::InvalidState {
                    id: id.to_string(),
                    status,
                    operation: "validate",
                });
            }
        }

        if !self.validator.request_validation(id).await? {
            warn!(audit_id = id, "validation declined");
            return Err(AuditError::ValidationDeclined(id.to_string()));
        }

        let won = self
            .store
            .set_validated(id, Utc::now())
            .await
            .map_err(AuditError::store)?;
        let current = self.load(id).await?;
        if !won && current.status != AuditStatus::Validated {
            return Err(AuditError::InvalidState {
                id: id.to_string(),
                status: current.status,
                operation: "validate",
            });
        }
        info!(audit_id = id, "audit validated");
        Ok(current)
    }

    /// # Errors
    ///
    /// [`AuditError::NotFound`] when no audit has this id.
    pub async fn get_audit(&self, id: &str) -> Result<Audit, AuditError> {
        self.load(id).await
    }

    /// All audits of `owner_id`, newest first.
    ///
    /// # Errors
    ///
    /// Store failures as [`AuditError::Store`].
    pub async fn list_audits(&self, owner_id: &str) -> Result<Vec<Audit>, AuditError> {
        self.store
            .list_audits_by_owner(owner_id)
            .await
            .map_err(AuditError::store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reasons_are_kept() {
        assert_eq!(
            summarize("  model call timed out after 60s "),
            "model call timed out after 60s"
        );
    }

    #[test]
    fn long_reasons_are_truncated_on_char_boundary() {
        let long = "é".repeat(MAX_FAILURE_REASON + 10);
        let summary = summarize(&long);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), MAX_FAILURE_REASON + 3);
    }
}
