use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Opportunity, OpportunityId};
use super::repository::RecordStore;
use super::service::AccountingError;

/// Cached count disagreeing with the application records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub opportunity_id: OpportunityId,
    pub title: String,
    pub cached_count: u32,
    pub actual_count: u32,
    /// `actual_count - cached_count`; positive when the cache under-counts.
    pub difference: i64,
}

/// Result of repairing one opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountCorrection {
    pub opportunity_id: OpportunityId,
    pub previous_count: u32,
    pub corrected_count: u32,
}

impl CountCorrection {
    pub fn changed(&self) -> bool {
        self.previous_count != self.corrected_count
    }
}

/// An opportunity skipped because one of its store calls failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileFailure {
    pub opportunity_id: OpportunityId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub checked: Vec<OpportunityId>,
    pub mismatches: Vec<CountMismatch>,
    pub failures: Vec<ReconcileFailure>,
}

impl VerificationReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn mismatch_for(&self, opportunity_id: &OpportunityId) -> Option<&CountMismatch> {
        self.mismatches
            .iter()
            .find(|mismatch| &mismatch.opportunity_id == opportunity_id)
    }

    /// Promote a run with skipped opportunities to `PartialFailure`.
    pub fn into_result(self) -> Result<Self, AccountingError> {
        if self.is_partial() {
            return Err(AccountingError::PartialFailure {
                succeeded: self.checked,
                failed: self.failures,
            });
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub in_sync: Vec<OpportunityId>,
    pub corrected: Vec<CountCorrection>,
    pub failures: Vec<ReconcileFailure>,
}

impl SyncReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn succeeded(&self) -> Vec<OpportunityId> {
        self.in_sync
            .iter()
            .cloned()
            .chain(
                self.corrected
                    .iter()
                    .map(|correction| correction.opportunity_id.clone()),
            )
            .collect()
    }

    pub fn into_result(self) -> Result<Self, AccountingError> {
        if self.is_partial() {
            return Err(AccountingError::PartialFailure {
                succeeded: self.succeeded(),
                failed: self.failures,
            });
        }
        Ok(self)
    }
}

/// Detects and repairs drift between cached counts and application records.
///
/// Runs go one opportunity at a time with no surrounding transaction. A crash midway
/// leaves the processed opportunities repaired and the rest for the next run.
pub struct CountReconciler<S> {
    store: Arc<S>,
}

impl<S> CountReconciler<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Compare every active opportunity against its record count. Writes nothing.
    pub fn verify(&self) -> Result<VerificationReport, AccountingError> {
        let opportunities = self.store.active_opportunities()?;
        let mut report = VerificationReport::default();

        for opportunity in opportunities {
            let actual = match self.store.count_applications(&opportunity.id) {
                Ok(actual) => actual,
                Err(err) => {
                    warn!(opportunity_id = %opportunity.id, error = %err, "count query failed during verify");
                    report.failures.push(ReconcileFailure {
                        opportunity_id: opportunity.id,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if actual != opportunity.applicant_count {
                report.mismatches.push(CountMismatch {
                    opportunity_id: opportunity.id.clone(),
                    title: opportunity.title.clone(),
                    cached_count: opportunity.applicant_count,
                    actual_count: actual,
                    difference: i64::from(actual) - i64::from(opportunity.applicant_count),
                });
            }
            report.checked.push(opportunity.id);
        }

        info!(
            checked = report.checked.len(),
            mismatches = report.mismatches.len(),
            failures = report.failures.len(),
            "applicant counts verified"
        );
        Ok(report)
    }

    /// Overwrite every active opportunity's cache with its record count.
    ///
    /// Only differing values are written, so a second run with no new submissions
    /// reports everything as in sync.
    pub fn sync_all(&self) -> Result<SyncReport, AccountingError> {
        let opportunities = self.store.active_opportunities()?;
        let mut report = SyncReport::default();

        for opportunity in opportunities {
            let id = opportunity.id.clone();
            match self.repair(opportunity) {
                Ok(correction) if correction.changed() => report.corrected.push(correction),
                Ok(_) => report.in_sync.push(id),
                Err(err) => {
                    warn!(opportunity_id = %id, error = %err, "skipping opportunity during sync");
                    report.failures.push(ReconcileFailure {
                        opportunity_id: id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            in_sync = report.in_sync.len(),
            corrected = report.corrected.len(),
            failures = report.failures.len(),
            "applicant counts synchronized"
        );
        Ok(report)
    }

    /// Repair a single opportunity, active or not.
    pub fn resolve_one(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<CountCorrection, AccountingError> {
        let opportunity = self
            .store
            .fetch_opportunity(opportunity_id)?
            .ok_or_else(|| AccountingError::NotFound(opportunity_id.clone()))?;
        let correction = self.repair(opportunity)?;
        if correction.changed() {
            info!(
                opportunity_id = %correction.opportunity_id,
                previous = correction.previous_count,
                corrected = correction.corrected_count,
                "applicant count resolved"
            );
        }
        Ok(correction)
    }

    fn repair(&self, opportunity: Opportunity) -> Result<CountCorrection, AccountingError> {
        let actual = self.store.count_applications(&opportunity.id)?;
        if actual != opportunity.applicant_count {
            self.store.set_applicant_count(&opportunity.id, actual)?;
        }
        Ok(CountCorrection {
            opportunity_id: opportunity.id,
            previous_count: opportunity.applicant_count,
            corrected_count: actual,
        })
    }
}
