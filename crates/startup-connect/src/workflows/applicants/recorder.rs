use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::counter::ApplicantCounter;
use super::domain::{Application, ApplicationId, ApplicationSubmission, OpportunityId, UserId};
use super::intake::{IntakeGuard, ValidationError};
use super::repository::RecordStore;
use super::service::AccountingError;

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Outcome of a stored submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub application: Application,
    /// Cached count after the increment, or `None` when the increment was dropped.
    pub applicant_count: Option<u32>,
}

impl SubmissionReceipt {
    pub fn counted(&self) -> bool {
        self.applicant_count.is_some()
    }
}

/// Persists applications and then bumps the cached count as a separate step.
pub struct ApplicationRecorder<S> {
    guard: Arc<IntakeGuard>,
    store: Arc<S>,
    counter: ApplicantCounter<S>,
}

impl<S> ApplicationRecorder<S>
where
    S: RecordStore + 'static,
{
    pub fn new(guard: Arc<IntakeGuard>, store: Arc<S>, counter: ApplicantCounter<S>) -> Self {
        Self {
            guard,
            store,
            counter,
        }
    }

    /// Validate, insert, then increment.
    ///
    /// Validation and lookup failures leave nothing behind. Once the insert commits the
    /// submission succeeds even if the increment fails; that failure is only logged.
    pub fn record(
        &self,
        opportunity_id: &OpportunityId,
        applicant_id: UserId,
        submission: ApplicationSubmission,
    ) -> Result<SubmissionReceipt, AccountingError> {
        let draft = self.guard.application_from_submission(submission)?;

        let opportunity = self
            .store
            .fetch_opportunity(opportunity_id)?
            .ok_or_else(|| AccountingError::NotFound(opportunity_id.clone()))?;
        if !opportunity.active {
            return Err(ValidationError::OpportunityClosed(opportunity.id).into());
        }

        let application = Application {
            id: next_application_id(),
            opportunity_id: opportunity.id,
            applicant_id,
            motivation: draft.motivation,
            resume: draft.resume,
            submitted_at: Utc::now(),
        };
        let stored = self.store.insert_application(application)?;
        info!(
            application_id = %stored.id,
            opportunity_id = %stored.opportunity_id,
            has_resume = stored.resume.is_some(),
            "application recorded"
        );

        let applicant_count = match self.counter.increment(&stored.opportunity_id) {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(
                    application_id = %stored.id,
                    opportunity_id = %stored.opportunity_id,
                    error = %err,
                    "applicant count not updated; left for reconciliation"
                );
                None
            }
        };

        Ok(SubmissionReceipt {
            application: stored,
            applicant_count,
        })
    }
}
