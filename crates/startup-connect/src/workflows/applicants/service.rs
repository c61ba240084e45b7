use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::counter::ApplicantCounter;
use super::domain::{
    ApplicationStats, ApplicationSubmission, ApplicationSummary, Opportunity, OpportunityDraft,
    OpportunityId, UserId,
};
use super::intake::{IntakeGuard, IntakePolicy, ValidationError};
use super::reconciler::{
    CountCorrection, CountReconciler, ReconcileFailure, SyncReport, VerificationReport,
};
use super::recorder::{ApplicationRecorder, SubmissionReceipt};
use super::repository::{RecordStore, StoreError};

static OPPORTUNITY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_opportunity_id() -> OpportunityId {
    let id = OPPORTUNITY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OpportunityId(format!("opp-{id:06}"))
}

/// Facade composing intake validation, the recorder, the counter, and the reconciler
/// over one record store.
pub struct AccountingService<S> {
    guard: Arc<IntakeGuard>,
    store: Arc<S>,
    recorder: ApplicationRecorder<S>,
    counter: ApplicantCounter<S>,
    reconciler: CountReconciler<S>,
}

impl<S> AccountingService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>, policy: IntakePolicy) -> Self {
        let guard = Arc::new(IntakeGuard::with_policy(policy));
        let counter = ApplicantCounter::new(Arc::clone(&store));
        let recorder =
            ApplicationRecorder::new(Arc::clone(&guard), Arc::clone(&store), counter.clone());
        let reconciler = CountReconciler::new(Arc::clone(&store));

        Self {
            guard,
            store,
            recorder,
            counter,
            reconciler,
        }
    }

    pub fn policy(&self) -> &IntakePolicy {
        self.guard.policy()
    }

    /// Publish a new opportunity with an empty applicant count.
    pub fn post_opportunity(
        &self,
        created_by: UserId,
        draft: OpportunityDraft,
    ) -> Result<Opportunity, AccountingError> {
        let draft = self.guard.opportunity_from_draft(draft)?;
        let now = Utc::now();
        let opportunity = Opportunity {
            id: next_opportunity_id(),
            title: draft.title,
            description: draft.description,
            kind: draft.kind,
            location: draft.location,
            remote_friendly: draft.remote_friendly,
            compensation: draft.compensation,
            applicant_count: 0,
            created_by,
            active: true,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_opportunity(opportunity)?;
        info!(opportunity_id = %stored.id, kind = ?stored.kind, "opportunity posted");
        Ok(stored)
    }

    pub fn opportunity(&self, id: &OpportunityId) -> Result<Opportunity, AccountingError> {
        self.store
            .fetch_opportunity(id)?
            .ok_or_else(|| AccountingError::NotFound(id.clone()))
    }

    /// Soft delete: the opportunity stops taking applications and drops out of
    /// reconciliation runs, but keeps its records.
    pub fn deactivate_opportunity(
        &self,
        id: &OpportunityId,
    ) -> Result<Opportunity, AccountingError> {
        self.store.set_active(id, false)?;
        info!(opportunity_id = %id, "opportunity deactivated");
        self.opportunity(id)
    }

    pub fn submit(
        &self,
        opportunity_id: &OpportunityId,
        applicant_id: UserId,
        submission: ApplicationSubmission,
    ) -> Result<SubmissionReceipt, AccountingError> {
        self.recorder
            .record(opportunity_id, applicant_id, submission)
    }

    pub fn applications(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<ApplicationSummary>, AccountingError> {
        self.opportunity(opportunity_id)?;
        let mut applications = self.store.applications_for(opportunity_id)?;
        applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(applications.iter().map(|application| application.summary()).collect())
    }

    /// Count straight from the application records, bypassing the cache.
    pub fn live_count(&self, opportunity_id: &OpportunityId) -> Result<u32, AccountingError> {
        self.opportunity(opportunity_id)?;
        Ok(self.store.count_applications(opportunity_id)?)
    }

    pub fn stats(&self, opportunity_id: &OpportunityId) -> Result<ApplicationStats, AccountingError> {
        let opportunity = self.opportunity(opportunity_id)?;
        let applications = self.store.applications_for(opportunity_id)?;

        let with_resume = applications
            .iter()
            .filter(|application| application.resume.is_some())
            .count();
        let latest_submission_at = applications
            .iter()
            .map(|application| application.submitted_at)
            .max();

        Ok(ApplicationStats {
            opportunity_id: opportunity.id,
            cached_count: opportunity.applicant_count,
            live_count: u32::try_from(applications.len()).unwrap_or(u32::MAX),
            with_resume: u32::try_from(with_resume).unwrap_or(u32::MAX),
            latest_submission_at,
        })
    }

    pub fn increment(&self, opportunity_id: &OpportunityId) -> Result<u32, AccountingError> {
        self.counter.increment(opportunity_id)
    }

    pub fn recount(&self, opportunity_id: &OpportunityId) -> Result<u32, AccountingError> {
        self.counter.recount(opportunity_id)
    }

    pub fn verify(&self) -> Result<VerificationReport, AccountingError> {
        self.reconciler.verify()
    }

    pub fn sync_all(&self) -> Result<SyncReport, AccountingError> {
        self.reconciler.sync_all()
    }

    pub fn resolve_one(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<CountCorrection, AccountingError> {
        self.reconciler.resolve_one(opportunity_id)
    }
}

/// Error raised by the accounting service.
#[derive(Debug, thiserror::Error)]
pub enum AccountingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("opportunity {0} not found")]
    NotFound(OpportunityId),
    #[error("storage unavailable")]
    Storage(#[source] StoreError),
    #[error("{} opportunities could not be processed", .failed.len())]
    PartialFailure {
        succeeded: Vec<OpportunityId>,
        failed: Vec<ReconcileFailure>,
    },
}

impl AccountingError {
    /// Safe to repeat without risking a duplicate side effect.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AccountingError::Storage(_) | AccountingError::PartialFailure { .. }
        )
    }
}

impl From<StoreError> for AccountingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::MissingOpportunity(id) => AccountingError::NotFound(id),
            other => AccountingError::Storage(other),
        }
    }
}
