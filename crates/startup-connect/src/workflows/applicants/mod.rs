//! Application recording and applicant-count accounting.
//!
//! Submissions flow recorder → best-effort counter increment; the reconciler runs on
//! demand to find and repair any cached count that no longer matches the records.

pub mod counter;
pub mod domain;
pub mod intake;
pub mod memory;
pub mod reconciler;
pub mod recorder;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use counter::ApplicantCounter;
pub use domain::{
    Application, ApplicationId, ApplicationStats, ApplicationSubmission, ApplicationSummary,
    Compensation, CompensationKind, Opportunity, OpportunityDraft, OpportunityId,
    OpportunityKind, ResumeAttachment, ResumeSummary, UserId,
};
pub use intake::{IntakeGuard, IntakePolicy, ValidationError};
pub use memory::InMemoryRecordStore;
pub use reconciler::{
    CountCorrection, CountMismatch, CountReconciler, ReconcileFailure, SyncReport,
    VerificationReport,
};
pub use recorder::{ApplicationRecorder, SubmissionReceipt};
pub use repository::{RecordStore, StoreError};
pub use router::{accounting_router, submission_body_limit, USER_HEADER};
pub use service::{AccountingError, AccountingService};
