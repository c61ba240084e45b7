use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::workflows::applicants::domain::{
    Application, ApplicationSubmission, Compensation, CompensationKind, Opportunity,
    OpportunityDraft, OpportunityId, OpportunityKind, UserId,
};
use crate::workflows::applicants::intake::IntakePolicy;
use crate::workflows::applicants::memory::InMemoryRecordStore;
use crate::workflows::applicants::repository::{RecordStore, StoreError};
use crate::workflows::applicants::service::AccountingService;

pub(super) fn poster() -> UserId {
    UserId("founder-1".to_string())
}

pub(super) fn student(n: usize) -> UserId {
    UserId(format!("student-{n}"))
}

pub(super) fn draft() -> OpportunityDraft {
    OpportunityDraft {
        title: "  Backend Intern  ".to_string(),
        description: "Help us build the matching engine.".to_string(),
        kind: OpportunityKind::Internship,
        location: Some("Austin, TX".to_string()),
        remote_friendly: true,
        compensation: Some(Compensation {
            kind: CompensationKind::Stipend,
            amount: Some(1500.0),
        }),
    }
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        motivation: "I have shipped two Rust services and want to learn from founders."
            .to_string(),
        resume: None,
    }
}

pub(super) fn resume_data_url(mime_type: &str, size: usize) -> String {
    let body = STANDARD.encode(vec![b'%'; size]);
    format!("data:{mime_type};base64,{body}")
}

pub(super) fn submission_with_resume(size: usize) -> ApplicationSubmission {
    ApplicationSubmission {
        resume: Some(resume_data_url("application/pdf", size)),
        ..submission()
    }
}

pub(super) fn build_service() -> (
    AccountingService<InMemoryRecordStore>,
    Arc<InMemoryRecordStore>,
) {
    let store = Arc::new(InMemoryRecordStore::new());
    let service = AccountingService::new(store.clone(), IntakePolicy::default());
    (service, store)
}

pub(super) fn build_flaky_service() -> (AccountingService<FlakyStore>, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::default());
    let service = AccountingService::new(store.clone(), IntakePolicy::default());
    (service, store)
}

pub(super) fn cached_count<S: RecordStore>(store: &S, id: &OpportunityId) -> u32 {
    store
        .fetch_opportunity(id)
        .expect("fetch succeeds")
        .expect("opportunity present")
        .applicant_count
}

/// Wraps the in-memory store and fails chosen calls on demand.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryRecordStore,
    pub(super) fail_inserts: AtomicBool,
    pub(super) fail_count_writes: AtomicBool,
    pub(super) fail_listing: AtomicBool,
    pub(super) failing_counts: Mutex<HashSet<OpportunityId>>,
    pub(super) count_writes: AtomicUsize,
}

impl FlakyStore {
    pub(super) fn fail_counts_for(&self, id: &OpportunityId) {
        self.failing_counts
            .lock()
            .expect("flaky mutex poisoned")
            .insert(id.clone());
    }

    fn offline() -> StoreError {
        StoreError::Unavailable("database offline".to_string())
    }
}

impl RecordStore for FlakyStore {
    fn insert_opportunity(&self, opportunity: Opportunity) -> Result<Opportunity, StoreError> {
        self.inner.insert_opportunity(opportunity)
    }

    fn fetch_opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, StoreError> {
        self.inner.fetch_opportunity(id)
    }

    fn active_opportunities(&self) -> Result<Vec<Opportunity>, StoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.inner.active_opportunities()
    }

    fn set_applicant_count(&self, id: &OpportunityId, count: u32) -> Result<(), StoreError> {
        if self.fail_count_writes.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.count_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_applicant_count(id, count)
    }

    fn set_active(&self, id: &OpportunityId, active: bool) -> Result<(), StoreError> {
        self.inner.set_active(id, active)
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.inner.insert_application(application)
    }

    fn count_applications(&self, opportunity_id: &OpportunityId) -> Result<u32, StoreError> {
        if self
            .failing_counts
            .lock()
            .expect("flaky mutex poisoned")
            .contains(opportunity_id)
        {
            return Err(Self::offline());
        }
        self.inner.count_applications(opportunity_id)
    }

    fn applications_for(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<Application>, StoreError> {
        self.inner.applications_for(opportunity_id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
