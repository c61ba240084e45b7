use crate::infra::accounting_service;
use clap::Args;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use startup_connect::config::AppConfig;
use startup_connect::error::AppError;
use startup_connect::workflows::applicants::{
    Application, ApplicationSubmission, Compensation, CompensationKind, InMemoryRecordStore,
    Opportunity, OpportunityDraft, OpportunityId, OpportunityKind, RecordStore, StoreError,
    UserId,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of applications to submit against the demo opportunity.
    #[arg(long, default_value_t = 3)]
    pub(crate) submissions: usize,
    /// Simulate a store timeout on every Nth count update.
    #[arg(long)]
    pub(crate) drop_every: Option<usize>,
    /// Print reports as JSON instead of text.
    #[arg(long)]
    pub(crate) json: bool,
}

/// In-memory store that times out on every Nth applicant-count write while the
/// simulated outage lasts.
struct LossyCountStore {
    inner: InMemoryRecordStore,
    drop_every: Option<usize>,
    count_writes: AtomicUsize,
    outage: AtomicBool,
}

impl LossyCountStore {
    fn new(drop_every: Option<usize>) -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            drop_every,
            count_writes: AtomicUsize::new(0),
            outage: AtomicBool::new(true),
        }
    }

    fn end_outage(&self) {
        self.outage.store(false, Ordering::SeqCst);
    }
}

impl RecordStore for LossyCountStore {
    fn insert_opportunity(&self, opportunity: Opportunity) -> Result<Opportunity, StoreError> {
        self.inner.insert_opportunity(opportunity)
    }

    fn fetch_opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, StoreError> {
        self.inner.fetch_opportunity(id)
    }

    fn active_opportunities(&self) -> Result<Vec<Opportunity>, StoreError> {
        self.inner.active_opportunities()
    }

    fn set_applicant_count(&self, id: &OpportunityId, count: u32) -> Result<(), StoreError> {
        let write = self.count_writes.fetch_add(1, Ordering::Relaxed) + 1;
        if self.outage.load(Ordering::SeqCst)
            && matches!(self.drop_every, Some(every) if every > 0 && write % every == 0) {
            return Err(StoreError::Unavailable("statement timeout".to_string()));
        }
        self.inner.set_applicant_count(id, count)
    }

    fn set_active(&self, id: &OpportunityId, active: bool) -> Result<(), StoreError> {
        self.inner.set_active(id, active)
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        self.inner.insert_application(application)
    }

    fn count_applications(&self, opportunity_id: &OpportunityId) -> Result<u32, StoreError> {
        self.inner.count_applications(opportunity_id)
    }

    fn applications_for(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<Application>, StoreError> {
        self.inner.applications_for(opportunity_id)
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        submissions,
        drop_every,
        json,
    } = args;

    let store = Arc::new(LossyCountStore::new(drop_every));
    let config = AppConfig::load()?;
    let service = accounting_service(Arc::clone(&store), &config.intake);

    println!("Applicant accounting demo");
    let opportunity = service.post_opportunity(
        UserId("founder-demo".to_string()),
        OpportunityDraft {
            title: "Founding engineer intern".to_string(),
            description: "Ship the first version of our scheduling product.".to_string(),
            kind: OpportunityKind::Internship,
            location: Some("Remote".to_string()),
            remote_friendly: true,
            compensation: Some(Compensation {
                kind: CompensationKind::Paid,
                amount: Some(25.0),
            }),
        },
    )?;
    println!(
        "Posted {} '{}' (applicant_count = {})",
        opportunity.id, opportunity.title, opportunity.applicant_count
    );

    let rejected = service.submit(
        &opportunity.id,
        UserId("student-blank".to_string()),
        ApplicationSubmission {
            motivation: "   ".to_string(),
            resume: None,
        },
    );
    if let Err(err) = rejected {
        println!("Blank submission rejected: {err}");
    }

    for n in 1..=submissions {
        let receipt = service.submit(
            &opportunity.id,
            UserId(format!("student-{n}")),
            ApplicationSubmission {
                motivation: format!("Applicant {n} would love to help ship v1."),
                resume: None,
            },
        )?;
        match receipt.applicant_count {
            Some(count) => println!(
                "  {} recorded, cached count now {}",
                receipt.application.id, count
            ),
            None => println!(
                "  {} recorded, count update dropped",
                receipt.application.id
            ),
        }
    }

    store.end_outage();

    let report = service.verify()?;
    if json {
        print_json("verify", &report);
    } else if report.mismatches.is_empty() {
        println!("\nVerify: all {} opportunities in sync", report.checked.len());
    } else {
        println!("\nVerify: {} mismatch(es)", report.mismatches.len());
        for mismatch in &report.mismatches {
            println!(
                "  {} cached {} actual {} ({:+})",
                mismatch.opportunity_id,
                mismatch.cached_count,
                mismatch.actual_count,
                mismatch.difference
            );
        }
    }

    let sync = service.sync_all()?;
    if json {
        print_json("sync", &sync);
    } else {
        println!(
            "\nSync: {} corrected, {} already in sync, {} failed",
            sync.corrected.len(),
            sync.in_sync.len(),
            sync.failures.len()
        );
        for failure in &sync.failures {
            println!("  {} skipped: {}", failure.opportunity_id, failure.reason);
        }
    }

    let stats = service.stats(&opportunity.id)?;
    if json {
        print_json("stats", &stats);
    } else {
        println!(
            "Stats: cached {} live {} (in sync: {})",
            stats.cached_count,
            stats.live_count,
            stats.in_sync()
        );
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(label: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(body) => println!("\n{label}:\n{body}"),
        Err(err) => println!("\n{label}: unavailable ({err})"),
    }
}
