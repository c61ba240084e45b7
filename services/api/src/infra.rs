use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use startup_connect::config::IntakeConfig;
use startup_connect::workflows::applicants::{AccountingService, RecordStore};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn accounting_service<S>(store: Arc<S>, intake: &IntakeConfig) -> AccountingService<S>
where
    S: RecordStore + 'static,
{
    AccountingService::new(store, intake.policy())
}
