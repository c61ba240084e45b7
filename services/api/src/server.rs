use crate::cli::ServeArgs;
use crate::infra::{accounting_service, AppState};
use crate::routes::with_accounting_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use startup_connect::config::AppConfig;
use startup_connect::error::AppError;
use startup_connect::telemetry;
use startup_connect::workflows::applicants::InMemoryRecordStore;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryRecordStore::new());
    let service = Arc::new(accounting_service(store, &config.intake));

    let app = with_accounting_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_resume_bytes = config.intake.max_resume_bytes,
        "applicant accounting service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
