use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{ApplicationSubmission, OpportunityDraft, OpportunityId, UserId};
use super::repository::RecordStore;
use super::service::{AccountingError, AccountingService};

/// Header carrying the authenticated user's id, set by the upstream auth layer.
pub const USER_HEADER: &str = "x-user-id";

/// Allowance for the motivation text, data-URL header, and JSON framing.
const SUBMISSION_HEADROOM_BYTES: usize = 64 * 1024;

/// Request body ceiling for application submissions.
///
/// Admits base64 resumes up to twice the decoded ceiling so an oversized upload
/// reaches intake validation and is answered with a field-level error.
pub fn submission_body_limit(max_resume_bytes: usize) -> usize {
    max_resume_bytes
        .saturating_mul(2)
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(SUBMISSION_HEADROOM_BYTES)
}

/// Router builder exposing opportunity, application, and count maintenance endpoints.
pub fn accounting_router<S>(service: Arc<AccountingService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    let body_limit = submission_body_limit(service.policy().max_resume_bytes());

    Router::new()
        .route("/api/v1/opportunities", post(post_opportunity_handler::<S>))
        .route(
            "/api/v1/opportunities/:opportunity_id",
            get(opportunity_handler::<S>).delete(deactivate_handler::<S>),
        )
        .route(
            "/api/v1/opportunities/:opportunity_id/applications",
            post(submit_handler::<S>)
                .get(applications_handler::<S>)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/v1/opportunities/:opportunity_id/stats",
            get(stats_handler::<S>),
        )
        .route(
            "/api/v1/maintenance/applicant-counts",
            get(verify_handler::<S>),
        )
        .route(
            "/api/v1/maintenance/applicant-counts/sync",
            post(sync_handler::<S>),
        )
        .route(
            "/api/v1/maintenance/applicant-counts/:opportunity_id/resolve",
            post(resolve_handler::<S>),
        )
        .with_state(service)
}

pub(crate) fn status_for(err: &AccountingError) -> StatusCode {
    match err {
        AccountingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AccountingError::NotFound(_) => StatusCode::NOT_FOUND,
        AccountingError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        AccountingError::PartialFailure { .. } => StatusCode::MULTI_STATUS,
    }
}

pub(crate) fn error_response(err: AccountingError) -> Response {
    let status = status_for(&err);
    let payload = match &err {
        AccountingError::Validation(validation) => json!({
            "error": validation.to_string(),
            "field": validation.field(),
        }),
        AccountingError::NotFound(_) => json!({ "error": err.to_string() }),
        AccountingError::Storage(source) => {
            error!(error = %source, "record store call failed");
            json!({ "error": "service temporarily unavailable, please try again" })
        }
        AccountingError::PartialFailure { succeeded, failed } => json!({
            "error": err.to_string(),
            "succeeded": succeeded,
            "failed": failed,
        }),
    };
    (status, Json(payload)).into_response()
}

fn acting_user(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
}

fn unauthenticated() -> Response {
    let payload = json!({ "error": "sign in to continue" });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

pub(crate) async fn post_opportunity_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
    headers: HeaderMap,
    Json(draft): Json<OpportunityDraft>,
) -> Response
where
    S: RecordStore + 'static,
{
    let Some(user) = acting_user(&headers) else {
        return unauthenticated();
    };

    match service.post_opportunity(user, draft) {
        Ok(opportunity) => (StatusCode::CREATED, Json(opportunity)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn opportunity_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
    Path(opportunity_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.opportunity(&OpportunityId(opportunity_id)) {
        Ok(opportunity) => (StatusCode::OK, Json(opportunity)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn deactivate_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
    headers: HeaderMap,
    Path(opportunity_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    if acting_user(&headers).is_none() {
        return unauthenticated();
    }

    match service.deactivate_opportunity(&OpportunityId(opportunity_id)) {
        Ok(opportunity) => (StatusCode::OK, Json(opportunity)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
    headers: HeaderMap,
    Path(opportunity_id): Path<String>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    S: RecordStore + 'static,
{
    let Some(user) = acting_user(&headers) else {
        return unauthenticated();
    };

    match service.submit(&OpportunityId(opportunity_id), user, submission) {
        Ok(receipt) => {
            let payload = json!({
                "application": receipt.application.summary(),
                "applicant_count": receipt.applicant_count,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn applications_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
    Path(opportunity_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.applications(&OpportunityId(opportunity_id)) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn stats_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
    Path(opportunity_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.stats(&OpportunityId(opportunity_id)) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn verify_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.verify() {
        Ok(report) => {
            let status = if report.is_partial() {
                StatusCode::MULTI_STATUS
            } else {
                StatusCode::OK
            };
            (status, Json(report)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sync_handler<S>(State(service): State<Arc<AccountingService<S>>>) -> Response
where
    S: RecordStore + 'static,
{
    match service.sync_all() {
        Ok(report) => {
            let status = if report.is_partial() {
                StatusCode::MULTI_STATUS
            } else {
                StatusCode::OK
            };
            (status, Json(report)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resolve_handler<S>(
    State(service): State<Arc<AccountingService<S>>>,
    Path(opportunity_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.resolve_one(&OpportunityId(opportunity_id)) {
        Ok(correction) => (StatusCode::OK, Json(correction)).into_response(),
        Err(err) => error_response(err),
    }
}
