use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::checklist::ChecklistError;
use super::domain::{
    ApplicationId, ApplicationSubmission, EnrollmentType, ExaminationSubmission, ReviewDecision,
};
use super::legacy::LegacyApplicationRecord;
use super::repository::{ApplicationStore, ExaminationStore, StoreError};
use super::service::{ReviewServiceError, ScholarReviewService};

type SharedService<A, E> = State<Arc<ScholarReviewService<A, E>>>;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub application_ids: Vec<ApplicationId>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub application_ids: Vec<ApplicationId>,
    pub department: String,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistRequest {
    pub item: String,
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub department: String,
    pub enrollment_type: EnrollmentType,
}

/// Router builder exposing intake, workflow, and publication endpoints.
pub fn scholar_router<A, E>(service: Arc<ScholarReviewService<A, E>>) -> Router
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    Router::new()
        .route("/api/v1/scholars", post(intake_handler::<A, E>))
        .route("/api/v1/scholars/legacy", post(legacy_import_handler::<A, E>))
        .route("/api/v1/scholars/grouped", get(grouped_handler::<A, E>))
        .route("/api/v1/scholars/verified", get(verified_handler::<A, E>))
        .route("/api/v1/scholars/queries", get(queries_handler::<A, E>))
        .route("/api/v1/scholars/forward", post(forward_handler::<A, E>))
        .route("/api/v1/scholars/accept", post(accept_handler::<A, E>))
        .route("/api/v1/scholars/assign", post(assign_handler::<A, E>))
        .route(
            "/api/v1/scholars/return-to-coordinator",
            post(return_to_coordinator_handler::<A, E>),
        )
        .route(
            "/api/v1/scholars/return-to-director",
            post(return_to_director_handler::<A, E>),
        )
        .route(
            "/api/v1/scholars/:application_id",
            get(status_handler::<A, E>),
        )
        .route(
            "/api/v1/scholars/:application_id/decision",
            post(decision_handler::<A, E>),
        )
        .route(
            "/api/v1/scholars/:application_id/resubmit",
            post(resubmit_handler::<A, E>),
        )
        .route(
            "/api/v1/scholars/:application_id/checklist",
            post(checklist_handler::<A, E>),
        )
        .route("/api/v1/examinations", post(examination_handler::<A, E>))
        .route(
            "/api/v1/examinations/publish",
            post(publish_handler::<A, E>),
        )
        .with_state(service)
}

fn error_response(error: ReviewServiceError) -> Response {
    let status = match &error {
        ReviewServiceError::Transition(_) => StatusCode::CONFLICT,
        ReviewServiceError::ApplicationNotFound(_)
        | ReviewServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        ReviewServiceError::Store(StoreError::Conflict | StoreError::Stale(_)) => {
            StatusCode::CONFLICT
        }
        ReviewServiceError::Checklist(ChecklistError::Frozen) => StatusCode::LOCKED,
        ReviewServiceError::Checklist(ChecklistError::UnknownItem(_))
        | ReviewServiceError::Legacy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn intake_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.intake(submission) {
        Ok(record) => (StatusCode::ACCEPTED, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn legacy_import_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(record): Json<LegacyApplicationRecord>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.import_legacy(record) {
        Ok(record) => (StatusCode::CREATED, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<A, E>(
    State(service): SharedService<A, E>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn forward_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(request): Json<BatchRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.forward_to_coordinator(&request.application_ids) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn accept_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(request): Json<BatchRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.accept_pickup(&request.application_ids) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(request): Json<AssignRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.forward_to_department(&request.application_ids, &request.department) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn return_to_coordinator_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(request): Json<BatchRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.return_to_coordinator(&request.application_ids) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn return_to_director_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(request): Json<BatchRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.return_to_director(&request.application_ids) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<A, E>(
    State(service): SharedService<A, E>,
    Path(application_id): Path<String>,
    Json(decision): Json<ReviewDecision>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.record_decision(&ApplicationId(application_id), decision) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn resubmit_handler<A, E>(
    State(service): SharedService<A, E>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.resubmit(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn checklist_handler<A, E>(
    State(service): SharedService<A, E>,
    Path(application_id): Path<String>,
    Json(request): Json<ChecklistRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.update_checklist(
        &ApplicationId(application_id),
        &request.item,
        request.verified,
    ) {
        Ok(checklist) => (StatusCode::OK, Json(checklist)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn grouped_handler<A, E>(State(service): SharedService<A, E>) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.grouped() {
        Ok(grouped) => (StatusCode::OK, Json(grouped.summary())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verified_handler<A, E>(State(service): SharedService<A, E>) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.verified_scholars() {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queries_handler<A, E>(State(service): SharedService<A, E>) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.query_bucket() {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn examination_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(submission): Json<ExaminationSubmission>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.record_examination(submission) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn publish_handler<A, E>(
    State(service): SharedService<A, E>,
    Json(request): Json<PublishRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    E: ExaminationStore + 'static,
{
    match service.publish_department(&request.department, request.enrollment_type) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}
