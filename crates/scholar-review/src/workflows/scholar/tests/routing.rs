use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::scholar::directory::FacultyDirectory;
use crate::workflows::scholar::domain::Mark;
use crate::workflows::scholar::router;
use crate::workflows::scholar::ScholarReviewService;

fn post_json(uri: &str, body: Value) -> Request<axum::body::Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn intake_route_returns_legacy_status_fields() {
    let (service, _, _) = build_service();
    let app = router_with_service(service);

    let response = app
        .oneshot(post_json(
            "/api/v1/scholars",
            json!({
                "application_no": "APP-200",
                "scholar_name": "Meera K",
                "program_text": BIOMEDICAL_PROGRAM
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["state"], "uploaded");
    assert_eq!(payload["currentOwner"], "director");
    assert_eq!(payload["status"], "uploaded");
    assert_eq!(payload["department_name"], "Biomedical Engineering");
    assert_eq!(payload["enrollment_type"], "Part Time Internal");
    assert_eq!(payload["checklist_complete"], false);
}

#[tokio::test]
async fn status_handler_returns_not_found_for_unknown_ids() {
    let (service, _, _) = build_service();
    let response = router::status_handler::<MemoryApplicationStore, MemoryExaminationStore>(
        State(Arc::new(service)),
        Path("sch-unknown".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn forward_route_reports_applied_and_refused() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let record = service
        .intake(submission("APP-201", BIOMEDICAL_PROGRAM))
        .expect("intake");
    let app = crate::workflows::scholar::scholar_router(service.clone());

    let body = json!({ "application_ids": [record.id.0.clone(), "sch-ghost"] });
    let response = app
        .clone()
        .oneshot(post_json("/api/v1/scholars/forward", body.clone()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["transition"], "forward_to_coordinator");
    assert_eq!(payload["applied"], json!([record.id.0.clone()]));
    assert_eq!(payload["missing"], json!(["sch-ghost"]));

    let repeat = app
        .oneshot(post_json("/api/v1/scholars/forward", body))
        .await
        .expect("route executes");
    let payload = read_json_body(repeat).await;
    assert_eq!(payload["applied"], json!([]));
    assert_eq!(
        payload["refused"][0]["from_state"],
        "awaiting_coordinator_pickup"
    );
}

#[tokio::test]
async fn decision_on_uploaded_record_conflicts() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let record = service
        .intake(submission("APP-202", BIOMEDICAL_PROGRAM))
        .expect("intake");

    let response = crate::workflows::scholar::scholar_router(service)
        .oneshot(post_json(
            &format!("/api/v1/scholars/{}/decision", record.id),
            json!({ "decision": "approved" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("record is not with a department"));
}

#[tokio::test]
async fn department_review_round_trip_over_http() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let id = with_department(&service, "APP-203");
    let app = crate::workflows::scholar::scholar_router(service);

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/scholars/{id}/decision"),
            json!({ "decision": "queried", "question": "Attach the NOC" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["currentOwner"], "department");
    assert_eq!(payload["status"], "FORWARDED_TO_BME");
    assert_eq!(payload["deptReview"], "Query: Attach the NOC");

    let ids = json!({ "application_ids": [id.0.clone()] });
    for uri in [
        "/api/v1/scholars/return-to-coordinator",
        "/api/v1/scholars/return-to-director",
    ] {
        let response = app
            .clone()
            .oneshot(post_json(uri, ids.clone()))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let queries = app
        .oneshot(
            Request::get("/api/v1/scholars/queries")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let payload = read_json_body(queries).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["facultyForward"], "Back_To_Director");
}

#[tokio::test]
async fn checklist_errors_map_to_client_statuses() {
    let (service, applications, _) = build_service();
    let service = Arc::new(service);
    let record = service
        .intake(submission("APP-204", CHEMISTRY_PROGRAM))
        .expect("intake");
    let app = crate::workflows::scholar::scholar_router(service);
    let uri = format!("/api/v1/scholars/{}/checklist", record.id);

    let unknown = app
        .clone()
        .oneshot(post_json(&uri, json!({ "item": "passport", "verified": true })))
        .await
        .expect("route executes");
    assert_eq!(unknown.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let updated = app
        .clone()
        .oneshot(post_json(
            &uri,
            json!({ "item": "identity_proof", "verified": true }),
        ))
        .await
        .expect("route executes");
    assert_eq!(updated.status(), StatusCode::OK);
    let payload = read_json_body(updated).await;
    assert_eq!(payload["identity_proof"]["status"], "verified");
    assert_eq!(payload["identity_proof"]["type"], "mandatory");

    applications.confirm_eligibility(&record.id);
    let frozen = app
        .oneshot(post_json(
            &uri,
            json!({ "item": "mark_sheets", "verified": true }),
        ))
        .await
        .expect("route executes");
    assert_eq!(frozen.status(), StatusCode::LOCKED);
}

#[tokio::test]
async fn checklist_write_over_a_newer_update_conflicts() {
    let (service, applications, _) = build_service();
    let service = Arc::new(service);
    let record = service
        .intake(submission("APP-204A", CHEMISTRY_PROGRAM))
        .expect("intake");
    let app = crate::workflows::scholar::scholar_router(service);
    let uri = format!("/api/v1/scholars/{}/checklist", record.id);

    applications.freeze_reads();
    let first = app
        .clone()
        .oneshot(post_json(
            &uri,
            json!({ "item": "application_form", "verified": true }),
        ))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json(
            &uri,
            json!({ "item": "identity_proof", "verified": true }),
        ))
        .await
        .expect("route executes");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn legacy_import_route_accepts_exported_records() {
    let (service, _, _) = build_service();
    let app = router_with_service(service);

    let imported = app
        .clone()
        .oneshot(post_json(
            "/api/v1/scholars/legacy",
            json!({
                "applicationNo": "APP-205",
                "scholarName": "Imported Scholar",
                "program": CHEMISTRY_PROGRAM,
                "currentOwner": "research_coordinator",
                "status": "FORWARDED_TO_CHEM",
                "facultyForward": "Back_To_RC",
                "deptReview": "Query: Upload the NOC"
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(imported.status(), StatusCode::CREATED);
    let payload = read_json_body(imported).await;
    assert_eq!(payload["state"], "returned_to_coordinator");
    assert_eq!(payload["facultyForward"], "Back_To_RC");
    assert_eq!(payload["deptReview"], "Query: Upload the NOC");

    let rejected = app
        .oneshot(post_json(
            "/api/v1/scholars/legacy",
            json!({
                "applicationNo": "APP-206",
                "scholarName": "Broken Scholar",
                "program": CHEMISTRY_PROGRAM,
                "currentOwner": "registrar",
                "status": "uploaded"
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn publish_route_returns_rank_list() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service
        .record_examination(exam_submission(
            "E-20",
            "Chemistry",
            Mark::Score(40.0),
            Mark::Absent,
        ))
        .expect("stored");
    let app = crate::workflows::scholar::scholar_router(service);

    let response = app
        .oneshot(post_json(
            "/api/v1/examinations/publish",
            json!({ "department": "Chemistry", "enrollment_type": "FullTime" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["marker"], "Published_To_CHEM");
    assert_eq!(payload["already_published"], false);
    assert_eq!(payload["ranked"][0]["interview"], "Ab");
    assert_eq!(payload["ranked"][0]["total"], 40);
    assert_eq!(payload["ranked"][0]["partial_absence"], true);
}

#[tokio::test]
async fn examination_route_accepts_absent_marks() {
    let (service, _, examinations) = build_service();
    let app = router_with_service(service);

    let response = app
        .oneshot(post_json(
            "/api/v1/examinations",
            json!({
                "application_no": "E-21",
                "scholar_name": "Ravi P",
                "department_name": "Physics",
                "written": "Ab",
                "interview": 32.5
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = examinations.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].written, Mark::Absent);
    assert_eq!(stored[0].interview, Mark::Score(32.5));
}

#[tokio::test]
async fn grouped_route_lists_every_faculty() {
    let (service, _, _) = build_service();
    let app = router_with_service(service);

    let response = app
        .oneshot(
            Request::get("/api/v1/scholars/grouped")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["faculties"].as_array().map(Vec::len),
        Some(FacultyDirectory::standard().faculties.len())
    );
    assert_eq!(payload["assigned"], 0);
}

#[tokio::test]
async fn store_outage_is_internal_error() {
    let service = Arc::new(ScholarReviewService::new(
        Arc::new(UnavailableStore),
        Arc::new(UnavailableStore),
        FacultyDirectory::standard(),
    ));

    let response = router::verified_handler::<UnavailableStore, UnavailableStore>(State(service))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
