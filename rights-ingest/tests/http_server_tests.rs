//! HTTP Server & Routing Integration Tests
//!
//! Requests go through the full router with `oneshot`; external services are
//! replaced by the doubles in `helpers`.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use helpers::{
    complete_release, flat_record, test_app_state, test_app_state_with, variant_release,
    MockRegistrar, MockUploader,
};
use rights_ingest::api::submission::SubmitResponse;
use rights_ingest::{build_router, MAX_BODY_BYTES};
use rights_ingest::services::UploadTarget;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = test_app_state().await;
    let app = build_router(state);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "rights-ingest");
    assert_eq!(json["active_submissions"], 0);
    assert!(json.get("last_error").is_none());
}

#[tokio::test]
async fn test_submit_accepts_and_returns_socket_endpoint() {
    let state = test_app_state().await;
    let app = build_router(state.clone());

    let response = app
        .oneshot(post_json("/metadata", &complete_release()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body: SubmitResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert!(body.success);
    assert_eq!(
        body.ws_endpoint,
        format!("ws://localhost:5730/ws?submissionId={}", body.submission_id)
    );
    assert!(state.registry.contains(body.submission_id));
}

#[tokio::test]
async fn test_submit_rejects_non_object_body() {
    let state = test_app_state().await;

    let response = build_router(state.clone())
        .oneshot(post_json("/metadata", &json!(["a", "b"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");

    let malformed = Request::builder()
        .method("POST")
        .uri("/metadata")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = build_router(state.clone()).oneshot(malformed).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let state = test_app_state().await;
    let padding = "x".repeat(MAX_BODY_BYTES);

    let response = build_router(state.clone())
        .oneshot(post_json("/metadata", &json!({ "padding": padding })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(state.registry.is_empty());

    // Large but within the limit
    let mut raw = complete_release();
    raw["notes"] = json!("x".repeat(MAX_BODY_BYTES / 2));
    let response = build_router(state)
        .oneshot(post_json("/metadata/validate", &raw))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_incomplete_submission_snapshot_and_events() {
    let state = test_app_state().await;

    let response = build_router(state.clone())
        .oneshot(post_json("/metadata", &flat_record()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: SubmitResponse = serde_json::from_value(body_json(response).await).unwrap();
    let id = body.submission_id;

    let response = build_router(state.clone())
        .oneshot(get(&format!("/metadata/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["submissionId"], id.to_string());
    assert_eq!(snapshot["stage"], "Incomplete");
    assert_eq!(snapshot["percentage"], 100);
    assert_eq!(snapshot["outcome"]["status"], "incomplete");
    assert!(snapshot["outcome"]["missingFields"]
        .as_array()
        .unwrap()
        .contains(&json!("release.upc")));
    assert_eq!(snapshot["canonical"]["release"]["title"], "Midnight");

    let response = build_router(state.clone())
        .oneshot(get(&format!("/metadata/{}/events", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let events = body_json(response).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0]["type"], "progress");
    assert_eq!(events[0]["sequence"], 1);
    assert_eq!(events[3]["type"], "incomplete");
}

fn patch_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_amend_incomplete_submission_until_valid() {
    let state = test_app_state().await;
    let id = state.orchestrator.submit(flat_record()).submission_id();
    let uri = format!("/metadata/{}", id);

    // Single update: one gap closed, the rest still reported
    let response = build_router(state.clone())
        .oneshot(patch_json(&uri, &json!({"path": "release.upc", "value": 123456789012u64})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "INCOMPLETE");
    assert_eq!(json["metadata"]["release"]["upc"], "123456789012");
    let missing = json["missingFields"].as_array().unwrap();
    assert!(!missing.contains(&json!("release.upc")));
    assert!(missing.contains(&json!("submitter.role")));

    // Batch closes every remaining gap
    let batch = json!([
        {"path": "release.type", "value": "single"},
        {"path": "release.releaseDate", "value": "2024-08-15"},
        {"path": "release.tracks[0].composition.writers", "value": [{"name": "Ann", "split": 100}]},
        {"path": "release.tracks[0].recording.performers", "value": [{"name": "Nina", "split": 100}]},
        {"path": "submitter.role", "value": "Artist"}
    ]);
    let response = build_router(state.clone())
        .oneshot(patch_json(&uri, &batch))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "VALID", "{}", json);
    assert_eq!(json["missingFields"], json!([]));
    assert_eq!(json["formatErrors"], json!([]));
    assert_eq!(json["updated"].as_array().unwrap().len(), 5);
    assert!(json["registrationGaps"]
        .as_array()
        .unwrap()
        .contains(&json!("submitter.walletAddress")));

    let snapshot = state.registry.snapshot(id).unwrap();
    assert_eq!(snapshot.amendments.len(), 6);
    assert_eq!(snapshot.canonical.unwrap().submitter.role, "Artist");
}

#[tokio::test]
async fn test_amend_rejections() {
    let state = test_app_state().await;
    let incomplete = state.orchestrator.submit(flat_record()).submission_id();

    let cases = [
        (json!({"path": "release.title.main", "value": "x"}), StatusCode::BAD_REQUEST),
        (json!({"path": "release.mood", "value": "calm"}), StatusCode::BAD_REQUEST),
        (json!({"path": "release.tracks", "value": "none"}), StatusCode::BAD_REQUEST),
        (json!([]), StatusCode::BAD_REQUEST),
        (json!({"value": 1}), StatusCode::BAD_REQUEST),
    ];
    for (body, status) in cases {
        let response = build_router(state.clone())
            .oneshot(patch_json(&format!("/metadata/{}", incomplete), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), status, "{}", body);
    }
    assert!(state.registry.snapshot(incomplete).unwrap().amendments.is_empty());

    let response = build_router(state.clone())
        .oneshot(patch_json(
            &format!("/metadata/{}", Uuid::new_v4()),
            &json!({"path": "release.upc", "value": "123456789012"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A submission that went on to registration cannot be amended
    let handle = state.orchestrator.submit(complete_release());
    let registered = handle.submission_id();
    handle.wait().await;
    let response = build_router(state)
        .oneshot(patch_json(
            &format!("/metadata/{}", registered),
            &json!({"path": "release.upc", "value": "123456789012"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_unknown_submission_is_404() {
    let state = test_app_state().await;
    let id = Uuid::new_v4();

    for uri in [format!("/metadata/{}", id), format!("/metadata/{}/events", id)] {
        let response = build_router(state.clone()).oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    let response = build_router(state)
        .oneshot(post_json(&format!("/metadata/{}/cancel", id), &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_finished_submission() {
    let state = test_app_state().await;
    let handle = state.orchestrator.submit(flat_record());
    let id = handle.submission_id();

    let response = build_router(state)
        .oneshot(post_json(&format!("/metadata/{}/cancel", id), &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["submissionId"], id.to_string());
    assert_eq!(json["disposition"], "alreadyFinished");
}

#[tokio::test]
async fn test_failed_submission_shows_in_health() {
    let state = test_app_state_with(
        MockUploader::failing_on(UploadTarget::Ip),
        MockRegistrar::succeeding(),
    )
    .await;
    state.orchestrator.submit(complete_release()).wait().await;

    let response = build_router(state).oneshot(get("/health")).await.unwrap();
    let json = body_json(response).await;
    let last_error = json["last_error"].as_str().unwrap();
    assert!(last_error.contains("IP metadata document"), "{}", last_error);
}

#[tokio::test]
async fn test_validate_endpoint_statuses() {
    let state = test_app_state().await;

    let cases = [
        (complete_release(), "VALID", "canonical"),
        (variant_release(), "REFORMATTED", "variant"),
        (flat_record(), "INCOMPLETE", "canonical"),
    ];
    for (raw, status, format) in cases {
        let response = build_router(state.clone())
            .oneshot(post_json("/metadata/validate", &raw))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], status);
        assert_eq!(json["format"], format);
        assert!(json["missingFields"].is_array());
        assert!(json["registrationGaps"].is_array());
    }

    // Validation never registers a submission
    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn test_template_endpoint() {
    let state = test_app_state().await;

    let response = build_router(state.clone())
        .oneshot(get("/metadata/template?releaseType=ep&trackCount=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["release"]["type"], "EP");
    assert_eq!(json["release"]["tracks"].as_array().unwrap().len(), 3);
    assert_eq!(json["release"]["territories"], json!(["WORLDWIDE"]));

    let response = build_router(state)
        .oneshot(get("/metadata/template?trackCount=500"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
