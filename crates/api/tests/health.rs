//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = common::build_test_app();
    let response = get(&app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app();
    let response = get(&app, "/this-route-does-not-exist", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app();
    let response = get(&app, "/health", None).await;

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );

    // MakeRequestUuid produces a hyphenated UUID.
    let id_str = request_id.unwrap().to_str().unwrap();
    assert_eq!(id_str.len(), 36);
}

// ---------------------------------------------------------------------------
// Test: the movement catalog is public
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reference_movements_need_no_identity() {
    let app = common::build_test_app();
    let response = get(&app, "/api/v1/reference/movements", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let movements = json["data"].as_array().unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0]["id"], "cheek-lift");
    assert_eq!(movements[0]["reference"]["targetFeature"], "cheekLiftRatio");
    assert_eq!(movements[1]["id"], "jaw-release");
    assert_eq!(movements[1]["reference"]["modelVersion"], "landmark-rule-v2");
}
