//! Integration tests for consent, telemetry and stateless quality scoring.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, good_quality, poor_quality, post_json};
use serde_json::{json, Value};

fn sample(status: &str, accuracy: f64) -> Value {
    json!({
        "pseudoSessionKey": "psk-1",
        "movementId": "cheek-lift",
        "modelVersion": "landmark-rule-v2",
        "deviceOrientation": "portrait",
        "qualityOverall": 0.8,
        "accuracy": accuracy,
        "confidence": 0.7,
        "statusColor": status,
        "distanceBucket": "near",
        "latencyMs": 12.5
    })
}

async fn opt_in(app: &axum::Router, user: &str) {
    let response = post_json(
        app,
        "/api/v1/consent",
        Some(user),
        json!({ "telemetryOptIn": true, "consentVersion": "v2", "locale": "en-US" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Consent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn consent_defaults_to_opted_out() {
    let app = common::build_test_app();
    let response = get(&app, "/api/v1/consent", Some("alice")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["userId"], "alice");
    assert_eq!(json["data"]["telemetryOptIn"], false);
    assert_eq!(json["data"]["consentVersion"], "v1");
    assert_eq!(json["data"]["locale"], "tr-TR");
}

#[tokio::test]
async fn consent_update_is_persisted() {
    let app = common::build_test_app();
    opt_in(&app, "alice").await;

    let json = body_json(get(&app, "/api/v1/consent", Some("alice")).await).await;
    assert_eq!(json["data"]["telemetryOptIn"], true);
    assert_eq!(json["data"]["consentVersion"], "v2");
    assert_eq!(json["data"]["locale"], "en-US");
}

#[tokio::test]
async fn blank_consent_version_is_rejected() {
    let app = common::build_test_app();
    let response = post_json(
        &app,
        "/api/v1/consent",
        Some("alice"),
        json!({ "telemetryOptIn": true, "consentVersion": "" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn telemetry_without_consent_is_forbidden() {
    let app = common::build_test_app();
    let response = post_json(
        &app,
        "/api/v1/telemetry/frame",
        Some("alice"),
        sample("green", 0.9),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");

    let buckets = body_json(get(&app, "/api/v1/telemetry/fairness", Some("alice")).await).await;
    assert!(buckets["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn opted_in_telemetry_feeds_fairness_buckets() {
    let app = common::build_test_app();
    opt_in(&app, "alice").await;

    for (status, accuracy) in [("green", 0.9), ("red", 0.3)] {
        let response = post_json(
            &app,
            "/api/v1/telemetry/frame",
            Some("alice"),
            sample(status, accuracy),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = get(&app, "/api/v1/telemetry/fairness", Some("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let buckets = json["data"].as_array().unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0]["bucketId"], "portrait:near");
    assert_eq!(buckets[0]["sampleCount"], 2);
    assert!((buckets[0]["averageAccuracy"].as_f64().unwrap() - 0.6).abs() < 1e-9);
    assert!((buckets[0]["redRate"].as_f64().unwrap() - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn blank_telemetry_key_is_rejected() {
    let app = common::build_test_app();
    opt_in(&app, "alice").await;
    let mut body = sample("green", 0.9);
    body["pseudoSessionKey"] = json!("  ");

    let response = post_json(&app, "/api/v1/telemetry/frame", Some("alice"), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Stateless quality
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quality_evaluate_scores_good_signal() {
    let app = common::build_test_app();
    let response = post_json(&app, "/api/v1/quality/evaluate", Some("alice"), good_quality()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["level"], "good");
    assert!(json["data"]["reasons"].as_array().unwrap().is_empty());
    assert!(json["data"]["recommendedCalibrationSec"].is_u64());
}

#[tokio::test]
async fn quality_evaluate_explains_poor_signal() {
    let app = common::build_test_app();
    let response = post_json(&app, "/api/v1/quality/evaluate", Some("alice"), poor_quality()).await;

    let json = body_json(response).await;
    assert_eq!(json["data"]["level"], "poor");
    assert!(!json["data"]["reasons"].as_array().unwrap().is_empty());
}
