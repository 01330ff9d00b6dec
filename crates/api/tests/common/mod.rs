#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use facecoach_api::auth::identity::{HeaderIdentityResolver, JwtIdentityResolver, USER_ID_HEADER};
use facecoach_api::auth::jwt::JwtConfig;
use facecoach_api::config::{AuthMode, ServerConfig};
use facecoach_api::router::build_app_router;
use facecoach_api::state::AppState;
use facecoach_core::store::CoachStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-long-enough";

/// Build a test `ServerConfig` with safe defaults and header identity.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        auth_mode: AuthMode::Header,
        jwt: None,
    }
}

/// Full application router with header identity and a fresh store.
///
/// The router is cheap to clone; clones share the same store, so a test can
/// drive a multi-request flow with `app.clone().oneshot(..)`.
pub fn build_test_app() -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(CoachStore::new()),
        identity: Arc::new(HeaderIdentityResolver),
    };
    build_app_router(state, &config)
}

/// Same router, but identity comes from HS256 bearer tokens.
pub fn build_jwt_test_app() -> Router {
    let jwt = JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
    };
    let config = ServerConfig {
        auth_mode: AuthMode::Jwt,
        jwt: Some(jwt.clone()),
        ..test_config()
    };
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(CoachStore::new()),
        identity: Arc::new(JwtIdentityResolver::new(jwt)),
    };
    build_app_router(state, &config)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// GET as `user` (no identity header when `None`).
pub async fn get(app: &Router, uri: &str, user: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

/// POST a JSON body as `user`.
pub async fn post_json(app: &Router, uri: &str, user: Option<&str>, body: Value) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Payload fixtures
// ---------------------------------------------------------------------------

/// Camera signal that scores a perfect 1.0.
pub fn good_quality() -> Value {
    json!({
        "brightness": 0.55,
        "blur": 1.0,
        "faceCoverage": 0.25,
        "headYawDeg": 0.0,
        "occlusion": 0.0,
        "fps": 30.0
    })
}

/// Dark, blurry, far away and turned aside.
pub fn poor_quality() -> Value {
    json!({
        "brightness": 0.05,
        "blur": 0.1,
        "faceCoverage": 0.02,
        "headYawDeg": 40.0,
        "occlusion": 0.8,
        "fps": 6.0
    })
}

pub fn device_profile() -> Value {
    json!({
        "platform": "web",
        "userAgent": "integration-test",
        "videoWidth": 1280.0,
        "videoHeight": 720.0
    })
}

/// Start a calibration for `user`, returning its id.
pub async fn start_calibration(app: &Router, user: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/calibration/start",
        Some(user),
        json!({ "deviceProfile": device_profile() }),
    )
    .await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    json["data"]["calibrationId"].as_str().unwrap().to_string()
}

/// Start a session for `user`, returning its id.
pub async fn start_session(app: &Router, user: &str, movement_ids: Value) -> String {
    let response = post_json(
        app,
        "/api/v1/session/start",
        Some(user),
        json!({ "movementIds": movement_ids }),
    )
    .await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    json["data"]["sessionId"].as_str().unwrap().to_string()
}
