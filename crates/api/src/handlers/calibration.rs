//! Handlers for personal-baseline calibration.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use facecoach_core::calibration::{validate_calibration_frame, CalibrationFrame};
use facecoach_core::error::CoreError;
use facecoach_core::quality::evaluate_quality;
use facecoach_core::types::{
    distance_bucket, validate_device_profile, DeviceProfile, DistanceBucket, Point3D, QualityInput,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCalibrationRequest {
    pub device_profile: DeviceProfile,
}

/// One captured frame. Timestamp and quality breakdown are filled in here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationFrameRequest {
    pub calibration_id: Uuid,
    pub quality: QualityInput,
    pub expression_proxy: f64,
    #[serde(default)]
    pub landmarks: Option<Vec<Point3D>>,
    #[serde(default)]
    pub landmark_model_version: Option<String>,
    /// Derived from face coverage when absent.
    #[serde(default)]
    pub distance_bucket: Option<DistanceBucket>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCalibrationRequest {
    pub calibration_id: Uuid,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/calibration/start
pub async fn start_calibration(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<StartCalibrationRequest>,
) -> AppResult<impl IntoResponse> {
    validate_device_profile(&input.device_profile)?;
    let started = state
        .store
        .start_calibration(&user.user_id, input.device_profile);
    Ok(Json(DataResponse { data: started }))
}

/// POST /api/v1/calibration/frame
///
/// Append a frame and report the running quality level.
pub async fn add_frame(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CalibrationFrameRequest>,
) -> AppResult<impl IntoResponse> {
    let score = evaluate_quality(&input.quality);
    let frame = CalibrationFrame {
        timestamp: Utc::now(),
        quality: input.quality,
        expression_proxy: input.expression_proxy,
        landmarks: input.landmarks,
        landmark_model_version: input.landmark_model_version,
        quality_breakdown: Some(score.breakdown()),
        distance_bucket: Some(
            input
                .distance_bucket
                .unwrap_or_else(|| distance_bucket(input.quality.face_coverage)),
        ),
    };
    validate_calibration_frame(&frame)?;

    let progress = state
        .store
        .add_calibration_frame(input.calibration_id, &user.user_id, frame)
        .ok_or_else(|| CoreError::not_found("Calibration", input.calibration_id))?;

    Ok(Json(DataResponse { data: progress }))
}

/// POST /api/v1/calibration/complete
///
/// Fold the run into the caller's calibration profile.
pub async fn complete_calibration(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CompleteCalibrationRequest>,
) -> AppResult<impl IntoResponse> {
    let profile = state
        .store
        .complete_calibration(input.calibration_id, &user.user_id)
        .ok_or_else(|| CoreError::not_found("Calibration", input.calibration_id))?;

    Ok(Json(DataResponse { data: profile }))
}

/// GET /api/v1/calibration/profile
pub async fn get_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let profile = state
        .store
        .calibration_profile(&user.user_id)
        .ok_or_else(|| CoreError::not_found("Calibration profile", &user.user_id))?;

    Ok(Json(DataResponse { data: profile }))
}
