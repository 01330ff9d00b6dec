//! Handlers for guided exercise sessions.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use facecoach_core::error::CoreError;
use facecoach_core::evaluator::{evaluate_movement_frame, EvaluateFrameInput};
use facecoach_core::measurement::measure;
use facecoach_core::movements::{movement_by_id, reference_profile};
use facecoach_core::quality::evaluate_quality;
use facecoach_core::types::{
    validate_landmarks, validate_quality_input, Point3D, QualityInput, SessionPhase, StatusColor,
    TargetFeature,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[serde(default)]
    pub movement_ids: Vec<String>,
}

/// One live frame to judge. Phase and status strings are parsed leniently.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEvalRequest {
    pub session_id: Uuid,
    pub movement_id: String,
    pub quality: QualityInput,
    pub expression_proxy: f64,
    #[serde(default)]
    pub hold_progress_sec: Option<f64>,
    #[serde(default)]
    pub previous_phase: Option<String>,
    #[serde(default)]
    pub previous_status: Option<String>,
    #[serde(default)]
    pub landmarks: Option<Vec<Point3D>>,
    #[serde(default)]
    pub landmark_model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub session_id: Uuid,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/session/start
///
/// Unknown movement ids are rejected; an empty list means the default movement.
pub async fn start_session(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<StartSessionRequest>,
) -> AppResult<impl IntoResponse> {
    if let Some(unknown) = input
        .movement_ids
        .iter()
        .find(|id| movement_by_id(id).is_none())
    {
        return Err(AppError::BadRequest(format!("Unknown movement id: {unknown}")));
    }

    let started = state.store.start_session(&user.user_id, input.movement_ids);
    Ok(Json(DataResponse { data: started }))
}

/// POST /api/v1/session/frame-eval
///
/// Measure the frame against the caller's calibration, judge it and append
/// the verdict to the session.
pub async fn evaluate_frame(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<FrameEvalRequest>,
) -> AppResult<impl IntoResponse> {
    validate_quality_input(&input.quality)?;
    if !input.expression_proxy.is_finite() {
        return Err(CoreError::Validation("expressionProxy must be a finite number".into()).into());
    }
    if let Some(points) = &input.landmarks {
        validate_landmarks(points)?;
    }

    let movement = movement_by_id(&input.movement_id)
        .ok_or_else(|| CoreError::not_found("Movement", &input.movement_id))?;

    if !state.store.owns_session(input.session_id, &user.user_id) {
        return Err(CoreError::not_found("Session", input.session_id).into());
    }

    let profile = state.store.calibration_profile(&user.user_id);
    // Landmarks only count for movements with a declared target feature.
    let (landmarks, target_feature) = match reference_profile(movement.id) {
        Some(reference) => (input.landmarks.as_deref(), reference.target_feature),
        None => (None, TargetFeature::SmileRatio),
    };
    let measurement = measure(
        profile.as_ref(),
        input.expression_proxy,
        landmarks,
        target_feature,
    );

    let quality = evaluate_quality(&input.quality);
    let evaluation = evaluate_movement_frame(&EvaluateFrameInput {
        movement,
        measured_value: measurement.value,
        quality: &quality,
        previous_phase: input
            .previous_phase
            .as_deref()
            .map(SessionPhase::parse_or_default)
            .unwrap_or_default(),
        previous_status: input
            .previous_status
            .as_deref()
            .map_or(StatusColor::Yellow, StatusColor::parse_or_default),
        hold_progress_sec: input.hold_progress_sec.filter(|s| s.is_finite()).unwrap_or(0.0),
        used_landmarks: measurement.used_landmarks,
        landmark_model_version: input.landmark_model_version.as_deref(),
        baseline_confidence: measurement.baseline_confidence,
    });

    // An end that won the race leaves the slot empty; the frame is not recorded.
    if !state
        .store
        .append_evaluation(input.session_id, &user.user_id, evaluation.clone())
    {
        return Err(CoreError::not_found("Session", input.session_id).into());
    }

    tracing::debug!(
        session_id = %input.session_id,
        movement_id = movement.id,
        status = evaluation.status_color.as_str(),
        phase = evaluation.phase.as_str(),
        accuracy = evaluation.accuracy,
        confidence = evaluation.confidence,
        "Frame evaluated"
    );

    Ok(Json(DataResponse { data: evaluation }))
}

/// POST /api/v1/session/end
pub async fn end_session(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<EndSessionRequest>,
) -> AppResult<impl IntoResponse> {
    let metrics = state
        .store
        .end_session(input.session_id, &user.user_id)
        .ok_or_else(|| CoreError::not_found("Session", input.session_id))?;

    Ok(Json(DataResponse { data: metrics }))
}
