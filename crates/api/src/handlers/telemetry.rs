//! Handlers for opt-in frame telemetry.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use facecoach_core::error::CoreError;
use facecoach_core::telemetry::{validate_telemetry_sample, TelemetryFrameSample};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/telemetry/frame
///
/// Returns 202 when stored, 403 when the caller has not opted in.
pub async fn record_frame(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<TelemetryFrameSample>,
) -> AppResult<impl IntoResponse> {
    validate_telemetry_sample(&input)?;
    if !state.store.append_telemetry(&user.user_id, input) {
        return Err(CoreError::Forbidden("Telemetry consent is required".into()).into());
    }
    Ok(StatusCode::ACCEPTED)
}

/// GET /api/v1/telemetry/fairness
pub async fn fairness(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let buckets = state.store.fairness_buckets(&user.user_id);
    Ok(Json(DataResponse { data: buckets }))
}
