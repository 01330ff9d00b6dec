//! Handlers for telemetry consent.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use facecoach_core::telemetry::{validate_consent_update, ConsentUpdate};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/consent
///
/// Users who never answered get the opted-out default.
pub async fn get_consent(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let consent = state.store.user_consent(&user.user_id);
    Ok(Json(DataResponse { data: consent }))
}

/// POST /api/v1/consent
pub async fn update_consent(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ConsentUpdate>,
) -> AppResult<impl IntoResponse> {
    validate_consent_update(&input)?;
    let consent = state.store.update_consent(&user.user_id, input);
    Ok(Json(DataResponse { data: consent }))
}
