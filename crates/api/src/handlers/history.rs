//! Read-only views over finished sessions.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/history/sessions
///
/// Finished sessions of the caller, newest first.
pub async fn list_sessions(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let sessions = state.store.sessions(&user.user_id);
    Ok(Json(DataResponse { data: sessions }))
}

/// GET /api/v1/history/movements
pub async fn list_movements(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let movements = state.store.movement_history(&user.user_id);
    Ok(Json(DataResponse { data: movements }))
}
