use axum::routing::{get, post};
use axum::Router;

use crate::handlers::telemetry;
use crate::state::AppState;

/// Routes mounted at `/telemetry`.
///
/// ```text
/// POST   /frame       -> record_frame
/// GET    /fairness    -> fairness
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/frame", post(telemetry::record_frame))
        .route("/fairness", get(telemetry::fairness))
}
