use axum::routing::{get, post};
use axum::Router;

use crate::handlers::calibration;
use crate::state::AppState;

/// Routes mounted at `/calibration`.
///
/// ```text
/// POST   /start       -> start_calibration
/// POST   /frame       -> add_frame
/// POST   /complete    -> complete_calibration
/// GET    /profile     -> get_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(calibration::start_calibration))
        .route("/frame", post(calibration::add_frame))
        .route("/complete", post(calibration::complete_calibration))
        .route("/profile", get(calibration::get_profile))
}
