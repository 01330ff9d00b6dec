use axum::routing::post;
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/session`.
///
/// ```text
/// POST   /start        -> start_session
/// POST   /frame-eval   -> evaluate_frame
/// POST   /end          -> end_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(session::start_session))
        .route("/frame-eval", post(session::evaluate_frame))
        .route("/end", post(session::end_session))
}
