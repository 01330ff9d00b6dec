use axum::routing::get;
use axum::Router;

use crate::handlers::history;
use crate::state::AppState;

/// Routes mounted at `/history`.
///
/// ```text
/// GET    /sessions     -> list_sessions
/// GET    /movements    -> list_movements
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(history::list_sessions))
        .route("/movements", get(history::list_movements))
}
