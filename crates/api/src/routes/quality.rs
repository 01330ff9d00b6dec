use axum::routing::post;
use axum::Router;

use crate::handlers::quality;
use crate::state::AppState;

/// Routes mounted at `/quality`.
pub fn router() -> Router<AppState> {
    Router::new().route("/evaluate", post(quality::evaluate))
}
