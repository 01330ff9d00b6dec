use axum::routing::get;
use axum::Router;

use crate::handlers::reference;
use crate::state::AppState;

/// Routes mounted at `/reference`.
pub fn router() -> Router<AppState> {
    Router::new().route("/movements", get(reference::list_movements))
}
