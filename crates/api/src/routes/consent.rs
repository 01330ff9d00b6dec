use axum::routing::get;
use axum::Router;

use crate::handlers::consent;
use crate::state::AppState;

/// Routes mounted at `/consent`.
///
/// ```text
/// GET    /    -> get_consent
/// POST   /    -> update_consent
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(consent::get_consent).post(consent::update_consent))
}
