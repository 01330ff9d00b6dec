pub mod calibration;
pub mod consent;
pub mod health;
pub mod history;
pub mod quality;
pub mod reference;
pub mod session;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /calibration/start                 POST  start a calibration run
/// /calibration/frame                 POST  append a frame
/// /calibration/complete              POST  build the profile
/// /calibration/profile               GET   latest profile
///
/// /session/start                     POST  open a session
/// /session/frame-eval                POST  judge one live frame
/// /session/end                       POST  close and summarize
///
/// /history/sessions                  GET   finished sessions
/// /history/movements                 GET   per-movement aggregates
///
/// /reference/movements               GET   catalog (public)
///
/// /consent                           GET, POST
///
/// /telemetry/frame                   POST  opt-in sample
/// /telemetry/fairness                GET   bucket metrics
///
/// /quality/evaluate                  POST  stateless quality score
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/calibration", calibration::router())
        .nest("/session", session::router())
        .nest("/history", history::router())
        .nest("/reference", reference::router())
        .nest("/consent", consent::router())
        .nest("/telemetry", telemetry::router())
        .nest("/quality", quality::router())
}
