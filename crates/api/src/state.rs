use std::sync::Arc;

use facecoach_core::store::CoachStore;

use crate::auth::identity::IdentityResolver;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Calibration and session runs, profiles, history, consent and telemetry.
    pub store: Arc<CoachStore>,
    /// Maps request headers to the calling user.
    pub identity: Arc<dyn IdentityResolver>,
}
