//! Authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use facecoach_core::types::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// Caller identity, resolved by the configured
/// [`IdentityResolver`](crate::auth::identity::IdentityResolver).
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = state.identity.resolve(&parts.headers)?;
        Ok(AuthUser { user_id })
    }
}
