//! Request identity resolution.
//!
//! Handlers never look at credentials themselves. They receive an already
//! resolved user id from whichever [`IdentityResolver`] the server was
//! configured with, so there is a single code path per endpoint.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use facecoach_core::error::CoreError;
use facecoach_core::types::UserId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::config::{AuthMode, ServerConfig};

/// Header read by [`HeaderIdentityResolver`].
pub const USER_ID_HEADER: &str = "x-user-id";

/// Maps request headers to the requesting user.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<UserId, CoreError>;
}

/// Bearer-token resolver; the token's `sub` claim is the user id.
pub struct JwtIdentityResolver {
    config: JwtConfig,
}

impl JwtIdentityResolver {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<UserId, CoreError> {
        let auth_header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| CoreError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            CoreError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        let claims = validate_token(token, &self.config)
            .map_err(|_| CoreError::Unauthorized("Invalid or expired token".into()))?;

        if claims.sub.trim().is_empty() {
            return Err(CoreError::Unauthorized("Token has no subject".into()));
        }
        Ok(claims.sub)
    }
}

/// Trusts the `x-user-id` header as-is.
pub struct HeaderIdentityResolver;

impl IdentityResolver for HeaderIdentityResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<UserId, CoreError> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CoreError::Unauthorized(format!("Missing {USER_ID_HEADER} header")))
    }
}

/// Build the resolver selected by the configuration.
pub fn resolver_for(config: &ServerConfig) -> Result<Arc<dyn IdentityResolver>, CoreError> {
    match (config.auth_mode, &config.jwt) {
        (AuthMode::Jwt, Some(jwt)) => Ok(Arc::new(JwtIdentityResolver::new(jwt.clone()))),
        (AuthMode::Jwt, None) => Err(CoreError::Internal(
            "JWT auth selected without a JWT secret".into(),
        )),
        (AuthMode::Header, _) => {
            tracing::warn!("Header identity mode enabled; x-user-id is trusted as-is");
            Ok(Arc::new(HeaderIdentityResolver))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use crate::auth::jwt::generate_access_token;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "identity-test-secret-long-enough".into(),
        }
    }

    #[test]
    fn header_resolver_reads_user_id() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" alice "));
        assert_eq!(HeaderIdentityResolver.resolve(&headers).unwrap(), "alice");
    }

    #[test]
    fn header_resolver_rejects_blank() {
        let mut headers = HeaderMap::new();
        assert_matches!(
            HeaderIdentityResolver.resolve(&headers),
            Err(CoreError::Unauthorized(_))
        );
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert_matches!(
            HeaderIdentityResolver.resolve(&headers),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn jwt_resolver_accepts_bearer_token() {
        let config = jwt_config();
        let token = generate_access_token("bob", 5, &config).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let resolver = JwtIdentityResolver::new(config);
        assert_eq!(resolver.resolve(&headers).unwrap(), "bob");
    }

    #[test]
    fn jwt_resolver_rejects_missing_and_malformed() {
        let resolver = JwtIdentityResolver::new(jwt_config());
        let mut headers = HeaderMap::new();
        assert_matches!(resolver.resolve(&headers), Err(CoreError::Unauthorized(_)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_matches!(resolver.resolve(&headers), Err(CoreError::Unauthorized(_)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_matches!(resolver.resolve(&headers), Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn jwt_resolver_ignores_user_id_header() {
        let resolver = JwtIdentityResolver::new(jwt_config());
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("mallory"));
        assert!(resolver.resolve(&headers).is_err());
    }
}
