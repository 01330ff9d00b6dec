use crate::auth::jwt::JwtConfig;

/// How request identity is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `Authorization: Bearer <HS256 JWT>`; the `sub` claim is the user id.
    Jwt,
    /// Trusted `x-user-id` header. Development and tests only.
    Header,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {kind}, got `{value}`")]
    Invalid {
        var: &'static str,
        kind: &'static str,
        value: String,
    },

    #[error("AUTH_MODE must be `jwt` or `header`, got `{0}`")]
    UnknownAuthMode(String),

    #[error("JWT_SECRET must be set and non-empty when AUTH_MODE=jwt")]
    MissingJwtSecret,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub auth_mode: AuthMode,
    /// Present exactly when `auth_mode` is [`AuthMode::Jwt`].
    pub jwt: Option<JwtConfig>,
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.into())
}

fn parse_env<T: std::str::FromStr>(
    var: &'static str,
    default: &str,
    kind: &'static str,
) -> Result<T, ConfigError> {
    let value = env_or(var, default);
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, kind, value })
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `AUTH_MODE`            | `jwt`                      |
    /// | `JWT_SECRET`           | required in `jwt` mode     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0");
        let port: u16 = parse_env("PORT", "3000", "u16")?;

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| o.parse::<axum::http::HeaderValue>().is_err())
        {
            return Err(ConfigError::Invalid {
                var: "CORS_ORIGINS",
                kind: "origin list",
                value: bad.clone(),
            });
        }

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", "30", "u64")?;

        let auth_mode = match env_or("AUTH_MODE", "jwt").trim().to_ascii_lowercase().as_str() {
            "jwt" => AuthMode::Jwt,
            "header" => AuthMode::Header,
            other => return Err(ConfigError::UnknownAuthMode(other.to_string())),
        };

        let jwt = match auth_mode {
            AuthMode::Jwt => Some(JwtConfig::from_env().ok_or(ConfigError::MissingJwtSecret)?),
            AuthMode::Header => None,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            auth_mode,
            jwt,
        })
    }
}
