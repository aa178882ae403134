use std::fmt;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;
use crate::media::MediaConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
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
    /// Time allowed for background jobs to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Realtime channel grant signing.
    pub realtime: RealtimeConfig,
    /// Upload provider credentials; `None` disables upload confirmation.
    pub media: Option<MediaConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    ///
    /// Also loads [`JwtConfig`], [`RealtimeConfig`] and the optional
    /// [`MediaConfig`]. Panics on malformed values.
    pub fn from_env() -> Self {
        let jwt = JwtConfig::from_env();
        let realtime = RealtimeConfig::from_env(&jwt.secret);

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins: parse_origins(&env_or(
                "CORS_ORIGINS",
                "http://localhost:5173".to_string(),
            )),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt,
            realtime,
            media: MediaConfig::from_env(),
        }
    }
}

/// Read `name` and parse it, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse as `T`.
pub(crate) fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Default lifetime of a realtime channel grant.
const DEFAULT_GRANT_TTL_SECS: i64 = 3600;

/// Signing material for realtime channel grants.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Public key prefixed to every grant.
    pub key: String,
    /// HMAC secret; never sent to clients.
    pub secret: String,
    /// How long an issued grant stays valid.
    pub grant_ttl_secs: i64,
}

impl RealtimeConfig {
    /// Load from environment variables.
    ///
    /// | Env Var                   | Default                  |
    /// |---------------------------|--------------------------|
    /// | `REALTIME_KEY`            | `intake`                 |
    /// | `REALTIME_SECRET`         | the JWT secret           |
    /// | `REALTIME_GRANT_TTL_SECS` | `3600`                   |
    pub fn from_env(fallback_secret: &str) -> Self {
        let secret: String = env_or("REALTIME_SECRET", String::new());

        Self {
            key: env_or("REALTIME_KEY", "intake".to_string()),
            secret: if secret.is_empty() {
                fallback_secret.to_string()
            } else {
                secret
            },
            grant_ttl_secs: env_or("REALTIME_GRANT_TTL_SECS", DEFAULT_GRANT_TTL_SECS),
        }
    }
}
