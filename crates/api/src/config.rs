//! Process configuration, read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

use shopfront_auth::DEFAULT_TTL_HOURS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
/// Upper bound for TOKEN_TTL_HOURS (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BIND_ADDR is not a socket address: {0}")]
    BindAddr(String),

    #[error("TOKEN_TTL_HOURS must be an integer in 1..=8760, got {0:?}")]
    TokenTtl(String),

    #[error("BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD must be set together")]
    PartialBootstrap,
}

/// Credentials for an admin seeded at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub token_ttl: Duration,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            token_ttl: Duration::hours(DEFAULT_TTL_HOURS),
            bootstrap_admin: None,
        }
    }

    pub fn with_bootstrap_admin(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.bootstrap_admin = Some(BootstrapAdmin {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::BindAddr(bind_raw.clone()))?;

        let token_ttl = match lookup("TOKEN_TTL_HOURS") {
            None => Duration::hours(DEFAULT_TTL_HOURS),
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) => {
                    Duration::try_hours(hours).ok_or_else(|| ConfigError::TokenTtl(raw.clone()))?
                }
                _ => return Err(ConfigError::TokenTtl(raw)),
            },
        };

        let bootstrap_admin = match (lookup("BOOTSTRAP_ADMIN_USERNAME"), lookup("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialBootstrap),
        };

        Ok(Self {
            jwt_secret,
            bind_addr,
            token_ttl,
            bootstrap_admin,
        })
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}
