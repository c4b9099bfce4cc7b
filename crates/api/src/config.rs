//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use tenantgate_auth::invite::{BASE_URL_ENV, DEFAULT_BASE_URL};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `JWT_SECRET`: shared HS256 secret for access tokens.
    pub jwt_secret: String,
    /// `APP_BASE_URL`: public base of the web app, used in invitation links.
    pub base_url: String,
    /// `PUBLIC_ORIGIN`: fixed origin for redirects. Unset means "derive from
    /// the request's Host header".
    pub public_origin: Option<String>,
    /// `DATABASE_URL`: Postgres membership store. Unset means in-memory.
    pub database_url: Option<String>,
    /// `DB_MAX_CONNECTIONS`
    pub db_max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            public_origin: None,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.trim().parse::<SocketAddr>().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: "BIND_ADDR",
                    reason: e.to_string(),
                }
            })?,
            None => defaults.bind_addr,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            defaults.jwt_secret.clone()
        });

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DB_MAX_CONNECTIONS",
                        reason: format!("expected a positive integer, got '{raw}'"),
                    });
                }
            },
            None => defaults.db_max_connections,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            base_url: get(BASE_URL_ENV)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            public_origin: get("PUBLIC_ORIGIN").map(|v| v.trim_end_matches('/').to_string()),
            database_url: get("DATABASE_URL"),
            db_max_connections,
        })
    }
}
