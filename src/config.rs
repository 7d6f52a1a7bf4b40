//! Service configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Only `ADMIN_KEY` is mandatory.

use std::net::SocketAddr;

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A mandatory variable is unset or empty.
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    /// `LISTEN_ADDR` is not a socket address.
    #[error("invalid LISTEN_ADDR: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`LiveConfig::from_env`].
#[derive(Clone)]
pub struct LiveConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Public URL of this service; issuer and audience of every token.
    pub public_url: String,

    /// Shared admin secret. Never logged.
    pub admin_key: String,

    /// SQLite connection string.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Per-subscriber live queue capacity.
    pub subscriber_buffer: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl LiveConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults for everything except `ADMIN_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `ADMIN_KEY` is unset or empty,
    /// or [`ConfigError::ListenAddr`] if `LISTEN_ADDR` cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;

        let public_url = std::env::var("PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let admin_key = std::env::var("ADMIN_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("ADMIN_KEY"))?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://trackstar-live.db".to_string());
        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 5);

        let subscriber_buffer = parse_env("SUBSCRIBER_BUFFER", 16_usize).max(1);

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            public_url,
            admin_key,
            database_url,
            database_max_connections,
            subscriber_buffer,
            log_format,
        })
    }
}

impl std::fmt::Debug for LiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConfig")
            .field("listen_addr", &self.listen_addr)
            .field("public_url", &self.public_url)
            .field("admin_key", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("subscriber_buffer", &self.subscriber_buffer)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
