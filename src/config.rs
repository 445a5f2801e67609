//! Connection configuration.

use std::fmt;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::{CatalogError, CatalogResult};

/// Database settings loaded from environment variables.
#[derive(Clone)]
pub struct DbConfig {
    /// Database user (`DB_USER`, default "root1").
    pub user: String,

    /// Database password (`DB_PASSWORD`, default "password").
    pub password: String,

    /// Database host (`DB_HOST`, default "localhost").
    pub host: String,

    /// Database port (`DB_PORT`, default 5432).
    pub port: u16,

    /// Database name (`DB_NAME`, default "streamlit_demo").
    pub database: String,

    /// Lifetime of cached read results (`QUERY_CACHE_TTL_SECS`, default 60).
    pub cache_ttl: Duration,

    /// Pool size (`DB_MAX_CONNECTIONS`, default 5).
    pub max_connections: u32,
}

impl DbConfig {
    /// Load configuration from a `.env` file (if any) and the environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        let defaults = Self::default();
        Self {
            user: std::env::var("DB_USER").unwrap_or(defaults.user),
            password: std::env::var("DB_PASSWORD").unwrap_or(defaults.password),
            host: std::env::var("DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            database: std::env::var("DB_NAME").unwrap_or(defaults.database),
            cache_ttl: std::env::var("QUERY_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_connections),
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            user: "root1".into(),
            password: "password".into(),
            host: "localhost".into(),
            port: 5432,
            database: "streamlit_demo".into(),
            cache_ttl: Duration::from_secs(60),
            max_connections: 5,
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("cache_ttl", &self.cache_ttl)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Open the process-wide connection pool.
///
/// Any failure is reported as [`CatalogError::Connection`]; callers treat it
/// as "catalog unavailable" rather than aborting.
pub async fn connect(config: &DbConfig) -> CatalogResult<PgPool> {
    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        user = %config.user,
        "Connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(config.connect_options())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Database connection failed");
            CatalogError::Connection(e.to_string())
        })
}
