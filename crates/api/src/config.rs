//! Application configuration loaded from environment variables.

use std::time::Duration;

use catalog_store::{InMemoryStoreConfig, PostgresStoreConfig};
use coordinator::{CoordinatorConfig, HttpNotifierConfig};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on a seeded in-memory store
/// - `DATABASE_MAX_CONNECTIONS` — pool size, also the in-memory session limit (default: `10`)
/// - `INVENTORY_BASE_URL` — inventory service URL; unset uses an in-memory inventory
/// - `INVENTORY_TIMEOUT_MS` — per-notification timeout (default: `10000`)
/// - `INVENTORY_INITIAL_QUANTITY` — stock sent for new items (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub inventory_base_url: Option<String>,
    pub inventory_timeout: Duration,
    pub initial_quantity: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .and_then(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.database_max_connections),
            inventory_base_url: non_empty("INVENTORY_BASE_URL"),
            inventory_timeout: lookup("INVENTORY_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.inventory_timeout),
            initial_quantity: lookup("INVENTORY_INITIAL_QUANTITY")
                .and_then(|q| q.parse().ok())
                .unwrap_or(defaults.initial_quantity),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// PostgreSQL settings, if a database is configured.
    pub fn postgres_store(&self) -> Option<PostgresStoreConfig> {
        self.database_url.as_ref().map(|url| PostgresStoreConfig {
            max_connections: self.database_max_connections,
            ..PostgresStoreConfig::new(url.clone())
        })
    }

    pub fn memory_store(&self) -> InMemoryStoreConfig {
        InMemoryStoreConfig {
            max_sessions: self.database_max_connections as usize,
        }
    }

    /// HTTP notifier settings, if an inventory service is configured.
    pub fn http_notifier(&self) -> Option<HttpNotifierConfig> {
        self.inventory_base_url
            .as_ref()
            .map(|base_url| HttpNotifierConfig {
                base_url: base_url.clone(),
                timeout: self.inventory_timeout,
            })
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            initial_quantity: self.initial_quantity,
            notify_timeout: self.inventory_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 10,
            inventory_base_url: None,
            inventory_timeout: Duration::from_millis(10_000),
            initial_quantity: 5,
        }
    }
}
