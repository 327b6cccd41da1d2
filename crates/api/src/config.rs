//! Application configuration loaded from environment variables.

use std::str::FromStr;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `DB_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `HORIZON_MONTHS`: how far ahead bookings are accepted (default: `24`)
/// - `DAILY_SPACES`: capacity of newly stocked days (default: `10`)
/// - `DAILY_PRICE_CENTS`: price of newly stocked days (default: `1500`)
/// - `HORIZON_REFRESH_SECS`: interval of the stocking task (default: `3600`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub horizon_months: u32,
    pub daily_spaces: i32,
    pub daily_price_cents: i64,
    pub horizon_refresh_secs: u64,
}

/// Parses an environment variable, falling back to `default` when it is
/// unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: env_or("LOG_FORMAT", defaults.log_format),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            horizon_months: env_or("HORIZON_MONTHS", defaults.horizon_months),
            daily_spaces: env_or("DAILY_SPACES", defaults.daily_spaces),
            daily_price_cents: env_or("DAILY_PRICE_CENTS", defaults.daily_price_cents),
            horizon_refresh_secs: env_or("HORIZON_REFRESH_SECS", defaults.horizon_refresh_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            db_max_connections: 5,
            horizon_months: 24,
            daily_spaces: 10,
            daily_price_cents: 1500,
            horizon_refresh_secs: 3600,
        }
    }
}
