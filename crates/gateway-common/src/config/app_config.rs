//! Application configuration structs
//!
//! Loads configuration from environment variables, with documented defaults
//! for every knob so the gateway starts against a local database untouched.

use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub pool: PoolSettings,
    pub health: HealthSettings,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Outer request deadline applied by the timeout middleware
    pub request_timeout: Duration,
}

impl ServerSettings {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database endpoint configuration
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Connection pool tuning
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Upper bound on leased + idle connections
    pub max_size: usize,
    /// Idle connections kept alive below this count even past the idle timeout
    pub min_idle: usize,
    /// Idle window after which surplus connections are closed
    pub idle_timeout: Duration,
    /// Maximum time a caller waits for a free connection
    pub acquire_timeout: Duration,
    /// Per-statement execution deadline
    pub statement_timeout: Duration,
}

/// Health probe tuning
#[derive(Debug, Clone)]
pub struct HealthSettings {
    /// Deadline for the acquire + probe round trip
    pub probe_timeout: Duration,
    /// Pool utilization at or above which the gateway reports `degraded`
    pub degraded_utilization: f64,
}

// Default value functions
fn default_app_name() -> String {
    "query-gateway".to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "pass".to_string()
}

fn default_db_name() -> String {
    "employees".to_string()
}

fn default_max_size() -> usize {
    10
}

fn default_min_idle() -> usize {
    1
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_acquire_timeout_ms() -> u64 {
    5_000
}

fn default_statement_timeout_ms() -> u64 {
    15_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_degraded_utilization() -> f64 {
    0.9
}

/// Read an environment variable and parse it, falling back to a default
fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Every variable has a default; `from_env` only fails when the
    /// resulting values are inconsistent (e.g. min idle above max size).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            server: ServerSettings {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| default_server_host()),
                port: env_parse("SERVER_PORT", default_server_port()),
                request_timeout: Duration::from_secs(env_parse(
                    "REQUEST_TIMEOUT_SECS",
                    default_request_timeout_secs(),
                )),
            },
            database: DatabaseSettings {
                host: env::var("DATABASE_HOST").unwrap_or_else(|_| default_db_host()),
                port: env_parse("DATABASE_PORT", default_db_port()),
                user: env::var("DATABASE_USER").unwrap_or_else(|_| default_db_user()),
                password: env::var("DATABASE_PASSWORD").unwrap_or_else(|_| default_db_password()),
                database: env::var("DATABASE_NAME").unwrap_or_else(|_| default_db_name()),
            },
            pool: PoolSettings {
                max_size: env_parse("DATABASE_MAX_CONNECTIONS", default_max_size()),
                min_idle: env_parse("DATABASE_MIN_CONNECTIONS", default_min_idle()),
                idle_timeout: Duration::from_secs(env_parse(
                    "DATABASE_IDLE_TIMEOUT_SECS",
                    default_idle_timeout_secs(),
                )),
                acquire_timeout: Duration::from_millis(env_parse(
                    "DATABASE_ACQUIRE_TIMEOUT_MS",
                    default_acquire_timeout_ms(),
                )),
                statement_timeout: Duration::from_millis(env_parse(
                    "STATEMENT_TIMEOUT_MS",
                    default_statement_timeout_ms(),
                )),
            },
            health: HealthSettings {
                probe_timeout: Duration::from_millis(env_parse(
                    "HEALTH_PROBE_TIMEOUT_MS",
                    default_probe_timeout_ms(),
                )),
                degraded_utilization: env_parse(
                    "HEALTH_DEGRADED_UTILIZATION",
                    default_degraded_utilization(),
                ),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency of the loaded values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.max_size == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS",
                "must be at least 1".to_string(),
            ));
        }
        if self.pool.min_idle > self.pool.max_size {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MIN_CONNECTIONS",
                format!(
                    "must not exceed DATABASE_MAX_CONNECTIONS ({})",
                    self.pool.max_size
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.health.degraded_utilization) {
            return Err(ConfigError::InvalidValue(
                "HEALTH_DEGRADED_UTILIZATION",
                "must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::default(),
            },
            server: ServerSettings {
                host: default_server_host(),
                port: default_server_port(),
                request_timeout: Duration::from_secs(default_request_timeout_secs()),
            },
            database: DatabaseSettings {
                host: default_db_host(),
                port: default_db_port(),
                user: default_db_user(),
                password: default_db_password(),
                database: default_db_name(),
            },
            pool: PoolSettings {
                max_size: default_max_size(),
                min_idle: default_min_idle(),
                idle_timeout: Duration::from_secs(default_idle_timeout_secs()),
                acquire_timeout: Duration::from_millis(default_acquire_timeout_ms()),
                statement_timeout: Duration::from_millis(default_statement_timeout_ms()),
            },
            health: HealthSettings {
                probe_timeout: Duration::from_millis(default_probe_timeout_ms()),
                degraded_utilization: default_degraded_utilization(),
            },
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
