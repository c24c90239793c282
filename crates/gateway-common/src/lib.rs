//! # gateway-common
//!
//! Shared utilities for the query gateway: configuration, the unified
//! error taxonomy, and telemetry setup.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, AppSettings, ConfigError, DatabaseSettings, Environment, HealthSettings,
    PoolSettings, ServerSettings,
};
pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
