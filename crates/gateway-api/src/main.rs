//! Query Gateway API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p gateway-api
//! ```
//!
//! Configuration is loaded from environment variables (see
//! `gateway_common::AppConfig`); every variable has a default.

use gateway_common::{try_init_tracing_with_config, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    let tracing_config = match std::env::var("APP_ENV").ok().as_deref() {
        Some("production") => TracingConfig::production(),
        Some("development") => TracingConfig::development(),
        _ => TracingConfig::default(),
    };
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    // Run the server
    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Query Gateway...");

    // Load configuration
    let config = gateway_common::AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        port = config.server.port,
        "Configuration loaded"
    );

    // Run the server
    gateway_api::run(config).await?;

    Ok(())
}
