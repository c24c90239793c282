//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::time::Duration;

use axum::Router;
use gateway_common::{AppConfig, GatewayError, GatewayResult};
use gateway_pool::open_pool;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// How often the background health task re-probes the pool
const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = health_routes().merge(create_router());
    let router = apply_middleware(router, &state.config().server);
    router.with_state(state)
}

/// Open the pool and assemble the application state
pub async fn create_app_state(config: AppConfig) -> AppState {
    info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.database,
        max_connections = config.pool.max_size,
        "Opening PostgreSQL connection pool"
    );
    let pool = open_pool(&config.database, &config.pool).await;
    AppState::new(pool, config)
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: &str) -> GatewayResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> GatewayResult<()> {
    let addr = config.server.address();

    // Create app state
    let state = create_app_state(config).await;

    // Keep a background probe going so health transitions land in the logs
    let health_task = std::sync::Arc::clone(state.health()).spawn_periodic(HEALTH_INTERVAL);

    // Build application
    let app = create_app(state);

    // Run server
    let result = run_server(app, &addr).await;
    health_task.abort();
    result
}
