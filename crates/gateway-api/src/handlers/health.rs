//! Health check handler
//!
//! Probes the pool on demand and reports connectivity plus capacity.

use axum::{extract::State, http::StatusCode, Json};
use gateway_pool::{HealthStatus, PoolStatus};
use serde::Serialize;

use crate::state::AppState;

/// Health check body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(rename = "dbConnected")]
    pub db_connected: bool,
    #[serde(rename = "checkedAt")]
    pub checked_at: chrono::DateTime<chrono::Utc>,
    pub pool: PoolCounters,
}

/// Pool capacity snapshot included in the health body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCounters {
    pub size: usize,
    pub idle: usize,
    pub in_use: usize,
    pub max_size: usize,
}

impl From<PoolStatus> for PoolCounters {
    fn from(status: PoolStatus) -> Self {
        Self {
            size: status.size,
            idle: status.idle,
            in_use: status.in_use,
            max_size: status.max_size,
        }
    }
}

impl From<&HealthStatus> for HealthResponse {
    fn from(status: &HealthStatus) -> Self {
        Self {
            status: status.state.as_str(),
            db_connected: status.db_connected,
            checked_at: status.checked_at,
            pool: PoolCounters::from(status.pool),
        }
    }
}

/// Database connectivity probe
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let status = state.health().check().await;
    let code = if status.state.is_available() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(HealthResponse::from(&status)))
}
