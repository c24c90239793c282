//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{employees, health, reports, salaries, transfers};
use crate::state::AppState;

/// Create the main API router with all routes (excluding health)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (mounted at the root, outside the API prefix)
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(employee_routes())
        .merge(report_routes())
        .merge(mutation_routes())
}

/// Employee directory routes
fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(employees::list_employees))
        .route("/employees/search", get(employees::search_employees))
        .route("/employees/:employee_id", get(employees::get_employee))
}

/// Reporting routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reports/departments/average-salary",
            get(reports::department_averages),
        )
        .route("/reports/top-earners", get(reports::top_earners))
}

/// Mutation routes
fn mutation_routes() -> Router<AppState> {
    Router::new()
        .route("/employees/transfer", post(transfers::transfer_employees))
        .route("/salaries/adjust", put(salaries::adjust_salary))
}
