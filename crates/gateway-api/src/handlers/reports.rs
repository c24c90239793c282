//! Reporting handlers

use axum::extract::{Query, State};
use gateway_db::{DepartmentAverage, TopEarner};
use serde::Deserialize;

use crate::response::{ApiResult, DataResponse};
use crate::state::AppState;

/// Query parameters for the top-earners report
#[derive(Debug, Deserialize)]
pub struct TopEarnersParams {
    #[serde(default = "default_top_limit")]
    pub limit: i64,
}

fn default_top_limit() -> i64 {
    10
}

/// Average current salary and headcount per department
///
/// GET /api/v1/reports/departments/average-salary
pub async fn department_averages(
    State(state): State<AppState>,
) -> ApiResult<DataResponse<Vec<DepartmentAverage>>> {
    let rows = state.reports().department_averages().await?;
    Ok(DataResponse::new(rows))
}

/// Highest current salaries across the company
///
/// GET /api/v1/reports/top-earners
pub async fn top_earners(
    State(state): State<AppState>,
    Query(params): Query<TopEarnersParams>,
) -> ApiResult<DataResponse<Vec<TopEarner>>> {
    let rows = state.reports().top_earners(params.limit).await?;
    Ok(DataResponse::new(rows))
}
