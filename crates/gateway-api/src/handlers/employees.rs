//! Employee directory handlers

use axum::extract::{Path, Query, State};
use gateway_common::GatewayError;
use gateway_db::{EmployeeDetails, EmployeeSearchFilter, EmployeeSummary};
use serde::Deserialize;

use crate::response::{ApiResult, DataResponse};
use crate::state::AppState;

/// Query parameters for the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub department: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

/// Query parameters for the list endpoint
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 {
    500
}

/// Search employees by name and/or department
///
/// GET /api/v1/employees/search
pub async fn search_employees(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<DataResponse<Vec<EmployeeSummary>>> {
    let filter = EmployeeSearchFilter {
        name: params.name,
        department: params.department,
        page: params.page,
        page_size: params.page_size,
    };
    let rows = state.employees().search(&filter).await?;
    Ok(DataResponse::new(rows))
}

/// List employees with their current assignment
///
/// GET /api/v1/employees
pub async fn list_employees(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<DataResponse<Vec<EmployeeSummary>>> {
    let rows = state.employees().list_current(params.limit).await?;
    Ok(DataResponse::new(rows))
}

/// Fetch one employee's full record
///
/// GET /api/v1/employees/{employee_id}
pub async fn get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
) -> ApiResult<DataResponse<EmployeeDetails>> {
    let details = state
        .employees()
        .find_details(employee_id)
        .await?
        .ok_or_else(|| GatewayError::not_found(format!("employee {employee_id}")))?;
    Ok(DataResponse::new(details))
}
