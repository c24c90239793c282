//! Salary adjustment handler

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::extractors::ValidatedJson;
use crate::response::{ApiResult, MutationResponse};
use crate::state::AppState;

/// Request body for a salary adjustment
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustSalaryBody {
    pub employee_id: i64,
    /// New salary amount; must be positive
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
}

/// End the employee's current salary row and insert the new one
///
/// PUT /api/v1/salaries/adjust
pub async fn adjust_salary(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<AdjustSalaryBody>,
) -> ApiResult<MutationResponse> {
    let affected = state
        .salaries()
        .adjust(body.employee_id, body.amount)
        .await?;
    Ok(MutationResponse::new(format!(
        "salary updated for employee {}",
        body.employee_id
    ))
    .with_affected_rows(affected))
}
