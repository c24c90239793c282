//! Bulk department transfer handler

use axum::extract::State;
use gateway_db::TransferRequest;
use serde::Deserialize;
use validator::Validate;

use crate::extractors::ValidatedJson;
use crate::response::{ApiResult, MutationResponse};
use crate::state::AppState;

/// Request body for a bulk transfer
#[derive(Debug, Deserialize, Validate)]
pub struct TransferBody {
    #[validate(length(min = 1, message = "source_department is required"))]
    pub source_department: String,
    #[validate(length(min = 1, message = "target_department is required"))]
    pub target_department: String,
    /// Upper bound on employees moved in this call
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Move employees between departments in one set-based transaction
///
/// POST /api/v1/employees/transfer
pub async fn transfer_employees(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<TransferBody>,
) -> ApiResult<MutationResponse> {
    let request = TransferRequest {
        source_department: body.source_department,
        target_department: body.target_department,
        limit: body.limit,
    };
    let outcome = state.transfers().transfer_department(&request).await?;
    Ok(MutationResponse::new(format!(
        "transferred {} employees from {} to {}",
        outcome.transferred, request.source_department, request.target_department
    ))
    .with_affected_rows(outcome.transferred))
}
