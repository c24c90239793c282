//! Salary report models

use serde::Serialize;
use sqlx::FromRow;

/// One row of the highest-earners report
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopEarner {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub amount: i64,
}
