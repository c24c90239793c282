//! Department report models

use serde::Serialize;
use sqlx::FromRow;

/// Average salary and headcount per department
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentAverage {
    pub department: String,
    /// Cast to float8 in SQL so no decimal type crosses the wire
    pub avg_salary: f64,
    pub headcount: i64,
}
