//! # gateway-db
//!
//! Database layer for the query gateway: typed row models with sqlx
//! `FromRow` derives and repositories that run bound statements through the
//! pooled executor.
//!
//! All SQL lives here. Every value reaching a statement is bound — the
//! repositories never interpolate caller input into query text.

pub mod models;
pub mod repositories;

// Re-export commonly used types
pub use models::{DepartmentAverage, EmployeeDetails, EmployeeSummary, TopEarner};
pub use repositories::{
    EmployeeRepository, EmployeeSearchFilter, ReportRepository, SalaryRepository,
    TransferOutcome, TransferRepository, TransferRequest,
};
