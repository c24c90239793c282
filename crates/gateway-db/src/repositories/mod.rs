//! Repositories
//!
//! One repository per endpoint family; each acquires a lease per call and
//! releases it on every exit path via RAII.

mod employee;
mod reports;
mod salary;
mod transfer;

pub use employee::{EmployeeRepository, EmployeeSearchFilter};
pub use reports::ReportRepository;
pub use salary::SalaryRepository;
pub use transfer::{TransferOutcome, TransferRepository, TransferRequest};
