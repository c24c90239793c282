//! Row models
//!
//! Shapes of the rows the repositories return, decoded via sqlx `FromRow`
//! and serialized straight into response bodies.

mod department;
mod employee;
mod salary;

pub use department::DepartmentAverage;
pub use employee::{EmployeeDetails, EmployeeSummary};
pub use salary::TopEarner;
