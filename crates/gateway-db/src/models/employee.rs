//! Employee row models

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// One employee with their current assignment, as listed by search and
/// list endpoints
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmployeeSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Current title, if any
    pub title: Option<String>,
    /// Current department name, if assigned
    pub department: Option<String>,
    /// Current salary amount, if on payroll
    pub salary: Option<i64>,
}

/// Full employee record for the details endpoint
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmployeeDetails {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    pub title: Option<String>,
    pub department: Option<String>,
    pub salary: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_optional_fields_as_null() {
        let summary = EmployeeSummary {
            id: 10_001,
            first_name: "Georgi".to_string(),
            last_name: "Facello".to_string(),
            title: None,
            department: Some("Development".to_string()),
            salary: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["id"], 10_001);
        assert_eq!(json["department"], "Development");
        assert!(json["title"].is_null());
        assert!(json["salary"].is_null());
    }
}
