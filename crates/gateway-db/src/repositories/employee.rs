//! Employee queries

use std::time::Duration;

use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use gateway_common::GatewayResult;
use gateway_pool::{executor, PgPool};

use crate::models::{EmployeeDetails, EmployeeSummary};

/// Search filter for the employee directory
#[derive(Debug, Clone, Default)]
pub struct EmployeeSearchFilter {
    /// Matches first or last name, case-insensitive substring
    pub name: Option<String>,
    /// Matches department name, case-insensitive substring
    pub department: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

impl EmployeeSearchFilter {
    /// Page size clamped to a sane window
    fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }

    fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

/// Employee directory queries
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
    statement_timeout: Duration,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Search employees by name and/or department, paginated
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        filter: &EmployeeSearchFilter,
    ) -> GatewayResult<Vec<EmployeeSummary>> {
        let mut lease = self.pool.acquire().await?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT e.id, e.first_name, e.last_name, \
                    t.title, d.dept_name AS department, s.amount AS salary \
             FROM employee e \
             LEFT JOIN department_employee de \
                    ON de.employee_id = e.id AND de.to_date = '9999-01-01' \
             LEFT JOIN department d ON d.id = de.department_id \
             LEFT JOIN title t ON t.employee_id = e.id AND t.to_date = '9999-01-01' \
             LEFT JOIN salary s ON s.employee_id = e.id AND s.to_date = '9999-01-01' \
             WHERE 1=1",
        );

        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{name}%");
            builder.push(" AND (e.first_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR e.last_name ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if let Some(department) = filter.department.as_deref().filter(|s| !s.is_empty()) {
            builder.push(" AND d.dept_name ILIKE ");
            builder.push_bind(format!("%{department}%"));
        }

        builder.push(" ORDER BY e.last_name, e.first_name, e.id LIMIT ");
        builder.push_bind(filter.limit());
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset());

        let query = builder.build_query_as::<EmployeeSummary>();
        executor::fetch_all(&mut lease, self.statement_timeout, query).await
    }

    /// List employees with their current assignment, bounded
    ///
    /// The unbounded list endpoints in the legacy services are the reason
    /// this takes an explicit cap.
    #[instrument(skip(self))]
    pub async fn list_current(&self, limit: i64) -> GatewayResult<Vec<EmployeeSummary>> {
        let mut lease = self.pool.acquire().await?;
        let query = sqlx::query_as::<_, EmployeeSummary>(
            "SELECT e.id, e.first_name, e.last_name, \
                    t.title, d.dept_name AS department, s.amount AS salary \
             FROM employee e \
             JOIN department_employee de \
                    ON de.employee_id = e.id AND de.to_date = '9999-01-01' \
             JOIN department d ON d.id = de.department_id \
             LEFT JOIN title t ON t.employee_id = e.id AND t.to_date = '9999-01-01' \
             LEFT JOIN salary s ON s.employee_id = e.id AND s.to_date = '9999-01-01' \
             ORDER BY e.id \
             LIMIT $1",
        )
        .bind(limit.clamp(1, 1_000));
        executor::fetch_all(&mut lease, self.statement_timeout, query).await
    }

    /// Fetch one employee's full record
    #[instrument(skip(self))]
    pub async fn find_details(&self, id: i64) -> GatewayResult<Option<EmployeeDetails>> {
        let mut lease = self.pool.acquire().await?;
        let query = sqlx::query_as::<_, EmployeeDetails>(
            "SELECT e.id, e.first_name, e.last_name, e.gender::text AS gender, \
                    e.birth_date, e.hire_date, \
                    t.title, d.dept_name AS department, s.amount AS salary \
             FROM employee e \
             LEFT JOIN department_employee de \
                    ON de.employee_id = e.id AND de.to_date = '9999-01-01' \
             LEFT JOIN department d ON d.id = de.department_id \
             LEFT JOIN title t ON t.employee_id = e.id AND t.to_date = '9999-01-01' \
             LEFT JOIN salary s ON s.employee_id = e.id AND s.to_date = '9999-01-01' \
             WHERE e.id = $1",
        )
        .bind(id);
        executor::fetch_optional(&mut lease, self.statement_timeout, query).await
    }
}
