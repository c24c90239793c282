//! Reporting queries

use std::time::Duration;

use tracing::instrument;

use gateway_common::GatewayResult;
use gateway_pool::{executor, PgPool};

use crate::models::{DepartmentAverage, TopEarner};

/// Aggregated reporting queries
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
    statement_timeout: Duration,
}

impl ReportRepository {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Average current salary and headcount per department
    #[instrument(skip(self))]
    pub async fn department_averages(&self) -> GatewayResult<Vec<DepartmentAverage>> {
        let mut lease = self.pool.acquire().await?;
        let query = sqlx::query_as::<_, DepartmentAverage>(
            "SELECT d.dept_name AS department, \
                    AVG(s.amount)::float8 AS avg_salary, \
                    COUNT(DISTINCT e.id) AS headcount \
             FROM department d \
             JOIN department_employee de \
                    ON de.department_id = d.id AND de.to_date = '9999-01-01' \
             JOIN employee e ON e.id = de.employee_id \
             JOIN salary s ON s.employee_id = e.id AND s.to_date = '9999-01-01' \
             GROUP BY d.dept_name \
             ORDER BY avg_salary DESC",
        );
        executor::fetch_all(&mut lease, self.statement_timeout, query).await
    }

    /// Highest current salaries across the company
    #[instrument(skip(self))]
    pub async fn top_earners(&self, limit: i64) -> GatewayResult<Vec<TopEarner>> {
        let mut lease = self.pool.acquire().await?;
        let query = sqlx::query_as::<_, TopEarner>(
            "SELECT e.id AS employee_id, e.first_name, e.last_name, s.amount \
             FROM employee e \
             JOIN salary s ON s.employee_id = e.id AND s.to_date = '9999-01-01' \
             ORDER BY s.amount DESC, e.id \
             LIMIT $1",
        )
        .bind(limit.clamp(1, 100));
        executor::fetch_all(&mut lease, self.statement_timeout, query).await
    }
}
