//! Salary adjustment workflow

use std::time::Duration;

use tracing::instrument;

use gateway_common::{GatewayError, GatewayResult};
use gateway_pool::{PgPool, Transaction};

/// Salary mutations
#[derive(Clone)]
pub struct SalaryRepository {
    pool: PgPool,
    statement_timeout: Duration,
}

impl SalaryRepository {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Set an employee's salary: end the current row, insert the new one
    ///
    /// Both statements run in one transaction on one leased connection.
    /// Returns the total affected-row count on commit.
    #[instrument(skip(self))]
    pub async fn adjust(&self, employee_id: i64, amount: i64) -> GatewayResult<u64> {
        if amount <= 0 {
            return Err(GatewayError::validation("amount must be positive"));
        }

        let mut lease = self.pool.acquire().await?;
        let mut tx = Transaction::begin(&mut lease, self.statement_timeout).await?;

        let ended = match tx
            .execute(
                sqlx::query(
                    "UPDATE salary \
                     SET to_date = CURRENT_DATE \
                     WHERE employee_id = $1 AND to_date = '9999-01-01'",
                )
                .bind(employee_id),
            )
            .await
        {
            Ok(ended) => ended,
            Err(e) => return Err(tx.fail(e).await),
        };

        if ended == 0 {
            tx.rollback().await?;
            return Err(GatewayError::not_found(format!("employee {employee_id}")));
        }

        if let Err(e) = tx
            .execute(
                sqlx::query(
                    "INSERT INTO salary (employee_id, amount, from_date, to_date) \
                     VALUES ($1, $2, CURRENT_DATE, '9999-01-01')",
                )
                .bind(employee_id)
                .bind(amount),
            )
            .await
        {
            return Err(tx.fail(e).await);
        }

        tx.commit().await
    }
}
