//! Bulk department transfer workflow
//!
//! The representative multi-statement transactional mutation. The legacy
//! services moved employees with a two-step update/insert over a
//! CURRENT_DATE marker; here the whole move is one set-based CTE statement
//! inside an explicit transaction.

use std::time::Duration;

use serde::Serialize;
use tracing::instrument;

use gateway_common::{GatewayError, GatewayResult};
use gateway_pool::{PgPool, Transaction};

/// Largest batch one transfer call may move
pub const MAX_TRANSFER_BATCH: i64 = 1_000;

/// Inputs of a bulk transfer
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source_department: String,
    pub target_department: String,
    /// Upper bound on employees moved in this call
    pub limit: i64,
}

impl TransferRequest {
    /// Reject bad input before any connection is acquired
    pub fn validate(&self) -> GatewayResult<()> {
        if self.source_department.trim().is_empty() || self.target_department.trim().is_empty() {
            return Err(GatewayError::validation(
                "source and target department identifiers are required",
            ));
        }
        if self.source_department == self.target_department {
            return Err(GatewayError::validation(
                "source and target departments must differ",
            ));
        }
        if !(1..=MAX_TRANSFER_BATCH).contains(&self.limit) {
            return Err(GatewayError::validation(format!(
                "limit must be between 1 and {MAX_TRANSFER_BATCH}"
            )));
        }
        Ok(())
    }
}

/// Result of a committed transfer
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TransferOutcome {
    pub transferred: u64,
}

/// Department transfer mutations
#[derive(Clone)]
pub struct TransferRepository {
    pool: PgPool,
    statement_timeout: Duration,
}

impl TransferRepository {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Move up to `limit` employees from one department to another
    ///
    /// Skips employees already assigned to the target. Commits exactly one
    /// set-based statement or rolls back; the connection is released in
    /// both cases.
    #[instrument(skip(self), fields(source = %request.source_department, target = %request.target_department))]
    pub async fn transfer_department(
        &self,
        request: &TransferRequest,
    ) -> GatewayResult<TransferOutcome> {
        request.validate()?;

        let mut lease = self.pool.acquire().await?;
        let mut tx = Transaction::begin(&mut lease, self.statement_timeout).await?;

        let outcome = tx
            .execute(
                sqlx::query(
                    "WITH moved AS ( \
                         UPDATE department_employee de \
                         SET to_date = CURRENT_DATE \
                         WHERE de.department_id = $1 \
                           AND de.to_date = '9999-01-01' \
                           AND de.employee_id IN ( \
                               SELECT de2.employee_id \
                               FROM department_employee de2 \
                               WHERE de2.department_id = $1 \
                                 AND de2.to_date = '9999-01-01' \
                                 AND NOT EXISTS ( \
                                     SELECT 1 FROM department_employee de3 \
                                     WHERE de3.employee_id = de2.employee_id \
                                       AND de3.department_id = $2 \
                                       AND de3.to_date = '9999-01-01' \
                                 ) \
                               ORDER BY de2.employee_id \
                               LIMIT $3 \
                           ) \
                         RETURNING de.employee_id \
                     ) \
                     INSERT INTO department_employee \
                         (employee_id, department_id, from_date, to_date) \
                     SELECT employee_id, $2, CURRENT_DATE, '9999-01-01' \
                     FROM moved \
                     ON CONFLICT (employee_id, department_id) DO NOTHING",
                )
                .bind(&request.source_department)
                .bind(&request.target_department)
                .bind(request.limit),
            )
            .await;

        match outcome {
            Ok(transferred) => {
                tx.commit().await?;
                Ok(TransferOutcome { transferred })
            }
            Err(e) => Err(tx.fail(e).await),
        }
    }
}
