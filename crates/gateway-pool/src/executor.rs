//! Query executor
//!
//! Runs prepared, bound statements on a leased Postgres connection under a
//! hard execution deadline. Driver errors never cross this boundary raw:
//! they are classified into the gateway taxonomy, and a connection whose
//! state is unknown (timeout, I/O failure) is poisoned so the pool retires
//! it instead of reusing it.
//!
//! Parameters are always bound via sqlx (`bind` / `QueryBuilder::push_bind`);
//! nothing in this workspace interpolates values into SQL text.

use std::time::Duration;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, Postgres};
use tracing::warn;

use gateway_common::{GatewayError, GatewayResult};

use crate::postgres::PgLease;

/// Fetch every row of a bound query as a typed model
pub async fn fetch_all<T>(
    lease: &mut PgLease,
    timeout: Duration,
    query: QueryAs<'_, Postgres, T, PgArguments>,
) -> GatewayResult<Vec<T>>
where
    T: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    lease.begin_statement();
    let outcome = tokio::time::timeout(timeout, query.fetch_all(lease.connection_mut())).await;
    lease.end_statement();
    settle(lease, timeout, outcome)
}

/// Fetch at most one row of a bound query as a typed model
pub async fn fetch_optional<T>(
    lease: &mut PgLease,
    timeout: Duration,
    query: QueryAs<'_, Postgres, T, PgArguments>,
) -> GatewayResult<Option<T>>
where
    T: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    lease.begin_statement();
    let outcome = tokio::time::timeout(timeout, query.fetch_optional(lease.connection_mut())).await;
    lease.end_statement();
    settle(lease, timeout, outcome)
}

/// Run a bound mutation, returning the affected-row count
pub async fn execute(
    lease: &mut PgLease,
    timeout: Duration,
    query: Query<'_, Postgres, PgArguments>,
) -> GatewayResult<u64> {
    lease.begin_statement();
    let outcome = tokio::time::timeout(timeout, query.execute(lease.connection_mut())).await;
    lease.end_statement();
    settle(lease, timeout, outcome).map(|done| done.rows_affected())
}

/// Apply the shared timeout / poisoning / classification discipline
fn settle<T>(
    lease: &mut PgLease,
    timeout: Duration,
    outcome: Result<Result<T, sqlx::Error>, tokio::time::error::Elapsed>,
) -> GatewayResult<T> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            if is_fatal(&e) {
                lease.poison();
            }
            Err(map_sqlx_error(e))
        }
        Err(_elapsed) => {
            // Postgres offers no reliable per-statement cancel on a raw
            // connection, so the connection state is unknown; retire it.
            warn!(timeout_ms = timeout.as_millis() as u64, "statement timed out");
            lease.poison();
            Err(GatewayError::StatementTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}

/// Whether the connection itself is unusable after this error
fn is_fatal(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_) | sqlx::Error::Protocol(_) | sqlx::Error::WorkerCrashed
    )
}

/// Wrap a driver error into the gateway taxonomy
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> GatewayError {
    match e {
        sqlx::Error::Io(e) => GatewayError::ConnectionLost(e.to_string()),
        sqlx::Error::Protocol(message) => GatewayError::ConnectionLost(message),
        sqlx::Error::WorkerCrashed => {
            GatewayError::ConnectionLost("connection worker crashed".into())
        }
        sqlx::Error::RowNotFound => GatewayError::not_found("row"),
        sqlx::Error::Database(db) => GatewayError::QueryFailed(db.message().to_string()),
        other => GatewayError::QueryFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_connection_lost() {
        let e = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        assert!(is_fatal(&e));
        assert!(matches!(
            map_sqlx_error(e),
            GatewayError::ConnectionLost(_)
        ));
    }

    #[test]
    fn protocol_errors_map_to_connection_lost() {
        let e = sqlx::Error::Protocol("unexpected message".into());
        assert!(is_fatal(&e));
        assert!(matches!(
            map_sqlx_error(e),
            GatewayError::ConnectionLost(_)
        ));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(!is_fatal(&sqlx::Error::RowNotFound));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            GatewayError::NotFound(_)
        ));
    }

    #[test]
    fn decode_errors_map_to_query_failed() {
        let e = sqlx::Error::ColumnNotFound("missing".into());
        assert!(!is_fatal(&e));
        assert!(matches!(map_sqlx_error(e), GatewayError::QueryFailed(_)));
    }
}
