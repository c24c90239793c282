//! Explicit transactions on a leased connection
//!
//! Lifecycle: `Idle -> Began -> { Committed, RolledBack }`. A transaction
//! never outlives its lease, and a connection is never returned to the pool
//! with a transaction still open: dropping a `Transaction` in `Began`
//! poisons the lease, which retires the connection (the server aborts the
//! open transaction when the socket goes away).

use std::fmt;
use std::time::Duration;

use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;
use tracing::warn;

use gateway_common::{GatewayError, GatewayResult};

use crate::executor;
use crate::postgres::PgLease;

/// Transaction lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Began,
    Committed,
    RolledBack,
}

impl TxState {
    /// Whether `next` is a legal successor state
    #[must_use]
    pub fn can_transition_to(self, next: TxState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Began)
                | (Self::Began, Self::Committed)
                | (Self::Began, Self::RolledBack)
        )
    }

    /// Whether the transaction has finished, one way or the other
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Began => "began",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

/// An open transaction on one leased connection
///
/// Statements execute strictly in submission order on the same connection.
pub struct Transaction<'a> {
    lease: &'a mut PgLease,
    state: TxState,
    statement_timeout: Duration,
    rows_affected: u64,
}

impl<'a> Transaction<'a> {
    /// Begin a transaction on the leased connection
    pub async fn begin(
        lease: &'a mut PgLease,
        statement_timeout: Duration,
    ) -> GatewayResult<Transaction<'a>> {
        executor::execute(lease, statement_timeout, sqlx::query("BEGIN")).await?;
        Ok(Self {
            lease,
            state: TxState::Began,
            statement_timeout,
            rows_affected: 0,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Run one bound mutation inside the transaction
    ///
    /// On error the transaction stays open so the caller decides between
    /// [`Self::fail`] (rollback + wrap) and propagating; if the error
    /// poisoned the lease the rollback is implicit in retiring the
    /// connection.
    pub async fn execute(
        &mut self,
        query: Query<'_, Postgres, PgArguments>,
    ) -> GatewayResult<u64> {
        debug_assert_eq!(self.state, TxState::Began, "statement outside transaction");
        let affected = executor::execute(self.lease, self.statement_timeout, query).await?;
        self.rows_affected += affected;
        Ok(affected)
    }

    /// Commit, consuming the transaction and reporting total affected rows
    pub async fn commit(mut self) -> GatewayResult<u64> {
        debug_assert!(self.state.can_transition_to(TxState::Committed));
        match executor::execute(self.lease, self.statement_timeout, sqlx::query("COMMIT")).await {
            Ok(_) => {
                self.state = TxState::Committed;
                Ok(self.rows_affected)
            }
            Err(e) => {
                // A failed COMMIT leaves the outcome unknown; retire the
                // connection and report the workflow as rolled back.
                self.lease.poison();
                self.state = TxState::RolledBack;
                Err(GatewayError::TransactionFailed {
                    message: e.to_string(),
                    rows_affected: 0,
                })
            }
        }
    }

    /// Roll back, consuming the transaction
    pub async fn rollback(mut self) -> GatewayResult<()> {
        self.rollback_inner().await;
        Ok(())
    }

    /// Roll back and wrap a statement failure as `TransactionFailed`
    ///
    /// The affected-row count reported to the caller is zero: the rollback
    /// undid everything this transaction had changed.
    pub async fn fail(mut self, cause: GatewayError) -> GatewayError {
        self.rollback_inner().await;
        GatewayError::TransactionFailed {
            message: cause.to_string(),
            rows_affected: 0,
        }
    }

    async fn rollback_inner(&mut self) {
        if self.state != TxState::Began {
            return;
        }
        if self.lease.is_poisoned() {
            // The connection is already being retired; the server aborts
            // the open transaction with it.
            self.state = TxState::RolledBack;
            return;
        }
        match executor::execute(self.lease, self.statement_timeout, sqlx::query("ROLLBACK")).await
        {
            Ok(_) => self.state = TxState::RolledBack,
            Err(e) => {
                warn!(error = %e, "rollback failed; retiring connection");
                self.lease.poison();
                self.state = TxState::RolledBack;
            }
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state == TxState::Began {
            warn!("transaction dropped while open; retiring connection");
            self.lease.poison();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        assert!(TxState::Idle.can_transition_to(TxState::Began));
        assert!(TxState::Began.can_transition_to(TxState::Committed));
        assert!(TxState::Began.can_transition_to(TxState::RolledBack));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert!(!TxState::Idle.can_transition_to(TxState::Committed));
        assert!(!TxState::Idle.can_transition_to(TxState::RolledBack));
        assert!(!TxState::Committed.can_transition_to(TxState::RolledBack));
        assert!(!TxState::RolledBack.can_transition_to(TxState::Committed));
        assert!(!TxState::Committed.can_transition_to(TxState::Began));
        assert!(!TxState::Began.can_transition_to(TxState::Began));
    }

    #[test]
    fn exactly_commit_or_rollback_is_terminal() {
        assert!(!TxState::Idle.is_terminal());
        assert!(!TxState::Began.is_terminal());
        assert!(TxState::Committed.is_terminal());
        assert!(TxState::RolledBack.is_terminal());
    }

    #[test]
    fn display_names() {
        assert_eq!(TxState::Began.to_string(), "began");
        assert_eq!(TxState::RolledBack.to_string(), "rolled_back");
    }
}
