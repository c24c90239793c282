//! # gateway-pool
//!
//! The core of the query gateway: a bounded connection pool with leased
//! connections, a timeout-enforcing query executor, explicit transactions,
//! and a health monitor probing the pool.
//!
//! ## Overview
//!
//! The pool is generic over a [`ConnectionManager`] that knows how to open,
//! validate, and close one connection. The Postgres backend
//! ([`postgres::PgConnectionManager`]) drives raw `sqlx::PgConnection`s;
//! sqlx's own pool is deliberately not used — handing out leases with
//! bounded concurrency is this crate's job.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_pool::{open_pool, executor};
//!
//! async fn example(config: &gateway_common::AppConfig) -> gateway_common::GatewayResult<()> {
//!     let pool = open_pool(&config.database, &config.pool).await;
//!     let mut lease = pool.acquire().await?;
//!     let n = executor::execute(
//!         &mut lease,
//!         config.pool.statement_timeout,
//!         sqlx::query("UPDATE salary SET to_date = CURRENT_DATE WHERE employee_id = $1")
//!             .bind(10_001_i64),
//!     )
//!     .await?;
//!     // Lease returns to the pool when dropped
//!     Ok(())
//! }
//! ```

pub mod executor;
pub mod health;
pub mod manager;
pub mod pool;
pub mod postgres;
pub mod transaction;

// Re-export commonly used types
pub use health::{HealthMonitor, HealthState, HealthStatus};
pub use manager::ConnectionManager;
pub use pool::{Lease, Pool, PoolConfig, PoolStatus};
pub use postgres::{open_pool, PgConnectionManager, PgLease, PgPool};
pub use transaction::{Transaction, TxState};
