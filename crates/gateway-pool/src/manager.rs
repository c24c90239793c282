//! Connection manager trait
//!
//! The seam between the generic pool and a concrete database backend.
//! A manager knows how to open one connection, verify it is alive, and
//! close it. Additional backends (MySQL, SQL Server) would land here.

use async_trait::async_trait;
use gateway_common::GatewayResult;

/// Opens, validates, and closes connections on behalf of the pool
#[async_trait]
pub trait ConnectionManager: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Establish a new connection
    async fn connect(&self) -> GatewayResult<Self::Connection>;

    /// Run a cheap liveness probe against the connection
    ///
    /// Used both when vetting an idle connection before hand-out and as
    /// the health monitor's probe query.
    async fn check(&self, conn: &mut Self::Connection) -> GatewayResult<()>;

    /// Close the connection gracefully
    async fn close(&self, conn: Self::Connection);
}
