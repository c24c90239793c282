//! PostgreSQL backend for the pool
//!
//! Owns raw `sqlx::PgConnection`s; the probe query is a literal `SELECT 1`.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::debug;

use gateway_common::{DatabaseSettings, GatewayError, GatewayResult, PoolSettings};

use crate::manager::ConnectionManager;
use crate::pool::{Lease, Pool, PoolConfig};

/// Pool over PostgreSQL connections
pub type PgPool = Pool<PgConnectionManager>;

/// Lease of one PostgreSQL connection
pub type PgLease = Lease<PgConnectionManager>;

/// Opens and probes PostgreSQL connections
pub struct PgConnectionManager {
    options: PgConnectOptions,
}

impl PgConnectionManager {
    /// Build a manager from discrete endpoint settings
    pub fn new(settings: &DatabaseSettings) -> Self {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);
        Self { options }
    }
}

#[async_trait]
impl ConnectionManager for PgConnectionManager {
    type Connection = PgConnection;

    async fn connect(&self) -> GatewayResult<PgConnection> {
        self.options
            .connect()
            .await
            .map_err(|e| GatewayError::ConnectionLost(e.to_string()))
    }

    async fn check(&self, conn: &mut PgConnection) -> GatewayResult<()> {
        sqlx::query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map(|_| ())
            .map_err(|e| GatewayError::ConnectionLost(e.to_string()))
    }

    async fn close(&self, conn: PgConnection) {
        if let Err(e) = conn.close().await {
            debug!(error = %e, "error closing connection");
        }
    }
}

/// Open a PostgreSQL pool from the application settings
pub async fn open_pool(database: &DatabaseSettings, pool: &PoolSettings) -> PgPool {
    Pool::open(PgConnectionManager::new(database), PoolConfig::from(pool)).await
}
