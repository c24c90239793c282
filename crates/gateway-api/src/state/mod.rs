//! Application state
//!
//! Holds the shared pool, the health monitor, the repositories, and the
//! configuration. Handlers receive the state by reference through Axum;
//! nothing here is ambient global state.

use std::sync::Arc;

use gateway_common::AppConfig;
use gateway_db::{EmployeeRepository, ReportRepository, SalaryRepository, TransferRepository};
use gateway_pool::{HealthMonitor, PgConnectionManager, PgPool};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    health: Arc<HealthMonitor<PgConnectionManager>>,
    employees: EmployeeRepository,
    reports: ReportRepository,
    salaries: SalaryRepository,
    transfers: TransferRepository,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new AppState around an opened pool
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let statement_timeout = config.pool.statement_timeout;
        let health = Arc::new(HealthMonitor::new(pool.clone(), &config.health));
        Self {
            employees: EmployeeRepository::new(pool.clone(), statement_timeout),
            reports: ReportRepository::new(pool.clone(), statement_timeout),
            salaries: SalaryRepository::new(pool.clone(), statement_timeout),
            transfers: TransferRepository::new(pool.clone(), statement_timeout),
            health,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the health monitor
    pub fn health(&self) -> &Arc<HealthMonitor<PgConnectionManager>> {
        &self.health
    }

    /// Get the employee repository
    pub fn employees(&self) -> &EmployeeRepository {
        &self.employees
    }

    /// Get the report repository
    pub fn reports(&self) -> &ReportRepository {
        &self.reports
    }

    /// Get the salary repository
    pub fn salaries(&self) -> &SalaryRepository {
        &self.salaries
    }

    /// Get the transfer repository
    pub fn transfers(&self) -> &TransferRepository {
        &self.transfers
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pool", &self.pool.status())
            .field("config", &"AppConfig")
            .finish()
    }
}
