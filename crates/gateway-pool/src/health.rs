//! Health monitor
//!
//! Probes the pool on demand: acquire a lease under a short deadline, run
//! the backend's liveness check, release immediately. The lease is never
//! held past the probe.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use gateway_common::HealthSettings;

use crate::manager::ConnectionManager;
use crate::pool::{Pool, PoolStatus};

/// Health verdict for the gateway's database path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Connectivity confirmed, capacity available
    Ok,
    /// Connectivity confirmed, but pool utilization is at or above the
    /// configured threshold
    Degraded,
    /// Could not acquire a connection or the probe query failed
    Unavailable,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Degraded => "degraded",
            Self::Unavailable => "unavailable",
        }
    }

    /// Whether the gateway can still serve queries
    #[must_use]
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Outcome of one probe; derived, never persisted
#[derive(Debug, Clone, Copy)]
pub struct HealthStatus {
    pub state: HealthState,
    pub db_connected: bool,
    pub pool: PoolStatus,
    pub checked_at: DateTime<Utc>,
}

/// Probes the pool and classifies the result
pub struct HealthMonitor<M: ConnectionManager> {
    pool: Pool<M>,
    probe_timeout: Duration,
    degraded_utilization: f64,
}

impl<M: ConnectionManager> HealthMonitor<M> {
    pub fn new(pool: Pool<M>, settings: &HealthSettings) -> Self {
        Self {
            pool,
            probe_timeout: settings.probe_timeout,
            degraded_utilization: settings.degraded_utilization,
        }
    }

    /// Probe the pool once
    ///
    /// Bounded by the probe timeout on both the acquire and the query; a
    /// broken backend yields `Unavailable` within that window, never a hang.
    pub async fn check(&self) -> HealthStatus {
        let checked_at = Utc::now();
        // Snapshot utilization before the probe's own lease skews it
        let pool_status = self.pool.status();
        let started = Instant::now();

        let mut lease = match self.pool.acquire_timeout(self.probe_timeout).await {
            Ok(lease) => lease,
            Err(e) => {
                debug!(error = %e, "health probe could not acquire a connection");
                return HealthStatus {
                    state: HealthState::Unavailable,
                    db_connected: false,
                    pool: pool_status,
                    checked_at,
                };
            }
        };

        let remaining = self
            .probe_timeout
            .saturating_sub(started.elapsed())
            .max(Duration::from_millis(1));
        let probe =
            tokio::time::timeout(remaining, self.pool.manager().check(lease.connection_mut()))
                .await;

        let state = match probe {
            Ok(Ok(())) => {
                lease.release();
                if pool_status.utilization() >= self.degraded_utilization {
                    HealthState::Degraded
                } else {
                    HealthState::Ok
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "health probe query failed");
                lease.discard();
                HealthState::Unavailable
            }
            Err(_elapsed) => {
                warn!(timeout_ms = self.probe_timeout.as_millis() as u64, "health probe timed out");
                lease.discard();
                HealthState::Unavailable
            }
        };

        HealthStatus {
            state,
            db_connected: state.is_available(),
            pool: pool_status,
            checked_at,
        }
    }

    /// Re-probe on an interval, logging state transitions
    ///
    /// Exits when the pool is closed. The handle can be aborted earlier.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let monitor = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last: Option<HealthState> = None;
            loop {
                ticker.tick().await;
                if monitor.pool.is_closed() {
                    break;
                }
                let status = monitor.check().await;
                if last != Some(status.state) {
                    info!(
                        state = status.state.as_str(),
                        in_use = status.pool.in_use,
                        idle = status.pool.idle,
                        "health state changed"
                    );
                }
                last = Some(status.state);
            }
        })
    }
}
