//! Bounded connection pool with leased connections
//!
//! One shared pool hands connections out as RAII [`Lease`]s. Capacity is
//! enforced with a semaphore, the free list is a LIFO stack guarded by a
//! single mutex, and every exit path (drop, explicit release, discard,
//! caller cancellation) returns or retires the connection exactly once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use gateway_common::{GatewayError, GatewayResult, PoolSettings};

use crate::manager::ConnectionManager;

/// Pool tuning knobs
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on leased + idle connections
    pub max_size: usize,
    /// Idle connections kept alive past the idle timeout
    pub min_idle: usize,
    /// Maximum time a caller waits for a free connection
    pub acquire_timeout: Duration,
    /// Idle window after which surplus connections are closed
    pub idle_timeout: Duration,
    /// Probe idle connections before handing them out
    pub check_on_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(30),
            check_on_acquire: true,
        }
    }
}

impl From<&PoolSettings> for PoolConfig {
    fn from(settings: &PoolSettings) -> Self {
        Self {
            max_size: settings.max_size,
            min_idle: settings.min_idle,
            acquire_timeout: settings.acquire_timeout,
            idle_timeout: settings.idle_timeout,
            check_on_acquire: true,
        }
    }
}

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, leased + idle
    pub size: usize,
    /// Connections sitting in the free list
    pub idle: usize,
    /// Connections currently leased out
    pub in_use: usize,
    /// Configured upper bound
    pub max_size: usize,
}

impl PoolStatus {
    /// Fraction of capacity currently leased out
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.in_use as f64 / self.max_size as f64
        }
    }
}

/// Shared handle to the connection pool
///
/// Cloning is cheap; all clones drive the same pool.
pub struct Pool<M: ConnectionManager> {
    inner: Arc<PoolInner<M>>,
}

impl<M: ConnectionManager> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<M: ConnectionManager> {
    manager: Arc<M>,
    config: PoolConfig,
    /// Free list; newest entries at the back (LIFO reuse)
    idle: Mutex<Vec<IdleConn<M::Connection>>>,
    semaphore: Arc<Semaphore>,
    /// Open connections, leased + idle
    size: AtomicUsize,
    closed: AtomicBool,
}

struct IdleConn<C> {
    conn: C,
    since: Instant,
}

impl<M: ConnectionManager> Pool<M> {
    /// Open a pool, pre-warming `min_idle` connections (best effort) and
    /// spawning the idle reaper task
    pub async fn open(manager: M, config: PoolConfig) -> Self {
        let pool = Self {
            inner: Arc::new(PoolInner {
                manager: Arc::new(manager),
                semaphore: Arc::new(Semaphore::new(config.max_size)),
                idle: Mutex::new(Vec::with_capacity(config.max_size)),
                size: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                config,
            }),
        };

        for _ in 0..pool.inner.config.min_idle {
            match pool.inner.manager.connect().await {
                Ok(conn) => {
                    pool.inner.size.fetch_add(1, Ordering::Release);
                    pool.inner.idle.lock().push(IdleConn {
                        conn,
                        since: Instant::now(),
                    });
                }
                Err(e) => {
                    // Not fatal: connections are opened lazily on demand
                    warn!(error = %e, "failed to pre-open pool connection");
                    break;
                }
            }
        }

        PoolInner::spawn_reaper(Arc::downgrade(&pool.inner));
        pool
    }

    /// Acquire a lease, waiting up to the configured acquire timeout
    pub async fn acquire(&self) -> GatewayResult<Lease<M>> {
        self.acquire_timeout(self.inner.config.acquire_timeout).await
    }

    /// Acquire a lease, waiting up to `timeout` for capacity
    ///
    /// Fails with `PoolExhausted` when the pool stays saturated for the
    /// whole window, and with `PoolClosed` once `close` has run. A
    /// connection that failed its last liveness check is never returned.
    pub async fn acquire_timeout(&self, timeout: Duration) -> GatewayResult<Lease<M>> {
        if self.is_closed() {
            return Err(GatewayError::PoolClosed);
        }

        let permit = match tokio::time::timeout(
            timeout,
            Arc::clone(&self.inner.semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            // Semaphore closed by `close()`
            Ok(Err(_)) => return Err(GatewayError::PoolClosed),
            Err(_) => {
                return Err(GatewayError::PoolExhausted {
                    waited_ms: timeout.as_millis() as u64,
                })
            }
        };

        if self.is_closed() {
            return Err(GatewayError::PoolClosed);
        }

        // Reuse the freshest idle connection that is not expired and still
        // passes its liveness check; fall through to a new connection.
        loop {
            let entry = self.inner.idle.lock().pop();
            let Some(IdleConn { mut conn, since }) = entry else {
                break;
            };

            if since.elapsed() >= self.inner.config.idle_timeout {
                self.inner.retire(conn).await;
                continue;
            }

            if self.inner.config.check_on_acquire {
                if let Err(e) = self.inner.manager.check(&mut conn).await {
                    debug!(error = %e, "discarding idle connection that failed liveness check");
                    self.inner.retire(conn).await;
                    continue;
                }
            }

            return Ok(Lease::new(conn, self.clone(), permit));
        }

        // Free list empty: open a replacement lazily. On failure the permit
        // drops here and the capacity slot is released to other waiters.
        let conn = self.inner.manager.connect().await?;
        self.inner.size.fetch_add(1, Ordering::Release);
        Ok(Lease::new(conn, self.clone(), permit))
    }

    /// Current pool counters
    pub fn status(&self) -> PoolStatus {
        let size = self.inner.size.load(Ordering::Acquire);
        let idle = self.inner.idle.lock().len();
        PoolStatus {
            size,
            idle,
            in_use: size.saturating_sub(idle),
            max_size: self.inner.config.max_size,
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Drain and close all idle connections and wake blocked waiters
    ///
    /// Idempotent. Leased connections are retired when their leases drop.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.semaphore.close();

        let drained: Vec<_> = self.inner.idle.lock().drain(..).collect();
        for entry in drained {
            self.inner.retire(entry.conn).await;
        }
        info!("connection pool closed");
    }

    pub(crate) fn manager(&self) -> &M {
        &self.inner.manager
    }
}

impl<M: ConnectionManager> PoolInner<M> {
    /// Close a connection and forget it
    async fn retire(&self, conn: M::Connection) {
        self.size.fetch_sub(1, Ordering::Release);
        self.manager.close(conn).await;
    }

    /// Synchronous variant used from `Lease::drop`; closes in a background
    /// task when a runtime is available, otherwise just drops the handle.
    fn retire_detached(&self, conn: M::Connection) {
        self.size.fetch_sub(1, Ordering::Release);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let manager = Arc::clone(&self.manager);
            handle.spawn(async move { manager.close(conn).await });
        } else {
            drop(conn);
        }
    }

    /// Take back a connection from a finished lease
    fn reclaim(&self, conn: M::Connection, broken: bool) {
        if broken || self.closed.load(Ordering::Acquire) {
            self.retire_detached(conn);
            return;
        }
        self.idle.lock().push(IdleConn {
            conn,
            since: Instant::now(),
        });
    }

    /// Pull idle connections past the idle timeout, sparing `min_idle`
    fn take_expired(&self) -> Vec<M::Connection> {
        let mut idle = self.idle.lock();
        let mut removable = idle.len().saturating_sub(self.config.min_idle);
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(idle.len());
        // Coldest entries sit at the front of the LIFO stack
        for entry in idle.drain(..) {
            if removable > 0 && entry.since.elapsed() >= self.config.idle_timeout {
                removable -= 1;
                expired.push(entry.conn);
            } else {
                kept.push(entry);
            }
        }
        *idle = kept;
        expired
    }

    /// Periodically close surplus idle connections
    fn spawn_reaper(weak: Weak<Self>) {
        tokio::spawn(async move {
            loop {
                let Some(pool) = weak.upgrade() else { break };
                if pool.closed.load(Ordering::Acquire) {
                    break;
                }

                let expired = pool.take_expired();
                for conn in expired {
                    pool.retire(conn).await;
                }

                let period = (pool.config.idle_timeout / 2).max(Duration::from_millis(100));
                drop(pool);
                tokio::time::sleep(period).await;
            }
        });
    }
}

/// Exclusive handle to one pooled connection
///
/// Returned to the pool when dropped. A lease that was poisoned (statement
/// timeout, I/O failure, caller cancellation mid-statement) retires its
/// connection instead; the pool opens a replacement lazily.
pub struct Lease<M: ConnectionManager> {
    conn: Option<M::Connection>,
    pool: Pool<M>,
    poisoned: bool,
    in_flight: bool,
    _permit: OwnedSemaphorePermit,
}

impl<M: ConnectionManager> Lease<M> {
    fn new(conn: M::Connection, pool: Pool<M>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            conn: Some(conn),
            pool,
            poisoned: false,
            in_flight: false,
            _permit: permit,
        }
    }

    /// Get the underlying connection
    ///
    /// # Panics
    /// Panics if called after the connection has been returned to the pool
    /// (structurally unreachable: release/discard consume the lease).
    pub fn connection(&self) -> &M::Connection {
        self.conn
            .as_ref()
            .expect("BUG: lease used after release")
    }

    /// Get mutable access to the underlying connection
    pub fn connection_mut(&mut self) -> &mut M::Connection {
        self.conn
            .as_mut()
            .expect("BUG: lease used after release")
    }

    /// Mark the connection as being in an unknown state
    ///
    /// A poisoned connection is retired on drop, never reused.
    pub fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Whether the connection has been marked unusable
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Return the connection to the pool
    ///
    /// Dropping the lease does the same; this spells it out at call sites.
    pub fn release(self) {
        drop(self);
    }

    /// Retire the connection instead of returning it
    pub fn discard(mut self) {
        self.poison();
        drop(self);
    }

    /// Flag that a statement is executing on this connection. If the lease
    /// is dropped before `end_statement` (caller cancelled mid-await), the
    /// connection state is unknown and the connection is retired.
    pub(crate) fn begin_statement(&mut self) {
        self.in_flight = true;
    }

    pub(crate) fn end_statement(&mut self) {
        self.in_flight = false;
    }
}

impl<M: ConnectionManager> std::ops::Deref for Lease<M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        self.connection()
    }
}

impl<M: ConnectionManager> std::ops::DerefMut for Lease<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection_mut()
    }
}

impl<M: ConnectionManager> Drop for Lease<M> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.in_flight {
                debug!("lease dropped mid-statement; retiring connection");
            }
            let broken = self.poisoned || self.in_flight;
            self.pool.inner.reclaim(conn, broken);
        }
        // The semaphore permit drops after the connection is back in the
        // free list, so a woken waiter always finds it there.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct TestConn {
        id: usize,
    }

    #[derive(Default)]
    struct TestState {
        connects: AtomicUsize,
        closes: AtomicUsize,
        fail_connect: AtomicBool,
        fail_check: AtomicBool,
    }

    #[derive(Clone)]
    struct TestManager {
        state: Arc<TestState>,
    }

    impl TestManager {
        fn new() -> (Self, Arc<TestState>) {
            let state = Arc::new(TestState::default());
            (
                Self {
                    state: Arc::clone(&state),
                },
                state,
            )
        }
    }

    #[async_trait]
    impl ConnectionManager for TestManager {
        type Connection = TestConn;

        async fn connect(&self) -> GatewayResult<TestConn> {
            if self.state.fail_connect.load(Ordering::SeqCst) {
                return Err(GatewayError::ConnectionLost("connect refused".into()));
            }
            let id = self.state.connects.fetch_add(1, Ordering::SeqCst);
            Ok(TestConn { id })
        }

        async fn check(&self, _conn: &mut TestConn) -> GatewayResult<()> {
            if self.state.fail_check.load(Ordering::SeqCst) {
                return Err(GatewayError::ConnectionLost("probe failed".into()));
            }
            Ok(())
        }

        async fn close(&self, conn: TestConn) {
            let _ = conn;
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(max_size: usize, min_idle: usize) -> PoolConfig {
        PoolConfig {
            max_size,
            min_idle,
            acquire_timeout: Duration::from_millis(100),
            idle_timeout: Duration::from_secs(60),
            check_on_acquire: true,
        }
    }

    #[tokio::test]
    async fn acquire_reuses_released_connection() {
        let (manager, state) = TestManager::new();
        let pool = Pool::open(manager, config(2, 0)).await;

        let first = pool.acquire().await.unwrap();
        let first_id = first.connection().id;
        first.release();

        let second = pool.acquire().await.unwrap();
        assert_eq!(second.connection().id, first_id);
        assert_eq!(state.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn saturated_pool_times_out_with_pool_exhausted() {
        let (manager, _state) = TestManager::new();
        let pool = Pool::open(manager, config(2, 0)).await;

        let _a = pool.acquire().await.unwrap();
        let _b = pool.acquire().await.unwrap();

        let started = Instant::now();
        let third = pool.acquire_timeout(Duration::from_millis(100)).await;
        let waited = started.elapsed();

        assert!(matches!(third, Err(GatewayError::PoolExhausted { .. })));
        assert!(waited >= Duration::from_millis(90), "returned too early: {waited:?}");
        assert!(waited < Duration::from_secs(1), "hung: {waited:?}");
    }

    #[tokio::test]
    async fn pool_never_exceeds_max_size() {
        let (manager, _state) = TestManager::new();
        let pool = Pool::open(manager, config(3, 0)).await;

        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..12 {
            let pool = pool.clone();
            let live = Arc::clone(&live);
            let peak = Arc::clone(&peak);
            tasks.push(tokio::spawn(async move {
                let lease = pool.acquire_timeout(Duration::from_secs(5)).await.unwrap();
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                live.fetch_sub(1, Ordering::SeqCst);
                drop(lease);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn poisoned_lease_is_retired_not_reused() {
        let (manager, state) = TestManager::new();
        let pool = Pool::open(manager, config(1, 0)).await;

        let mut lease = pool.acquire().await.unwrap();
        lease.poison();
        drop(lease);

        // Retirement happens in a spawned task
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);

        let replacement = pool.acquire().await.unwrap();
        assert_eq!(replacement.connection().id, 1, "expected a fresh connection");
        assert_eq!(state.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn discard_retires_the_connection() {
        let (manager, state) = TestManager::new();
        let pool = Pool::open(manager, config(1, 0)).await;

        pool.acquire().await.unwrap().discard();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
        assert_eq!(pool.status().size, 0);
    }

    #[tokio::test]
    async fn failed_liveness_check_discards_idle_connection() {
        let (manager, state) = TestManager::new();
        let pool = Pool::open(manager, config(1, 0)).await;

        pool.acquire().await.unwrap().release();
        state.fail_check.store(true, Ordering::SeqCst);

        // The idle connection fails its probe; connecting fresh also fails
        state.fail_connect.store(true, Ordering::SeqCst);
        let result = pool.acquire().await;
        assert!(matches!(result, Err(GatewayError::ConnectionLost(_))));
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);

        // Once the backend recovers, acquire opens a replacement
        state.fail_check.store(false, Ordering::SeqCst);
        state.fail_connect.store(false, Ordering::SeqCst);
        let lease = pool.acquire().await.unwrap();
        assert_eq!(lease.connection().id, 1);
    }

    #[tokio::test]
    async fn min_idle_connections_are_prewarmed() {
        let (manager, state) = TestManager::new();
        let pool = Pool::open(manager, config(5, 2)).await;

        assert_eq!(state.connects.load(Ordering::SeqCst), 2);
        let status = pool.status();
        assert_eq!(status.size, 2);
        assert_eq!(status.idle, 2);
        assert_eq!(status.in_use, 0);
    }

    #[tokio::test]
    async fn idle_connection_past_timeout_is_replaced_on_acquire() {
        let (manager, state) = TestManager::new();
        let mut cfg = config(2, 0);
        cfg.idle_timeout = Duration::from_millis(30);
        let pool = Pool::open(manager, cfg).await;

        pool.acquire().await.unwrap().release();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let lease = pool.acquire().await.unwrap();
        assert_eq!(lease.connection().id, 1, "stale connection must not be handed out");
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn status_tracks_leased_and_idle_counts() {
        let (manager, _state) = TestManager::new();
        let pool = Pool::open(manager, config(3, 0)).await;

        let lease = pool.acquire().await.unwrap();
        let status = pool.status();
        assert_eq!(status.size, 1);
        assert_eq!(status.in_use, 1);
        assert_eq!(status.idle, 0);
        assert!((status.utilization() - 1.0 / 3.0).abs() < f64::EPSILON);

        drop(lease);
        let status = pool.status();
        assert_eq!(status.in_use, 0);
        assert_eq!(status.idle, 1);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_new_acquires() {
        let (manager, state) = TestManager::new();
        let pool = Pool::open(manager, config(2, 1)).await;

        pool.close().await;
        pool.close().await;

        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
        assert!(matches!(pool.acquire().await, Err(GatewayError::PoolClosed)));
    }

    #[tokio::test]
    async fn close_wakes_blocked_waiters() {
        let (manager, _state) = TestManager::new();
        let pool = Pool::open(manager, config(1, 0)).await;

        let held = pool.acquire().await.unwrap();
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire_timeout(Duration::from_secs(10)).await })
        };
        // Let the waiter park on the semaphore before closing
        tokio::time::sleep(Duration::from_millis(20)).await;

        pool.close().await;
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter did not wake")
            .unwrap();
        assert!(matches!(result, Err(GatewayError::PoolClosed)));

        drop(held);
    }

    #[tokio::test]
    async fn lease_dropped_mid_statement_is_retired() {
        let (manager, state) = TestManager::new();
        let pool = Pool::open(manager, config(1, 0)).await;

        let mut lease = pool.acquire().await.unwrap();
        lease.begin_statement();
        // Simulates the caller's future being dropped before the statement
        // completed: end_statement never runs.
        drop(lease);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
        assert_eq!(pool.status().size, 0);
    }
}
