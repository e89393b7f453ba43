use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PoolStatsConfig;
use crate::error::{ErrorKind, PoolStatsError, Result};
use crate::fetch::{StatsApi, StatsFetcher};
use crate::registry;
use crate::snapshot::{Snapshot, SnapshotBuilder};

/// Coordinator health phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthPhase {
    /// No refresh cycle has succeeded yet
    Uninitialized,

    /// The most recent refresh cycle succeeded
    Healthy,

    /// A prior cycle succeeded but the most recent one failed; the last
    /// successful snapshot remains available
    Degraded,

    /// Polling stopped by explicit teardown
    Stopped,
}

/// What went wrong during the most recent failed refresh cycle
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// Error category
    pub kind: ErrorKind,

    /// Human-readable error message
    pub message: String,

    /// When the failure was recorded
    pub occurred_at: DateTime<Utc>,
}

/// Published coordinator state
///
/// Once any refresh has succeeded, `snapshot` is never cleared by a later
/// failure; it is only replaced by a later success.
#[derive(Debug, Clone)]
pub struct CoordinatorState {
    /// Current health phase
    pub phase: HealthPhase,

    /// Most recent successfully merged snapshot
    pub snapshot: Option<Arc<Snapshot>>,

    /// When the most recent successful refresh completed
    pub last_success: Option<DateTime<Utc>>,

    /// Failure record of the most recent failed cycle; cleared on success
    pub last_failure: Option<FailureRecord>,
}

impl CoordinatorState {
    fn empty() -> Self {
        Self {
            phase: HealthPhase::Uninitialized,
            snapshot: None,
            last_success: None,
            last_failure: None,
        }
    }
}

/// Polls the pool statistics API on a fixed interval and publishes the
/// last-known-good snapshot to readers
///
/// One coordinator instance serves one pool endpoint pair. Construction runs
/// a single health probe before any polling starts; a probe failure surfaces
/// as [`PoolStatsError::SetupProbeFailed`] and no coordinator is created.
/// Readers load the published state without blocking the refresh path.
pub struct PoolCoordinator {
    inner: Arc<CoordinatorInner>,
    shutdown_tx: mpsc::Sender<()>,
}

impl std::fmt::Debug for PoolCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolCoordinator").finish_non_exhaustive()
    }
}

struct CoordinatorInner {
    builder: SnapshotBuilder,
    state: ArcSwap<CoordinatorState>,
    refreshing: AtomicBool,
}

impl PoolCoordinator {
    /// Probe the API, run the first refresh, and start periodic polling
    pub async fn start(config: PoolStatsConfig) -> Result<Self> {
        // Reject bad config before any network traffic
        config.validate()?;

        let fetcher = StatsFetcher::from_config(&config)?;
        fetcher
            .probe_health()
            .await
            .map_err(|e| PoolStatsError::SetupProbeFailed(e.to_string()))?;

        info!("pool API at {} is reachable, starting coordinator", config.base_url());
        Self::start_with_api(config, Arc::new(fetcher)).await
    }

    /// Start with a caller-supplied transport, skipping the health probe
    ///
    /// Intended for embedders that bring their own client and for tests.
    pub async fn start_with_api(
        config: PoolStatsConfig,
        api: Arc<dyn StatsApi>,
    ) -> Result<Self> {
        config.validate()?;
        registry::validate().map_err(PoolStatsError::InvalidConfiguration)?;

        let inner = Arc::new(CoordinatorInner {
            builder: SnapshotBuilder::new(api),
            state: ArcSwap::from_pointee(CoordinatorState::empty()),
            refreshing: AtomicBool::new(false),
        });

        // First refresh happens before the caller gets the handle. A failure
        // here is recorded in the state, not returned: the probe already
        // established reachability, so steady-state polling can proceed.
        inner.refresh().await;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let task_inner = inner.clone();
        let period = config.poll_interval;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately and
            // the initial refresh already ran; consume it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => task_inner.refresh().await,
                    _ = shutdown_rx.recv() => {
                        debug!("refresh timer cancelled");
                        break;
                    }
                }
            }
        });

        Ok(Self { inner, shutdown_tx })
    }

    /// Load the current published state
    pub fn state(&self) -> Arc<CoordinatorState> {
        self.inner.state.load_full()
    }

    /// Convenience accessor for the last-known-good snapshot
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state().snapshot.clone()
    }

    /// Trigger a refresh outside the schedule; a no-op while one is in flight
    pub async fn refresh_now(&self) {
        self.inner.refresh().await;
    }

    /// Stop periodic polling
    ///
    /// An in-flight refresh is left to finish or hit its own request timeout;
    /// its result is discarded once the coordinator is stopped.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(()).await;

        let current = self.inner.state.load_full();
        let mut next = (*current).clone();
        next.phase = HealthPhase::Stopped;
        self.inner.state.store(Arc::new(next));

        info!("coordinator stopped");
    }
}

impl CoordinatorInner {
    /// Run one refresh cycle unless one is already in flight
    async fn refresh(&self) {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("refresh already in flight, skipping this tick");
            return;
        }

        let result = self.builder.build().await;
        self.apply(result);

        self.refreshing.store(false, Ordering::SeqCst);
    }

    /// Fold one build result into the published state
    fn apply(&self, result: Result<Snapshot>) {
        let current = self.state.load_full();
        if current.phase == HealthPhase::Stopped {
            debug!("coordinator stopped, discarding refresh result");
            return;
        }

        let next = match result {
            Ok(snapshot) => {
                info!(
                    "refresh ok: pool '{}', {} worker(s), user data: {}",
                    snapshot.pool.id,
                    snapshot.pool.workers,
                    if snapshot.user.is_some() { "present" } else { "absent" },
                );

                CoordinatorState {
                    phase: HealthPhase::Healthy,
                    last_success: Some(snapshot.fetched_at),
                    snapshot: Some(Arc::new(snapshot)),
                    last_failure: None,
                }
            }
            Err(err) => {
                warn!("refresh failed: {}", err);

                CoordinatorState {
                    // Degraded requires a prior success to fall back on
                    phase: if current.snapshot.is_some() {
                        HealthPhase::Degraded
                    } else {
                        HealthPhase::Uninitialized
                    },
                    snapshot: current.snapshot.clone(),
                    last_success: current.last_success,
                    last_failure: Some(FailureRecord {
                        kind: err.kind(),
                        message: err.to_string(),
                        occurred_at: Utc::now(),
                    }),
                }
            }
        };

        self.state.store(Arc::new(next));
    }
}
