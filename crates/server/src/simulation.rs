//! Simulation wiring.
//!
//! [`SimContext`] bundles the configuration, the live store and every
//! collaborator a fixture runner talks to. [`start`] spawns the long-running
//! tasks: the cycle scheduler and the live-state eviction sweep.
//!
//! ```text
//! CycleScheduler ──spawns──> match_runner (one per fixture)
//!                               ├── EventGenerator
//!                               ├── LiveStore
//!                               ├── PersistenceGateway
//!                               ├── BroadcastSink
//!                               └── Notifier
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;

use matchday_engine::{EventGenerator, LiveStore, SimulationConfig};

use crate::dashboard::Metrics;
use crate::event_bus::BroadcastSink;
use crate::notifier::Notifier;
use crate::persistence::PersistenceGateway;
use crate::scheduler::CycleScheduler;
use crate::shutdown::Shutdown;

/// How often completed live entries are checked for eviction.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Everything a fixture runner needs, shared via `Arc<SimContext>`.
pub struct SimContext {
    pub config: SimulationConfig,
    pub store: Arc<LiveStore>,
    pub gateway: Arc<dyn PersistenceGateway>,
    pub generator: Arc<dyn EventGenerator>,
    pub broadcast: Arc<dyn BroadcastSink>,
    pub notifier: Arc<dyn Notifier>,
    pub metrics: Arc<Metrics>,
}

impl SimContext {
    /// Independent random stream number `stream`. With a configured seed the
    /// stream is reproducible; otherwise it comes from OS entropy.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Handles of the background simulation tasks.
pub struct SimulationTasks {
    pub scheduler: JoinHandle<()>,
    pub sweeper: JoinHandle<()>,
}

impl SimulationTasks {
    /// Wait for both tasks to wind down after a shutdown request.
    pub async fn join(self) {
        if let Err(e) = self.scheduler.await {
            tracing::error!("Scheduler task ended abnormally: {}", e);
        }
        if let Err(e) = self.sweeper.await {
            tracing::error!("Sweeper task ended abnormally: {}", e);
        }
    }
}

/// Spawn the cycle scheduler and the eviction sweep.
pub fn start(ctx: Arc<SimContext>, shutdown: Shutdown) -> SimulationTasks {
    let sweeper = tokio::spawn(sweep_completed(Arc::clone(&ctx), shutdown.clone()));
    let scheduler = tokio::spawn(CycleScheduler::new(ctx, shutdown).run());
    SimulationTasks { scheduler, sweeper }
}

/// Periodically evict live entries whose fixture completed longer ago than
/// the configured retention.
async fn sweep_completed(ctx: Arc<SimContext>, mut shutdown: Shutdown) {
    let retention = ctx.config.retention();
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    // The first tick fires immediately; nothing can have expired yet.
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.requested() => break,
            _ = interval.tick() => {}
        }
        let evicted = ctx.store.evict_completed(std::time::Instant::now(), retention);
        if evicted > 0 {
            ctx.metrics.entries_evicted(evicted);
            tracing::debug!("Evicted {} completed fixtures from live state", evicted);
        }
    }
}
