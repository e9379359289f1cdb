//! Live web dashboard: simulation metrics, the match update stream and the
//! live-state API.
//!
//! Design contract with the simulation:
//!   • Metrics: atomic fetch_add (never blocks a tick).
//!   • Match updates and admin alerts: `tokio::sync::broadcast` subscribers;
//!     a slow browser lags and skips ahead, it never stalls a runner.
//!   • Live state is read from the same `LiveStore` the runners write, so
//!     reads never wait on the database.

pub mod live;
pub mod metrics;
pub mod server;

use std::sync::Arc;

use matchday_engine::LiveStore;

use crate::event_bus::EventBus;
use crate::notifier::AdminNotifier;
use crate::persistence::PersistenceGateway;

pub use metrics::{Metrics, MetricsSnapshot};

/// Central state shared via `Arc<DashboardState>`.
pub struct DashboardState {
    pub metrics: Arc<Metrics>,
    pub store: Arc<LiveStore>,
    pub gateway: Arc<dyn PersistenceGateway>,
    pub bus: Arc<EventBus>,
    pub alerts: Arc<AdminNotifier>,
}

impl DashboardState {
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.store.len() as u64)
    }
}
