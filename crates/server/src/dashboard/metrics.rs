//! Lock-free simulation counters.
//!
//! Fixture runners update these via atomic operations: no locks, no
//! allocations, no blocking on the tick path. The dashboard server reads
//! them at its own pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

use matchday_engine::EventKind;

pub struct Metrics {
    // Monotonic counters
    ticks_total: AtomicU64,
    events_accepted: AtomicU64,
    goals_total: AtomicU64,
    goals_suppressed: AtomicU64,
    generator_misses: AtomicU64,
    persistence_failures: AtomicU64,
    fixtures_started: AtomicU64,
    fixtures_completed: AtomicU64,
    fixtures_faulted: AtomicU64,
    cycles_completed: AtomicU64,
    live_entries_evicted: AtomicU64,

    // Tick handling latency (persist + event policy)
    hist_under_1ms: AtomicU64,
    hist_1_10ms: AtomicU64,
    hist_10_100ms: AtomicU64,
    hist_over_100ms: AtomicU64,

    // Gauges
    fixtures_running: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks_total: AtomicU64::new(0),
            events_accepted: AtomicU64::new(0),
            goals_total: AtomicU64::new(0),
            goals_suppressed: AtomicU64::new(0),
            generator_misses: AtomicU64::new(0),
            persistence_failures: AtomicU64::new(0),
            fixtures_started: AtomicU64::new(0),
            fixtures_completed: AtomicU64::new(0),
            fixtures_faulted: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            live_entries_evicted: AtomicU64::new(0),
            hist_under_1ms: AtomicU64::new(0),
            hist_1_10ms: AtomicU64::new(0),
            hist_10_100ms: AtomicU64::new(0),
            hist_over_100ms: AtomicU64::new(0),
            fixtures_running: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called once per clock tick with the time spent handling it.
    pub fn record_tick(&self, duration: Duration) {
        self.ticks_total.fetch_add(1, Relaxed);

        let bucket = match duration.as_millis() {
            0 => &self.hist_under_1ms,
            1..=9 => &self.hist_1_10ms,
            10..=99 => &self.hist_10_100ms,
            _ => &self.hist_over_100ms,
        };
        bucket.fetch_add(1, Relaxed);
    }

    pub fn event_accepted(&self, kind: EventKind) {
        self.events_accepted.fetch_add(1, Relaxed);
        if kind.is_goal() {
            self.goals_total.fetch_add(1, Relaxed);
        }
    }

    pub fn goal_suppressed(&self) {
        self.goals_suppressed.fetch_add(1, Relaxed);
    }

    pub fn generator_miss(&self) {
        self.generator_misses.fetch_add(1, Relaxed);
    }

    pub fn persistence_failed(&self) {
        self.persistence_failures.fetch_add(1, Relaxed);
    }

    pub fn fixture_started(&self) {
        self.fixtures_started.fetch_add(1, Relaxed);
        self.fixtures_running.fetch_add(1, Relaxed);
    }

    /// A runner exited, either at `Completed` or by stop request.
    pub fn fixture_finished(&self, completed: bool) {
        self.fixtures_running.fetch_sub(1, Relaxed);
        if completed {
            self.fixtures_completed.fetch_add(1, Relaxed);
        }
    }

    /// A runner task died without reporting (panic or abort).
    pub fn fixture_faulted(&self) {
        self.fixtures_running.fetch_sub(1, Relaxed);
        self.fixtures_faulted.fetch_add(1, Relaxed);
    }

    pub fn cycle_completed(&self) {
        self.cycles_completed.fetch_add(1, Relaxed);
    }

    pub fn entries_evicted(&self, count: usize) {
        self.live_entries_evicted.fetch_add(count as u64, Relaxed);
    }

    /// Read all counters into a serializable snapshot.
    pub fn snapshot(&self, live_entries: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            ticks_total: self.ticks_total.load(Relaxed),
            events_accepted: self.events_accepted.load(Relaxed),
            goals_total: self.goals_total.load(Relaxed),
            goals_suppressed: self.goals_suppressed.load(Relaxed),
            generator_misses: self.generator_misses.load(Relaxed),
            persistence_failures: self.persistence_failures.load(Relaxed),
            fixtures_started: self.fixtures_started.load(Relaxed),
            fixtures_completed: self.fixtures_completed.load(Relaxed),
            fixtures_faulted: self.fixtures_faulted.load(Relaxed),
            fixtures_running: self.fixtures_running.load(Relaxed),
            cycles_completed: self.cycles_completed.load(Relaxed),
            live_entries,
            live_entries_evicted: self.live_entries_evicted.load(Relaxed),
            tick_hist: [
                self.hist_under_1ms.load(Relaxed),
                self.hist_1_10ms.load(Relaxed),
                self.hist_10_100ms.load(Relaxed),
                self.hist_over_100ms.load(Relaxed),
            ],
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all metrics at a point in time.
/// The client computes rates (ticks/sec, etc.) by diffing consecutive snapshots.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub ticks_total: u64,
    pub events_accepted: u64,
    pub goals_total: u64,
    pub goals_suppressed: u64,
    pub generator_misses: u64,
    pub persistence_failures: u64,
    pub fixtures_started: u64,
    pub fixtures_completed: u64,
    pub fixtures_faulted: u64,
    pub fixtures_running: u64,
    pub cycles_completed: u64,
    pub live_entries: u64,
    pub live_entries_evicted: u64,
    /// `[<1ms, 1-10ms, 10-100ms, >100ms]`
    pub tick_hist: [u64; 4],
}
