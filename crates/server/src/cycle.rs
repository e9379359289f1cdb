//! Per-cycle counters shared between the scheduler and its fixture runners.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use matchday_engine::FixtureId;

/// Goal tallies per fixture and the number of fixtures that finished this
/// cycle. Owned by the scheduler and reset at the start of every cycle.
pub struct CycleCounters {
    goals: DashMap<FixtureId, u32>,
    completed: AtomicUsize,
}

impl CycleCounters {
    pub fn new() -> Self {
        Self {
            goals: DashMap::new(),
            completed: AtomicUsize::new(0),
        }
    }

    /// Zero every counter and register the fixtures of the new cycle.
    pub fn reset(&self, fixtures: impl IntoIterator<Item = FixtureId>) {
        self.goals.clear();
        for id in fixtures {
            self.goals.insert(id, 0);
        }
        self.completed.store(0, Ordering::SeqCst);
    }

    /// Count one goal for `fixture` unless it already reached `cap`.
    ///
    /// Check and increment happen under the fixture's shard lock, so two
    /// candidates racing for the last slot cannot both win.
    pub fn try_claim_goal(&self, fixture: FixtureId, cap: u32) -> bool {
        let mut goals = self.goals.entry(fixture).or_insert(0);
        if *goals >= cap {
            return false;
        }
        *goals += 1;
        true
    }

    pub fn goals(&self, fixture: FixtureId) -> u32 {
        self.goals.get(&fixture).map(|g| *g).unwrap_or(0)
    }

    /// Record a fixture reaching full time. Returns the new total.
    pub fn mark_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Default for CycleCounters {
    fn default() -> Self {
        Self::new()
    }
}
