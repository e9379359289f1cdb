pub mod event;
pub mod state;

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use crate::error::ValidationError;
use crate::fixture::FixtureId;
use crate::phase::Phase;
use event::MatchEvent;
use state::{MatchState, StateOverride};

/// Live view of every active fixture. Thread-safe, lock-sharded by fixture.
///
/// Each entry is written by its fixture's runner and, occasionally, by an
/// external override; `DashMap`'s per-shard locks serialize the two. Nothing
/// here ever waits on durable storage.
pub struct LiveStore {
    entries: DashMap<FixtureId, MatchState>,
}

impl LiveStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Snapshot of a fixture's current state.
    pub fn get(&self, id: FixtureId) -> Option<MatchState> {
        self.entries.get(&id).map(|entry| entry.clone())
    }

    /// Replace the whole entry, filling in defaults for absent fields.
    pub fn set(&self, id: FixtureId, state: StateOverride) -> MatchState {
        let state = MatchState::from(state);
        tracing::debug!("Live state of fixture {} overwritten ({})", id, state.phase.label());
        self.entries.insert(id, state.clone());
        state
    }

    /// Insert a default entry unless one already exists, and return whatever
    /// the entry holds afterwards. A running fixture is never replaced.
    pub fn seed(&self, id: FixtureId, state: StateOverride) -> MatchState {
        self.entries
            .entry(id)
            .or_insert_with(|| MatchState::from(state))
            .clone()
    }

    /// Validate and append an untyped event submission.
    ///
    /// A rejected submission leaves the entry exactly as it was.
    pub fn append_event(&self, id: FixtureId, raw: &Value) -> Result<MatchEvent, ValidationError> {
        let event = MatchEvent::from_json(raw)?;
        self.record_event(id, event.clone());
        Ok(event)
    }

    /// Append an event that is already known to be well-formed.
    pub fn record_event(&self, id: FixtureId, event: MatchEvent) {
        self.entries.entry(id).or_default().apply_event(event);
    }

    /// Ordered events of a fixture; empty when the fixture is unknown.
    pub fn list_events(&self, id: FixtureId) -> Vec<MatchEvent> {
        self.entries
            .get(&id)
            .map(|entry| entry.events.clone())
            .unwrap_or_default()
    }

    /// Start a fresh entry for a fixture that is about to kick off.
    pub fn begin(&self, id: FixtureId, home_team: &str, away_team: &str) {
        self.entries.insert(id, MatchState::new(home_team, away_team));
    }

    pub fn set_phase(&self, id: FixtureId, phase: Phase) {
        self.entries.entry(id).or_default().enter_phase(phase);
    }

    /// Move the clock forward to `elapsed`. Never rewinds; returns the
    /// resulting clock value.
    pub fn advance_clock(&self, id: FixtureId, elapsed: u32) -> u32 {
        let mut entry = self.entries.entry(id).or_default();
        entry.elapsed = entry.elapsed.max(elapsed);
        entry.elapsed
    }

    /// Mark a fixture whose runner died as finished where it stands, so the
    /// entry ages out like a completed one. The phase is left untouched.
    pub fn abandon(&self, id: FixtureId) {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.completed_at.get_or_insert_with(Instant::now);
        }
    }

    /// Drop entries that completed at least `retention` before `now`.
    /// Returns how many were evicted.
    pub fn evict_completed(&self, now: Instant, retention: Duration) -> usize {
        let mut evicted = 0;
        self.entries.retain(|_, state| {
            let expired = state.is_expired(now, retention);
            if expired {
                evicted += 1;
            }
            !expired
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LiveStore {
    fn default() -> Self {
        Self::new()
    }
}
