//! The live state record kept for each active fixture.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::event::{MatchEvent, Side};
use crate::phase::Phase;

pub const DEFAULT_HOME_LABEL: &str = "Home";
pub const DEFAULT_AWAY_LABEL: &str = "Away";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn credit(&mut self, side: Side) {
        match side {
            Side::Home => self.home += 1,
            Side::Away => self.away += 1,
        }
    }
}

/// What is happening in one fixture right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchState {
    pub home_team: String,
    pub away_team: String,
    pub phase: Phase,
    /// Match clock in ticks. Never moves backwards through engine mutations.
    pub elapsed: u32,
    pub score: Score,
    pub goals_scored: u32,
    pub events: Vec<MatchEvent>,
    /// When the fixture reached `Completed`; drives eviction.
    #[serde(skip)]
    pub completed_at: Option<Instant>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(DEFAULT_HOME_LABEL, DEFAULT_AWAY_LABEL)
    }
}

impl MatchState {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            phase: Phase::NotStarted,
            elapsed: 0,
            score: Score::default(),
            goals_scored: 0,
            events: Vec::new(),
            completed_at: None,
        }
    }

    /// Append an already-valid event: a goal credits exactly one side by one.
    /// The clock advances to the event's minute when that minute is newer.
    pub fn apply_event(&mut self, event: MatchEvent) {
        if event.kind.is_goal() {
            self.score.credit(event.team);
            self.goals_scored += 1;
        }
        self.elapsed = self.elapsed.max(event.minute);
        self.events.push(event);
    }

    pub fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.completed_at = phase.is_terminal().then(Instant::now);
    }

    /// Completed more than `retention` before `now`.
    pub fn is_expired(&self, now: Instant, retention: Duration) -> bool {
        self.completed_at
            .is_some_and(|at| now.saturating_duration_since(at) >= retention)
    }
}

/// An external overwrite of a fixture's live state. Absent fields fall back to
/// defaults so the resulting state is always fully populated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StateOverride {
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub phase: Option<Phase>,
    pub elapsed: Option<u32>,
    pub score: Option<Score>,
    pub events: Option<Vec<MatchEvent>>,
}

impl From<StateOverride> for MatchState {
    fn from(o: StateOverride) -> Self {
        let events = o.events.unwrap_or_default();
        let mut state = MatchState {
            home_team: o.home_team.unwrap_or_else(|| DEFAULT_HOME_LABEL.to_string()),
            away_team: o.away_team.unwrap_or_else(|| DEFAULT_AWAY_LABEL.to_string()),
            phase: Phase::NotStarted,
            elapsed: o.elapsed.unwrap_or(0),
            score: o.score.unwrap_or_default(),
            goals_scored: events.iter().filter(|e| e.kind.is_goal()).count() as u32,
            events,
            completed_at: None,
        };
        state.enter_phase(o.phase.unwrap_or_default());
        state
    }
}
