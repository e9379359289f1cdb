//! Recording doubles and context builders shared by the server tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use matchday_engine::{
    EventGenerator, EventKind, Fixture, FixtureId, FixtureStatus, GeneratorError, LiveStore,
    MatchEvent, NewFixture, Phase, Side, SimulationConfig,
};
use matchday_server::dashboard::Metrics;
use matchday_server::event_bus::{BroadcastSink, MatchUpdate};
use matchday_server::notifier::Notifier;
use matchday_server::persistence::{
    PersistenceError, PersistenceGateway, PersistenceResult, SqliteGateway,
};
use matchday_server::simulation::SimContext;

#[derive(Default)]
pub struct RecordingSink {
    pub updates: Mutex<Vec<MatchUpdate>>,
}

impl RecordingSink {
    /// Phase updates for `fixture`, in publication order.
    pub fn phases(&self, fixture: FixtureId) -> Vec<(Phase, u32)> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter_map(|u| match u {
                MatchUpdate::Phase { fixture: f, phase, elapsed } if *f == fixture => {
                    Some((*phase, *elapsed))
                }
                _ => None,
            })
            .collect()
    }

    pub fn events(&self, fixture: FixtureId) -> Vec<MatchEvent> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter_map(|u| match u {
                MatchUpdate::Event { fixture: f, event } if *f == fixture => Some(event.clone()),
                _ => None,
            })
            .collect()
    }
}

impl BroadcastSink for RecordingSink {
    fn publish(&self, update: MatchUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Generator driven by a closure.
pub struct ScriptedGenerator<F>(pub F);

impl<F> EventGenerator for ScriptedGenerator<F>
where
    F: Fn(FixtureId, u32) -> Result<MatchEvent, GeneratorError> + Send + Sync + 'static,
{
    fn generate(&self, fixture: FixtureId, elapsed: u32) -> Result<MatchEvent, GeneratorError> {
        (self.0)(fixture, elapsed)
    }
}

pub fn always_goal(_: FixtureId, elapsed: u32) -> Result<MatchEvent, GeneratorError> {
    Ok(MatchEvent::new(EventKind::Goal, Side::Home, "Okello #9", elapsed))
}

pub fn never_event(_: FixtureId, _: u32) -> Result<MatchEvent, GeneratorError> {
    Err(GeneratorError::Unavailable("scripted silence".into()))
}

/// Short matches with no breaks: two-tick halves, every tick a trial.
pub fn quick_config() -> SimulationConfig {
    SimulationConfig {
        startup_delay_secs: 1,
        match_duration: 2,
        break_secs: 0,
        extra_time_secs: 0,
        tick_millis: 1000,
        max_goals: 3,
        batch_size: 3,
        event_probability: 1.0,
        retention_secs: 600,
        seed: Some(42),
    }
}

pub struct Harness {
    pub ctx: Arc<SimContext>,
    pub sink: Arc<RecordingSink>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(
    config: SimulationConfig,
    gateway: Arc<dyn PersistenceGateway>,
    generator: impl EventGenerator,
) -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = Arc::new(SimContext {
        config,
        store: Arc::new(LiveStore::new()),
        gateway,
        generator: Arc::new(generator),
        broadcast: sink.clone(),
        notifier: notifier.clone(),
        metrics: Arc::new(Metrics::new()),
    });
    Harness { ctx, sink, notifier }
}

pub fn memory_db() -> Arc<SqliteGateway> {
    Arc::new(SqliteGateway::open_in_memory().unwrap())
}

/// Insert `pairs` as fixtures that were due a minute ago.
pub async fn seed_due(db: &SqliteGateway, pairs: &[(&str, &str)]) -> Vec<Fixture> {
    let start = Utc::now() - TimeDelta::minutes(1);
    let planned: Vec<NewFixture> = pairs
        .iter()
        .map(|(home, away)| NewFixture {
            home_team: home.to_string(),
            away_team: away.to_string(),
            scheduled_start: start,
        })
        .collect();
    let ids = db.insert_fixtures(&planned).await.unwrap();

    let mut fixtures = Vec::new();
    for id in ids {
        fixtures.push(db.fixture(id).await.unwrap().unwrap());
    }
    fixtures
}

/// Gateway whose every call fails.
pub struct BrokenGateway;

#[async_trait]
impl PersistenceGateway for BrokenGateway {
    async fn find_due_fixtures(&self, _: usize, _: DateTime<Utc>) -> PersistenceResult<Vec<Fixture>> {
        Err(PersistenceError::Poisoned)
    }
    async fn fixture(&self, _: FixtureId) -> PersistenceResult<Option<Fixture>> {
        Err(PersistenceError::Poisoned)
    }
    async fn set_fixture_status(&self, _: FixtureId, _: FixtureStatus) -> PersistenceResult<()> {
        Err(PersistenceError::Poisoned)
    }
    async fn set_fixture_phase(&self, _: FixtureId, _: Phase) -> PersistenceResult<()> {
        Err(PersistenceError::Poisoned)
    }
    async fn set_fixture_elapsed(&self, _: FixtureId, _: u32) -> PersistenceResult<()> {
        Err(PersistenceError::Poisoned)
    }
    async fn append_fixture_event(&self, _: FixtureId, _: &MatchEvent) -> PersistenceResult<()> {
        Err(PersistenceError::Poisoned)
    }
    async fn list_fixture_events(&self, _: FixtureId) -> PersistenceResult<Vec<MatchEvent>> {
        Err(PersistenceError::Poisoned)
    }
    async fn list_distinct_teams(&self) -> PersistenceResult<Vec<String>> {
        Err(PersistenceError::Poisoned)
    }
    async fn insert_fixtures(&self, _: &[NewFixture]) -> PersistenceResult<Vec<FixtureId>> {
        Err(PersistenceError::Poisoned)
    }
    async fn count_upcoming(&self) -> PersistenceResult<usize> {
        Err(PersistenceError::Poisoned)
    }
    async fn insert_teams(&self, _: &[&str]) -> PersistenceResult<usize> {
        Err(PersistenceError::Poisoned)
    }
}
