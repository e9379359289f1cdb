//! Live-state API handlers, called directly with extracted arguments.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};

use chrono::{DateTime, Utc};

use matchday_engine::{
    EventKind, Fixture, FixtureId, FixtureStatus, LiveStore, MatchEvent, NewFixture, Phase, Side,
};
use matchday_server::dashboard::{live, DashboardState, Metrics};
use matchday_server::event_bus::{EventBus, MatchUpdate};
use matchday_server::notifier::AdminNotifier;
use matchday_server::persistence::{PersistenceGateway, PersistenceResult, SqliteGateway};

use common::{memory_db, seed_due};

fn dashboard(db: Arc<dyn PersistenceGateway>) -> Arc<DashboardState> {
    Arc::new(DashboardState {
        metrics: Arc::new(Metrics::new()),
        store: Arc::new(LiveStore::new()),
        gateway: db,
        bus: Arc::new(EventBus::default()),
        alerts: Arc::new(AdminNotifier::new()),
    })
}

/// Delegates to SQLite, but fixture lookups take 50ms.
struct SlowLookups(Arc<SqliteGateway>);

#[async_trait]
impl PersistenceGateway for SlowLookups {
    async fn find_due_fixtures(&self, limit: usize, now: DateTime<Utc>) -> PersistenceResult<Vec<Fixture>> {
        self.0.find_due_fixtures(limit, now).await
    }
    async fn fixture(&self, id: FixtureId) -> PersistenceResult<Option<Fixture>> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.0.fixture(id).await
    }
    async fn set_fixture_status(&self, id: FixtureId, status: FixtureStatus) -> PersistenceResult<()> {
        self.0.set_fixture_status(id, status).await
    }
    async fn set_fixture_phase(&self, id: FixtureId, phase: Phase) -> PersistenceResult<()> {
        self.0.set_fixture_phase(id, phase).await
    }
    async fn set_fixture_elapsed(&self, id: FixtureId, elapsed: u32) -> PersistenceResult<()> {
        self.0.set_fixture_elapsed(id, elapsed).await
    }
    async fn append_fixture_event(&self, id: FixtureId, event: &MatchEvent) -> PersistenceResult<()> {
        self.0.append_fixture_event(id, event).await
    }
    async fn list_fixture_events(&self, id: FixtureId) -> PersistenceResult<Vec<MatchEvent>> {
        self.0.list_fixture_events(id).await
    }
    async fn list_distinct_teams(&self) -> PersistenceResult<Vec<String>> {
        self.0.list_distinct_teams().await
    }
    async fn insert_fixtures(&self, fixtures: &[NewFixture]) -> PersistenceResult<Vec<FixtureId>> {
        self.0.insert_fixtures(fixtures).await
    }
    async fn count_upcoming(&self) -> PersistenceResult<usize> {
        self.0.count_upcoming().await
    }
    async fn insert_teams(&self, teams: &[&str]) -> PersistenceResult<usize> {
        self.0.insert_teams(teams).await
    }
}

async fn body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn valid_event_is_applied_persisted_and_broadcast() {
    let db = memory_db();
    let fixture = seed_due(&db, &[("Vipers", "KCCA")]).await.remove(0);
    let state = dashboard(db.clone());
    let mut updates = state.bus.subscribe();

    let response = live::append_event(
        Path(fixture.id.0),
        State(state.clone()),
        Json(json!({"type": "goal", "team": "away", "player": "Okello #9", "minute": 12})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["success"], json!(true));

    let live = state.store.get(fixture.id).unwrap();
    assert_eq!(live.score.away, 1);
    assert_eq!(live.elapsed, 12);

    let expected = MatchEvent::new(EventKind::Goal, Side::Away, "Okello #9", 12);
    assert_eq!(db.list_fixture_events(fixture.id).await.unwrap(), vec![expected.clone()]);
    assert_eq!(
        updates.recv().await.unwrap(),
        MatchUpdate::Event {
            fixture: fixture.id,
            event: expected,
        }
    );
}

#[tokio::test]
async fn malformed_event_is_a_bad_request() {
    let db = memory_db();
    let fixture = seed_due(&db, &[("Vipers", "KCCA")]).await.remove(0);
    let state = dashboard(db.clone());

    let response = live::append_event(
        Path(fixture.id.0),
        State(state.clone()),
        Json(json!({"type": "goal", "team": "home", "minute": 3})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["success"], json!(false));

    assert!(state.store.get(fixture.id).is_none());
    assert!(db.list_fixture_events(fixture.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reading_state_seeds_known_fixtures_only() {
    let db = memory_db();
    let fixture = seed_due(&db, &[("Express", "SC Villa")]).await.remove(0);
    let state = dashboard(db);

    let response = live::get_state(Path(fixture.id.0), State(state.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body(response).await;
    assert_eq!(payload["state"]["home_team"], json!("Express"));
    assert_eq!(payload["state"]["phase"], json!("not_started"));
    assert_eq!(state.store.get(fixture.id).unwrap().phase, Phase::NotStarted);

    let missing = live::get_state(Path(9_999), State(state.clone())).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reading_state_never_clobbers_a_fixture_that_kicked_off_meanwhile() {
    let db = memory_db();
    let fixture = seed_due(&db, &[("Express", "SC Villa")]).await.remove(0);
    let state = dashboard(Arc::new(SlowLookups(db)));

    let read = tokio::spawn(live::get_state(Path(fixture.id.0), State(state.clone())));
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The runner starts while the lookup is still in flight.
    state.store.begin(fixture.id, "Express", "SC Villa");
    state.store.set_phase(fixture.id, Phase::FirstHalf);
    state.store.advance_clock(fixture.id, 3);

    let response = read.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["state"]["phase"], json!("first_half"));

    let live = state.store.get(fixture.id).unwrap();
    assert_eq!(live.phase, Phase::FirstHalf);
    assert_eq!(live.elapsed, 3);
}

#[tokio::test]
async fn partial_override_fills_defaults() {
    let db = memory_db();
    let fixture = seed_due(&db, &[("Police", "NEC")]).await.remove(0);
    let state = dashboard(db);

    let response = live::set_state(
        Path(fixture.id.0),
        State(state.clone()),
        Json(serde_json::from_value(json!({"phase": "second_half", "elapsed": 61})).unwrap()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let live = state.store.get(fixture.id).unwrap();
    assert_eq!(live.phase, Phase::SecondHalf);
    assert_eq!(live.elapsed, 61);
    assert_eq!(live.score.home + live.score.away, 0);
    assert!(live.events.is_empty());
}

#[tokio::test]
async fn event_history_falls_back_to_storage() {
    let db = memory_db();
    let fixture = seed_due(&db, &[("Maroons", "UPDF")]).await.remove(0);
    let stored = MatchEvent::new(EventKind::Corner, Side::Home, "Kato #2", 40);
    db.append_fixture_event(fixture.id, &stored).await.unwrap();
    let state = dashboard(db);

    let response = live::list_events(Path(fixture.id.0), State(state.clone())).await;
    let events: Vec<MatchEvent> = serde_json::from_value(body(response).await).unwrap();
    assert_eq!(events, vec![stored]);

    // Once live, the live list wins.
    state.store.begin(fixture.id, "Maroons", "UPDF");
    let response = live::list_events(Path(fixture.id.0), State(state)).await;
    assert_eq!(body(response).await, json!([]));
}
