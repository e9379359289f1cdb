//! Live-state API handlers.
//!
//! Reads come straight from the live store. Writes go to the live store first
//! and are then persisted best-effort, mirroring what the fixture runners do.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use matchday_engine::{FixtureId, MatchEvent, StateOverride};

use super::DashboardState;
use crate::event_bus::{BroadcastSink, MatchUpdate};

fn failure(status: StatusCode, error: impl ToString) -> Response {
    (status, Json(json!({"success": false, "error": error.to_string()}))).into_response()
}

/// `GET /fixtures/:id/state`. Seeds a not-started entry from the stored
/// fixture when the live store has none.
pub async fn get_state(
    Path(id): Path<i64>,
    State(state): State<Arc<DashboardState>>,
) -> Response {
    let id = FixtureId(id);
    if let Some(live) = state.store.get(id) {
        return Json(json!({"success": true, "state": live})).into_response();
    }

    match state.gateway.fixture(id).await {
        Ok(Some(fixture)) => {
            // A runner may have begun while the lookup was in flight.
            let seeded = state.store.seed(
                id,
                StateOverride {
                    home_team: Some(fixture.home_team),
                    away_team: Some(fixture.away_team),
                    ..StateOverride::default()
                },
            );
            Json(json!({"success": true, "state": seeded})).into_response()
        }
        Ok(None) => failure(StatusCode::NOT_FOUND, "fixture not found"),
        Err(e) => {
            tracing::error!("Failed to seed live state for fixture {}: {}", id, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// `POST /fixtures/:id/state`: overwrite the live entry.
pub async fn set_state(
    Path(id): Path<i64>,
    State(state): State<Arc<DashboardState>>,
    Json(over): Json<StateOverride>,
) -> Response {
    let id = FixtureId(id);
    let updated = state.store.set(id, over);
    if let Err(e) = state.gateway.set_fixture_phase(id, updated.phase).await {
        state.metrics.persistence_failed();
        tracing::warn!("Fixture {}: failed to persist overridden phase: {}", id, e);
    }
    Json(json!({"success": true, "state": updated})).into_response()
}

/// `GET /fixtures/:id/events`. Falls back to the stored history when the
/// fixture is no longer (or not yet) live.
pub async fn list_events(
    Path(id): Path<i64>,
    State(state): State<Arc<DashboardState>>,
) -> Response {
    let id = FixtureId(id);
    let events = state.store.list_events(id);
    if !events.is_empty() || state.store.get(id).is_some() {
        return Json(events).into_response();
    }

    match state.gateway.list_fixture_events(id).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => {
            tracing::warn!("Fixture {}: failed to load stored events: {}", id, e);
            Json(Vec::<MatchEvent>::new()).into_response()
        }
    }
}

/// `POST /fixtures/:id/event`: validated append. Malformed events get a 400
/// and leave the live entry untouched.
pub async fn append_event(
    Path(id): Path<i64>,
    State(state): State<Arc<DashboardState>>,
    Json(raw): Json<Value>,
) -> Response {
    let id = FixtureId(id);
    let event = match state.store.append_event(id, &raw) {
        Ok(event) => event,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e),
    };

    if let Err(e) = state.gateway.append_fixture_event(id, &event).await {
        state.metrics.persistence_failed();
        tracing::warn!("Fixture {}: failed to persist submitted event: {}", id, e);
    }
    if let Err(e) = state.gateway.set_fixture_elapsed(id, event.minute).await {
        state.metrics.persistence_failed();
        tracing::warn!("Fixture {}: failed to persist elapsed time: {}", id, e);
    }

    state.bus.publish(MatchUpdate::Event {
        fixture: id,
        event: event.clone(),
    });
    Json(json!({"success": true, "event": event})).into_response()
}
