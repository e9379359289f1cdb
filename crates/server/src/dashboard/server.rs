//! axum web server for the live dashboard.
//!
//! Serves a single-page HTML dashboard at `/`, a metrics snapshot at
//! `/metrics`, the live-state API under `/fixtures/:id`, and pushes metrics,
//! match updates and admin alerts to connected browsers via WebSocket at `/ws`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;

use super::{live, DashboardState, MetricsSnapshot};

/// Build the dashboard router.
pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_upgrade))
        .route("/metrics", get(metrics))
        .route("/fixtures/:id/state", get(live::get_state).post(live::set_state))
        .route("/fixtures/:id/events", get(live::list_events))
        .route("/fixtures/:id/event", axum::routing::post(live::append_event))
        .with_state(state)
}

/// Start the dashboard web server. Runs until the listener fails.
pub async fn start(state: Arc<DashboardState>, port: u16) {
    let addr = format!("0.0.0.0:{}", port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Dashboard failed to bind to {}: {}", addr, e);
            return;
        }
    };
    tracing::info!("Dashboard listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::error!("Dashboard server error: {}", e);
    }
}

/// Serve the embedded single-page dashboard.
async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn metrics(State(state): State<Arc<DashboardState>>) -> Json<MetricsSnapshot> {
    Json(state.snapshot())
}

/// Upgrade an HTTP request to a WebSocket connection.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<DashboardState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Push metrics, match updates and admin alerts to a connected browser.
async fn handle_socket(mut socket: WebSocket, state: Arc<DashboardState>) {
    let mut updates = state.bus.subscribe();
    let mut alerts = state.alerts.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            // Push metrics every second.
            _ = ticker.tick() => {
                let msg = serde_json::json!({
                    "type": "metrics",
                    "data": state.snapshot(),
                });
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            update = updates.recv() => {
                match update {
                    Ok(update) => {
                        let msg = serde_json::json!({
                            "type": "match",
                            "data": update,
                        });
                        if send_json(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Dashboard client lagged, skipped {} updates", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            alert = alerts.recv() => {
                match alert {
                    Ok(alert) => {
                        let msg = serde_json::json!({
                            "type": "alert",
                            "data": alert,
                        });
                        if send_json(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }

            // Drain any incoming messages (ping/pong, close).
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {} // ignore pings, text, etc.
                }
            }
        }
    }
}

async fn send_json(socket: &mut WebSocket, value: &serde_json::Value) -> Result<(), ()> {
    let text = value.to_string();
    socket.send(Message::Text(text)).await.map_err(|_| ())
}
