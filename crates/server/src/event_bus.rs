//! Live match update bus for viewer distribution.
//!
//! Fixture runners publish every phase change and accepted event as a
//! [`MatchUpdate`] on a shared `tokio::sync::broadcast` channel. Dashboard
//! WebSocket clients subscribe and forward updates to browsers.

use serde::Serialize;
use tokio::sync::broadcast;

use matchday_engine::{FixtureId, MatchEvent, Phase};

/// Recommended capacity for the broadcast channel.
/// Slow subscribers that fall further behind than this skip ahead (lagged).
pub const BUS_CAPACITY: usize = 1024;

/// Something viewers of a fixture should see.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchUpdate {
    Phase {
        fixture: FixtureId,
        phase: Phase,
        elapsed: u32,
    },
    Event {
        fixture: FixtureId,
        event: MatchEvent,
    },
}

impl MatchUpdate {
    pub fn fixture(&self) -> FixtureId {
        match self {
            MatchUpdate::Phase { fixture, .. } | MatchUpdate::Event { fixture, .. } => *fixture,
        }
    }
}

/// Best-effort delivery of match updates. Publishing never blocks and never
/// reports failure back to the simulation.
pub trait BroadcastSink: Send + Sync + 'static {
    fn publish(&self, update: MatchUpdate);
}

pub struct EventBus {
    tx: broadcast::Sender<MatchUpdate>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BUS_CAPACITY)
    }
}

impl BroadcastSink for EventBus {
    fn publish(&self, update: MatchUpdate) {
        // Ignore send errors (no subscribers = no problem).
        let _ = self.tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchday_engine::{EventKind, Side};

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.publish(MatchUpdate::Phase {
            fixture: FixtureId(1),
            phase: Phase::FirstHalf,
            elapsed: 0,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_updates_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let goal = MatchEvent::new(EventKind::Goal, Side::Home, "Mutebi #7", 12);

        bus.publish(MatchUpdate::Phase {
            fixture: FixtureId(3),
            phase: Phase::FirstHalf,
            elapsed: 0,
        });
        bus.publish(MatchUpdate::Event {
            fixture: FixtureId(3),
            event: goal.clone(),
        });

        assert!(matches!(rx.recv().await.unwrap(), MatchUpdate::Phase { phase: Phase::FirstHalf, .. }));
        assert_eq!(
            rx.recv().await.unwrap(),
            MatchUpdate::Event {
                fixture: FixtureId(3),
                event: goal,
            }
        );
    }

    #[test]
    fn wire_shape_is_tagged() {
        let value = serde_json::to_value(MatchUpdate::Phase {
            fixture: FixtureId(8),
            phase: Phase::HalfTime,
            elapsed: 300,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "phase", "fixture": 8, "phase": "half_time", "elapsed": 300})
        );
    }
}
