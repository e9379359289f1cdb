//! Admin alerts for phase transitions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Fire-and-forget sink for operator-facing messages.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, message: &str);
}

#[derive(Clone, Debug, Serialize)]
pub struct AdminAlert {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Logs every alert under the `admin` target and fans it out to dashboard
/// subscribers.
pub struct AdminNotifier {
    tx: broadcast::Sender<AdminAlert>,
}

impl AdminNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdminAlert> {
        self.tx.subscribe()
    }
}

impl Default for AdminNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for AdminNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(target: "admin", "{}", message);
        let _ = self.tx.send(AdminAlert {
            at: Utc::now(),
            message: message.to_string(),
        });
    }
}
