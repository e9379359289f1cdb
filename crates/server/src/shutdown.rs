//! Cooperative stop signal for the scheduler and fixture runners.
//!
//! Built on `tokio::sync::watch`: one [`ShutdownTrigger`], any number of
//! cloned [`Shutdown`] listeners. Listeners only observe the request at
//! their own suspension points (sleeps and clock ticks).

use tokio::sync::watch;

pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A listener that is never triggered.
    pub fn never() -> Self {
        channel().1
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested. If the trigger is dropped
    /// without firing, this never resolves.
    pub async fn requested(&mut self) {
        let trigger_dropped = self.rx.wait_for(|stop| *stop).await.is_err();
        if trigger_dropped {
            std::future::pending::<()>().await;
        }
    }
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}
