use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Cooperative stop signal shared between the ingest loop, the heartbeat
/// timer, and the `terminate` action -- the in-process analogue of
/// `EngineInner`'s `stop_requested` flag plus `Notify` in
/// `client-engine/src/engine.rs`.
#[derive(Debug, Default)]
pub struct StopSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    /// Create a signal in the not-requested state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop and wake anyone waiting on [`StopSignal::wait`].
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Whether a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolve once a stop has been requested.
    pub async fn wait(&self) {
        if self.is_requested() {
            return;
        }
        self.notify.notified().await;
    }
}
