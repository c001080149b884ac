use chrono::{DateTime, Utc};
use serde::Serialize;

/// Server-level uptime tracking, distinct from the per-group
/// [`ensemble_metrics::MetricsRegistry`] the engine maintains. Grounded on
/// `ensemble/metrics.py`'s `Metrics` class.
#[derive(Debug, Clone, Serialize)]
pub struct ServerUptime {
    start_time: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl ServerUptime {
    /// Start tracking uptime from now.
    pub fn new() -> Self {
        let now = Utc::now();
        ServerUptime {
            start_time: now,
            last_updated: now,
        }
    }

    /// Record that the server is alive right now.
    pub fn tick(&mut self) {
        self.last_updated = Utc::now();
    }

    /// Seconds elapsed between start and the last tick.
    pub fn elapsed_seconds(&self) -> i64 {
        (self.last_updated - self.start_time).num_seconds()
    }
}

impl Default for ServerUptime {
    fn default() -> Self {
        Self::new()
    }
}
