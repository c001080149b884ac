//! Running statistical estimators over per-group scalar samples, plus nested
//! event counters. Grounded on `ensemble/members/metrics.py`'s `QueueMetrics`
//! (there built on `river.stats`); reimplemented here with single-pass,
//! bounded-memory estimators since no streaming-stats crate appears in the
//! reference pack (see DESIGN.md).
#![deny(unreachable_pub)]
#![deny(missing_docs)]

use std::collections::HashMap;

mod estimator;

use estimator::RunningStats;

/// The five scalar statistics (beyond `count`) a key can be queried for.
const STAT_NAMES: [&str; 5] = ["mean", "variance", "min", "max", "iqr"];

/// Per-(group, metric-name) running statistics and nested event counters.
///
/// Owned exclusively by the controller's single event-loop task; there is no
/// internal locking (see SPEC_FULL.md §5).
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    stats: HashMap<String, RunningStats>,
    counts: HashMap<String, HashMap<String, u64>>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a scalar sample under `key` (e.g. `"grpA-duration"`), updating
    /// every tracked statistic for that key. Estimators are created lazily on
    /// first use.
    pub fn record(&mut self, key: &str, value: f64) {
        self.stats.entry(key.to_string()).or_default().update(value);
    }

    /// Increment `count.<group>.<counter>` by one, creating it if absent.
    pub fn increment(&mut self, group: &str, counter: &str) {
        *self
            .counts
            .entry(group.to_string())
            .or_default()
            .entry(counter.to_string())
            .or_insert(0) += 1;
    }

    /// Read the current counter value, or 0 if never incremented.
    pub fn count(&self, group: &str, counter: &str) -> u64 {
        self.counts
            .get(group)
            .and_then(|c| c.get(counter))
            .copied()
            .unwrap_or(0)
    }

    /// Resolve a dotted metric path to its current scalar reading.
    ///
    /// Accepted forms: `"count.<group>.<counter>"` and
    /// `"<stat>.<key>"` where `stat` is one of `mean`, `variance`, `min`,
    /// `max`, `iqr`, `mad`. Returns `None` if any segment is unresolved
    /// (unknown stat name, or no samples recorded yet under that key).
    pub fn get(&self, path: &str) -> Option<f64> {
        let mut parts = path.splitn(2, '.');
        let head = parts.next()?;
        let rest = parts.next()?;
        if head == "count" {
            let mut rest_parts = rest.splitn(2, '.');
            let group = rest_parts.next()?;
            let counter = rest_parts.next()?;
            return Some(self.count(group, counter) as f64);
        }
        let stats = self.stats.get(rest)?;
        match head {
            "mean" => stats.mean(),
            "variance" => stats.variance(),
            "min" => stats.min(),
            "max" => stats.max(),
            "iqr" => stats.iqr(),
            "mad" => stats.mad(),
            _ => None,
        }
    }

    /// Validate a dotted metric path's *syntax* only: a recognised stat name
    /// (or `count`) followed by at least one more segment. Does not require
    /// the underlying key to have samples yet.
    pub fn validate_path_syntax(path: &str) -> Result<(), String> {
        let mut parts = path.splitn(2, '.');
        let head = parts.next().ok_or_else(|| format!("empty metric path: '{path}'"))?;
        let rest = parts
            .next()
            .ok_or_else(|| format!("metric path '{path}' is missing a key segment"))?;
        if rest.is_empty() {
            return Err(format!("metric path '{path}' is missing a key segment"));
        }
        if head == "count" {
            let mut rest_parts = rest.splitn(2, '.');
            rest_parts.next();
            rest_parts
                .next()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| format!("count path '{path}' needs '<group>.<counter>'"))?;
            return Ok(());
        }
        if STAT_NAMES.contains(&head) || head == "mad" {
            Ok(())
        } else {
            Err(format!("unknown metric statistic '{head}' in path '{path}'"))
        }
    }

    /// Render every tracked statistic as `tracing::info!` events, mirroring
    /// the teacher's run-summary logging but structured rather than printed.
    pub fn summarise_all(&self) {
        for (key, stats) in &self.stats {
            self.summarise(key, stats);
        }
        for (group, counters) in &self.counts {
            for (counter, value) in counters {
                tracing::info!(group, counter, value, "count");
            }
        }
    }

    /// Render every statistic tracked under a single key.
    pub fn summarise_key(&self, key: &str) {
        if let Some(stats) = self.stats.get(key) {
            self.summarise(key, stats);
        }
    }

    fn summarise(&self, key: &str, stats: &RunningStats) {
        tracing::info!(
            key,
            count = stats.count(),
            mean = stats.mean(),
            variance = stats.variance(),
            min = stats.min(),
            max = stats.max(),
            iqr = stats.iqr(),
            mad = stats.mad(),
            "metric summary"
        );
    }
}
