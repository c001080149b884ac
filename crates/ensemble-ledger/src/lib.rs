//! In-memory job ledger: external job id -> owning group plus lifecycle
//! timestamps. Grounded on the `BTreeMap`-keyed store idiom of
//! `client-engine/src/inflight.rs`, but deliberately without that module's
//! disk persistence -- the ledger does not survive a restart (see
//! SPEC_FULL.md §1 Non-goals).
#![deny(unreachable_pub)]
#![deny(missing_docs)]

use std::collections::BTreeMap;

use ensemble_types::JobLedgerEntry;

/// The external job id type used by the workload manager.
pub type JobId = i64;

/// Owned exclusively by the controller's event-loop task.
#[derive(Debug, Default)]
pub struct JobLedger {
    entries: BTreeMap<JobId, JobLedgerEntry>,
}

impl JobLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly submitted job.
    pub fn insert(&mut self, job_id: JobId, group_name: impl Into<String>, submit_ts: f64) {
        self.entries
            .insert(job_id, JobLedgerEntry::new(group_name, submit_ts));
    }

    /// Record a workload-manager `submit` event for an already-tracked job
    /// (the controller's own submit path already inserted the entry; this
    /// just reconciles the workload manager's own timestamp).
    pub fn set_submit(&mut self, job_id: JobId, submit_ts: f64) {
        match self.entries.get_mut(&job_id) {
            Some(entry) => entry.submit_ts = Some(submit_ts),
            None => tracing::debug!(job_id, "set_submit for unknown job id, ignoring"),
        }
    }

    /// Record that a known job has started running.
    ///
    /// No-op (with a debug-level log) if the job id is not in the ledger --
    /// per invariant 5, such events belong to the pre-sentinel backlog.
    pub fn set_start(&mut self, job_id: JobId, start_ts: f64) {
        match self.entries.get_mut(&job_id) {
            Some(entry) => entry.start_ts = Some(start_ts),
            None => tracing::debug!(job_id, "set_start for unknown job id, ignoring"),
        }
    }

    /// Look up a job's ledger entry.
    pub fn get(&self, job_id: JobId) -> Option<&JobLedgerEntry> {
        self.entries.get(&job_id)
    }

    /// Remove and return a job's ledger entry, typically on `finish`.
    pub fn drop(&mut self, job_id: JobId) -> Option<JobLedgerEntry> {
        self.entries.remove(&job_id)
    }

    /// Whether a job id is currently tracked (i.e. not backlog).
    pub fn contains(&self, job_id: JobId) -> bool {
        self.entries.contains_key(&job_id)
    }

    /// Distinct group names with at least one active entry.
    pub fn active_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self
            .entries
            .values()
            .map(|e| e.group_name.as_str())
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Iterate entries that have been submitted but not yet started --
    /// the set the heartbeat samples pending-time from.
    pub fn pending(&self) -> impl Iterator<Item = (JobId, &JobLedgerEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.start_ts.is_none())
            .map(|(id, e)| (*id, e))
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no tracked entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
