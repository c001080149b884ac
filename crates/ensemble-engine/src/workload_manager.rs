use async_trait::async_trait;
use ensemble_types::JobInstance;

use crate::error::EngineError;

/// The sentinel job id the workload manager emits to mark the end of
/// pre-existing backlog and the start of live events (invariant 6).
pub const SENTINEL_JOB_ID: i64 = -1;

/// One lifecycle event within a job record (`submit`, `start`, `finish`,
/// ...), named after the Flux job-state machine the original implementation
/// targets (`ensemble/members/flux/queue.py`'s `job_events`).
#[derive(Debug, Clone)]
pub struct JobEvent {
    /// Event name, e.g. `"submit"`, `"start"`, `"finish"`.
    pub name: String,
    /// Event timestamp, seconds since epoch (fractional).
    pub timestamp: f64,
    /// Exit status for `finish` events; `Some(0)` is success.
    pub status: Option<i32>,
}

/// One record from the workload manager's event journal: a job id plus the
/// events observed for it since the last record.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// The job id this record is about, or [`SENTINEL_JOB_ID`] for the
    /// backlog/live boundary marker.
    pub job_id: i64,
    /// Events carried by this record, in occurrence order.
    pub events: Vec<JobEvent>,
}

impl JobRecord {
    /// Whether this record is the backlog/live sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.job_id == SENTINEL_JOB_ID
    }
}

/// Abstraction over the external workload manager (e.g. Flux): submitting
/// jobs and declaring which triggers it can support. The real wire protocol
/// is out of scope (SPEC_FULL.md §1); this trait is the seam a concrete
/// binding plugs into.
#[async_trait]
pub trait WorkloadManager: Send + Sync {
    /// Submit one already-expanded job instance (`JobGroup::expand`'s
    /// output), returning the workload manager's job id on success.
    async fn submit(&self, job: &JobInstance) -> Result<i64, EngineError>;

    /// Trigger names this executor understands, used to validate
    /// configuration at load time.
    fn supported_triggers(&self) -> Vec<String>;
}
