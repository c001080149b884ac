use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use ensemble_engine::{EngineError, WorkloadManager};
use ensemble_types::JobInstance;

/// A minimal stand-in for a real Flux binding: it "submits" jobs by handing
/// out monotonically increasing ids and logging the command line it would
/// have run. The real Flux job-submission RPC and event journal transport
/// are out of scope for this controller (SPEC_FULL.md §1) -- a production
/// deployment swaps this for a binding against the actual Flux handle.
pub struct FluxWorkloadManager {
    next_id: AtomicI64,
}

impl FluxWorkloadManager {
    /// Create a fresh in-process id allocator.
    pub fn new() -> Self {
        FluxWorkloadManager {
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for FluxWorkloadManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkloadManager for FluxWorkloadManager {
    async fn submit(&self, job: &JobInstance) -> Result<i64, EngineError> {
        let job_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            job_id,
            group = %job.group_name,
            command = ?job.command,
            nodes = job.nodes,
            tasks = job.tasks,
            "submitted job"
        );
        Ok(job_id)
    }

    fn supported_triggers(&self) -> Vec<String> {
        ensemble_engine::flux_supported_triggers()
    }
}
