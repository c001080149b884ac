use serde::{Deserialize, Serialize};

/// The default task count used when a job group does not declare one:
/// one task per allocated node.
fn default_tasks_equals_nodes() -> Option<u32> {
    None
}

/// A named, immutable job template. A group may appear more than once under
/// the same `name` in a configuration document; `submit` iterates every
/// occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobGroup {
    /// Group name, used to address `submit` actions and as the metrics key
    /// prefix (`"<name>-duration"`, `"<name>-pending"`).
    pub name: String,
    /// Shell command line, split on whitespace at submit time.
    pub command: String,
    /// Working directory for submitted jobs; defaults to the controller's cwd.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    /// Number of job instances to submit per `submit` firing. Must be >= 1.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Number of nodes per job instance. Must be >= 1.
    #[serde(default = "default_nodes")]
    pub nodes: u32,
    /// Tasks per job instance; bumped up to `nodes` if declared smaller.
    #[serde(default = "default_tasks_equals_nodes")]
    pub tasks: Option<u32>,
    /// Wall-clock duration in seconds; 0 or absent means unlimited.
    #[serde(default)]
    pub duration: u32,
}

fn default_count() -> u32 {
    1
}

fn default_nodes() -> u32 {
    1
}

/// One already-expanded job ready to submit: what `extract_jobs`/`submit`
/// build from a `JobGroup` in the original implementation
/// (`ensemble/members/flux/queue.py`), before handing each job to the
/// workload manager.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInstance {
    /// Name of the group this instance was expanded from, carried along so
    /// the ledger can be keyed by it without re-threading the group.
    pub group_name: String,
    /// Shell-split command line (`extract_jobs`'s `shlex.split(group["command"])`).
    pub command: Vec<String>,
    /// Working directory, inherited from the group.
    pub workdir: Option<String>,
    /// Node count, inherited from the group.
    pub nodes: u32,
    /// Task count, bumped up to `nodes` if the group declared fewer.
    pub tasks: u32,
    /// Wall-clock duration in seconds; 0 means unlimited.
    pub duration: u32,
}

impl JobGroup {
    /// Tasks per instance, defaulting to and clamped up to `nodes`.
    pub fn effective_tasks(&self) -> u32 {
        self.tasks.unwrap_or(self.nodes).max(self.nodes)
    }

    /// Expand this group into `count` independent job instances, each with
    /// its command shell-split and `tasks` bumped up to `nodes`: the same
    /// per-job expansion `extract_jobs`/`submit` perform in
    /// `ensemble/members/flux/queue.py` before a job reaches the workload
    /// manager. Falls back to the unsplit command as a single argument if
    /// the command line has unbalanced quoting.
    pub fn expand(&self) -> Vec<JobInstance> {
        let command = shlex::split(&self.command).unwrap_or_else(|| vec![self.command.clone()]);
        let tasks = self.effective_tasks();
        (0..self.count)
            .map(|_| JobInstance {
                group_name: self.name.clone(),
                command: command.clone(),
                workdir: self.workdir.clone(),
                nodes: self.nodes,
                tasks,
                duration: self.duration,
            })
            .collect()
    }
}
