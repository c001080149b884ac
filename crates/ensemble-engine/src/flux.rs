/// Lifecycle event names Flux reports on its job event journal. Grounded on
/// the `job_events` list in `ensemble/members/flux/queue.py`.
const FLUX_JOB_EVENTS: &[&str] = &[
    "submit",
    "jobspec-update",
    "resource-update",
    "validate",
    "invalidate",
    "set-flags",
    "dependency-add",
    "dependency-remove",
    "depend",
    "priority",
    "flux-restart",
    "urgency",
    "alloc",
    "prolog-start",
    "prolog-finish",
    "epilog-start",
    "epilog-finish",
    "free",
    "start",
    "release",
    "finish",
    "clean",
    "exception",
    "memo",
    "debug",
];

/// The full set of trigger names the Flux executor supports: `start`,
/// `metric`, `heartbeat`, and one `job-<event>` per entry in
/// [`FLUX_JOB_EVENTS`]. Mirrors `FluxQueue.rules` in the original
/// implementation (`["start", "metric"]` plus the derived `job-<event>`
/// triggers).
pub fn flux_supported_triggers() -> Vec<String> {
    let mut triggers = vec!["start".to_string(), "metric".to_string(), "heartbeat".to_string()];
    triggers.extend(FLUX_JOB_EVENTS.iter().map(|e| format!("job-{e}")));
    triggers
}
