use ensemble_config::RuleStore;
use ensemble_ledger::JobLedger;
use ensemble_metrics::MetricsRegistry;
use ensemble_types::Trigger;

use crate::error::EngineError;
use crate::executor::{ActionExecutor, EvalContext};
use crate::workload_manager::JobRecord;

/// How often (in finished jobs) to log a metrics summary. Mirrors
/// `summary_frequency`-style batching in the original `record_finish_metrics`
/// path without hard-coding a magic constant inline at the call site.
const SUMMARY_FREQUENCY: u64 = 50;

/// C5: apply one record from the workload manager's event journal to the
/// ledger and metrics, then evaluate the rules it makes eligible.
///
/// Backlog isolation (invariant 5 and Open Question i in SPEC_FULL.md §4.5):
/// a record whose job id is not already tracked in the ledger is assumed to
/// predate the controller's own submissions and is ignored entirely, for
/// both metrics and `job-<event>` rule firing.
pub async fn process_record(
    record: JobRecord,
    store: &mut RuleStore,
    ledger: &mut JobLedger,
    metrics: &mut MetricsRegistry,
    executor: &mut ActionExecutor,
) -> Result<bool, EngineError> {
    if record.is_sentinel() {
        return Ok(true);
    }

    if !ledger.contains(record.job_id) {
        tracing::debug!(job_id = record.job_id, "ignoring backlog record");
        return Ok(false);
    }

    let group_name = ledger
        .get(record.job_id)
        .map(|e| e.group_name.clone())
        .unwrap_or_default();

    for event in &record.events {
        match event.name.as_str() {
            "submit" => ledger.set_submit(record.job_id, event.timestamp),
            "start" => {
                ledger.set_start(record.job_id, event.timestamp);
                if let Some(entry) = ledger.get(record.job_id) {
                    if let Some(submit_ts) = entry.submit_ts {
                        metrics.record(&format!("{group_name}-pending"), event.timestamp - submit_ts);
                    }
                }
            }
            "finish" => {
                if let Some(entry) = ledger.get(record.job_id) {
                    if let Some(start_ts) = entry.start_ts {
                        metrics.record(&format!("{group_name}-duration"), event.timestamp - start_ts);
                    }
                }
                metrics.increment(&group_name, "finished");
                if event.status.unwrap_or(0) == 0 {
                    metrics.increment(&group_name, "success");
                } else {
                    metrics.increment(&group_name, "failed");
                }
                ledger.drop(record.job_id);
                let finished = metrics.count(&group_name, "finished");
                if finished % SUMMARY_FREQUENCY == 0 {
                    metrics.summarise_all();
                }
            }
            _ => {}
        }

        let trigger = Trigger::Job(event.name.clone());
        let rule_count = store.rules_for(&trigger).len();
        for idx in 0..rule_count {
            let label = store.rules_for(&trigger)[idx].action.label.clone();
            let jobs = store.jobs(label.as_deref()).into_iter().cloned().collect();
            let rule = &mut store.rules_for_mut(&trigger)[idx];
            let ctx = EvalContext {
                ledger,
                metrics,
                jobs,
                event: Some(event.clone()),
            };
            executor.evaluate(rule, ctx).await?;
        }
    }

    let metric_rule_count = store.rules_for(&Trigger::Metric).len();
    for idx in 0..metric_rule_count {
        let label = store.rules_for(&Trigger::Metric)[idx].action.label.clone();
        let jobs = store.jobs(label.as_deref()).into_iter().cloned().collect();
        let rule = &mut store.rules_for_mut(&Trigger::Metric)[idx];
        let ctx = EvalContext {
            ledger,
            metrics,
            jobs,
            event: None,
        };
        executor.evaluate(rule, ctx).await?;
    }

    Ok(false)
}
