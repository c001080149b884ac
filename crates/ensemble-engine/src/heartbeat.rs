use ensemble_config::RuleStore;
use ensemble_ledger::JobLedger;
use ensemble_metrics::MetricsRegistry;
use ensemble_types::Trigger;

use crate::error::EngineError;
use crate::executor::{ActionExecutor, EvalContext};

/// C6: one heartbeat tick. Samples pending-time for every job submitted but
/// not yet started, then evaluates every `metric` rule (same semantics as
/// the per-record pass in [`crate::ingest::process_record`]).
pub async fn tick(
    now: f64,
    store: &mut RuleStore,
    ledger: &mut JobLedger,
    metrics: &mut MetricsRegistry,
    executor: &mut ActionExecutor,
) -> Result<(), EngineError> {
    let samples: Vec<(String, f64)> = ledger
        .pending()
        .filter_map(|(_, entry)| entry.submit_ts.map(|ts| (entry.group_name.clone(), now - ts)))
        .collect();
    for (group_name, pending) in samples {
        metrics.record(&format!("{group_name}-pending"), pending);
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

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerRegistry;
    use crate::stop::StopSignal;
    use async_trait::async_trait;
    use ensemble_config::{ConfigDocument, EmptyHandlerCatalog};
    use ensemble_types::JobInstance;
    use std::sync::Arc;

    struct NoopWorkloadManager;
    #[async_trait]
    impl crate::workload_manager::WorkloadManager for NoopWorkloadManager {
        async fn submit(&self, _job: &JobInstance) -> Result<i64, EngineError> {
            Ok(1)
        }
        fn supported_triggers(&self) -> Vec<String> {
            vec!["metric".to_string()]
        }
    }

    fn empty_store() -> ensemble_config::RuleStore {
        let doc = ConfigDocument {
            jobs: vec![],
            rules: vec![],
            logging: Default::default(),
            custom: None,
        };
        ensemble_config::RuleStore::from_document(doc, &["metric"], &EmptyHandlerCatalog).unwrap()
    }

    #[tokio::test]
    async fn tick_samples_pending_jobs_without_touching_started_ones() {
        let mut store = empty_store();
        let mut ledger = JobLedger::new();
        ledger.insert(1, "g", 0.0);
        ledger.insert(2, "g", 0.0);
        ledger.set_start(2, 1.0);
        let mut metrics = MetricsRegistry::new();
        let mut executor = ActionExecutor::new(
            Arc::new(NoopWorkloadManager),
            None,
            HandlerRegistry::new(),
            "flux-framework.org",
            "v1alpha2",
            "m",
            "pool",
            Arc::new(StopSignal::new()),
        );
        tick(5.0, &mut store, &mut ledger, &mut metrics, &mut executor)
            .await
            .unwrap();
        assert_eq!(metrics.get("count.g-pending.count"), None);
        assert_eq!(metrics.get("mean.g-pending"), Some(5.0));
    }
}
