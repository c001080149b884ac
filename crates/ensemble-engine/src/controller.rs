use std::sync::Arc;
use std::time::Duration;

use ensemble_config::RuleStore;
use ensemble_ledger::JobLedger;
use ensemble_metrics::MetricsRegistry;
use ensemble_types::Trigger;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::executor::{ActionExecutor, EvalContext};
use crate::heartbeat;
use crate::ingest;
use crate::stop::StopSignal;
use crate::workload_manager::JobRecord;

/// The single cooperative event loop described in SPEC_FULL.md §5: one task
/// owns [`RuleStore`]/[`JobLedger`]/[`MetricsRegistry`] and serialises all
/// mutation through `tokio::select!` over the ingest channel and the
/// heartbeat interval, the same shape `client-engine/src/engine.rs`'s
/// `EngineRuntime::run` multiplexes its fetch task and worker events with.
pub struct Controller {
    store: RuleStore,
    ledger: JobLedger,
    metrics: MetricsRegistry,
    executor: ActionExecutor,
    heartbeat_interval: Option<Duration>,
    stop: Arc<StopSignal>,
}

impl Controller {
    /// Assemble a controller from its already-loaded pieces.
    pub fn new(
        store: RuleStore,
        executor: ActionExecutor,
        stop: Arc<StopSignal>,
    ) -> Self {
        let heartbeat_interval = store.heartbeat_interval().map(Duration::from_secs);
        Controller {
            store,
            ledger: JobLedger::new(),
            metrics: MetricsRegistry::new(),
            executor,
            heartbeat_interval,
            stop,
        }
    }

    /// Run until `records` closes or a `terminate` action / external
    /// shutdown signal fires. Evaluates `start`-triggered rules exactly once
    /// before entering the loop.
    pub async fn run(mut self, mut records: mpsc::Receiver<JobRecord>) -> Result<(), EngineError> {
        self.fire_start_rules().await?;

        let mut heartbeat_timer = self
            .heartbeat_interval
            .map(tokio::time::interval);

        loop {
            if self.stop.is_requested() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.stop.wait() => {
                    break;
                }

                maybe_record = records.recv() => {
                    match maybe_record {
                        Some(record) => {
                            ingest::process_record(
                                record,
                                &mut self.store,
                                &mut self.ledger,
                                &mut self.metrics,
                                &mut self.executor,
                            ).await?;
                        }
                        None => break,
                    }
                }

                _ = async {
                    match heartbeat_timer.as_mut() {
                        Some(timer) => { timer.tick().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    let now = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_secs_f64();
                    heartbeat::tick(now, &mut self.store, &mut self.ledger, &mut self.metrics, &mut self.executor).await?;
                }
            }
        }

        self.metrics.summarise_all();
        Ok(())
    }

    async fn fire_start_rules(&mut self) -> Result<(), EngineError> {
        let rule_count = self.store.rules_for(&Trigger::Start).len();
        for idx in 0..rule_count {
            let label = self.store.rules_for(&Trigger::Start)[idx].action.label.clone();
            let jobs = self.store.jobs(label.as_deref()).into_iter().cloned().collect();
            let rule = &mut self.store.rules_for_mut(&Trigger::Start)[idx];
            let ctx = EvalContext {
                ledger: &mut self.ledger,
                metrics: &mut self.metrics,
                jobs,
                event: None,
            };
            self.executor.evaluate(rule, ctx).await?;
        }
        Ok(())
    }
}
