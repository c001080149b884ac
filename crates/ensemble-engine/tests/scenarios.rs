//! End-to-end scenarios S1-S6, driving the public `ensemble-engine` API the
//! same way `ensemble-cli`'s `run()` assembles it. Placed as a crate-level
//! `tests/` directory the way `knhk-sidecar/tests/` is laid out relative to
//! its own package.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ensemble_config::{ConfigDocument, EmptyHandlerCatalog, RuleStore};
use ensemble_endpoint::{ComputePoolOrchestrator, FakeOrchestrator, PoolSize};
use ensemble_elasticity::ElasticityClient;
use ensemble_engine::{
    ActionDescriptor, ActionExecutor, Controller, CustomContext, CustomHandler, EngineError,
    EvalContext, HandlerRegistry, JobEvent, JobRecord, StopSignal, WorkloadManager,
};
use ensemble_ledger::JobLedger;
use ensemble_metrics::MetricsRegistry;
use ensemble_types::{Action, ActionName, JobGroup, JobInstance, Rule, Trigger, When};
use tokio::sync::mpsc;
use tokio::time::timeout;

fn group(name: &str, count: u32, nodes: u32) -> JobGroup {
    JobGroup {
        name: name.to_string(),
        command: "hostname".to_string(),
        workdir: None,
        count,
        nodes,
        tasks: None,
        duration: 0,
    }
}

fn submit_rule(label: &str, repetitions: u32) -> Rule {
    Rule {
        trigger: Trigger::Start,
        name: None,
        when: None,
        action: Action {
            name: ActionName::Submit,
            label: Some(label.to_string()),
            value: None,
            repetitions,
            backoff: None,
            backoff_counter: 0,
        },
    }
}

/// Records every job instance it is asked to submit and hands out
/// sequential job ids, starting at 1.
struct RecordingWorkloadManager {
    next_id: std::sync::atomic::AtomicI64,
    submitted: Mutex<Vec<JobInstance>>,
}

impl RecordingWorkloadManager {
    fn new() -> Self {
        RecordingWorkloadManager {
            next_id: std::sync::atomic::AtomicI64::new(1),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WorkloadManager for RecordingWorkloadManager {
    async fn submit(&self, job: &JobInstance) -> Result<i64, EngineError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(job.clone());
        Ok(id)
    }

    fn supported_triggers(&self) -> Vec<String> {
        vec!["start".to_string(), "job-finish".to_string(), "metric".to_string()]
    }
}

struct NoopWorkloadManager;

#[async_trait]
impl WorkloadManager for NoopWorkloadManager {
    async fn submit(&self, _job: &JobInstance) -> Result<i64, EngineError> {
        Ok(1)
    }

    fn supported_triggers(&self) -> Vec<String> {
        vec!["start".to_string(), "metric".to_string()]
    }
}

/// A `custom` handler that does nothing but count how many times it fired.
struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CustomHandler for CountingHandler {
    fn call(&self, _ctx: CustomContext<'_>) -> Option<ActionDescriptor> {
        self.count.fetch_add(1, Ordering::SeqCst);
        None
    }
}

fn finish_event(timestamp: f64) -> JobRecord {
    JobRecord {
        job_id: 0,
        events: vec![JobEvent {
            name: "finish".to_string(),
            timestamp,
            status: Some(0),
        }],
    }
}

/// S1: one group `g` (`count=2, nodes=1, command="hostname"`) submitted by a
/// `start` rule expands into two job instances, each with the command
/// shell-split and `tasks` bumped up to `nodes`; once both finish, a
/// `job-finish` custom handler observes exactly two finish events.
#[tokio::test]
async fn s1_single_submit_on_start_expands_and_tracks_finishes() {
    let finish_count = Arc::new(AtomicUsize::new(0));
    let mut handlers = HandlerRegistry::new();
    handlers.register(
        "track_finish",
        Arc::new(CountingHandler {
            count: finish_count.clone(),
        }),
    );

    let doc = ConfigDocument {
        jobs: vec![group("g", 2, 1)],
        rules: vec![
            submit_rule("g", 1),
            Rule {
                trigger: Trigger::Job("finish".to_string()),
                name: None,
                when: None,
                action: Action {
                    name: ActionName::Custom,
                    label: Some("track_finish".to_string()),
                    value: None,
                    repetitions: 100,
                    backoff: None,
                    backoff_counter: 0,
                },
            },
        ],
        logging: Default::default(),
        custom: None,
    };
    let store = RuleStore::from_document(doc, &["start", "job-finish"], &handlers).unwrap();

    let wm = Arc::new(RecordingWorkloadManager::new());
    let stop = Arc::new(StopSignal::new());
    let executor = ActionExecutor::new(
        wm.clone(),
        None,
        handlers,
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "pool",
        stop.clone(),
    );
    let controller = Controller::new(store, executor, stop);

    let (tx, rx) = mpsc::channel(8);
    tx.send(JobRecord {
        job_id: 1,
        events: vec![JobEvent {
            name: "finish".to_string(),
            timestamp: 1.0,
            status: Some(0),
        }],
    })
    .await
    .unwrap();
    tx.send(JobRecord {
        job_id: 2,
        events: vec![JobEvent {
            name: "finish".to_string(),
            timestamp: 2.0,
            status: Some(0),
        }],
    })
    .await
    .unwrap();
    drop(tx);

    controller.run(rx).await.unwrap();

    let submitted = wm.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2, "count=2 must expand into two job instances");
    for instance in submitted.iter() {
        assert_eq!(instance.command, vec!["hostname".to_string()]);
        assert_eq!(instance.nodes, 1);
        assert_eq!(instance.tasks, 1);
    }
    assert_eq!(finish_count.load(Ordering::SeqCst), 2);
}

/// S2: a `metric` rule `{name: count.g.finished, when: >= 5, action:
/// terminate}` stops the controller once five `finish` events for group `g`
/// have been observed, without waiting for the ingest channel to close.
#[tokio::test]
async fn s2_metric_rule_terminates_after_threshold() {
    let doc = ConfigDocument {
        jobs: vec![group("g", 5, 1)],
        rules: vec![
            submit_rule("g", 1),
            Rule {
                trigger: Trigger::Metric,
                name: Some("count.g.finished".to_string()),
                when: Some(When::parse_str(">= 5").unwrap()),
                action: Action {
                    name: ActionName::Terminate,
                    label: None,
                    value: None,
                    repetitions: 1,
                    backoff: None,
                    backoff_counter: 0,
                },
            },
        ],
        logging: Default::default(),
        custom: None,
    };
    let store = RuleStore::from_document(doc, &["start", "job-finish", "metric"], &EmptyHandlerCatalog).unwrap();

    let wm = Arc::new(RecordingWorkloadManager::new());
    let stop = Arc::new(StopSignal::new());
    let executor = ActionExecutor::new(
        wm,
        None,
        HandlerRegistry::new(),
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "pool",
        stop.clone(),
    );
    let controller = Controller::new(store, executor, stop.clone());

    let (tx, rx) = mpsc::channel(8);
    for job_id in 1..=5 {
        let mut record = finish_event(job_id as f64);
        record.job_id = job_id;
        tx.send(record).await.unwrap();
    }
    // tx stays alive: the controller must stop itself via the terminate
    // action, not because the channel closed.

    timeout(Duration::from_secs(2), controller.run(rx))
        .await
        .expect("controller did not terminate after the fifth finish event")
        .unwrap();
    assert!(stop.is_requested());
}

async fn spawn_endpoint(orchestrator: Arc<FakeOrchestrator>) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    tokio::spawn(ensemble_endpoint::serve(
        addr,
        orchestrator as Arc<dyn ComputePoolOrchestrator>,
        "default".to_string(),
        std::future::pending(),
    ));

    for _ in 0..50 {
        if ElasticityClient::connect(format!("http://{addr}")).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    addr
}

fn grow_rule(value: f64) -> Rule {
    Rule {
        trigger: Trigger::Metric,
        name: None,
        when: None,
        action: Action {
            name: ActionName::Grow,
            label: None,
            value: Some(value),
            repetitions: 1,
            backoff: None,
            backoff_counter: 0,
        },
    }
}

fn shrink_rule(value: f64) -> Rule {
    Rule {
        trigger: Trigger::Metric,
        name: None,
        when: None,
        action: Action {
            name: ActionName::Shrink,
            label: None,
            value: Some(value),
            repetitions: 1,
            backoff: None,
            backoff_counter: 0,
        },
    }
}

fn empty_eval_ctx<'a>(ledger: &'a mut JobLedger, metrics: &'a mut MetricsRegistry) -> EvalContext<'a> {
    EvalContext {
        ledger,
        metrics,
        jobs: vec![],
        event: None,
    }
}

/// S3: pool `{minSize: 2, maxSize: 4, size: 3}`; a `grow(value: 5)` rule
/// round-trips over real gRPC to the endpoint, which clamps the request and
/// patches the pool to 4.
#[tokio::test]
async fn s3_grow_clamps_and_patches_pool_over_grpc() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    orchestrator.register(
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "default",
        "pool",
        PoolSize {
            size: 3,
            min_size: 2,
            max_size: 4,
        },
    );
    let addr = spawn_endpoint(orchestrator.clone()).await;
    let client = ElasticityClient::connect(format!("http://{addr}")).await.unwrap();

    let wm = Arc::new(NoopWorkloadManager);
    let mut executor = ActionExecutor::new(
        wm,
        Some(client),
        HandlerRegistry::new(),
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "pool",
        Arc::new(StopSignal::new()),
    );
    let mut ledger = JobLedger::new();
    let mut metrics = MetricsRegistry::new();
    let mut rule = grow_rule(5.0);
    executor
        .evaluate(&mut rule, empty_eval_ctx(&mut ledger, &mut metrics))
        .await
        .unwrap();

    let pool = orchestrator
        .get("flux-framework.org", "v1alpha2", "miniclusters", "default", "pool")
        .await
        .unwrap();
    assert_eq!(pool.size, 4, "proposed size 8 must clamp to max_size 4");
}

/// S4: the same pool; `shrink(value: 0)` is a zero-magnitude resize, which
/// the endpoint rejects outright -- the pool size is left unchanged and the
/// executor surfaces the rejection as an `EngineError::Elasticity`.
#[tokio::test]
async fn s4_shrink_zero_is_rejected_pool_unchanged() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    orchestrator.register(
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "default",
        "pool",
        PoolSize {
            size: 3,
            min_size: 2,
            max_size: 4,
        },
    );
    let addr = spawn_endpoint(orchestrator.clone()).await;
    let client = ElasticityClient::connect(format!("http://{addr}")).await.unwrap();

    let wm = Arc::new(NoopWorkloadManager);
    let mut executor = ActionExecutor::new(
        wm,
        Some(client),
        HandlerRegistry::new(),
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "pool",
        Arc::new(StopSignal::new()),
    );
    let mut ledger = JobLedger::new();
    let mut metrics = MetricsRegistry::new();
    let mut rule = shrink_rule(0.0);
    let err = executor
        .evaluate(&mut rule, empty_eval_ctx(&mut ledger, &mut metrics))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Elasticity(_)));

    let pool = orchestrator
        .get("flux-framework.org", "v1alpha2", "miniclusters", "default", "pool")
        .await
        .unwrap();
    assert_eq!(pool.size, 3, "rejected resize must not mutate the pool");
}

/// S5: a `job-finish` rule `{action: custom, label: f, repetitions: 3,
/// backoff: 2}` fires on the 1st, 4th, and 7th of nine consecutive finish
/// events and never again after that.
#[tokio::test]
async fn s5_backoff_spaces_out_custom_firings() {
    let fire_count = Arc::new(AtomicUsize::new(0));
    let mut handlers = HandlerRegistry::new();
    handlers.register(
        "f",
        Arc::new(CountingHandler {
            count: fire_count.clone(),
        }),
    );

    let doc = ConfigDocument {
        jobs: vec![group("g", 1, 1)],
        rules: vec![
            submit_rule("g", 1),
            Rule {
                trigger: Trigger::Job("finish".to_string()),
                name: None,
                when: None,
                action: Action {
                    name: ActionName::Custom,
                    label: Some("f".to_string()),
                    value: None,
                    repetitions: 3,
                    backoff: Some(2),
                    backoff_counter: 0,
                },
            },
        ],
        logging: Default::default(),
        custom: None,
    };
    let store = RuleStore::from_document(doc, &["start", "job-finish"], &handlers).unwrap();

    let wm = Arc::new(RecordingWorkloadManager::new());
    let stop = Arc::new(StopSignal::new());
    let executor = ActionExecutor::new(
        wm,
        None,
        handlers,
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "pool",
        stop.clone(),
    );
    let controller = Controller::new(store, executor, stop);

    let (tx, rx) = mpsc::channel(16);
    for i in 0..9 {
        // The single submitted job (id 1) finishes and is dropped from the
        // ledger on its first finish event; later events target the same id
        // so each record still resolves a `group_name` for the rule dispatch
        // even once the ledger entry itself is gone.
        let mut record = finish_event(i as f64);
        record.job_id = 1;
        tx.send(record).await.unwrap();
    }
    drop(tx);

    controller.run(rx).await.unwrap();
    assert_eq!(fire_count.load(Ordering::SeqCst), 3, "fires on occurrences 0, 3, and 6 only");
}

/// S6: one job submitted at t=0 with no `start` event ever recorded; across
/// three heartbeat ticks the pending-time metric keeps accumulating samples
/// (observed here via a `metric` rule on `mean.g-pending` that fires every
/// tick once resolvable) while `count.g.finished` never crosses its own
/// threshold rule, since no `finish` event is ever sent.
#[tokio::test]
async fn s6_heartbeat_samples_pending_job() {
    let pending_fires = Arc::new(AtomicUsize::new(0));
    let finished_fires = Arc::new(AtomicUsize::new(0));
    let mut handlers = HandlerRegistry::new();
    handlers.register(
        "saw_pending",
        Arc::new(CountingHandler {
            count: pending_fires.clone(),
        }),
    );
    handlers.register(
        "saw_finished",
        Arc::new(CountingHandler {
            count: finished_fires.clone(),
        }),
    );

    let mut doc = ConfigDocument {
        jobs: vec![group("g", 1, 1)],
        rules: vec![
            submit_rule("g", 1),
            Rule {
                trigger: Trigger::Metric,
                name: Some("mean.g-pending".to_string()),
                when: Some(When::parse_str(">= 0").unwrap()),
                action: Action {
                    name: ActionName::Custom,
                    label: Some("saw_pending".to_string()),
                    value: None,
                    repetitions: 3,
                    backoff: None,
                    backoff_counter: 0,
                },
            },
            Rule {
                trigger: Trigger::Metric,
                name: Some("count.g.finished".to_string()),
                when: Some(When::parse_str(">= 1").unwrap()),
                action: Action {
                    name: ActionName::Custom,
                    label: Some("saw_finished".to_string()),
                    value: None,
                    repetitions: 3,
                    backoff: None,
                    backoff_counter: 0,
                },
            },
        ],
        logging: Default::default(),
        custom: None,
    };
    doc.logging.heartbeat = Some(1);
    let store = RuleStore::from_document(doc, &["start", "metric"], &handlers).unwrap();

    let wm = Arc::new(RecordingWorkloadManager::new());
    let stop = Arc::new(StopSignal::new());
    let executor = ActionExecutor::new(
        wm,
        None,
        handlers,
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "pool",
        stop.clone(),
    );
    let controller = Controller::new(store, executor, stop.clone());

    let (_tx, rx) = mpsc::channel(1);
    let run = tokio::spawn(controller.run(rx));
    tokio::time::sleep(Duration::from_millis(3_300)).await;
    stop.request();
    timeout(Duration::from_secs(2), run)
        .await
        .expect("controller did not stop after the request")
        .unwrap()
        .unwrap();

    assert!(
        pending_fires.load(Ordering::SeqCst) >= 3,
        "pending-time metric must accumulate a sample on every one of the three ticks"
    );
    assert_eq!(
        finished_fires.load(Ordering::SeqCst),
        0,
        "count.g.finished must stay at 0 with no finish event ever sent"
    );
}
