//! `ensemble run --executor <flux|...> <config>` (SPEC_FULL.md §6). Follows
//! the setup/shutdown/event-loop shape of `client/src/main.rs`.
mod cli;
mod flux_workload_manager;
mod shutdown;
mod stdin_source;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ensemble_engine::{ActionExecutor, Controller, HandlerRegistry, StopSignal};
use tokio::sync::mpsc;

use cli::{Cli, Command, Executor, RunArgs};
use flux_workload_manager::FluxWorkloadManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read config file {}", args.config.display()))?;

    init_tracing(document_wants_debug(&raw));

    let supported = match args.executor {
        Executor::Flux => ensemble_engine::flux_supported_triggers(),
    };
    let supported_refs: Vec<&str> = supported.iter().map(String::as_str).collect();

    // No `custom` handlers are wired into the CLI binary today; embedding a
    // real deployment registers its handlers here before loading.
    let handlers = HandlerRegistry::new();
    let store = ensemble_config::RuleStore::load(&raw, &supported_refs, &handlers)
        .with_context(|| format!("invalid configuration in {}", args.config.display()))?;

    let workload_manager: Arc<dyn ensemble_engine::WorkloadManager> = match args.executor {
        Executor::Flux => Arc::new(FluxWorkloadManager::new()),
    };

    let stop = Arc::new(StopSignal::new());
    shutdown::install(stop.clone());

    let elasticity = match &args.elasticity_addr {
        Some(addr) => Some(
            ensemble_elasticity::ElasticityClient::connect(addr.clone())
                .await
                .with_context(|| format!("failed to connect to elasticity endpoint at {addr}"))?,
        ),
        None => None,
    };

    let executor = ActionExecutor::new(
        workload_manager,
        elasticity,
        handlers,
        "flux-framework.org",
        "v1alpha2",
        "miniclusters",
        "pool",
        stop.clone(),
    );
    let controller = Controller::new(store, executor, stop);

    let (tx, rx) = mpsc::channel(256);
    if args.read_stdin {
        stdin_source::spawn_stdin_reader(tx);
    } else {
        drop(tx);
    }

    controller.run(rx).await.context("controller run failed")?;
    Ok(())
}

fn document_wants_debug(raw: &str) -> bool {
    serde_yaml::from_str::<serde_yaml::Value>(raw)
        .ok()
        .and_then(|v| v.get("logging")?.get("debug")?.as_bool())
        .unwrap_or(false)
}

fn init_tracing(document_debug: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if document_debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
