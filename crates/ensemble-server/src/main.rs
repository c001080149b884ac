//! `ensemble-server start [--workers N] [--port P] [--host H] [--kubernetes]`
//! (SPEC_FULL.md §6). Grounded on `serve()`/`main()` in `ensemble/server.py`.
mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ensemble_endpoint::{resolve_namespace, ComputePoolOrchestrator, FakeOrchestrator};

use cli::{Cli, Command, StartArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Start(args) => start(args).await,
    }
}

async fn start(args: StartArgs) -> anyhow::Result<()> {
    if args.workers != 10 {
        tracing::debug!(workers = args.workers, "ignoring --workers under the Tokio executor");
    }

    let namespace = resolve_namespace(args.kubernetes);
    tracing::info!(kubernetes = args.kubernetes, namespace, "resolved namespace");

    // A real Kubernetes-backed orchestrator is a deployment detail left for
    // the embedding binary to supply (SPEC_FULL.md §1); this binary always
    // runs the in-memory fake, which is sufficient for local/dev use.
    let orchestrator: Arc<dyn ComputePoolOrchestrator> = Arc::new(FakeOrchestrator::new());

    let addr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal, stopping endpoint");
    };

    ensemble_endpoint::serve(addr, orchestrator, namespace, shutdown)
        .await
        .context("endpoint server failed")?;
    Ok(())
}
