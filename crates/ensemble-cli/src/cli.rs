use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// `ensemble`: the rule-engine front end. Mirrors the flag/env layout of
/// `client/src/cli.rs`, swapping the farming-specific options for the
/// executor/config pair the original `ensemble run` command takes.
#[derive(Debug, Parser)]
#[command(name = "ensemble", version, about = "Run an ensemble rule engine")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a configuration and run the controller until it terminates.
    Run(RunArgs),
}

/// Arguments to `ensemble run`.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Which workload-manager binding to validate the configuration
    /// against and submit jobs through.
    #[arg(long, value_enum, default_value_t = Executor::Flux)]
    pub executor: Executor,

    /// Path to the YAML configuration document.
    pub config: PathBuf,

    /// Read job-event records as newline-delimited JSON from stdin instead
    /// of exiting immediately after `start` rules fire. Ambient test/demo
    /// hook -- the real workload-manager event journal transport is out of
    /// scope (SPEC_FULL.md §1).
    #[arg(long, env = "ENSEMBLE_READ_STDIN", default_value_t = false)]
    pub read_stdin: bool,

    /// Address of the elasticity endpoint (C8) that `grow`/`shrink` actions
    /// dispatch to, e.g. `http://127.0.0.1:50051`. Without this, `grow`/
    /// `shrink` rules still fire and advance their counters but their
    /// requests are logged and dropped (SPEC_FULL.md §4.7/§7).
    #[arg(long, env = "ENSEMBLE_ELASTICITY_ADDR")]
    pub elasticity_addr: Option<String>,
}

/// Supported workload-manager executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Executor {
    /// Flux, the reference executor (SPEC_FULL.md's `FluxQueue` triggers).
    Flux,
}
