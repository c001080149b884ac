use clap::{Parser, Subcommand};

/// `ensemble-server`: the control-plane gRPC endpoint (C8). Mirrors the
/// `start --workers --port` shape of `get_parser()` in `ensemble/server.py`.
#[derive(Debug, Parser)]
#[command(name = "ensemble-server", version, about = "Run the ensemble control-plane endpoint")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gRPC server.
    Start(StartArgs),
}

/// Arguments to `ensemble-server start`.
#[derive(Debug, Parser)]
pub struct StartArgs {
    /// Carried over from the original's thread-pool sizing knob for
    /// operational parity; `tonic`'s Tokio executor serves concurrent
    /// requests without a fixed worker count, so this is accepted but
    /// unused.
    #[arg(long, default_value_t = 10)]
    pub workers: usize,

    /// Port to listen on.
    #[arg(long, default_value_t = 50051)]
    pub port: u16,

    /// Host/address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Resolve the operating namespace from the mounted service-account
    /// file and use a real orchestrator binding instead of the in-memory
    /// fake.
    #[arg(long, default_value_t = false)]
    pub kubernetes: bool,
}
