use ensemble_engine::StopSignal;
use std::sync::Arc;

/// Wire OS signals into the engine's [`StopSignal`]: SIGINT or SIGTERM
/// requests a graceful stop; a second signal of either kind exits the
/// process immediately. Adapted from `client/src/shutdown.rs`'s
/// `ShutdownController`, extended with SIGTERM since this binary runs as a
/// long-lived service rather than an interactive client.
pub fn install(stop: Arc<StopSignal>) {
    tokio::spawn(async move {
        wait_for_first_signal().await;
        tracing::info!("received shutdown signal, stopping gracefully (press again to force)");
        stop.request();
        wait_for_first_signal().await;
        tracing::warn!("received second shutdown signal, exiting immediately");
        std::process::exit(130);
    });
}

async fn wait_for_first_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
