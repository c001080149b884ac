//! The control-plane gRPC endpoint (C8): validates resize requests and
//! applies them to a compute-pool orchestrator. Grounded on
//! `EnsembleEndpoint`/`serve` in `ensemble/server.py`; the `tonic::Server`
//! bootstrap follows the shape of `knhk-sidecar/src/server.rs`'s
//! `SidecarServer::start`.
#![deny(unreachable_pub)]
#![deny(missing_docs)]

mod endpoint;
mod namespace;
mod orchestrator;
mod uptime;

pub use endpoint::EnsembleEndpointService;
pub use namespace::resolve_namespace;
pub use orchestrator::{ComputePoolOrchestrator, FakeOrchestrator, OrchestratorError, PoolSize};
pub use uptime::ServerUptime;

use std::net::SocketAddr;
use std::sync::Arc;

use ensemble_elasticity::EnsembleOperatorServer;

/// Serve the endpoint on `addr` until the `shutdown` future resolves.
///
/// Mirrors `serve(port, workers)` in `ensemble/server.py`, minus the
/// thread-pool sizing knob -- `tonic`'s Tokio executor handles concurrent
/// requests without a fixed worker count.
pub async fn serve(
    addr: SocketAddr,
    orchestrator: Arc<dyn ComputePoolOrchestrator>,
    namespace: String,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), tonic::transport::Error> {
    let service = EnsembleEndpointService::new(orchestrator, namespace);
    tracing::info!(%addr, "starting ensemble endpoint");
    tonic::transport::Server::builder()
        .add_service(EnsembleOperatorServer::new(service))
        .serve_with_shutdown(addr, shutdown)
        .await
}
