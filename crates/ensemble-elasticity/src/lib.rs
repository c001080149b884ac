//! Typed gRPC client to the elasticity control plane (C7). Grounded on the
//! `RequestAction`/`RequestStatus` pair in `ensemble/server.py`'s
//! `EnsembleEndpoint`, compiled here as a `tonic`/`prost` service (the
//! gRPC shape this reference pack otherwise uses in `knhk-sidecar`).
#![deny(unreachable_pub)]
#![deny(missing_docs)]

use thiserror::Error;

pub mod proto {
    //! Generated gRPC bindings for the `ensemble.EnsembleOperator` service.
    #![allow(missing_docs)]
    tonic::include_proto!("ensemble");
}

pub use proto::response::ResultType;
pub use proto::{ActionRequest, Response, StatusRequest};
pub use proto::ensemble_operator_client::EnsembleOperatorClient;
pub use proto::ensemble_operator_server::{EnsembleOperator, EnsembleOperatorServer};

/// Errors a caller of the elasticity client may see.
#[derive(Debug, Error)]
pub enum ElasticityError {
    /// The gRPC transport failed to connect or was interrupted.
    #[error("elasticity transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    /// The remote endpoint replied with a gRPC status error.
    #[error("elasticity request failed: {0}")]
    Status(#[from] tonic::Status),
    /// The endpoint replied `ERROR` at the application level.
    #[error("elasticity endpoint rejected the request")]
    Rejected,
}

/// A resize or status request against the elasticity control plane.
#[derive(Debug, Clone)]
pub struct ElasticityClient {
    inner: EnsembleOperatorClient<tonic::transport::Channel>,
}

impl ElasticityClient {
    /// Connect to the elasticity endpoint at `addr` (e.g.
    /// `"http://127.0.0.1:50051"`).
    pub async fn connect(addr: impl Into<String>) -> Result<Self, ElasticityError> {
        let inner = EnsembleOperatorClient::connect(addr.into()).await?;
        Ok(ElasticityClient { inner })
    }

    /// Issue an action request (`grow`, `shrink`, or any custom action name
    /// the endpoint understands) with a JSON payload. Returns the decoded
    /// response payload on `SUCCESS`.
    pub async fn action_request(
        &mut self,
        member: &str,
        name: &str,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<Option<String>, ElasticityError> {
        let request = tonic::Request::new(ActionRequest {
            member: member.to_string(),
            name: name.to_string(),
            namespace: String::new(),
            action: action.to_string(),
            payload: payload.to_string(),
        });
        let response = self.inner.request_action(request).await?.into_inner();
        match response.status() {
            ResultType::Success => Ok(Some(response.payload)),
            ResultType::Error => {
                tracing::warn!(member, name, action, "elasticity endpoint returned ERROR");
                Err(ElasticityError::Rejected)
            }
        }
    }
}
