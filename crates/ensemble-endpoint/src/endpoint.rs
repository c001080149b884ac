use std::sync::{Arc, Mutex};

use ensemble_elasticity::proto::{ActionRequest, Response, ResultType, StatusRequest};
use ensemble_elasticity::EnsembleOperator;
use serde_json::Value;
use tonic::{Request, Status};

use crate::orchestrator::{ComputePoolOrchestrator, OrchestratorError, PoolSize};
use crate::uptime::ServerUptime;

/// The gRPC service consumed by [`ensemble_elasticity::ElasticityClient`]
/// peers (C8). `request_status`'s member-lookup-and-echo shape is grounded
/// on `EnsembleEndpoint.RequestStatus` in `ensemble/server.py`, which has
/// real logic to port. `request_action`'s clamped `grow`/`shrink` handling
/// has no such precedent anywhere in the pack: `RequestStatus`'s sibling
/// `RequestAction` in that same file is an unimplemented stub (`print()`
/// placeholders, no status ever set), and `FluxMiniClusterQueue.grow`/
/// `.shrink` in `ensemble/members/flux/minicluster.py` are themselves
/// `print("GROW Vanessa implement me")`-style stubs. SPEC_FULL.md §4.7's
/// C8 contract (parse `payload`, require `version` and `group`, address by
/// `(group, version, member, namespace, name)`, clamp, patch) is therefore
/// the sole ground truth this method implements.
pub struct EnsembleEndpointService {
    orchestrator: Arc<dyn ComputePoolOrchestrator>,
    namespace: String,
    uptime: Mutex<ServerUptime>,
}

impl EnsembleEndpointService {
    /// Build a new endpoint bound to the given orchestrator and namespace.
    pub fn new(orchestrator: Arc<dyn ComputePoolOrchestrator>, namespace: String) -> Self {
        EnsembleEndpointService {
            orchestrator,
            namespace,
            uptime: Mutex::new(ServerUptime::new()),
        }
    }

    fn tick(&self) {
        self.uptime.lock().unwrap().tick();
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_resize(
        &self,
        group: &str,
        version: &str,
        member: &str,
        name: &str,
        delta: f64,
    ) -> Result<(), OrchestratorError> {
        if delta == 0.0 {
            return Err(OrchestratorError::PatchFailed(
                "zero-magnitude resize rejected".to_string(),
            ));
        }
        let pool: PoolSize = self
            .orchestrator
            .get(group, version, member, &self.namespace, name)
            .await?;
        let proposed = pool.size + delta as i64;
        let clamped = pool.clamp(proposed);
        if clamped != proposed {
            tracing::warn!(
                group,
                version,
                member,
                name,
                proposed,
                clamped,
                "resize clamped to pool bounds"
            );
        }
        self.orchestrator
            .patch_size(group, version, member, &self.namespace, name, clamped)
            .await
    }
}

#[tonic::async_trait]
impl EnsembleOperator for EnsembleEndpointService {
    async fn request_status(
        &self,
        request: Request<StatusRequest>,
    ) -> Result<tonic::Response<Response>, Status> {
        self.tick();
        let req = request.into_inner();
        match serde_json::from_str::<Value>(&req.payload) {
            Ok(payload) => Ok(tonic::Response::new(Response {
                status: ResultType::Success as i32,
                payload: payload.to_string(),
            })),
            Err(err) => {
                tracing::warn!(error = %err, "malformed status request payload");
                Ok(tonic::Response::new(Response {
                    status: ResultType::Error as i32,
                    payload: String::new(),
                }))
            }
        }
    }

    async fn request_action(
        &self,
        request: Request<ActionRequest>,
    ) -> Result<tonic::Response<Response>, Status> {
        self.tick();
        let req = request.into_inner();
        let payload: Value = match serde_json::from_str(&req.payload) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(error = %err, "malformed action request payload");
                return Ok(tonic::Response::new(Response {
                    status: ResultType::Error as i32,
                    payload: String::new(),
                }));
            }
        };
        let group = payload.get("group").and_then(Value::as_str);
        let version = payload.get("version").and_then(|v| {
            v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string()))
        });
        let (group, version) = match (group, version) {
            (Some(group), Some(version)) => (group, version),
            _ => {
                tracing::warn!("action request payload missing required 'group' or 'version' field");
                return Ok(tonic::Response::new(Response {
                    status: ResultType::Error as i32,
                    payload: String::new(),
                }));
            }
        };

        let result = match req.action.as_str() {
            "grow" => {
                let delta = payload.get("grow").and_then(Value::as_f64).unwrap_or(0.0);
                self.handle_resize(group, &version, &req.member, &req.name, delta).await
            }
            "shrink" => {
                let delta = payload.get("shrink").and_then(Value::as_f64).unwrap_or(0.0);
                self.handle_resize(group, &version, &req.member, &req.name, -delta).await
            }
            other => {
                tracing::warn!(action = other, "unknown action requested");
                Err(OrchestratorError::PatchFailed(format!("unknown action '{other}'")))
            }
        };

        match result {
            Ok(()) => Ok(tonic::Response::new(Response {
                status: ResultType::Success as i32,
                payload: payload.to_string(),
            })),
            Err(err) => {
                tracing::warn!(error = %err, "action request failed");
                Ok(tonic::Response::new(Response {
                    status: ResultType::Error as i32,
                    payload: String::new(),
                }))
            }
        }
    }
}
