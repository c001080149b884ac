use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// A compute pool's addressable, resizable state -- the thing `grow`/`shrink`
/// actions ultimately mutate.
#[derive(Debug, Clone, Copy)]
pub struct PoolSize {
    /// Current instance count.
    pub size: i64,
    /// Lower bound a resize may not go below.
    pub min_size: i64,
    /// Upper bound a resize may not exceed.
    pub max_size: i64,
}

impl PoolSize {
    /// Clamp a proposed new size into `[min_size, max_size]`.
    pub fn clamp(&self, new_size: i64) -> i64 {
        new_size.clamp(self.min_size, self.max_size)
    }
}

/// Errors raised while fetching or patching a compute pool.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No pool is known under the given address.
    #[error(
        "unknown compute pool: group={group} version={version} member={member} \
         namespace={namespace} name={name}"
    )]
    NotFound {
        /// Requested group.
        group: String,
        /// Requested API version.
        version: String,
        /// Requested member (the plural resource kind).
        member: String,
        /// Requested namespace.
        namespace: String,
        /// Requested resource name.
        name: String,
    },
    /// The patch call itself failed.
    #[error("failed to patch compute pool: {0}")]
    PatchFailed(String),
}

/// Abstraction over "the thing that actually knows how to resize a compute
/// pool" -- a Kubernetes custom resource client in production, an in-memory
/// map in tests and non-Kubernetes runs. The real Flux MiniCluster operator
/// binding has no concrete Rust equivalent in this pack (its Python
/// counterpart, `minicluster.py`, is itself a stub); selecting a real
/// implementation is a deployment detail left to the `--kubernetes` CLI flag,
/// not part of the rule-engine core.
///
/// The full address a pool is fetched/patched by is `(group, version,
/// member, namespace, name)`, matching SPEC_FULL.md §4.7's C8 contract: a
/// Kubernetes custom resource is addressed by API group, version, and
/// plural resource kind (`member`) in addition to namespace/name.
#[async_trait]
pub trait ComputePoolOrchestrator: Send + Sync {
    /// Fetch the current size bounds for a pool.
    async fn get(
        &self,
        group: &str,
        version: &str,
        member: &str,
        namespace: &str,
        name: &str,
    ) -> Result<PoolSize, OrchestratorError>;

    /// Patch a pool's size. Implementations should treat this as
    /// best-effort: a transient failure surfaces as `PatchFailed`.
    #[allow(clippy::too_many_arguments)]
    async fn patch_size(
        &self,
        group: &str,
        version: &str,
        member: &str,
        namespace: &str,
        name: &str,
        new_size: i64,
    ) -> Result<(), OrchestratorError>;
}

/// An in-memory orchestrator for tests and non-Kubernetes runs, keyed by
/// `(group, version, member, namespace, name)`.
#[derive(Debug, Default)]
pub struct FakeOrchestrator {
    pools: Mutex<HashMap<(String, String, String, String, String), PoolSize>>,
}

impl FakeOrchestrator {
    /// Create an orchestrator with no registered pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool's starting size and bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        group: &str,
        version: &str,
        member: &str,
        namespace: &str,
        name: &str,
        pool: PoolSize,
    ) {
        self.pools.lock().unwrap().insert(
            (
                group.to_string(),
                version.to_string(),
                member.to_string(),
                namespace.to_string(),
                name.to_string(),
            ),
            pool,
        );
    }
}

#[async_trait]
impl ComputePoolOrchestrator for FakeOrchestrator {
    async fn get(
        &self,
        group: &str,
        version: &str,
        member: &str,
        namespace: &str,
        name: &str,
    ) -> Result<PoolSize, OrchestratorError> {
        self.pools
            .lock()
            .unwrap()
            .get(&(
                group.to_string(),
                version.to_string(),
                member.to_string(),
                namespace.to_string(),
                name.to_string(),
            ))
            .copied()
            .ok_or_else(|| OrchestratorError::NotFound {
                group: group.to_string(),
                version: version.to_string(),
                member: member.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn patch_size(
        &self,
        group: &str,
        version: &str,
        member: &str,
        namespace: &str,
        name: &str,
        new_size: i64,
    ) -> Result<(), OrchestratorError> {
        let mut pools = self.pools.lock().unwrap();
        let key = (
            group.to_string(),
            version.to_string(),
            member.to_string(),
            namespace.to_string(),
            name.to_string(),
        );
        let pool = pools.get_mut(&key).ok_or_else(|| OrchestratorError::NotFound {
            group: group.to_string(),
            version: version.to_string(),
            member: member.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;
        pool.size = new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_respects_bounds() {
        let pool = PoolSize {
            size: 3,
            min_size: 2,
            max_size: 4,
        };
        assert_eq!(pool.clamp(10), 4);
        assert_eq!(pool.clamp(-5), 2);
        assert_eq!(pool.clamp(3), 3);
    }

    #[tokio::test]
    async fn fake_orchestrator_patches_registered_pool() {
        let orch = FakeOrchestrator::new();
        orch.register(
            "g",
            "v1",
            "miniclusters",
            "default",
            "pool",
            PoolSize {
                size: 3,
                min_size: 2,
                max_size: 4,
            },
        );
        orch.patch_size("g", "v1", "miniclusters", "default", "pool", 4)
            .await
            .unwrap();
        let pool = orch.get("g", "v1", "miniclusters", "default", "pool").await.unwrap();
        assert_eq!(pool.size, 4);
    }

    #[tokio::test]
    async fn unknown_pool_is_not_found() {
        let orch = FakeOrchestrator::new();
        assert!(matches!(
            orch.get("missing", "v1", "miniclusters", "default", "pool").await,
            Err(OrchestratorError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn mismatched_version_is_not_found() {
        let orch = FakeOrchestrator::new();
        orch.register(
            "g",
            "v1",
            "miniclusters",
            "default",
            "pool",
            PoolSize {
                size: 3,
                min_size: 2,
                max_size: 4,
            },
        );
        assert!(matches!(
            orch.get("g", "v2", "miniclusters", "default", "pool").await,
            Err(OrchestratorError::NotFound { .. })
        ));
    }
}
