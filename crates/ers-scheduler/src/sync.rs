use crate::Result;
use ers_core::{ExtendedResource, ExtendedResourceClaim};
use ers_storage::ExtendedResourceStore;
use std::sync::Arc;
use tracing::{error, info};

/// Writes planned claim and resource records back to the store
pub struct StateSynchronizer {
    store: Arc<dyn ExtendedResourceStore>,
}

impl StateSynchronizer {
    pub fn new(store: Arc<dyn ExtendedResourceStore>) -> Self {
        Self { store }
    }

    /// Persist `resources` and then `claims`.
    ///
    /// Each record is written on its own. A failure stops the batch but
    /// leaves earlier writes in place; the next plan for the pod picks them up.
    pub async fn commit(
        &self,
        claims: &[ExtendedResourceClaim],
        resources: &[ExtendedResource],
    ) -> Result<()> {
        for resource in resources {
            if let Err(e) = self.store.update_resource(resource).await {
                error!("Failed to update extended resource {}: {}", resource.name(), e);
                return Err(e.into());
            }
            info!(
                "Extended resource {} is {} for claim {}",
                resource.name(),
                resource.phase(),
                resource.owner().unwrap_or_default()
            );
        }

        for claim in claims {
            if let Err(e) = self.store.update_claim(claim).await {
                error!(
                    "Failed to update claim {}/{}: {}",
                    claim.namespace(),
                    claim.name(),
                    e
                );
                return Err(e.into());
            }
            info!(
                "Claim {}/{} is {} with {:?}",
                claim.namespace(),
                claim.name(),
                claim.phase(),
                claim.resolved_names()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ers_core::{ExtendedResourceClaimPhase, ExtendedResourcePhase};
    use ers_storage::{KvResourceStore, RedbBackend};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_commit_writes_records() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(RedbBackend::new(dir.path().join("test.redb")).unwrap());
        let store = Arc::new(KvResourceStore::new(backend));

        let mut gpu = store.create(ExtendedResource::new("gpu-0", "nvidia.com/gpu")).unwrap();
        let mut claim = store
            .create(ExtendedResourceClaim::new("default", "gpu-claim", "nvidia.com/gpu", 1))
            .unwrap();

        gpu.reserve("default", "gpu-claim").unwrap();
        claim.assign("gpu-0").unwrap();
        claim.mark_pending().unwrap();

        let sync = StateSynchronizer::new(store.clone());
        sync.commit(&[claim], &[gpu]).await.unwrap();

        let gpu = store.get_resource("gpu-0").await.unwrap().unwrap();
        assert_eq!(gpu.phase(), ExtendedResourcePhase::Pending);
        let claim = store.get_claim("default", "gpu-claim").await.unwrap().unwrap();
        assert_eq!(claim.phase(), ExtendedResourceClaimPhase::Pending);
        assert_eq!(claim.resolved_names(), &["gpu-0".to_string()]);
    }

    #[tokio::test]
    async fn test_commit_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(RedbBackend::new(dir.path().join("test.redb")).unwrap());
        let store = Arc::new(KvResourceStore::new(backend));

        let mut gpu0 = store.create(ExtendedResource::new("gpu-0", "nvidia.com/gpu")).unwrap();
        let stale = store.create(ExtendedResource::new("gpu-1", "nvidia.com/gpu")).unwrap();
        let mut claim = store
            .create(ExtendedResourceClaim::new("default", "gpu-claim", "nvidia.com/gpu", 2))
            .unwrap();

        // Someone else takes gpu-1 first
        let mut other = stale.clone();
        other.reserve("default", "other-claim").unwrap();
        store.update_resource(&other).await.unwrap();

        let mut gpu1 = stale;
        gpu0.reserve("default", "gpu-claim").unwrap();
        gpu1.reserve("default", "gpu-claim").unwrap();
        claim.assign("gpu-0").unwrap();
        claim.assign("gpu-1").unwrap();
        claim.mark_pending().unwrap();

        let sync = StateSynchronizer::new(store.clone());
        let err = sync.commit(&[claim], &[gpu0, gpu1]).await.unwrap_err();
        assert!(err.is_conflict());

        // gpu-0 stays written, the claim was never touched
        let gpu0 = store.get_resource("gpu-0").await.unwrap().unwrap();
        assert_eq!(gpu0.claimed_by(), Some("gpu-claim"));
        let claim = store.get_claim("default", "gpu-claim").await.unwrap().unwrap();
        assert!(claim.resolved_names().is_empty());
    }
}
