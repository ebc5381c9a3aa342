use crate::Result;
use ers_storage::ExtendedResourceStore;
use std::sync::Arc;
use tracing::{error, info};

/// Commits the scheduler's final node choice for a pod
pub struct BindingFinalizer {
    store: Arc<dyn ExtendedResourceStore>,
}

impl BindingFinalizer {
    pub fn new(store: Arc<dyn ExtendedResourceStore>) -> Self {
        Self { store }
    }

    /// Bind the pod to `node_name` without re-checking its reservations
    pub async fn bind(&self, namespace: &str, name: &str, uid: &str, node_name: &str) -> Result<()> {
        if let Err(e) = self.store.bind_pod(namespace, name, uid, node_name).await {
            error!("Failed to bind pod {}/{} to {}: {}", namespace, name, node_name, e);
            return Err(e.into());
        }

        info!("Bound pod {}/{} to node {}", namespace, name, node_name);
        Ok(())
    }
}
