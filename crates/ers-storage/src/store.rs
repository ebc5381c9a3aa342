use crate::Result;
use async_trait::async_trait;
use ers_core::{Binding, ExtendedResource, ExtendedResourceClaim, ObjectMeta, ObjectReference};

/// Read/write access to claims, resources and pod bindings.
///
/// Lookups return `Ok(None)` for missing objects; errors are reserved for
/// I/O failures and rejected writes. Updates use the object's
/// `metadata.resourceVersion` as the write precondition when it is set and
/// return the stored object with its new version.
#[async_trait]
pub trait ExtendedResourceStore: Send + Sync {
    async fn get_claim(&self, namespace: &str, name: &str)
        -> Result<Option<ExtendedResourceClaim>>;

    async fn update_claim(&self, claim: &ExtendedResourceClaim) -> Result<ExtendedResourceClaim>;

    /// All resources whose `spec.rawResourceName` equals `raw_resource_name`
    async fn list_resources_by_kind(&self, raw_resource_name: &str)
        -> Result<Vec<ExtendedResource>>;

    async fn get_resource(&self, name: &str) -> Result<Option<ExtendedResource>>;

    async fn update_resource(&self, resource: &ExtendedResource) -> Result<ExtendedResource>;

    /// Bind pod `namespace/name` to `node_name`
    async fn bind_pod(&self, namespace: &str, name: &str, uid: &str, node_name: &str)
        -> Result<()>;
}

/// Build the Binding object that assigns a pod to a node
pub fn pod_binding(namespace: &str, name: &str, uid: &str, node_name: &str) -> Binding {
    Binding {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: (!uid.is_empty()).then(|| uid.to_string()),
            ..Default::default()
        },
        target: ObjectReference {
            api_version: Some("v1".to_string()),
            kind: Some("Node".to_string()),
            name: Some(node_name.to_string()),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_binding() {
        let binding = pod_binding("default", "trainer", "uid-1", "node-a");
        assert_eq!(binding.metadata.name.as_deref(), Some("trainer"));
        assert_eq!(binding.metadata.uid.as_deref(), Some("uid-1"));
        assert_eq!(binding.target.kind.as_deref(), Some("Node"));
        assert_eq!(binding.target.name.as_deref(), Some("node-a"));

        let binding = pod_binding("default", "trainer", "", "node-a");
        assert!(binding.metadata.uid.is_none());
    }
}
