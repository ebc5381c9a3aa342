pub mod extended;
pub mod workload;

pub use extended::{
    ExtendedResource, ExtendedResourceClaim, ExtendedResourceClaimPhase,
    ExtendedResourceClaimSpec, ExtendedResourceClaimStatus, ExtendedResourcePhase,
    ExtendedResourceSpec, ExtendedResourceStatus, ResourceNodeAffinity,
};
pub use workload::{Container, Node, NodeStatus, Pod, PodSpec};

use crate::{GroupVersionKind, ResourceKey, ResourceVersion};
use k8s_openapi::api::core::v1::Binding;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Base validation for all resources
pub fn validate_base(metadata: &ObjectMeta) -> Result<(), ResourceError> {
    match &metadata.name {
        None => Err(ResourceError::MissingField("metadata.name".to_string())),
        Some(name) if !is_valid_name(name) => Err(ResourceError::InvalidName(name.clone())),
        Some(_) => Ok(()),
    }
}

/// Trait for API objects persisted by the resource store
pub trait Resource: Serialize + for<'de> Deserialize<'de> + Send + Sync {
    /// Get the API version of this resource
    fn api_version(&self) -> String;

    /// Get the kind of this resource
    fn kind(&self) -> String;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version_kind(&self.api_version(), &self.kind())
    }

    /// Get the ResourceKey. Cluster-scoped kinds ignore metadata.namespace.
    fn resource_key(&self) -> Result<ResourceKey, ResourceError> {
        let metadata = self.metadata();
        let name = metadata
            .name
            .as_ref()
            .ok_or_else(|| ResourceError::MissingField("metadata.name".to_string()))?;

        if self.is_namespaced() {
            let namespace = metadata
                .namespace
                .as_ref()
                .ok_or_else(|| ResourceError::MissingField("metadata.namespace".to_string()))?;
            Ok(ResourceKey::new(self.gvk(), namespace, name))
        } else {
            Ok(ResourceKey::cluster_scoped(self.gvk(), name))
        }
    }

    fn resource_version(&self) -> Option<ResourceVersion> {
        self.metadata()
            .resource_version
            .as_ref()
            .map(ResourceVersion::new)
    }

    fn set_resource_version(&mut self, version: ResourceVersion) {
        self.metadata_mut().resource_version = Some(version.0);
    }

    fn uid(&self) -> Option<String> {
        self.metadata().uid.clone()
    }

    fn set_uid(&mut self, uid: String) {
        self.metadata_mut().uid = Some(uid);
    }

    /// Whether this kind lives inside a namespace
    fn is_namespaced(&self) -> bool;

    fn validate(&self) -> Result<(), ResourceError> {
        validate_base(self.metadata())
    }
}

/// Resource-related errors
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Validate an object name (DNS-1123 subdomain)
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return false;
    }

    bytes
        .iter()
        .all(|&b| edge_ok(b) || b == b'-' || b == b'.')
}

impl Resource for ExtendedResource {
    fn api_version(&self) -> String {
        crate::EXTENSIONS_API_VERSION.to_string()
    }

    fn kind(&self) -> String {
        "ExtendedResource".to_string()
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn is_namespaced(&self) -> bool {
        false
    }

    fn validate(&self) -> Result<(), ResourceError> {
        validate_base(&self.metadata)?;

        if self.spec.raw_resource_name.is_empty() {
            return Err(ResourceError::MissingField("spec.rawResourceName".to_string()));
        }

        // claimedBy is set iff the resource is not Available
        let claimed = self.claimed_by().is_some();
        let available = self.phase() == ExtendedResourcePhase::Available;
        if claimed == available {
            return Err(ResourceError::ValidationFailed(format!(
                "extendedResourceClaimName must be set exactly when phase is not Available (phase {})",
                self.phase()
            )));
        }
        if self.claim_namespace().is_some() && !claimed {
            return Err(ResourceError::ValidationFailed(
                "extendedResourceClaimNamespace requires extendedResourceClaimName".to_string(),
            ));
        }

        Ok(())
    }
}

impl Resource for ExtendedResourceClaim {
    fn api_version(&self) -> String {
        crate::EXTENSIONS_API_VERSION.to_string()
    }

    fn kind(&self) -> String {
        "ExtendedResourceClaim".to_string()
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn is_namespaced(&self) -> bool {
        true
    }

    fn validate(&self) -> Result<(), ResourceError> {
        validate_base(&self.metadata)?;

        if self.metadata.namespace.is_none() {
            return Err(ResourceError::MissingField("metadata.namespace".to_string()));
        }

        if self.spec.extended_resource_num < 0 {
            return Err(ResourceError::ValidationFailed(format!(
                "extendResourceNum must not be negative, got {}",
                self.spec.extended_resource_num
            )));
        }

        Ok(())
    }
}

impl Resource for Binding {
    fn api_version(&self) -> String {
        "v1".to_string()
    }

    fn kind(&self) -> String {
        "Binding".to_string()
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn is_namespaced(&self) -> bool {
        true
    }
}
