//! ERS Core - API objects for the extended resource scheduler
//!
//! This crate provides:
//! - ExtendedResource / ExtendedResourceClaim objects and their lifecycle
//! - The Pod and Node fields the scheduler extender reads
//! - Error types with miette diagnostics
//! - Type-safe resource keys and identifiers
//! - Multi-document YAML loading

pub mod error;
pub mod resources;
pub mod types;

// Re-export commonly used types
pub use error::{ErsError, Result};
pub use resources::{
    is_valid_name, Container, ExtendedResource, ExtendedResourceClaim,
    ExtendedResourceClaimPhase, ExtendedResourceClaimSpec, ExtendedResourceClaimStatus,
    ExtendedResourcePhase, ExtendedResourceSpec, ExtendedResourceStatus, Node, NodeStatus, Pod,
    PodSpec, Resource, ResourceError, ResourceNodeAffinity,
};
pub use types::{GroupVersionKind, ResourceKey, ResourceVersion, EXTENSIONS_API_VERSION};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{
    Binding, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm, ObjectReference,
};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, LabelSelectorRequirement, ObjectMeta,
};

/// Deserialize every document of a (possibly multi-document) YAML stream
pub fn from_yaml_documents<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<Vec<T>> {
    use serde::Deserialize;

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(data) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| {
            ErsError::serialization_error(
                format!("Failed to parse YAML document: {}", e),
                Some(Box::new(e)),
            )
        })?;

        // Skip empty documents, e.g. a trailing "---"
        if value.is_null() {
            continue;
        }

        let resource = serde_yaml::from_value(value).map_err(|e| {
            ErsError::serialization_error(
                format!("Failed to deserialize from YAML: {}", e),
                Some(Box::new(e)),
            )
        })?;
        documents.push(resource);
    }
    Ok(documents)
}
