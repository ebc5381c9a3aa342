use ers_core::ResourceKey;

/// Key encoder for storage keys
pub struct KeyEncoder;

impl KeyEncoder {
    /// Encode a resource key: {api_version}/{kind}/{namespace}/{name}
    /// For cluster-scoped: {api_version}/{kind}/{name}
    pub fn encode_resource_key(key: &ResourceKey) -> String {
        key.storage_key()
    }

    /// Encode a prefix for scanning objects of a kind, optionally within a namespace
    pub fn encode_prefix(api_version: &str, kind: &str, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) => format!("{}/{}/{}/", api_version, kind, ns),
            None => format!("{}/{}/", api_version, kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ers_core::{GroupVersionKind, EXTENSIONS_API_VERSION};

    #[test]
    fn test_encode_resource_key() {
        let gvk = GroupVersionKind::from_api_version_kind(EXTENSIONS_API_VERSION, "ExtendedResourceClaim");
        let key = ResourceKey::new(gvk, "default", "gpu-claim");
        assert_eq!(
            KeyEncoder::encode_resource_key(&key),
            "extensions/v1alpha1/ExtendedResourceClaim/default/gpu-claim"
        );
    }

    #[test]
    fn test_encode_prefix_does_not_overlap_claims() {
        let resources = KeyEncoder::encode_prefix(EXTENSIONS_API_VERSION, "ExtendedResource", None);
        assert_eq!(resources, "extensions/v1alpha1/ExtendedResource/");
        assert!(!"extensions/v1alpha1/ExtendedResourceClaim/default/gpu-claim".starts_with(&resources));

        assert_eq!(
            KeyEncoder::encode_prefix("v1", "Binding", Some("default")),
            "v1/Binding/default/"
        );
    }
}
