use serde::{Deserialize, Serialize};
use std::fmt;

/// API group/version served for extended resource objects
pub const EXTENSIONS_API_VERSION: &str = "extensions/v1alpha1";

/// GroupVersionKind identifies an API object type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    /// API group ("" for the core group)
    pub group: String,
    /// API version (e.g., "v1", "v1alpha1")
    pub version: String,
    /// Object kind (e.g., "ExtendedResource")
    pub kind: String,
}

impl GroupVersionKind {
    /// Create a GVK from apiVersion and kind
    /// apiVersion format: "v1" or "group/version"
    pub fn from_api_version_kind(api_version: &str, kind: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((g, v)) => (g.to_string(), v.to_string()),
            None => (String::new(), api_version.to_string()),
        };

        Self {
            group,
            version,
            kind: kind.to_string(),
        }
    }

    /// Get the apiVersion string (group/version or just version)
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Get the API path segment
    pub fn api_path(&self) -> String {
        if self.group.is_empty() {
            format!("api/{}", self.version)
        } else {
            format!("apis/{}/{}", self.group, self.version)
        }
    }

    /// Get the resource name (lowercase, plural)
    pub fn resource_name(&self) -> String {
        let lower = self.kind.to_lowercase();
        if lower.ends_with('s') {
            format!("{}es", lower)
        } else if let Some(stem) = lower.strip_suffix('y') {
            format!("{}ies", stem)
        } else {
            format!("{}s", lower)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

/// ResourceKey identifies a single stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub gvk: GroupVersionKind,
    /// Namespace (empty for cluster-scoped objects)
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(gvk: GroupVersionKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gvk,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn cluster_scoped(gvk: GroupVersionKind, name: impl Into<String>) -> Self {
        Self::new(gvk, String::new(), name)
    }

    pub fn is_namespaced(&self) -> bool {
        !self.namespace.is_empty()
    }

    /// Storage key: {api_version}/{kind}/{namespace}/{name}
    /// For cluster-scoped: {api_version}/{kind}/{name}
    pub fn storage_key(&self) -> String {
        let api_version = self.gvk.api_version();
        if self.is_namespaced() {
            format!("{}/{}/{}/{}", api_version, self.gvk.kind, self.namespace, self.name)
        } else {
            format!("{}/{}/{}", api_version, self.gvk.kind, self.name)
        }
    }

    /// REST path of this object on a Kubernetes-compatible API server
    pub fn api_path(&self) -> String {
        format!("{}/{}", self.collection_path(), self.name)
    }

    /// REST path of the collection this object lives in
    pub fn collection_path(&self) -> String {
        let base = self.gvk.api_path();
        let resource = self.gvk.resource_name();

        if self.is_namespaced() {
            format!("/{}/namespaces/{}/{}", base, self.namespace, resource)
        } else {
            format!("/{}/{}", base, resource)
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_namespaced() {
            write!(f, "{}/{}/{}", self.gvk, self.namespace, self.name)
        } else {
            write!(f, "{}/{}", self.gvk, self.name)
        }
    }
}

/// Resource version - opaque to clients, a decimal counter in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVersion(pub String);

impl ResourceVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The first version assigned to a freshly created object
    pub fn initial() -> Self {
        Self("1".to_string())
    }

    /// The version following this one. Non-numeric versions restart at 1.
    pub fn next(&self) -> Self {
        match self.0.parse::<u64>() {
            Ok(n) => Self((n + 1).to_string()),
            Err(_) => Self::initial(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ResourceVersion {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceVersion {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
