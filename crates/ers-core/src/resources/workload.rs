//! The subset of Pod and Node the extender reads.
//!
//! Fields not modeled here are kept in `extra` so objects round-trip
//! unchanged through a filter call.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

static NO_LABELS: BTreeMap<String, String> = BTreeMap::new();

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default)]
    pub name: String,

    /// Names of the ExtendedResourceClaims this container consumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extended_resource_claims: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodSpec>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pod {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Namespace, defaulting to "default" like the API server does
    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or("default")
    }

    /// Distinct claim names across all containers, in declaration order
    pub fn claim_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let containers = self.spec.iter().flat_map(|spec| spec.containers.iter());

        for name in containers.flat_map(|c| c.extended_resource_claims.iter()) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }

        names
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// Extended resource names this node can currently hand out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extended_resource_allocatable: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        self.metadata.labels.as_ref().unwrap_or(&NO_LABELS)
    }

    pub fn allocatable_resources(&self) -> &[String] {
        self.status
            .as_ref()
            .map(|s| s.extended_resource_allocatable.as_slice())
            .unwrap_or_default()
    }
}
