//! JSON bodies exchanged with the cluster scheduler

use ers_core::{Node, Pod};
use ers_scheduler::FilterResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<Node>,
}

/// Filter request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtenderArgs {
    pub pod: Pod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<NodeList>,

    /// Sent instead of `nodes` by node-cache-capable extenders; not supported here
    #[serde(default, rename = "nodenames", skip_serializing_if = "Option::is_none")]
    pub node_names: Option<Vec<String>>,
}

/// Filter response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtenderFilterResult {
    pub nodes: Option<NodeList>,
    pub failed_nodes: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub error: String,
}

impl ExtenderFilterResult {
    /// A response carrying only an error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            nodes: None,
            failed_nodes: None,
            error: message.into(),
        }
    }
}

impl From<FilterResult> for ExtenderFilterResult {
    fn from(result: FilterResult) -> Self {
        Self {
            nodes: Some(NodeList {
                items: result.schedulable_nodes,
            }),
            failed_nodes: Some(result.unschedulable_nodes),
            error: result.error.unwrap_or_default(),
        }
    }
}

/// Bind request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtenderBindingArgs {
    #[serde(rename = "podName", default)]
    pub pod_name: String,
    #[serde(rename = "podNamespace", default)]
    pub pod_namespace: String,
    #[serde(rename = "podUID", default)]
    pub pod_uid: String,
    #[serde(default)]
    pub node: String,
}
