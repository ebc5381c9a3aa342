use ers_core::{ExtendedResource, ExtendedResourceClaim, Node, Pod};
use std::collections::BTreeMap;

/// Reason recorded for nodes the planner never got to
pub const NOT_EVALUATED: &str = "not yet evaluated";

/// Everything the planner knows about one pod while evaluating nodes
#[derive(Debug, Clone)]
pub struct SchedulingContext {
    /// `namespace/name` of the pod being placed
    pub pod_key: String,
    /// The pod's claims, in declaration order
    pub claims: Vec<ExtendedResourceClaim>,
    /// Extended resources relevant to the claims, by name
    pub resources: BTreeMap<String, ExtendedResource>,
}

impl SchedulingContext {
    pub fn new(
        pod: &Pod,
        claims: Vec<ExtendedResourceClaim>,
        resources: BTreeMap<String, ExtendedResource>,
    ) -> Self {
        Self {
            pod_key: format!("{}/{}", pod.namespace(), pod.name()),
            claims,
            resources,
        }
    }

    /// Resources still to be found across all claims
    pub fn unresolved_count(&self) -> usize {
        self.claims.iter().map(|c| c.unresolved_count()).sum()
    }

    /// Whether `resource` is held by one of this pod's claims
    pub fn is_held_by_pod(&self, resource: &ExtendedResource) -> bool {
        self.claims
            .iter()
            .any(|c| resource.is_claimed_by(c.namespace(), c.name()))
    }

    /// Whether `resource` is already fixed to one of the claims
    pub fn is_fixed(&self, resource: &str) -> bool {
        self.claims
            .iter()
            .any(|c| c.resolved_names().iter().any(|n| n == resource))
    }
}

/// Outcome of a single predicate for a single node
#[derive(Debug, Clone)]
pub struct PredicateResult {
    pub node_name: String,
    pub passed: bool,
    pub reason: Option<String>,
}

impl PredicateResult {
    pub fn pass(node_name: String) -> Self {
        Self {
            node_name,
            passed: true,
            reason: None,
        }
    }

    pub fn fail(node_name: String, reason: String) -> Self {
        Self {
            node_name,
            passed: false,
            reason: Some(reason),
        }
    }
}

/// Result of a filter call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterResult {
    /// Accepted nodes, in input order
    pub schedulable_nodes: Vec<Node>,
    /// Rejected nodes and the first reason each was rejected for
    pub unschedulable_nodes: BTreeMap<String, String>,
    /// Call-level failure
    pub error: Option<String>,
}

impl FilterResult {
    /// Every node unschedulable with the default reason
    pub fn unevaluated(nodes: &[Node]) -> Self {
        Self {
            schedulable_nodes: Vec::new(),
            unschedulable_nodes: nodes
                .iter()
                .map(|n| (n.name().to_string(), NOT_EVALUATED.to_string()))
                .collect(),
            error: None,
        }
    }

    /// A call-level failure; no node is schedulable
    pub fn failed(nodes: &[Node], error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::unevaluated(nodes)
        }
    }

    pub fn accept(&mut self, node: Node) {
        self.unschedulable_nodes.remove(node.name());
        self.schedulable_nodes.push(node);
    }

    pub fn reject(&mut self, node: &Node, reason: impl Into<String>) {
        self.unschedulable_nodes
            .insert(node.name().to_string(), reason.into());
    }

    pub fn schedulable_names(&self) -> Vec<&str> {
        self.schedulable_nodes.iter().map(|n| n.name()).collect()
    }
}
