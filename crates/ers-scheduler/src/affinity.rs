use crate::selector::{Selector, NODE_NAME_FIELD};
use ers_core::{ExtendedResource, Node, NodeSelector};
use std::collections::BTreeMap;

/// Whether `node` satisfies a required node affinity (OR of terms, AND within a term)
pub fn node_satisfies_affinity(node: &Node, affinity: &NodeSelector) -> bool {
    let fields = BTreeMap::from([(NODE_NAME_FIELD.to_string(), node.name().to_string())]);
    Selector::from_node_selector(affinity).matches_with_fields(node.labels(), &fields)
}

/// Whether `resource` may be used on `node`; resources without affinity fit anywhere
pub fn resource_usable_on(node: &Node, resource: &ExtendedResource) -> bool {
    resource
        .required_node_affinity()
        .is_none_or(|affinity| node_satisfies_affinity(node, affinity))
}
