use crate::types::{PredicateResult, SchedulingContext};
use ers_core::Node;
use tracing::debug;

/// Node precheck run before any resource is picked
pub trait FilterPredicate: Send + Sync {
    /// Filter a node for the pod in `context`
    fn filter(&self, context: &SchedulingContext, node: &Node) -> PredicateResult;

    /// Name of the filter
    fn name(&self) -> &str;
}

/// The node must advertise at least as many resources as the pod still needs
pub struct AdvertisedCapacity;

impl FilterPredicate for AdvertisedCapacity {
    fn filter(&self, context: &SchedulingContext, node: &Node) -> PredicateResult {
        let node_name = node.name().to_string();
        let advertised = node.allocatable_resources().len();
        let needed = context.unresolved_count();

        debug!(
            "Node {} advertises {} extended resources, pod {} needs {}",
            node_name, advertised, context.pod_key, needed
        );

        if advertised < needed {
            return PredicateResult::fail(
                node_name,
                format!(
                    "Insufficient extended resources: node advertises {}, pod needs {}",
                    advertised, needed
                ),
            );
        }

        PredicateResult::pass(node_name)
    }

    fn name(&self) -> &str {
        "AdvertisedCapacity"
    }
}

/// Resources already fixed in a claim must be allocatable on the node and still exist
pub struct CommittedResourcesPresent;

impl FilterPredicate for CommittedResourcesPresent {
    fn filter(&self, context: &SchedulingContext, node: &Node) -> PredicateResult {
        let node_name = node.name().to_string();
        let allocatable = node.allocatable_resources();

        for claim in &context.claims {
            for resource in claim.resolved_names() {
                if !allocatable.contains(resource) {
                    return PredicateResult::fail(
                        node_name,
                        format!(
                            "Extended resource {} reserved for claim {} is not allocatable on this node",
                            resource,
                            claim.name()
                        ),
                    );
                }
                let Some(record) = context.resources.get(resource) else {
                    return PredicateResult::fail(
                        node_name,
                        format!(
                            "Extended resource {} reserved for claim {} no longer exists",
                            resource,
                            claim.name()
                        ),
                    );
                };
                if record.is_claimed_by(claim.namespace(), claim.name()) {
                    continue;
                }
                if let Some(owner) = record.owner() {
                    return PredicateResult::fail(
                        node_name,
                        format!(
                            "Extended resource {} listed by claim {} is claimed by {}",
                            resource,
                            claim.name(),
                            owner
                        ),
                    );
                }
            }
        }

        PredicateResult::pass(node_name)
    }

    fn name(&self) -> &str {
        "CommittedResourcesPresent"
    }
}

/// Get default filter predicates, in evaluation order
pub fn default_filters() -> Vec<Box<dyn FilterPredicate>> {
    vec![Box::new(AdvertisedCapacity), Box::new(CommittedResourcesPresent)]
}
