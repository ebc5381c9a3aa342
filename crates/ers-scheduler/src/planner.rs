use crate::affinity::resource_usable_on;
use crate::filter::{default_filters, FilterPredicate};
use crate::selector::{contains_all, expressions_match};
use crate::types::{FilterResult, SchedulingContext};
use crate::{Result, SchedulerError};
use ers_core::{ExtendedResource, ExtendedResourceClaim, Node, Pod};
use ers_storage::ExtendedResourceStore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of planning one filter call: the result to return and the
/// records that must be written for it to hold.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub result: FilterResult,
    /// Claims whose resolved names or phase changed
    pub claims: Vec<ExtendedResourceClaim>,
    /// Resources newly reserved for one of the claims
    pub resources: Vec<ExtendedResource>,
}

impl Plan {
    pub fn has_writes(&self) -> bool {
        !self.claims.is_empty() || !self.resources.is_empty()
    }
}

enum Evaluation {
    /// The pod's claims, completed against this node
    Accepted(Vec<ExtendedResourceClaim>),
    Rejected(String),
}

/// Matches a pod's claims against the resources each candidate node advertises
pub struct AllocationPlanner {
    store: Arc<dyn ExtendedResourceStore>,
    filters: Vec<Box<dyn FilterPredicate>>,
}

impl AllocationPlanner {
    pub fn new(store: Arc<dyn ExtendedResourceStore>) -> Self {
        Self {
            store,
            filters: default_filters(),
        }
    }

    /// Partition `nodes` into schedulable and unschedulable for `pod`.
    ///
    /// The first accepted node, in input order, carries the reservation;
    /// later nodes stay schedulable only if they would resolve the claims to
    /// exactly the same resources.
    pub async fn plan(&self, pod: &Pod, nodes: &[Node]) -> Result<Plan> {
        let claim_names = pod.claim_names();
        if claim_names.is_empty() {
            return Err(SchedulerError::no_claims(pod.name()));
        }

        let context = self.load_context(pod, &claim_names).await?;
        let mut result = FilterResult::unevaluated(nodes);
        let mut committed: Option<(String, Vec<ExtendedResourceClaim>)> = None;

        for node in nodes {
            let claims = match self.evaluate_node(&context, node)? {
                Evaluation::Accepted(claims) => claims,
                Evaluation::Rejected(reason) => {
                    debug!("Node {} rejected for pod {}: {}", node.name(), context.pod_key, reason);
                    result.reject(node, reason);
                    continue;
                }
            };

            if let Some((reserved_on, chosen)) = &committed {
                if same_resolution(chosen, &claims) {
                    result.accept(node.clone());
                } else {
                    result.reject(
                        node,
                        format!("Extended resources for this pod are reserved on node {}", reserved_on),
                    );
                }
                continue;
            }

            result.accept(node.clone());
            committed = Some((node.name().to_string(), claims));
        }

        let Some((node_name, claims)) = committed else {
            info!("No node can satisfy the claims of pod {}", context.pod_key);
            return Ok(Plan {
                result,
                ..Default::default()
            });
        };

        let (claims, resources) = reservation(&context, claims)?;
        info!(
            "Pod {} fits on {} node(s), reserving on {}",
            context.pod_key,
            result.schedulable_nodes.len(),
            node_name
        );

        Ok(Plan {
            result,
            claims,
            resources,
        })
    }

    /// Fetch the pod's claims and every resource they could use
    async fn load_context(&self, pod: &Pod, claim_names: &[String]) -> Result<SchedulingContext> {
        let namespace = pod.namespace();

        let mut claims = Vec::with_capacity(claim_names.len());
        for name in claim_names {
            let claim = self
                .store
                .get_claim(namespace, name)
                .await?
                .ok_or_else(|| SchedulerError::claim_not_found(namespace, name))?;

            if claim.required_count() == 0 && claim.resolved_names().is_empty() {
                return Err(SchedulerError::empty_claim(namespace, name));
            }
            claims.push(claim);
        }

        let mut resources = BTreeMap::new();
        let kinds: BTreeSet<&str> = claims.iter().map(|c| c.raw_resource_name()).collect();
        for kind in kinds {
            for resource in self.store.list_resources_by_kind(kind).await? {
                resources.insert(resource.name().to_string(), resource);
            }
        }

        // Fixed names may point at resources of another kind
        for claim in &claims {
            for name in claim.resolved_names() {
                if resources.contains_key(name) {
                    continue;
                }
                match self.store.get_resource(name).await? {
                    Some(resource) => {
                        resources.insert(name.clone(), resource);
                    }
                    None => warn!(
                        "Extended resource {} resolved for claim {}/{} does not exist",
                        name,
                        namespace,
                        claim.name()
                    ),
                }
            }
        }

        Ok(SchedulingContext::new(pod, claims, resources))
    }

    fn evaluate_node(&self, context: &SchedulingContext, node: &Node) -> Result<Evaluation> {
        for filter in &self.filters {
            let result = filter.filter(context, node);
            if !result.passed {
                debug!("Node {} filtered out by {}", node.name(), filter.name());
                return Ok(Evaluation::Rejected(result.reason.unwrap_or_default()));
            }
        }

        let mut pool = candidate_pool(context, node);
        let mut claims = context.claims.clone();

        for claim in claims.iter_mut() {
            while !claim.is_satisfied() {
                let Some(position) = pick(&pool, claim, node) else {
                    break;
                };
                let resource = pool.remove(position);
                claim.assign(resource.name())?;
            }

            if !claim.is_satisfied() {
                return Ok(Evaluation::Rejected(format!(
                    "Claim {} needs {} more {} resource(s) than this node can provide",
                    claim.name(),
                    claim.unresolved_count(),
                    claim.raw_resource_name()
                )));
            }
        }

        Ok(Evaluation::Accepted(claims))
    }
}

/// Resources on `node` that one of the pod's claims may still take, in advertised order
fn candidate_pool<'a>(context: &'a SchedulingContext, node: &Node) -> Vec<&'a ExtendedResource> {
    let mut seen = BTreeSet::new();
    node.allocatable_resources()
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .filter(|name| !context.is_fixed(name))
        .filter_map(|name| context.resources.get(name.as_str()))
        .filter(|resource| resource.is_available() || context.is_held_by_pod(resource))
        .collect()
}

/// Position of the next resource for `claim`. Resources left reserved for the
/// claim by an earlier, partly written pass are taken first.
fn pick(pool: &[&ExtendedResource], claim: &ExtendedResourceClaim, node: &Node) -> Option<usize> {
    pool.iter()
        .position(|r| {
            r.is_claimed_by(claim.namespace(), claim.name()) && resource_fits_claim(r, claim, node)
        })
        .or_else(|| pool.iter().position(|r| resource_fits_claim(r, claim, node)))
}

/// Whether `resource` can serve `claim` on `node`
pub fn resource_fits_claim(
    resource: &ExtendedResource,
    claim: &ExtendedResourceClaim,
    node: &Node,
) -> bool {
    if resource.raw_resource_name() != claim.raw_resource_name() {
        return false;
    }
    let held_elsewhere =
        resource.claimed_by().is_some() && !resource.is_claimed_by(claim.namespace(), claim.name());
    if held_elsewhere {
        return false;
    }

    let labels_match = claim
        .required_properties()
        .is_none_or(|required| contains_all(required, resource.properties()));
    let expressions_match = claim
        .property_expressions()
        .is_none_or(|expressions| expressions_match(expressions, resource.properties()));

    labels_match && expressions_match && resource_usable_on(node, resource)
}

fn same_resolution(a: &[ExtendedResourceClaim], b: &[ExtendedResourceClaim]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.resolved_names() == y.resolved_names())
}

/// Records to write so that `claims` are held Pending
fn reservation(
    context: &SchedulingContext,
    claims: Vec<ExtendedResourceClaim>,
) -> Result<(Vec<ExtendedResourceClaim>, Vec<ExtendedResource>)> {
    let mut resources = Vec::new();
    for claim in &claims {
        for name in claim.resolved_names() {
            let original = context.resources.get(name).ok_or_else(|| {
                SchedulerError::internal_error(format!("resource {} missing from planning context", name))
            })?;

            let mut resource = original.clone();
            resource.reserve(claim.namespace(), claim.name())?;
            if resource != *original {
                resources.push(resource);
            }
        }
    }

    let mut changed = Vec::new();
    for (original, mut claim) in context.claims.iter().zip(claims) {
        claim.mark_pending()?;
        if claim != *original {
            changed.push(claim);
        }
    }

    Ok((changed, resources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ers_core::{
        Container, ExtendedResourceClaimPhase, ExtendedResourcePhase, LabelSelector,
        LabelSelectorRequirement, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
        NodeStatus, PodSpec, ResourceNodeAffinity,
    };
    use ers_storage::{KvResourceStore, RedbBackend};
    use tempfile::{tempdir, TempDir};

    const GPU: &str = "nvidia.com/gpu";

    fn setup_store() -> (TempDir, Arc<KvResourceStore>) {
        let dir = tempdir().unwrap();
        let backend = Arc::new(RedbBackend::new(dir.path().join("test.redb")).unwrap());
        (dir, Arc::new(KvResourceStore::new(backend)))
    }

    fn create_test_pod(claims: &[&str]) -> Pod {
        create_namespaced_pod("default", claims)
    }

    fn create_namespaced_pod(namespace: &str, claims: &[&str]) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some("trainer".to_string());
        pod.metadata.namespace = Some(namespace.to_string());
        pod.spec = Some(PodSpec {
            containers: vec![Container {
                name: "main".to_string(),
                extended_resource_claims: claims.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }],
            ..Default::default()
        });
        pod
    }

    fn create_test_node(name: &str, allocatable: &[&str]) -> Node {
        let mut node = Node::default();
        node.metadata.name = Some(name.to_string());
        node.metadata.labels = Some(BTreeMap::from([("zone".to_string(), "us-west1-b".to_string())]));
        node.status = Some(NodeStatus {
            extended_resource_allocatable: allocatable.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        node
    }

    fn gpu(name: &str, zone: &str) -> ExtendedResource {
        let mut er = ExtendedResource::new(name, GPU);
        er.spec.properties.insert("zone".to_string(), zone.to_string());
        er
    }

    fn claim(name: &str, count: i64, zone: Option<&str>) -> ExtendedResourceClaim {
        let mut erc = ExtendedResourceClaim::new("default", name, GPU, count);
        if let Some(zone) = zone {
            erc.spec.metadata_requirements = Some(LabelSelector {
                match_labels: Some(BTreeMap::from([("zone".to_string(), zone.to_string())])),
                match_expressions: None,
            });
        }
        erc
    }

    #[tokio::test]
    async fn test_single_gpu_claim() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-west1-b")).unwrap();
        store.create(gpu("gpu-1", "us-east1-a")).unwrap();
        store.create(claim("gpu-claim", 1, Some("us-west1-b"))).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-1", "gpu-0"])];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-a"]);
        assert!(plan.result.unschedulable_nodes.is_empty());
        assert!(plan.result.error.is_none());

        assert_eq!(plan.claims.len(), 1);
        assert_eq!(plan.claims[0].resolved_names(), &["gpu-0".to_string()]);
        assert_eq!(plan.claims[0].phase(), ExtendedResourceClaimPhase::Pending);

        assert_eq!(plan.resources.len(), 1);
        assert_eq!(plan.resources[0].name(), "gpu-0");
        assert_eq!(plan.resources[0].phase(), ExtendedResourcePhase::Pending);
        assert_eq!(plan.resources[0].claimed_by(), Some("gpu-claim"));
    }

    #[tokio::test]
    async fn test_picks_matching_resources_in_pool_order() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-east1-a")).unwrap();
        store.create(gpu("gpu-1", "us-west1-b")).unwrap();
        store.create(gpu("gpu-2", "us-east1-a")).unwrap();
        store.create(gpu("gpu-3", "us-west1-b")).unwrap();
        store.create(ExtendedResource::new("fpga-0", "xilinx.com/fpga")).unwrap();
        store.create(claim("gpu-claim", 2, Some("us-west1-b"))).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node(
            "node-a",
            &["fpga-0", "gpu-3", "gpu-0", "gpu-2", "gpu-1"],
        )];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-a"]);
        assert_eq!(
            plan.claims[0].resolved_names(),
            &["gpu-3".to_string(), "gpu-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_insufficient_matches_rejects_node() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-west1-b")).unwrap();
        store.create(gpu("gpu-1", "us-west1-b")).unwrap();
        store.create(gpu("gpu-2", "us-east1-a")).unwrap();
        store.create(claim("gpu-claim", 3, Some("us-west1-b"))).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0", "gpu-1", "gpu-2"])];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert!(plan.result.schedulable_nodes.is_empty());
        assert!(plan.result.unschedulable_nodes["node-a"].contains("gpu-claim"));
        assert!(!plan.has_writes());

        let stored = store.get_claim("default", "gpu-claim").await.unwrap().unwrap();
        assert!(stored.resolved_names().is_empty());
        assert_eq!(stored.phase(), ExtendedResourceClaimPhase::Unbound);
    }

    #[tokio::test]
    async fn test_capacity_check_comes_first() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-west1-b")).unwrap();
        store.create(claim("gpu-claim", 2, None)).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0"])];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert!(plan.result.unschedulable_nodes["node-a"].starts_with("Insufficient extended resources"));
    }

    #[tokio::test]
    async fn test_claim_expressions_and_affinity() {
        let (_dir, store) = setup_store();

        let mut pinned = gpu("gpu-0", "us-west1-b");
        pinned.spec.node_affinity = Some(ResourceNodeAffinity {
            required: Some(NodeSelector {
                node_selector_terms: vec![NodeSelectorTerm {
                    match_expressions: Some(vec![NodeSelectorRequirement {
                        key: "zone".to_string(),
                        operator: "In".to_string(),
                        values: Some(vec!["us-east1-a".to_string()]),
                    }]),
                    match_fields: None,
                }],
            }),
        });
        store.create(pinned).unwrap();

        let mut t4 = gpu("gpu-1", "us-west1-b");
        t4.spec.properties.insert("model".to_string(), "t4".to_string());
        store.create(t4).unwrap();

        let mut a100 = gpu("gpu-2", "us-west1-b");
        a100.spec.properties.insert("model".to_string(), "a100".to_string());
        store.create(a100).unwrap();

        let mut erc = claim("gpu-claim", 1, None);
        erc.spec.metadata_requirements = Some(LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![LabelSelectorRequirement {
                key: "model".to_string(),
                operator: "NotIn".to_string(),
                values: Some(vec!["t4".to_string()]),
            }]),
        });
        store.create(erc).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        // gpu-0 only fits nodes in us-east1-a, gpu-1 is a t4
        let nodes = vec![create_test_node("node-a", &["gpu-0", "gpu-1", "gpu-2"])];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert_eq!(plan.claims[0].resolved_names(), &["gpu-2".to_string()]);
    }

    #[tokio::test]
    async fn test_replan_is_idempotent() {
        let (_dir, store) = setup_store();
        let mut gpu0 = gpu("gpu-0", "us-west1-b");
        gpu0.reserve("default", "gpu-claim").unwrap();
        store.create(gpu0).unwrap();
        store.create(gpu("gpu-1", "us-west1-b")).unwrap();
        store.create(gpu("gpu-2", "us-west1-b")).unwrap();

        let mut erc = claim("gpu-claim", 2, None);
        erc.assign("gpu-0").unwrap();
        erc.mark_pending().unwrap();
        store.create(erc).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0", "gpu-1", "gpu-2"])];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-a"]);
        assert_eq!(
            plan.claims[0].resolved_names(),
            &["gpu-0".to_string(), "gpu-1".to_string()]
        );
        // gpu-0 already carries the reservation
        let names: Vec<_> = plan.resources.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["gpu-1"]);
    }

    #[tokio::test]
    async fn test_stale_reservation_is_reused() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-west1-b")).unwrap();
        let mut gpu1 = gpu("gpu-1", "us-west1-b");
        gpu1.reserve("default", "gpu-claim").unwrap();
        store.create(gpu1).unwrap();
        store.create(claim("gpu-claim", 1, None)).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0", "gpu-1"])];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert_eq!(plan.claims[0].resolved_names(), &["gpu-1".to_string()]);
        assert!(plan.resources.is_empty());
    }

    #[tokio::test]
    async fn test_same_claim_name_in_other_namespace_is_not_reused() {
        let (_dir, store) = setup_store();
        let mut gpu0 = gpu("gpu-0", "us-west1-b");
        gpu0.reserve("team-a", "gpu-claim").unwrap();
        store.create(gpu0).unwrap();
        store.create(gpu("gpu-1", "us-west1-b")).unwrap();

        let mut team_a = ExtendedResourceClaim::new("team-a", "gpu-claim", GPU, 1);
        team_a.assign("gpu-0").unwrap();
        team_a.mark_pending().unwrap();
        store.create(team_a).unwrap();
        store.create(ExtendedResourceClaim::new("team-b", "gpu-claim", GPU, 1)).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0", "gpu-1"])];
        let plan = planner
            .plan(&create_namespaced_pod("team-b", &["gpu-claim"]), &nodes)
            .await
            .unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-a"]);
        assert_eq!(plan.claims[0].namespace(), "team-b");
        assert_eq!(plan.claims[0].resolved_names(), &["gpu-1".to_string()]);
        assert_eq!(plan.resources.len(), 1);
        assert_eq!(plan.resources[0].name(), "gpu-1");
        assert!(plan.resources[0].is_claimed_by("team-b", "gpu-claim"));
    }

    #[tokio::test]
    async fn test_replan_on_other_node_writes_nothing() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-west1-b")).unwrap();
        store.create(claim("gpu-claim", 1, None)).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let pod = create_test_pod(&["gpu-claim"]);
        let first = vec![create_test_node("node-a", &["gpu-0"])];
        let plan = planner.plan(&pod, &first).await.unwrap();
        for resource in &plan.resources {
            store.update_resource(resource).await.unwrap();
        }
        for erc in &plan.claims {
            store.update_claim(erc).await.unwrap();
        }

        let second = vec![
            create_test_node("node-b", &["gpu-0"]),
            create_test_node("node-a", &["gpu-0"]),
        ];
        let plan = planner.plan(&pod, &second).await.unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-b", "node-a"]);
        assert!(!plan.has_writes());
    }

    #[tokio::test]
    async fn test_resources_held_by_other_claims_are_skipped() {
        let (_dir, store) = setup_store();
        let mut gpu0 = gpu("gpu-0", "us-west1-b");
        gpu0.reserve("default", "someone-else").unwrap();
        store.create(gpu0).unwrap();
        store.create(claim("gpu-claim", 1, None)).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0"])];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert!(plan.result.schedulable_nodes.is_empty());
        assert!(plan.result.unschedulable_nodes["node-a"].contains("gpu-claim"));
    }

    #[tokio::test]
    async fn test_fixed_resource_missing_on_node() {
        let (_dir, store) = setup_store();
        let mut gpu0 = gpu("gpu-0", "us-west1-b");
        gpu0.reserve("default", "gpu-claim").unwrap();
        store.create(gpu0).unwrap();
        store.create(gpu("gpu-1", "us-west1-b")).unwrap();

        let mut erc = claim("gpu-claim", 1, None);
        erc.assign("gpu-0").unwrap();
        store.create(erc).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![
            create_test_node("node-a", &["gpu-1"]),
            create_test_node("node-b", &["gpu-0"]),
        ];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-b"]);
        assert!(plan.result.unschedulable_nodes["node-a"].contains("not allocatable"));
    }

    #[tokio::test]
    async fn test_first_accepted_node_holds_reservation() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-west1-b")).unwrap();
        store.create(gpu("gpu-1", "us-west1-b")).unwrap();
        store.create(claim("gpu-claim", 1, None)).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![
            create_test_node("node-x", &[]),
            create_test_node("node-a", &["gpu-0"]),
            create_test_node("node-b", &["gpu-1"]),
            create_test_node("node-c", &["gpu-0", "gpu-1"]),
        ];
        let plan = planner.plan(&create_test_pod(&["gpu-claim"]), &nodes).await.unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-a", "node-c"]);
        assert!(plan.result.unschedulable_nodes["node-b"].contains("reserved on node node-a"));
        assert!(plan.result.unschedulable_nodes.contains_key("node-x"));
        assert_eq!(plan.claims[0].resolved_names(), &["gpu-0".to_string()]);
    }

    #[tokio::test]
    async fn test_multiple_claims_in_declaration_order() {
        let (_dir, store) = setup_store();
        store.create(gpu("gpu-0", "us-west1-b")).unwrap();
        store.create(gpu("gpu-1", "us-east1-a")).unwrap();
        store.create(gpu("gpu-2", "us-west1-b")).unwrap();
        store.create(claim("any", 1, None)).unwrap();
        store.create(claim("west", 1, Some("us-west1-b"))).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0", "gpu-1", "gpu-2"])];
        let plan = planner.plan(&create_test_pod(&["any", "west"]), &nodes).await.unwrap();

        assert_eq!(plan.claims.len(), 2);
        assert_eq!(plan.claims[0].resolved_names(), &["gpu-0".to_string()]);
        assert_eq!(plan.claims[1].resolved_names(), &["gpu-2".to_string()]);
        assert_eq!(plan.resources.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_count_claim_with_names_is_satisfied() {
        let (_dir, store) = setup_store();
        let mut gpu0 = gpu("gpu-0", "us-west1-b");
        gpu0.reserve("default", "fixed").unwrap();
        store.create(gpu0).unwrap();

        let mut erc = claim("fixed", 1, None);
        erc.assign("gpu-0").unwrap();
        erc.spec.extended_resource_num = 0;
        store.create(erc).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0"])];
        let plan = planner.plan(&create_test_pod(&["fixed"]), &nodes).await.unwrap();

        assert_eq!(plan.result.schedulable_names(), vec!["node-a"]);
    }

    #[tokio::test]
    async fn test_call_level_errors() {
        let (_dir, store) = setup_store();
        store.create(claim("empty", 0, None)).unwrap();

        let planner = AllocationPlanner::new(store.clone());
        let nodes = vec![create_test_node("node-a", &["gpu-0"])];

        let err = planner.plan(&create_test_pod(&[]), &nodes).await.unwrap_err();
        assert!(matches!(err, SchedulerError::NoClaims { .. }));
        assert!(err.to_string().contains("extendedResourceClaims is empty"));

        let err = planner.plan(&create_test_pod(&["missing"]), &nodes).await.unwrap_err();
        assert!(matches!(err, SchedulerError::ClaimNotFound { .. }));

        let err = planner.plan(&create_test_pod(&["empty"]), &nodes).await.unwrap_err();
        assert!(matches!(err, SchedulerError::EmptyClaim { .. }));
    }
}
