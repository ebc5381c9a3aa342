use crate::bind::BindingFinalizer;
use crate::planner::AllocationPlanner;
use crate::sync::StateSynchronizer;
use crate::types::FilterResult;
use crate::{Result, SchedulerError};
use ers_core::{Node, Pod};
use ers_storage::ExtendedResourceStore;
use std::sync::Arc;
use tracing::{error, warn};

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How many times a filter call re-plans after a stale write
    pub conflict_retries: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            conflict_retries: 3,
        }
    }
}

/// Runs filter and bind calls for the scheduler extender
pub struct ExtendedResourceScheduler {
    planner: AllocationPlanner,
    synchronizer: StateSynchronizer,
    finalizer: BindingFinalizer,
    config: SchedulerConfig,
}

impl ExtendedResourceScheduler {
    pub fn new(store: Arc<dyn ExtendedResourceStore>, config: SchedulerConfig) -> Self {
        Self {
            planner: AllocationPlanner::new(store.clone()),
            synchronizer: StateSynchronizer::new(store.clone()),
            finalizer: BindingFinalizer::new(store),
            config,
        }
    }

    /// Filter `nodes` for `pod`. Call-level failures end up in `error`.
    pub async fn filter(&self, pod: &Pod, nodes: &[Node]) -> FilterResult {
        match self.try_filter(pod, nodes).await {
            Ok(result) => result,
            Err(e) => {
                error!("Filter for pod {}/{} failed: {}", pod.namespace(), pod.name(), e);
                FilterResult::failed(nodes, e.to_string())
            }
        }
    }

    /// Plan and commit, re-planning from fresh state when a write conflicts
    pub async fn try_filter(&self, pod: &Pod, nodes: &[Node]) -> Result<FilterResult> {
        let mut attempt = 0;
        loop {
            let plan = self.planner.plan(pod, nodes).await?;
            if !plan.has_writes() {
                return Ok(plan.result);
            }

            match self.synchronizer.commit(&plan.claims, &plan.resources).await {
                Ok(()) => return Ok(plan.result),
                Err(e) if e.is_conflict() && attempt < self.config.conflict_retries => {
                    attempt += 1;
                    warn!(
                        "Reservation for pod {}/{} conflicted, retrying ({}/{})",
                        pod.namespace(),
                        pod.name(),
                        attempt,
                        self.config.conflict_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Bind a pod to the node the scheduler picked
    pub async fn bind(&self, namespace: &str, name: &str, uid: &str, node_name: &str) -> Result<()> {
        let missing: Vec<&str> = [("podNamespace", namespace), ("podName", name), ("node", node_name)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(SchedulerError::invalid_binding(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        self.finalizer.bind(namespace, name, uid, node_name).await
    }
}
