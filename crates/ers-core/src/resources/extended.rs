//! ExtendedResource and ExtendedResourceClaim API objects and their lifecycle.
//!
//! An `ExtendedResource` (ER) is one device instance. Its phase moves
//! Available -> Pending when the scheduler reserves it for a claim, then
//! Pending -> Bound once the consumer is running, and back to Available when
//! released. `spec.extendedResourceClaimName` is set exactly while the phase
//! is not Available. Claims are namespaced while resources are not, so the
//! back-reference also records `spec.extendedResourceClaimNamespace`.
//!
//! An `ExtendedResourceClaim` (ERC) asks for `extendResourceNum` resources of
//! one raw kind. Resolved resource names only ever grow while the claim is
//! Unbound or Pending.

use crate::error::{ErsError, Result};
use k8s_openapi::api::core::v1::NodeSelector;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, LabelSelectorRequirement, ObjectMeta,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle phase of an ExtendedResource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtendedResourcePhase {
    #[default]
    Available,
    Pending,
    Bound,
}

impl ExtendedResourcePhase {
    pub fn can_transition_to(self, next: Self) -> bool {
        use ExtendedResourcePhase::*;
        matches!(
            (self, next),
            (Available, Pending) | (Pending, Bound) | (Pending, Available) | (Bound, Available)
        )
    }
}

impl fmt::Display for ExtendedResourcePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Available => "Available",
            Self::Pending => "Pending",
            Self::Bound => "Bound",
        };
        f.write_str(s)
    }
}

/// Lifecycle phase of an ExtendedResourceClaim
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtendedResourceClaimPhase {
    #[default]
    Unbound,
    Pending,
    Bound,
    Lost,
}

impl ExtendedResourceClaimPhase {
    pub fn can_transition_to(self, next: Self) -> bool {
        use ExtendedResourceClaimPhase::*;
        matches!(
            (self, next),
            (Unbound, Pending)
                | (Pending, Pending)
                | (Pending, Bound)
                | (Lost, Pending)
                | (Unbound, Lost)
                | (Pending, Lost)
                | (Bound, Lost)
        )
    }
}

impl fmt::Display for ExtendedResourceClaimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unbound => "Unbound",
            Self::Pending => "Pending",
            Self::Bound => "Bound",
            Self::Lost => "Lost",
        };
        f.write_str(s)
    }
}

/// Node constraints limiting where an extended resource can be consumed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceNodeAffinity {
    /// Hard node constraints that must be met
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<NodeSelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedResourceSpec {
    /// Raw resource name, e.g. nvidia.com/gpu
    #[serde(default)]
    pub raw_resource_name: String,

    #[serde(rename = "deviceID", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Free-form device properties, e.g. gpuType: k80, zone: us-west1-b
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_affinity: Option<ResourceNodeAffinity>,

    /// Name of the claim this resource is reserved for or bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_resource_claim_name: Option<String>,

    /// Namespace of that claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_resource_claim_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedResourceStatus {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capacity: BTreeMap<String, Quantity>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allocatable: BTreeMap<String, Quantity>,

    #[serde(default)]
    pub phase: ExtendedResourcePhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One schedulable device instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ExtendedResourceSpec,

    #[serde(default)]
    pub status: ExtendedResourceStatus,
}

impl ExtendedResource {
    /// Create an Available resource of the given raw kind
    pub fn new(name: impl Into<String>, raw_resource_name: impl Into<String>) -> Self {
        Self {
            api_version: Some(crate::EXTENSIONS_API_VERSION.to_string()),
            kind: Some("ExtendedResource".to_string()),
            metadata: ObjectMeta {
                name: Some(name.into()),
                ..Default::default()
            },
            spec: ExtendedResourceSpec {
                raw_resource_name: raw_resource_name.into(),
                ..Default::default()
            },
            status: ExtendedResourceStatus::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn raw_resource_name(&self) -> &str {
        &self.spec.raw_resource_name
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.spec.properties
    }

    pub fn phase(&self) -> ExtendedResourcePhase {
        self.status.phase
    }

    pub fn claimed_by(&self) -> Option<&str> {
        self.spec.extended_resource_claim_name.as_deref()
    }

    pub fn claim_namespace(&self) -> Option<&str> {
        self.spec.extended_resource_claim_namespace.as_deref()
    }

    /// Whether this resource is held by the claim `namespace/name`
    pub fn is_claimed_by(&self, namespace: &str, name: &str) -> bool {
        self.claimed_by() == Some(name) && self.claim_namespace().unwrap_or_default() == namespace
    }

    /// `namespace/name` of the holding claim
    pub fn owner(&self) -> Option<String> {
        self.claimed_by().map(|name| match self.claim_namespace() {
            Some(namespace) => format!("{}/{}", namespace, name),
            None => name.to_string(),
        })
    }

    pub fn is_available(&self) -> bool {
        self.phase() == ExtendedResourcePhase::Available
    }

    /// The required node selector, if this resource constrains placement at all
    pub fn required_node_affinity(&self) -> Option<&NodeSelector> {
        self.spec
            .node_affinity
            .as_ref()
            .and_then(|affinity| affinity.required.as_ref())
    }

    /// Reserve this resource for the claim `namespace/claim`: Available -> Pending.
    ///
    /// Reserving a resource already held by the same claim is a no-op.
    pub fn reserve(&mut self, namespace: &str, claim: &str) -> Result<()> {
        if !self.is_available() {
            if self.is_claimed_by(namespace, claim) {
                return Ok(());
            }
            return match self.owner() {
                Some(owner) => Err(ErsError::already_claimed(self.name(), owner)),
                None => Err(ErsError::invalid_phase_transition(
                    self.name(),
                    self.phase(),
                    ExtendedResourcePhase::Pending,
                )),
            };
        }

        self.spec.extended_resource_claim_name = Some(claim.to_string());
        self.spec.extended_resource_claim_namespace = Some(namespace.to_string());
        self.transition(ExtendedResourcePhase::Pending)?;
        self.status.reason = Some("Reserved".to_string());
        self.status.message = Some(format!("Reserved for claim {}/{}", namespace, claim));
        Ok(())
    }

    /// Pending -> Bound
    pub fn bind(&mut self) -> Result<()> {
        if self.phase() == ExtendedResourcePhase::Bound {
            return Ok(());
        }
        self.transition(ExtendedResourcePhase::Bound)?;
        self.status.reason = Some("Bound".to_string());
        Ok(())
    }

    /// Pending|Bound -> Available, dropping the claim back-reference
    pub fn release(&mut self) -> Result<()> {
        if self.is_available() {
            return Ok(());
        }
        self.transition(ExtendedResourcePhase::Available)?;
        self.spec.extended_resource_claim_name = None;
        self.spec.extended_resource_claim_namespace = None;
        self.status.reason = None;
        self.status.message = None;
        Ok(())
    }

    fn transition(&mut self, next: ExtendedResourcePhase) -> Result<()> {
        if !self.phase().can_transition_to(next) {
            return Err(ErsError::invalid_phase_transition(self.name(), self.phase(), next));
        }
        self.status.phase = next;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedResourceClaimSpec {
    /// Property constraints, e.g. zone in { us-west1-b, us-west1-c }; type: k80
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_requirements: Option<LabelSelector>,

    /// Names of the extended resources resolved for this claim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extended_resource_names: Vec<String>,

    #[serde(default)]
    pub raw_resource_name: String,

    /// How many resources of the raw kind are requested at once
    #[serde(rename = "extendResourceNum", default)]
    pub extended_resource_num: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedResourceClaimStatus {
    #[serde(default)]
    pub phase: ExtendedResourceClaimPhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A pod-level request for extended resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedResourceClaim {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ExtendedResourceClaimSpec,

    #[serde(default)]
    pub status: ExtendedResourceClaimStatus,
}

impl ExtendedResourceClaim {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        raw_resource_name: impl Into<String>,
        count: i64,
    ) -> Self {
        Self {
            api_version: Some(crate::EXTENSIONS_API_VERSION.to_string()),
            kind: Some("ExtendedResourceClaim".to_string()),
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some(namespace.into()),
                ..Default::default()
            },
            spec: ExtendedResourceClaimSpec {
                raw_resource_name: raw_resource_name.into(),
                extended_resource_num: count,
                ..Default::default()
            },
            status: ExtendedResourceClaimStatus::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    pub fn raw_resource_name(&self) -> &str {
        &self.spec.raw_resource_name
    }

    pub fn phase(&self) -> ExtendedResourceClaimPhase {
        self.status.phase
    }

    /// Requested count; negative wire values count as zero
    pub fn required_count(&self) -> usize {
        usize::try_from(self.spec.extended_resource_num).unwrap_or(0)
    }

    pub fn resolved_names(&self) -> &[String] {
        &self.spec.extended_resource_names
    }

    /// How many more resources must be resolved before the claim is satisfied
    pub fn unresolved_count(&self) -> usize {
        self.required_count()
            .saturating_sub(self.resolved_names().len())
    }

    pub fn is_satisfied(&self) -> bool {
        self.unresolved_count() == 0
    }

    /// `matchLabels` of the property requirements, if any
    pub fn required_properties(&self) -> Option<&BTreeMap<String, String>> {
        self.spec
            .metadata_requirements
            .as_ref()
            .and_then(|selector| selector.match_labels.as_ref())
    }

    /// `matchExpressions` of the property requirements, if any
    pub fn property_expressions(&self) -> Option<&[LabelSelectorRequirement]> {
        self.spec
            .metadata_requirements
            .as_ref()
            .and_then(|selector| selector.match_expressions.as_deref())
    }

    /// Append a resolved resource name
    pub fn assign(&mut self, resource: &str) -> Result<()> {
        if self.is_satisfied() {
            return Err(ErsError::invalid_resource(
                format!(
                    "claim {} already has {} of {} resources",
                    self.name(),
                    self.resolved_names().len(),
                    self.required_count()
                ),
                "Do not assign more resources than extendResourceNum",
            ));
        }
        if self.resolved_names().iter().any(|n| n == resource) {
            return Err(ErsError::invalid_resource(
                format!("resource {} is already assigned to claim {}", resource, self.name()),
                "Each extended resource can be assigned to a claim only once",
            ));
        }
        self.spec.extended_resource_names.push(resource.to_string());
        Ok(())
    }

    /// Mark the claim as holding its resolved resources.
    ///
    /// Bound claims are left untouched. The status only depends on the
    /// resolved names, so re-planning an unchanged claim leaves it equal.
    pub fn mark_pending(&mut self) -> Result<()> {
        if self.phase() == ExtendedResourceClaimPhase::Bound {
            return Ok(());
        }
        self.transition(ExtendedResourceClaimPhase::Pending)?;
        self.status.reason = Some("Reserved".to_string());
        self.status.message = Some(format!(
            "Reserved {} extended resource(s)",
            self.resolved_names().len()
        ));
        Ok(())
    }

    /// Pending -> Bound; every requested resource must be resolved
    pub fn mark_bound(&mut self) -> Result<()> {
        if self.phase() == ExtendedResourceClaimPhase::Bound {
            return Ok(());
        }
        if !self.is_satisfied() {
            return Err(ErsError::invalid_resource(
                format!(
                    "claim {} has {} of {} resources resolved",
                    self.name(),
                    self.resolved_names().len(),
                    self.required_count()
                ),
                "A claim can only become Bound once every requested resource is resolved",
            ));
        }
        self.transition(ExtendedResourceClaimPhase::Bound)?;
        self.status.reason = Some("Bound".to_string());
        Ok(())
    }

    /// Any phase -> Lost, e.g. when a resolved resource disappeared
    pub fn mark_lost(&mut self, message: impl Into<String>) -> Result<()> {
        if self.phase() != ExtendedResourceClaimPhase::Lost {
            self.transition(ExtendedResourceClaimPhase::Lost)?;
        }
        self.status.reason = Some("Lost".to_string());
        self.status.message = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: ExtendedResourceClaimPhase) -> Result<()> {
        if !self.phase().can_transition_to(next) {
            return Err(ErsError::invalid_phase_transition(self.name(), self.phase(), next));
        }
        self.status.phase = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_reserve_bind_release() {
        let mut er = ExtendedResource::new("gpu-0", "nvidia.com/gpu");
        assert!(er.is_available());

        er.reserve("default", "gpu-claim").unwrap();
        assert_eq!(er.phase(), ExtendedResourcePhase::Pending);
        assert_eq!(er.claimed_by(), Some("gpu-claim"));
        assert_eq!(er.owner().as_deref(), Some("default/gpu-claim"));

        // Same claim again is a no-op
        er.reserve("default", "gpu-claim").unwrap();
        assert_eq!(er.phase(), ExtendedResourcePhase::Pending);

        er.bind().unwrap();
        assert_eq!(er.phase(), ExtendedResourcePhase::Bound);

        er.release().unwrap();
        assert!(er.is_available());
        assert_eq!(er.claimed_by(), None);
        assert_eq!(er.claim_namespace(), None);
    }

    #[test]
    fn test_resource_reserve_conflict() {
        let mut er = ExtendedResource::new("gpu-0", "nvidia.com/gpu");
        er.reserve("default", "claim-a").unwrap();

        let err = er.reserve("default", "claim-b").unwrap_err();
        assert!(matches!(err, ErsError::AlreadyClaimed { .. }));
        assert_eq!(er.claimed_by(), Some("claim-a"));
    }

    #[test]
    fn test_resource_reserve_same_name_other_namespace() {
        let mut er = ExtendedResource::new("gpu-0", "nvidia.com/gpu");
        er.reserve("team-a", "gpu-claim").unwrap();

        assert!(er.is_claimed_by("team-a", "gpu-claim"));
        assert!(!er.is_claimed_by("team-b", "gpu-claim"));

        let err = er.reserve("team-b", "gpu-claim").unwrap_err();
        assert!(err.to_string().contains("team-a/gpu-claim"));
        assert_eq!(er.claim_namespace(), Some("team-a"));
    }

    #[test]
    fn test_resource_bind_requires_pending() {
        let mut er = ExtendedResource::new("gpu-0", "nvidia.com/gpu");
        let err = er.bind().unwrap_err();
        assert!(matches!(err, ErsError::InvalidPhaseTransition { .. }));
    }

    #[test]
    fn test_claim_assign_respects_count() {
        let mut erc = ExtendedResourceClaim::new("default", "gpu-claim", "nvidia.com/gpu", 2);
        assert_eq!(erc.unresolved_count(), 2);

        erc.assign("gpu-0").unwrap();
        assert!(erc.assign("gpu-0").is_err());
        erc.assign("gpu-1").unwrap();
        assert!(erc.is_satisfied());
        assert!(erc.assign("gpu-2").is_err());
        assert_eq!(erc.resolved_names(), &["gpu-0", "gpu-1"]);
    }

    #[test]
    fn test_claim_phase_lifecycle() {
        let mut erc = ExtendedResourceClaim::new("default", "gpu-claim", "nvidia.com/gpu", 1);
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Unbound);

        // Cannot bind before everything is resolved
        erc.mark_pending().unwrap();
        assert!(erc.mark_bound().is_err());

        erc.assign("gpu-0").unwrap();
        erc.mark_pending().unwrap();
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Pending);

        erc.mark_bound().unwrap();
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Bound);

        // Re-planning a bound claim keeps it bound
        erc.mark_pending().unwrap();
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Bound);

        erc.mark_lost("gpu-0 was removed").unwrap();
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Lost);

        erc.mark_pending().unwrap();
        let again = erc.clone();
        erc.mark_pending().unwrap();
        assert_eq!(erc, again);

        erc.mark_lost("gpu-0 was removed").unwrap();
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Lost);

        erc.mark_pending().unwrap();
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Pending);
    }

    #[test]
    fn test_claim_wire_format() {
        let json = r#"{
            "apiVersion": "extensions/v1alpha1",
            "kind": "ExtendedResourceClaim",
            "metadata": {"name": "gpu-claim", "namespace": "default"},
            "spec": {
                "rawResourceName": "nvidia.com/gpu",
                "extendResourceNum": 2,
                "metadataRequirements": {"matchLabels": {"zone": "us-west1-b"}}
            }
        }"#;

        let erc: ExtendedResourceClaim = serde_json::from_str(json).unwrap();
        assert_eq!(erc.required_count(), 2);
        assert_eq!(erc.phase(), ExtendedResourceClaimPhase::Unbound);
        assert_eq!(
            erc.required_properties().and_then(|p| p.get("zone")).map(String::as_str),
            Some("us-west1-b")
        );

        let value = serde_json::to_value(&erc).unwrap();
        assert_eq!(value["spec"]["extendResourceNum"], 2);
        assert_eq!(value["status"]["phase"], "Unbound");
    }
}
