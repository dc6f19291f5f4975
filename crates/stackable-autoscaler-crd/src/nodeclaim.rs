//! `NodeClaim` is the authoritative record of a single node's intent and observed status. It is
//! created either by the Provisioner (for new, pending-pod-driven capacity) or by
//! the Disruption Engine (for replacement capacity during consolidation/drift).

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stackable_operator::time::Duration;
use stackable_versioned::versioned;

use crate::{
    nodeclass::NodeClassReference,
    nodepool::ResourceList,
    requirement::{NodeSelectorRequirement, Taint},
};

#[versioned(
    version(name = "v1alpha1"),
    k8s(
        group = "autoscaling.kubernetes.stackable.tech",
        kind = "NodeClaim",
        status = NodeClaimStatus,
        shortname = "nc",
    )
)]
#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClaimSpec {
    /// Requirements resolved at NodeClaim creation time: the union of the owning NodePool's
    /// requirements with whatever the Scheduler needed to satisfy the pods this claim was sized
    /// for.
    #[serde(default)]
    pub requirements: Vec<NodeSelectorRequirement>,

    /// Resource requests this claim was sized to hold, including pre-deducted DaemonSet
    /// overhead.
    #[serde(default)]
    pub resources: NodeClaimResources,

    /// Carried over from the owning NodePool for the lifetime of the node.
    #[serde(default)]
    pub taints: Vec<Taint>,

    /// Removed once the claim reaches `Initialized`.
    #[serde(default)]
    pub startup_taints: Vec<Taint>,

    pub node_class_ref: NodeClassReference,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClaimResources {
    #[serde(default)]
    pub requests: ResourceList,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClaimStatus {
    /// The cloud provider's identifier for the launched instance, set once `Launched` is
    /// observed True. Joins this NodeClaim to a Kubernetes `Node` by matching
    /// `node.spec.providerID`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Set once a matching Node is observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,

    /// The instance type's advertised capacity, as reported by the cloud provider at launch.
    #[serde(default)]
    pub capacity: ResourceList,

    /// `capacity - overhead`, cached at launch time.
    #[serde(default)]
    pub allocatable: ResourceList,

    /// Timestamp of the most recent pod scheduling/binding event observed against this claim's
    /// node, used by the Disruption Engine's emptiness check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pod_event_time: Option<String>,

    /// Set at first drain attempt to `now + terminationGracePeriod`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_timestamp: Option<String>,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl NodeClaimStatus {
    pub const LAUNCHED_CONDITION: &'static str = "Launched";
    pub const REGISTERED_CONDITION: &'static str = "Registered";
    pub const INITIALIZED_CONDITION: &'static str = "Initialized";
    pub const DRIFTED_CONDITION: &'static str = "Drifted";
    pub const CONSOLIDATABLE_CONDITION: &'static str = "Consolidatable";
    pub const EXPIRED_CONDITION: &'static str = "Expired";
    pub const INSTANCE_TERMINATING_CONDITION: &'static str = "InstanceTerminating";
    pub const CONSISTENT_STATE_FOUND_CONDITION: &'static str = "ConsistentStateFound";
    pub const READY_CONDITION: &'static str = "Ready";

    /// The fixed forward order of the non-terminal lifecycle conditions. Consulted by
    /// [`Self::permits_forward_transition`] so a NodeClaim's status conditions are monotonic
    /// forward and never regress to an earlier stage once a later one has been observed.
    pub const LIFECYCLE_ORDER: &'static [&'static str] = &[
        Self::LAUNCHED_CONDITION,
        Self::REGISTERED_CONDITION,
        Self::INITIALIZED_CONDITION,
    ];

    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Whether setting `type_` to `True` right now is consistent with the monotonic-forward
    /// invariant: `type_` must not precede, in [`Self::LIFECYCLE_ORDER`], any condition already
    /// `True`. Conditions outside `LIFECYCLE_ORDER` (e.g. `Drifted`, `Consolidatable`) aren't
    /// ordered and always permit the transition.
    pub fn permits_forward_transition(&self, type_: &str) -> bool {
        let Some(target_index) = Self::LIFECYCLE_ORDER.iter().position(|&c| c == type_) else {
            return true;
        };
        !Self::LIFECYCLE_ORDER
            .iter()
            .enumerate()
            .any(|(i, &condition)| i > target_index && self.is_true(condition))
    }

    pub fn is_true(&self, type_: &str) -> bool {
        self.condition(type_).is_some_and(|c| c.status == "True")
    }

    /// The node is ready to receive workloads: registered, initialized, and not already marked
    /// for termination.
    pub fn is_ready(&self) -> bool {
        self.is_true(Self::INITIALIZED_CONDITION) && !self.is_true(Self::INSTANCE_TERMINATING_CONDITION)
    }
}

/// Categorized reasons a NodeClaim was disrupted, carried as the
/// `autoscaling.kubernetes.stackable.tech/disruption-reason` annotation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum DisruptionCause {
    Expired,
    Drifted,
    Empty,
    Underutilized,
    Unhealthy,
}

/// The default registration grace window: if no Node appears with the resolved
/// providerID within this long, the NodeClaim is deleted.
pub fn default_registration_grace_period() -> Duration {
    // 15 minutes, matching the cloud-provider-defined default.
    Duration::from_std(std::time::Duration::from_secs(15 * 60))
}

pub type NodeClaimConditionMap = BTreeMap<String, Condition>;

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    use super::*;

    fn condition(type_: &str) -> Condition {
        Condition {
            last_transition_time: Time("2024-01-01T00:00:00Z".parse().unwrap()),
            message: String::new(),
            observed_generation: None,
            reason: "Test".to_string(),
            status: "True".to_string(),
            type_: type_.to_string(),
        }
    }

    #[test]
    fn permits_transition_when_no_later_condition_is_true() {
        let status = NodeClaimStatus {
            conditions: vec![condition(NodeClaimStatus::REGISTERED_CONDITION)],
            ..Default::default()
        };
        assert!(status.permits_forward_transition(NodeClaimStatus::INITIALIZED_CONDITION));
    }

    #[test]
    fn rejects_transition_that_would_regress_past_a_later_condition() {
        let status = NodeClaimStatus {
            conditions: vec![condition(NodeClaimStatus::INITIALIZED_CONDITION)],
            ..Default::default()
        };
        assert!(!status.permits_forward_transition(NodeClaimStatus::REGISTERED_CONDITION));
    }

    #[test]
    fn unordered_conditions_always_permit_transition() {
        let status = NodeClaimStatus {
            conditions: vec![condition(NodeClaimStatus::INITIALIZED_CONDITION)],
            ..Default::default()
        };
        assert!(status.permits_forward_transition(NodeClaimStatus::DRIFTED_CONDITION));
    }
}
