use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::Condition};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stackable_operator::time::Duration;
use stackable_versioned::versioned;

use crate::{nodeclass::NodeClassReference, requirement::{NodeSelectorRequirement, Taint}};

/// A `ResourceList` is a map of resource name (`cpu`, `memory`, or an extended resource such as
/// `nvidia.com/gpu`) to quantity, mirroring `corev1.ResourceList`.
pub type ResourceList = BTreeMap<String, Quantity>;

#[versioned(
    version(name = "v1alpha1"),
    k8s(
        group = "autoscaling.kubernetes.stackable.tech",
        kind = "NodePool",
        status = NodePoolStatus,
        shortname = "np",
        namespaced,
    )
)]
// Printer columns (`NodeClass`, `Nodes`, `Ready`, `Age`, `Weight`, `CPU`, `Memory`) are left to
// the CRD manifest this crate's `CustomResourceExt` output feeds into; the generation macro used
// here does not yet expose `printcolumn` pass-through.
#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    /// Requirements that constrain which instance types/zones/capacity-types this pool may
    /// launch. Intersected against a pending pod's effective requirements during scheduling.
    #[serde(default)]
    pub requirements: Vec<NodeSelectorRequirement>,

    /// Reference to the cloud-specific configuration (subnets, images, security groups, ...)
    /// used to launch nodes from this pool.
    pub node_class_ref: NodeClassReference,

    /// Taints applied to every node launched from this pool for its entire lifetime.
    #[serde(default)]
    pub taints: Vec<Taint>,

    /// Taints applied at launch and removed once the node is `Initialized`.
    #[serde(default)]
    pub startup_taints: Vec<Taint>,

    /// If set, NodeClaims launched from this pool are disrupted for `Expiration` once they have
    /// existed for this long, regardless of utilization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_after: Option<Duration>,

    /// How long the Drain step is allowed to respect PodDisruptionBudgets before force-deleting
    /// remaining pods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_grace_period: Option<Duration>,

    /// Resource caps across every NodeClaim owned by this pool. A proposed NodeClaim that would
    /// push the pool's aggregate resource usage over any entry here is rejected with
    /// `ResourceLimitsExceeded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceList>,

    /// Higher-weight pools are preferred (tried first) when the Scheduler simulates a new node;
    /// ties broken by name.
    #[serde(default = "default_weight")]
    pub weight: i32,

    #[serde(default)]
    pub disruption: NodePoolDisruption,
}

fn default_weight() -> i32 {
    1
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolDisruption {
    /// Whether empty, or empty-or-underutilized, nodes are eligible for consolidation.
    #[serde(default)]
    pub consolidation_policy: ConsolidationPolicy,

    /// How long a node must continuously satisfy its consolidation policy before it becomes a
    /// disruption candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidate_after: Option<Duration>,

    /// Ordered list of budgets constraining how many NodeClaims owned by this pool may be
    /// disrupting concurrently. Active budgets intersect via `min` aggregation
    /// (see Design Note open question on overlapping-budget precedence).
    #[serde(default)]
    pub budgets: Vec<Budget>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ConsolidationPolicy {
    #[default]
    WhenEmpty,
    WhenEmptyOrUnderutilized,
}

/// An operator constraint on how many nodes of a NodePool may be disrupting simultaneously,
/// optionally scoped by reason and an active schedule.
///
/// `nodes` is either a bare integer (`"5"`) or a percentage (`"10%"`), the latter rounding up to
/// mirror PodDisruptionBudget semantics.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub nodes: String,

    /// If empty, this budget applies to every disruption reason. Otherwise it only constrains
    /// the listed reasons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<DisruptionReason>,

    /// A standard five-field cron expression. When present and not currently active, this
    /// budget is treated as unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// How long the schedule stays active once triggered. Required if `schedule` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum DisruptionReason {
    Expired,
    Drifted,
    Underutilized,
    Empty,
    Unhealthy,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Number of NodeClaims currently owned by this pool, maintained by the Provisioner/
    /// Disruption controllers as a cheap observability signal (not used for scheduling
    /// decisions, which always re-derive counts from the Cluster State).
    #[serde(default)]
    pub resources: ResourceList,
}

impl NodePoolStatus {
    pub const READY_CONDITION: &'static str = "Ready";
    pub const VALIDATION_SUCCEEDED_CONDITION: &'static str = "ValidationSucceeded";
    pub const NODECLASS_READY_CONDITION: &'static str = "NodeClassReady";
    pub const NODE_REGISTRATION_HEALTHY_CONDITION: &'static str = "NodeRegistrationHealthy";
}
