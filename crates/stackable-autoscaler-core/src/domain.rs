//! Plain, Kubernetes-type-free projections of the objects the Scheduler and Cluster State reason
//! about. The real watch events carry `k8s_openapi`/`kube` types; translating
//! those into these shapes is the job of the informer wiring in `stackable-autoscaler-controller`,
//! so that this crate's core algorithms stay pure and directly unit-testable by constructing
//! these values.

use std::collections::BTreeSet;

use stackable_autoscaler_crd::requirement::{Taint, TaintEffect};

use crate::{cloud::ResourceList, requirements::RequirementSet};

/// A pending or bound pod, projected with everything the Scheduler needs.
#[derive(Clone, Debug, PartialEq)]
pub struct PodInfo {
    pub namespace: String,
    pub name: String,

    /// Resource requests including overhead and the max of init-container requests.
    pub requests: ResourceList,

    pub node_selector: RequirementSet,
    pub required_node_affinity: RequirementSet,
    pub tolerations: Vec<Toleration>,

    pub topology_spread_constraints: Vec<TopologySpreadConstraint>,
    pub required_pod_affinity: Vec<PodAffinityTerm>,
    pub required_pod_anti_affinity: Vec<PodAffinityTerm>,

    pub host_ports: Vec<HostPort>,
    pub volume_claims: Vec<VolumeClaim>,

    /// `spec.nodeName` once bound; `None` while pending.
    pub bound_node_name: Option<String>,

    pub owner: PodOwner,

    /// Pod carries the `do-not-disrupt` annotation.
    pub do_not_disrupt: bool,
    /// Pod carries the `do-not-evict` label.
    pub do_not_evict: bool,

    pub scheduling_gates: Vec<String>,
    pub phase: PodPhase,
}

impl PodInfo {
    pub fn is_pending(&self) -> bool {
        self.bound_node_name.is_none()
            && self.scheduling_gates.is_empty()
            && self.phase == PodPhase::Pending
    }

    /// Whether the pod should be excluded from drain accounting.
    pub fn skip_on_drain(&self) -> bool {
        matches!(
            self.owner,
            PodOwner::Static | PodOwner::Mirror
        ) || self.phase == PodPhase::Terminating
    }

    pub fn is_daemonset(&self) -> bool {
        matches!(self.owner, PodOwner::DaemonSet { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PodPhase {
    #[default]
    Pending,
    Running,
    Terminating,
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PodOwner {
    #[default]
    None,
    DaemonSet {
        name: String,
    },
    Static,
    Mirror,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toleration {
    pub key: Option<String>,
    pub operator: TolerationOperator,
    pub value: Option<String>,
    pub effect: Option<TaintEffect>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TolerationOperator {
    Exists,
    Equal,
}

impl Toleration {
    pub fn tolerates(&self, taint: &Taint) -> bool {
        if let Some(effect) = &self.effect {
            if *effect != taint.effect {
                return false;
            }
        }
        match (&self.key, self.operator) {
            (None, TolerationOperator::Exists) => true,
            (Some(key), TolerationOperator::Exists) => *key == taint.key,
            (Some(key), TolerationOperator::Equal) => {
                *key == taint.key && self.value == taint.value
            }
            (None, TolerationOperator::Equal) => false,
        }
    }
}

/// A topology-spread constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologySpreadConstraint {
    pub topology_key: String,
    pub max_skew: i32,
    pub selector: RequirementSetKey,
}

/// A marker wrapping the label selector a topology-spread/affinity term matches other pods by.
/// Kept distinct from [`RequirementSet`] because it selects *pods*, not nodes.
pub type RequirementSetKey = std::collections::BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodAffinityTerm {
    pub topology_key: String,
    pub label_selector: RequirementSetKey,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostPort {
    pub ip: String,
    pub protocol: String,
    pub port: u16,
}

impl std::fmt::Display for HostPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.ip, self.protocol, self.port)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeClaim {
    pub driver: String,
    pub pvc_key: String,
}

/// A Kubernetes `Node` joined to its `NodeClaim` by `providerID`.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    pub provider_id: String,
    pub name: String,
    pub labels: std::collections::BTreeMap<String, String>,
    pub taints: Vec<Taint>,
    pub ready: bool,
    pub allocatable: ResourceList,

    /// Since when the node has continuously held whichever Node condition the cloud provider's
    /// `RepairPolicy` names as unhealthy, as resolved by the (out of scope) informer translation
    /// layer. `None` means the node currently holds no such condition.
    pub unhealthy_condition_since: Option<jiff::Timestamp>,
}

pub fn topology_domains(nodes: impl Iterator<Item = impl AsRef<str>>) -> BTreeSet<String> {
    nodes.map(|s| s.as_ref().to_string()).collect()
}
