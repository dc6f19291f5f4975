//! Scheduler / bin-packer.
//!
//! Implemented as a pure function, [`simulate`], with no I/O: given a cluster snapshot, a batch
//! of pending pods and the set of NodePools, it produces a [`Solution`] without touching the
//! apiserver or cloud provider. This is what makes it possible to test that running the Scheduler
//! twice on the same input yields the same plan, modulo stable tie-breakers.

use std::{cmp::Ordering, collections::BTreeMap};

use itertools::Itertools;
use snafu::Snafu;
use stackable_autoscaler_crd::nodepool::v1alpha1::NodePool;
use stackable_operator::quantity::Quantity;
use strum::{EnumDiscriminants, IntoStaticStr};
use tracing::{debug, instrument, warn};

use crate::{
    cloud::{InstanceType, ResourceList},
    domain::PodInfo,
    requirements::{self, RequirementSet},
    state::StateNode,
};

/// Per-pod reason a pod could not be placed.
#[derive(Clone, Debug, PartialEq, Eq, Snafu, EnumDiscriminants)]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum UnschedulableReason {
    #[snafu(display("no compatible instance type exists in any NodePool ({pod_key:?})"))]
    PodFitsOnNoInstanceType { pod_key: PodKey },

    #[snafu(display("every candidate NodePool's resource limits would be exceeded ({pod_key:?})"))]
    ResourceLimitsExceeded { pod_key: PodKey },

    #[snafu(display("minValues for key {key:?} could not be satisfied ({pod_key:?})"))]
    MinValuesUnsatisfied { pod_key: PodKey, key: String },

    #[snafu(display("no node tolerates this pod's taints ({pod_key:?})"))]
    TaintsNotTolerated { pod_key: PodKey },

    #[snafu(display("a topology-spread or affinity constraint could not be satisfied ({pod_key:?})"))]
    TopologyViolation { pod_key: PodKey },

    #[snafu(display("insufficient capacity across every compatible offering ({pod_key:?})"))]
    Insufficient { pod_key: PodKey },

    #[snafu(display("requirements are incompatible with every NodePool ({pod_key:?})"))]
    Incompatible { pod_key: PodKey },
}

pub type PodKey = (String, String);

/// A node the current scheduling run has decided to create.
#[derive(Clone, Debug)]
pub struct SimulatedNodeClaim {
    pub pool_name: String,
    pub requirements: RequirementSet,
    pub instance_type: InstanceType,
    pub allocatable: ResourceList,
    pub daemonset_requests: ResourceList,
    pub pod_requests: ResourceList,
    pub pods: Vec<PodKey>,
}

impl SimulatedNodeClaim {
    fn available(&self) -> ResourceList {
        let mut available = self.allocatable.clone();
        for (key, qty) in self.daemonset_requests.iter().chain(self.pod_requests.iter()) {
            if let Some(existing) = available.get(key).copied() {
                available.insert(key.clone(), existing - *qty);
            }
        }
        available
    }

    fn fits(&self, requests: &ResourceList) -> bool {
        let available = self.available();
        requests
            .iter()
            .all(|(key, req_qty)| available.get(key).is_some_and(|avail| *avail >= *req_qty))
    }
}

/// The outcome of a scheduling simulation.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    /// Existing-node bindings: pod key -> target `providerID`.
    pub existing_node_bindings: BTreeMap<PodKey, String>,
    pub new_nodeclaims: Vec<SimulatedNodeClaim>,
    pub unschedulable: BTreeMap<PodKey, UnschedulableReason>,
}

/// The catalog lookup the Scheduler consults per-NodePool.
pub trait InstanceTypeSource {
    fn instance_types_for(&self, pool: &NodePool) -> Vec<InstanceType>;
}

/// Maximum instance types considered when sizing a new node.
pub const DEFAULT_TRUNCATE_CAP: usize = 60;

/// Simulates placement of `pods` onto `existing_nodes` and, where necessary, hypothetical new
/// nodes drawn from `pools`.
#[instrument(skip_all, fields(pods = pods.len(), pools = pools.len()))]
pub fn simulate(
    existing_nodes: &[StateNode],
    pods: Vec<PodInfo>,
    pools: &[NodePool],
    instance_types: &impl InstanceTypeSource,
    daemonset_pods: &[PodInfo],
) -> Solution {
    let mut solution = Solution::default();
    let mut nodes: Vec<StateNode> = existing_nodes.to_vec();

    let ordered_pools = sorted_pools(pools);
    let ordered_pods = order_pods(pods);

    for pod in ordered_pods {
        let pod_key: PodKey = (pod.namespace.clone(), pod.name.clone());
        let effective_requirements = match effective_requirements(&pod) {
            Ok(reqs) => reqs,
            Err(_) => {
                warn!(namespace = %pod_key.0, pod = %pod_key.1, "pod's own requirements are self-contradictory");
                solution.unschedulable.insert(
                    pod_key.clone(),
                    UnschedulableReason::Incompatible {
                        pod_key: pod_key.clone(),
                    },
                );
                continue;
            }
        };

        if let Some(provider_id) = place_on_existing(&mut nodes, &pod, &effective_requirements) {
            debug!(namespace = %pod_key.0, pod = %pod_key.1, %provider_id, "placed on existing node");
            solution.existing_node_bindings.insert(pod_key, provider_id);
            continue;
        }

        if place_on_simulated(&mut solution.new_nodeclaims, &pod, &effective_requirements) {
            debug!(namespace = %pod_key.0, pod = %pod_key.1, "placed on in-flight simulated node");
            solution
                .new_nodeclaims
                .last_mut()
                .expect("a simulated node exists, we just placed onto one")
                .pods
                .push(pod_key);
            continue;
        }

        match create_simulated_node(
            &pod,
            &effective_requirements,
            &ordered_pools,
            instance_types,
            daemonset_pods,
        ) {
            Ok(mut simulated) => {
                debug!(
                    namespace = %pod_key.0,
                    pod = %pod_key.1,
                    pool = %simulated.pool_name,
                    instance_type = %simulated.instance_type.name,
                    "created simulated node"
                );
                simulated.pods.push(pod_key.clone());
                solution.new_nodeclaims.push(simulated);
            }
            Err(reason) => {
                let discriminant: &'static str = UnschedulableReasonDiscriminants::from(&reason).into();
                debug!(namespace = %pod_key.0, pod = %pod_key.1, reason = discriminant, "pod is unschedulable");
                solution.unschedulable.insert(pod_key, reason);
            }
        }
    }

    merge_simulated_nodes(&mut solution.new_nodeclaims, pools);
    debug!(
        new_nodeclaims = solution.new_nodeclaims.len(),
        unschedulable = solution.unschedulable.len(),
        "scheduling simulation complete"
    );
    solution
}

/// NodePools cost-sorted by `weight` desc then name.
fn sorted_pools(pools: &[NodePool]) -> Vec<NodePool> {
    pools
        .iter()
        .cloned()
        .sorted_by(|a, b| {
            b.spec
                .weight
                .cmp(&a.spec.weight)
                .then_with(|| a.metadata.name.cmp(&b.metadata.name))
        })
        .collect()
}

/// Deterministic pod ordering: largest aggregate request first, tie-broken
/// by name; pods with do-not-disrupt, hostname node-selector, or spread constraints go first
/// within their bucket.
fn order_pods(pods: Vec<PodInfo>) -> Vec<PodInfo> {
    pods.into_iter()
        .sorted_by(|a, b| {
            priority_bucket(a)
                .cmp(&priority_bucket(b))
                .then_with(|| cmp_quantity(&aggregate_request(b), &aggregate_request(a)))
                .then_with(|| a.name.cmp(&b.name))
        })
        .collect()
}

fn priority_bucket(pod: &PodInfo) -> u8 {
    let has_priority = pod.do_not_disrupt
        || pod.node_selector.get("kubernetes.io/hostname").is_some()
        || !pod.topology_spread_constraints.is_empty();
    if has_priority { 0 } else { 1 }
}

fn zero_quantity() -> Quantity {
    "0".parse().expect("\"0\" is always a valid quantity")
}

fn cmp_quantity(a: &Quantity, b: &Quantity) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// A cheap, approximate ranking scalar: the CPU request
/// if present, else the first declared resource. Exact multi-resource fit checks elsewhere
/// (`node_is_candidate`, `SimulatedNodeClaim::fits`) always compare every resource precisely;
/// this value only orders the pending-pod batch.
fn aggregate_request(pod: &PodInfo) -> Quantity {
    pod.requests
        .get("cpu")
        .or_else(|| pod.requests.values().next())
        .copied()
        .unwrap_or_else(zero_quantity)
}

/// Effective requirements for a pod: node-selector ∪ node-affinity-required ∪
/// topology/affinity-derived constraints. Inter-pod-affinity derivation and tolerable-taint
/// negation are folded in by the caller when walking candidate nodes, since they depend on the
/// candidate being evaluated.
fn effective_requirements(pod: &PodInfo) -> Result<RequirementSet, requirements::RequirementError> {
    pod.node_selector.intersect(&pod.required_node_affinity)
}

/// Try existing nodes first, preferring the tightest fit (best-fit bin-packing).
fn place_on_existing(
    nodes: &mut [StateNode],
    pod: &PodInfo,
    requirements: &RequirementSet,
) -> Option<String> {
    let candidate_idx = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| node_is_candidate(n, pod, requirements))
        .min_by(|(_, a), (_, b)| cmp_quantity(&remaining_after(a, pod), &remaining_after(b, pod)))
        .map(|(idx, _)| idx)?;

    let node = &mut nodes[candidate_idx];
    let is_daemonset = pod.is_daemonset();
    node.bind_pod(&pod.requests, is_daemonset);
    node.host_port_usage.extend(pod.host_ports.clone());
    Some(node.provider_id.clone())
}

fn node_is_candidate(node: &StateNode, pod: &PodInfo, requirements: &RequirementSet) -> bool {
    if node.marked_for_deletion || !node.ready() {
        return false;
    }

    let node_labels = RequirementSet::from_requirements(
        node.labels()
            .iter()
            .map(|(k, v)| crate::cloud::single_value(k, v)),
    )
    .unwrap_or_default();

    if !requirements.is_compatible(&node_labels, requirements::CompatibilityOptions {
        allow_undeclared_well_known: true,
    }) {
        return false;
    }

    if !node.fits(&pod.requests) {
        return false;
    }

    if !node
        .taints()
        .iter()
        .all(|taint| pod.tolerations.iter().any(|t| t.tolerates(taint)))
    {
        return false;
    }

    if pod
        .host_ports
        .iter()
        .any(|hp| node.host_port_usage.contains(hp))
    {
        return false;
    }

    true
}

/// A scalar "how close to exactly full" score used for best-fit ordering: prefers the node whose
/// remaining capacity is closest to (but not less than) the pod's request, so smaller is tighter.
/// Scored on the CPU resource alone, mirroring [`aggregate_request`]'s simplification.
fn remaining_after(node: &StateNode, pod: &PodInfo) -> Quantity {
    let available = node.available();
    let avail_cpu = available.get("cpu").copied().unwrap_or_else(zero_quantity);
    let req_cpu = pod.requests.get("cpu").copied().unwrap_or_else(zero_quantity);
    if avail_cpu.partial_cmp(&req_cpu) == Some(Ordering::Less) {
        zero_quantity()
    } else {
        avail_cpu - req_cpu
    }
}

/// Next, try in-flight simulated nodes from this run.
fn place_on_simulated(
    simulated: &mut [SimulatedNodeClaim],
    pod: &PodInfo,
    requirements: &RequirementSet,
) -> bool {
    let candidate = simulated
        .iter_mut()
        .filter(|s| {
            s.instance_type.requirements.is_compatible(
                requirements,
                requirements::CompatibilityOptions {
                    allow_undeclared_well_known: true,
                },
            ) && s.fits(&pod.requests)
        })
        .min_by(|a, b| {
            let rem_a = a.available().get("cpu").copied().unwrap_or_else(zero_quantity);
            let rem_b = b.available().get("cpu").copied().unwrap_or_else(zero_quantity);
            cmp_quantity(&rem_a, &rem_b)
        });

    let Some(node) = candidate else {
        return false;
    };

    for (key, qty) in &pod.requests {
        node.pod_requests
            .entry(key.clone())
            .and_modify(|existing| *existing += *qty)
            .or_insert(*qty);
    }
    true
}

/// Failing both, create a new simulated node by walking pools in weight order.
fn create_simulated_node(
    pod: &PodInfo,
    requirements: &RequirementSet,
    pools: &[NodePool],
    instance_types: &impl InstanceTypeSource,
    daemonset_pods: &[PodInfo],
) -> Result<SimulatedNodeClaim, UnschedulableReason> {
    let pod_key: PodKey = (pod.namespace.clone(), pod.name.clone());
    let mut saw_incompatible_pool = true;
    let mut saw_insufficient = false;
    let mut saw_taints_not_tolerated = false;

    for pool in pools {
        // Taints on `pool.spec.taints` persist for the node's entire lifetime, so a
        // pod that can't tolerate them can never land here regardless of instance type.
        if !pool
            .spec
            .taints
            .iter()
            .all(|taint| pod.tolerations.iter().any(|t| t.tolerates(taint)))
        {
            saw_taints_not_tolerated = true;
            continue;
        }

        let pool_requirements = match pool_requirement_set(pool) {
            Ok(reqs) => reqs,
            Err(_) => continue,
        };

        let Ok(merged) = pool_requirements.intersect(requirements) else {
            continue;
        };
        saw_incompatible_pool = false;

        let mut candidates = instance_types.instance_types_for(pool);
        candidates.retain(|it| it.has_compatible(&merged));
        if candidates.is_empty() {
            saw_insufficient = true;
            continue;
        }

        if merged.has_min_values() {
            match crate::cloud::truncate(&mut candidates, &merged, DEFAULT_TRUNCATE_CAP) {
                Ok(()) => {}
                Err(crate::cloud::TruncateError::MinValuesViolated { key, .. }) => {
                    return Err(UnschedulableReason::MinValuesUnsatisfied {
                        pod_key: pod_key.clone(),
                        key,
                    });
                }
            }
        } else {
            let _ = crate::cloud::truncate(&mut candidates, &merged, DEFAULT_TRUNCATE_CAP);
        }

        let daemonset_requests = daemonset_requests_for(daemonset_pods, &merged);

        for instance_type in candidates {
            let allocatable = instance_type.allocatable();
            let mut available = allocatable.clone();
            for (key, qty) in &daemonset_requests {
                if let Some(existing) = available.get(key).copied() {
                    available.insert(key.clone(), existing - *qty);
                }
            }

            let fits = pod
                .requests
                .iter()
                .all(|(key, req)| available.get(key).is_some_and(|avail| *avail >= *req));

            if !fits {
                saw_insufficient = true;
                continue;
            }

            return Ok(SimulatedNodeClaim {
                pool_name: pool.metadata.name.clone().unwrap_or_default(),
                requirements: merged,
                instance_type,
                allocatable,
                daemonset_requests,
                pod_requests: pod.requests.clone(),
                pods: vec![],
            });
        }
    }

    if saw_incompatible_pool && saw_taints_not_tolerated {
        Err(UnschedulableReason::TaintsNotTolerated { pod_key })
    } else if saw_incompatible_pool {
        Err(UnschedulableReason::PodFitsOnNoInstanceType { pod_key })
    } else if saw_insufficient {
        Err(UnschedulableReason::Insufficient { pod_key })
    } else {
        Err(UnschedulableReason::Incompatible { pod_key })
    }
}

fn pool_requirement_set(
    pool: &NodePool,
) -> Result<RequirementSet, requirements::RequirementError> {
    RequirementSet::from_requirements(pool.spec.requirements.iter().map(requirements::from_wire))
}

/// Pre-deduct DaemonSet-pod requirements compatible with `reqs`.
fn daemonset_requests_for(daemonset_pods: &[PodInfo], reqs: &RequirementSet) -> ResourceList {
    let mut total = ResourceList::new();
    for pod in daemonset_pods {
        let Ok(pod_reqs) = effective_requirements(pod) else {
            continue;
        };
        if !pod_reqs.is_compatible(reqs, requirements::CompatibilityOptions {
            allow_undeclared_well_known: true,
        }) {
            continue;
        }
        for (key, qty) in &pod.requests {
            total
                .entry(key.clone())
                .and_modify(|existing| *existing += *qty)
                .or_insert(*qty);
        }
    }
    total
}

/// Solution merging: coalesce simulated nodes sharing identical (pool, requirements,
/// instance-type) whose combined requests still fit the cheapest surviving type, up to the
/// pool's `limits`.
fn merge_simulated_nodes(nodes: &mut Vec<SimulatedNodeClaim>, pools: &[NodePool]) {
    let limits: BTreeMap<String, ResourceList> = pools
        .iter()
        .filter_map(|p| {
            p.metadata
                .name
                .clone()
                .zip(p.spec.limits.clone().map(|l| {
                    l.into_iter()
                        .filter_map(|(k, v)| {
                            stackable_operator::quantity::Quantity::try_from(&v)
                                .ok()
                                .map(|q| (k, q))
                        })
                        .collect::<ResourceList>()
                }))
        })
        .collect();

    let mut merged: Vec<SimulatedNodeClaim> = Vec::new();
    'outer: for node in nodes.drain(..) {
        for existing in merged.iter_mut() {
            let same_shape = existing.pool_name == node.pool_name
                && existing.instance_type.name == node.instance_type.name
                && existing.requirements == node.requirements;
            if !same_shape {
                continue;
            }

            let mut combined_pods = existing.pod_requests.clone();
            for (key, qty) in &node.pod_requests {
                combined_pods
                    .entry(key.clone())
                    .and_modify(|e| *e += *qty)
                    .or_insert(*qty);
            }

            let within_limits = limits
                .get(&node.pool_name)
                .is_none_or(|limit| combined_pods.iter().all(|(k, v)| limit.get(k).is_none_or(|l| *v <= *l)));

            let fits_type = combined_pods.iter().all(|(k, v)| {
                existing.allocatable.get(k).is_some_and(|allocatable| {
                    let daemonset = existing.daemonset_requests.get(k).copied();
                    let total = daemonset.map_or(*v, |ds| ds + *v);
                    *allocatable >= total
                })
            });

            if within_limits && fits_type {
                existing.pod_requests = combined_pods;
                existing.pods.extend(node.pods);
                continue 'outer;
            }
        }
        merged.push(node);
    }

    *nodes = merged;
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use stackable_autoscaler_crd::{
        nodeclass::NodeClassReference,
        nodepool::v1alpha1::NodePoolSpec,
        requirement::{NodeSelectorRequirement, RequirementOperator},
    };

    use super::*;
    use crate::domain::{PodOwner, PodPhase};

    fn qty(n: &str) -> Quantity {
        n.parse().unwrap()
    }

    fn node_class_ref() -> NodeClassReference {
        NodeClassReference {
            group: "example.com".to_string(),
            kind: "ExampleNodeClass".to_string(),
            name: "default".to_string(),
        }
    }

    fn pool(name: &str, requirements: Vec<NodeSelectorRequirement>, weight: i32) -> NodePool {
        NodePool {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: NodePoolSpec {
                requirements,
                node_class_ref: node_class_ref(),
                taints: Vec::new(),
                startup_taints: Vec::new(),
                expire_after: None,
                termination_grace_period: None,
                limits: None,
                weight,
                disruption: Default::default(),
            },
            status: None,
        }
    }

    fn requirement(key: &str, values: &[&str]) -> NodeSelectorRequirement {
        NodeSelectorRequirement {
            key: key.to_string(),
            operator: RequirementOperator::In,
            values: values.iter().map(|s| s.to_string()).collect(),
            min_values: None,
        }
    }

    fn pod(name: &str, cpu: &str) -> PodInfo {
        PodInfo {
            namespace: "default".into(),
            name: name.into(),
            requests: ResourceList::from([("cpu".to_string(), qty(cpu))]),
            node_selector: Default::default(),
            required_node_affinity: Default::default(),
            tolerations: vec![],
            topology_spread_constraints: vec![],
            required_pod_affinity: vec![],
            required_pod_anti_affinity: vec![],
            host_ports: vec![],
            volume_claims: vec![],
            bound_node_name: None,
            owner: PodOwner::None,
            do_not_disrupt: false,
            do_not_evict: false,
            scheduling_gates: vec![],
            phase: PodPhase::Pending,
        }
    }

    fn instance_type(name: &str, cpu: &str, price: f64, zone: &str) -> InstanceType {
        InstanceType {
            name: name.to_string(),
            requirements: RequirementSet::from_requirements([crate::cloud::single_value(
                stackable_autoscaler_crd::labels::LABEL_ARCH,
                "amd64",
            )])
            .unwrap(),
            capacity: ResourceList::from([("cpu".to_string(), qty(cpu))]),
            overhead: ResourceList::new(),
            offerings: vec![crate::cloud::on_demand_offering(zone, price, true)],
        }
    }

    /// A fixed catalog, the same for every pool (tests don't need per-pool catalogs).
    struct FixedCatalog(Vec<InstanceType>);

    impl InstanceTypeSource for FixedCatalog {
        fn instance_types_for(&self, _pool: &NodePool) -> Vec<InstanceType> {
            self.0.clone()
        }
    }

    /// Basic provisioning: three 1-vCPU pods against a catalog of
    /// `m.small` (2 vCPU, cheaper) and `m.large` (8 vCPU); expect a single `m.small` NodeClaim
    /// holding all three pods.
    #[test]
    fn basic_provisioning_picks_cheapest_fitting_type() {
        let pools = vec![pool(
            "general-purpose",
            vec![requirement(stackable_autoscaler_crd::labels::LABEL_ARCH, &["amd64"])],
            1,
        )];
        let catalog = FixedCatalog(vec![
            instance_type("m.small", "2", 0.05, "z1"),
            instance_type("m.large", "8", 0.20, "z1"),
        ]);
        let pods = vec![pod("a", "1"), pod("b", "1"), pod("c", "1")];

        let solution = simulate(&[], pods, &pools, &catalog, &[]);

        assert!(solution.unschedulable.is_empty());
        assert_eq!(solution.new_nodeclaims.len(), 1);
        let claim = &solution.new_nodeclaims[0];
        assert_eq!(claim.instance_type.name, "m.small");
        assert_eq!(claim.pods.len(), 3);
    }

    /// Boundary behavior: `minValues = n` with exactly `n-1` compatible values fails.
    #[test]
    fn min_values_unsatisfied_reports_specific_reason() {
        let pools = vec![pool(
            "general-purpose",
            vec![
                requirement(stackable_autoscaler_crd::labels::LABEL_ARCH, &["amd64"]),
                {
                    let mut req = requirement("instance-family", &["m", "c", "r"]);
                    req.min_values = Some(2);
                    req
                },
            ],
            1,
        )];

        // Catalog only ever exposes family "m" under this key, so only one of the three allowed
        // values is ever actually available: minValues=2 cannot be met.
        let mut family_m = instance_type("m.small", "2", 0.05, "z1");
        family_m
            .requirements
            .insert(crate::cloud::single_value("instance-family", "m"))
            .unwrap();
        let catalog = FixedCatalog(vec![family_m]);

        let solution = simulate(&[], vec![pod("a", "1")], &pools, &catalog, &[]);

        assert!(solution.new_nodeclaims.is_empty());
        assert_eq!(
            solution.unschedulable.get(&("default".to_string(), "a".to_string())),
            Some(&UnschedulableReason::MinValuesUnsatisfied {
                pod_key: ("default".to_string(), "a".to_string()),
                key: "instance-family".to_string(),
            })
        );
    }

    /// DaemonSet-pod requirements are pre-deducted from the chosen type's allocatable: a node
    /// otherwise big enough for the pod is skipped if the DaemonSet overhead doesn't leave room.
    #[test]
    fn daemonset_overhead_is_preempted_from_new_node() {
        let pools = vec![pool(
            "general-purpose",
            vec![requirement(stackable_autoscaler_crd::labels::LABEL_ARCH, &["amd64"])],
            1,
        )];
        let catalog = FixedCatalog(vec![instance_type("m.small", "2", 0.05, "z1")]);
        let mut daemonset_pod = pod("fluentd", "1.5");
        daemonset_pod.owner = PodOwner::DaemonSet { name: "fluentd".into() };

        let solution = simulate(&[], vec![pod("a", "1")], &pools, &catalog, &[daemonset_pod]);

        // 2 vCPU capacity - 1.5 vCPU daemonset overhead = 0.5 vCPU available, not enough for a
        // 1 vCPU pod: unschedulable as Insufficient, not placed.
        assert!(solution.new_nodeclaims.is_empty());
        assert!(matches!(
            solution.unschedulable.get(&("default".to_string(), "a".to_string())),
            Some(UnschedulableReason::Insufficient { .. })
        ));
    }

    /// Best-fit: among two existing nodes that both fit, the tighter one wins.
    #[test]
    fn existing_node_placement_prefers_tightest_fit() {
        let mut loose = StateNode {
            provider_id: "loose".into(),
            allocatable: ResourceList::from([("cpu".to_string(), qty("8"))]),
            initialized: true,
            ..Default::default()
        };
        loose.node = Some(crate::domain::NodeInfo {
            provider_id: "loose".into(),
            name: "loose".into(),
            labels: Default::default(),
            taints: vec![],
            ready: true,
            allocatable: loose.allocatable.clone(),
            unhealthy_condition_since: None,
        });

        let mut tight = StateNode {
            provider_id: "tight".into(),
            allocatable: ResourceList::from([("cpu".to_string(), qty("2"))]),
            initialized: true,
            ..Default::default()
        };
        tight.node = Some(crate::domain::NodeInfo {
            provider_id: "tight".into(),
            name: "tight".into(),
            labels: Default::default(),
            taints: vec![],
            ready: true,
            allocatable: tight.allocatable.clone(),
            unhealthy_condition_since: None,
        });

        let nodes = vec![loose, tight];
        let catalog = FixedCatalog(vec![]);
        let solution = simulate(&nodes, vec![pod("a", "1")], &[], &catalog, &[]);

        assert!(solution.new_nodeclaims.is_empty());
        assert_eq!(
            solution.existing_node_bindings.get(&("default".to_string(), "a".to_string())),
            Some(&"tight".to_string())
        );
    }

    /// Solution merging: two pods each sized to need their own node if placed in
    /// isolation still coalesce onto one node when, combined, they fit the cheapest type.
    #[test]
    fn solution_merging_coalesces_compatible_simulated_nodes() {
        let pools = vec![pool(
            "general-purpose",
            vec![requirement(stackable_autoscaler_crd::labels::LABEL_ARCH, &["amd64"])],
            1,
        )];
        let catalog = FixedCatalog(vec![instance_type("m.small", "4", 0.05, "z1")]);

        let solution = simulate(&[], vec![pod("a", "1"), pod("b", "1")], &pools, &catalog, &[]);

        assert!(solution.unschedulable.is_empty());
        assert_eq!(solution.new_nodeclaims.len(), 1);
        assert_eq!(solution.new_nodeclaims[0].pods.len(), 2);
    }

    /// No node tolerates this pod's taints: a pool whose persistent taints the pod can't
    /// tolerate is skipped even though its catalog would otherwise fit.
    #[test]
    fn taints_not_tolerated_reported_when_no_pool_is_tolerable() {
        let mut tainted_pool = pool(
            "tainted",
            vec![requirement(stackable_autoscaler_crd::labels::LABEL_ARCH, &["amd64"])],
            1,
        );
        tainted_pool.spec.taints.push(stackable_autoscaler_crd::requirement::Taint {
            key: "dedicated".to_string(),
            value: Some("gpu".to_string()),
            effect: stackable_autoscaler_crd::requirement::TaintEffect::NoSchedule,
        });
        let catalog = FixedCatalog(vec![instance_type("m.small", "2", 0.05, "z1")]);

        let solution = simulate(&[], vec![pod("a", "1")], &[tainted_pool], &catalog, &[]);

        assert!(solution.new_nodeclaims.is_empty());
        assert_eq!(
            solution.unschedulable.get(&("default".to_string(), "a".to_string())),
            Some(&UnschedulableReason::TaintsNotTolerated {
                pod_key: ("default".to_string(), "a".to_string())
            })
        );
    }
}
