//! InstanceType Catalog.
//!
//! `InstanceType`/`Offering` are the in-memory shapes a `CloudProvider::get_instance_types`
//! implementation returns per NodePool. This module owns only the queries the Scheduler and
//! Disruption Engine need over that catalog.

use std::collections::BTreeMap;

use snafu::Snafu;
use stackable_autoscaler_crd::labels::{CAPACITY_TYPE_ON_DEMAND, CAPACITY_TYPE_SPOT};
use stackable_autoscaler_crd::nodeclaim::v1alpha1::NodeClaim;
use stackable_autoscaler_crd::nodeclass::NodeClassReference;
use stackable_autoscaler_crd::nodepool::v1alpha1::NodePool;
use stackable_operator::quantity::Quantity;

use crate::{
    disruption::RepairPolicy,
    requirements::{Requirement, RequirementSet},
};

pub type ResourceList = BTreeMap<String, Quantity>;

/// A concrete (zone, capacity-type, price, availability) tuple a catalog entry offers.
#[derive(Clone, Debug, PartialEq)]
pub struct Offering {
    pub requirements: RequirementSet,
    pub price: f64,
    pub available: bool,
}

impl Offering {
    pub fn zone(&self) -> Option<&str> {
        self.requirements
            .get(stackable_autoscaler_crd::labels::LABEL_TOPOLOGY_ZONE)
            .and_then(|r| r.values.iter().next())
            .map(String::as_str)
    }

    pub fn capacity_type(&self) -> Option<&str> {
        self.requirements
            .get(stackable_autoscaler_crd::labels::CAPACITY_TYPE_LABEL)
            .and_then(|r| r.values.iter().next())
            .map(String::as_str)
    }

    pub fn is_spot(&self) -> bool {
        self.capacity_type() == Some(CAPACITY_TYPE_SPOT)
    }
}

/// A catalog entry: an instance shape with its requirements, capacity, overhead, and offerings.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceType {
    pub name: String,
    pub requirements: RequirementSet,
    pub capacity: ResourceList,
    pub overhead: ResourceList,
    pub offerings: Vec<Offering>,
}

impl InstanceType {
    /// `allocatable = capacity - overhead`, computed once and cached by the caller.
    pub fn allocatable(&self) -> ResourceList {
        subtract_resource_lists(&self.capacity, &self.overhead)
    }

    /// Offerings compatible with `reqs` (zone/capacity-type constraints included).
    pub fn compatible_offerings<'a>(
        &'a self,
        reqs: &'a RequirementSet,
    ) -> impl Iterator<Item = &'a Offering> {
        self.offerings
            .iter()
            .filter(move |o| self.requirements.is_compatible(reqs, Default::default()) && o.requirements_compatible(reqs))
    }

    pub fn available(&self) -> impl Iterator<Item = &Offering> {
        self.offerings.iter().filter(|o| o.available)
    }

    /// `Cheapest`: the lowest-priced available, compatible offering.
    pub fn cheapest(&self, reqs: &RequirementSet) -> Option<&Offering> {
        self.compatible_offerings(reqs)
            .filter(|o| o.available)
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    pub fn most_expensive(&self, reqs: &RequirementSet) -> Option<&Offering> {
        self.compatible_offerings(reqs)
            .filter(|o| o.available)
            .max_by(|a, b| a.price.total_cmp(&b.price))
    }

    pub fn has_compatible(&self, reqs: &RequirementSet) -> bool {
        self.compatible_offerings(reqs).any(|o| o.available)
    }

    /// `WorstLaunchPrice`: the max price among spot-compatible offerings if spot is
    /// allowed by `reqs`, else the max on-demand price. Used conservatively by the Disruption
    /// Engine to avoid under-costing a replacement.
    pub fn worst_launch_price(&self, reqs: &RequirementSet) -> Option<f64> {
        let spot_allowed = reqs
            .get(stackable_autoscaler_crd::labels::CAPACITY_TYPE_LABEL)
            .is_none_or(|r| r.has(CAPACITY_TYPE_SPOT));

        let mut candidates = self.compatible_offerings(reqs).peekable();
        if spot_allowed {
            candidates
                .filter(|o| o.is_spot())
                .map(|o| o.price)
                .fold(None::<f64>, |acc, p| Some(acc.map_or(p, |m: f64| m.max(p))))
        } else {
            candidates
                .filter(|o| !o.is_spot())
                .map(|o| o.price)
                .fold(None::<f64>, |acc, p| Some(acc.map_or(p, |m: f64| m.max(p))))
        }
    }
}

impl Offering {
    fn requirements_compatible(&self, reqs: &RequirementSet) -> bool {
        self.requirements.is_compatible(reqs, Default::default())
    }
}

fn subtract_resource_lists(capacity: &ResourceList, overhead: &ResourceList) -> ResourceList {
    let mut result = capacity.clone();
    for (key, overhead_qty) in overhead {
        if let Some(existing) = result.get(key).cloned() {
            result.insert(key.clone(), existing - *overhead_qty);
        }
    }
    result
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum TruncateError {
    #[snafu(display(
        "truncating the instance type list to {max_items} entries would violate minValues for key {key:?}"
    ))]
    MinValuesViolated { max_items: usize, key: String },
}

/// `Truncate(reqs, maxItems)`: sort by cheapest compatible offering, keep `maxItems`; if
/// the resulting prefix fails `SatisfiesMinValues`, return an error and leave the list unchanged.
pub fn truncate(
    instance_types: &mut Vec<InstanceType>,
    reqs: &RequirementSet,
    max_items: usize,
) -> Result<(), TruncateError> {
    instance_types.sort_by(|a, b| {
        let price_a = a.cheapest(reqs).map(|o| o.price).unwrap_or(f64::INFINITY);
        let price_b = b.cheapest(reqs).map(|o| o.price).unwrap_or(f64::INFINITY);
        price_a
            .total_cmp(&price_b)
            .then_with(|| a.name.cmp(&b.name))
    });

    if instance_types.len() <= max_items {
        return Ok(());
    }

    if reqs.has_min_values() {
        let prefix = &instance_types[..max_items];
        if let Err(err) = reqs.satisfies_min_values(prefix) {
            let key = match err {
                crate::requirements::RequirementError::MinValuesUnsatisfied { key } => key,
                other => other.to_string(),
            };
            return MinValuesViolatedSnafu { max_items, key }.fail();
        }
    }

    instance_types.truncate(max_items);
    Ok(())
}

/// Errors the [`CloudProvider`] interface reports back to the NodeClaim Lifecycle.
/// `NodeClaimNotFound` is the sentinel the instance-termination poll waits for before the
/// finalizer is removed.
#[derive(Debug, Snafu)]
pub enum CloudProviderError {
    #[snafu(display("insufficient capacity for instance type {instance_type:?} in {zone:?}/{capacity_type:?}"))]
    InsufficientCapacity {
        instance_type: String,
        zone: String,
        capacity_type: String,
    },

    #[snafu(display("NodeClass {node_class:?} is not Ready"))]
    NodeClassNotReady { node_class: String },

    #[snafu(display("no NodeClaim backs providerID {provider_id:?}"))]
    NodeClaimNotFound { provider_id: String },

    #[snafu(display("cloud provider call failed: {message}"))]
    Other { message: String },
}

/// The single external collaborator the core depends on. The core
/// never implements this — cloud-specific crates do — but the trait lives here because the
/// Scheduler's [`InstanceTypeSource`](crate::scheduler::InstanceTypeSource) and the Disruption
/// Engine's replacement simulation are both defined in terms of the catalog this interface
/// returns.
#[async_trait::async_trait]
pub trait CloudProvider: Send + Sync {
    /// Launches an instance for `nodeclaim`, returning it with `status.provider_id` and resolved
    /// labels/capacity/allocatable populated.
    async fn create(&self, nodeclaim: &NodeClaim) -> Result<NodeClaim, CloudProviderError>;

    /// Terminates the instance backing `nodeclaim`. Returns `NodeClaimNotFound` once the instance
    /// is confirmed gone.
    async fn delete(&self, nodeclaim: &NodeClaim) -> Result<(), CloudProviderError>;

    async fn get(&self, provider_id: &str) -> Result<NodeClaim, CloudProviderError>;

    async fn list(&self) -> Result<Vec<NodeClaim>, CloudProviderError>;

    /// The instance-type catalog available to `nodepool`.
    async fn instance_types(&self, nodepool: &NodePool) -> Result<Vec<InstanceType>, CloudProviderError>;

    /// Cloud-provider-reported drift (e.g. an AMI rollout), the lowest-precedence drift source.
    /// `None` means the cloud provider sees no drift.
    async fn is_drifted(&self, nodeclaim: &NodeClaim) -> Result<Option<String>, CloudProviderError>;

    /// A hash of the current state of the NodeClass `node_class_ref` points at, for the
    /// second-precedence drift source (NodeClass hash mismatch). NodeClass is provider-defined
    /// and opaque to this crate, so only the cloud provider integration can resolve its current
    /// content; `None` means this provider doesn't track a NodeClass hash, in which case this
    /// source never contributes a mismatch.
    async fn node_class_hash(
        &self,
        node_class_ref: &NodeClassReference,
    ) -> Result<Option<String>, CloudProviderError>;

    /// Node-repair policies this provider publishes. An empty vec disables the
    /// feature-gated repair path regardless of `featureGates.nodeRepair`.
    fn repair_policies(&self) -> Vec<RepairPolicy>;

    /// The `{group, kind}` pairs of NodeClass objects this provider understands.
    fn supported_node_classes(&self) -> Vec<(String, String)>;

    fn name(&self) -> &str;
}

/// Well-known requirement helper: a single-value `In` requirement, the common shape used for
/// zone/capacity-type/arch/os requirements.
pub fn single_value(key: &str, value: &str) -> Requirement {
    Requirement::new(
        key,
        stackable_autoscaler_crd::requirement::RequirementOperator::In,
        [value.to_string()],
    )
}

pub fn offering(zone: &str, capacity_type: &str, price: f64, available: bool) -> Offering {
    let requirements = RequirementSet::from_requirements([
        single_value(stackable_autoscaler_crd::labels::LABEL_TOPOLOGY_ZONE, zone),
        single_value(
            stackable_autoscaler_crd::labels::CAPACITY_TYPE_LABEL,
            capacity_type,
        ),
    ])
    .expect("zone and capacity-type keys are distinct, intersection cannot fail");

    Offering {
        requirements,
        price,
        available,
    }
}

pub fn on_demand_offering(zone: &str, price: f64, available: bool) -> Offering {
    offering(zone, CAPACITY_TYPE_ON_DEMAND, price, available)
}

impl InstanceType {
    /// Builds a minimal fixture for unit tests: a single-value `In` requirement for `key` plus an
    /// on-demand offering in `z1` at an arbitrary price.
    #[cfg(test)]
    pub fn test_fixture(
        name: &str,
        extra_requirements: impl IntoIterator<Item = (String, Requirement)>,
    ) -> Self {
        let mut requirements = RequirementSet::new();
        for (_, req) in extra_requirements {
            requirements.insert(req).expect("test fixture requirements do not conflict");
        }
        Self {
            name: name.to_string(),
            requirements,
            capacity: ResourceList::new(),
            overhead: ResourceList::new(),
            offerings: vec![on_demand_offering("z1", 0.1, true)],
        }
    }
}

#[cfg(test)]
mod tests {
    use stackable_autoscaler_crd::requirement::RequirementOperator;

    use super::*;

    fn it(name: &str, offerings: Vec<Offering>) -> InstanceType {
        InstanceType {
            name: name.to_string(),
            requirements: RequirementSet::from_requirements([single_value(
                stackable_autoscaler_crd::labels::LABEL_ARCH,
                "amd64",
            )])
            .unwrap(),
            capacity: ResourceList::new(),
            overhead: ResourceList::new(),
            offerings,
        }
    }

    /// A requester's `reqs` must restate every key an instance type declares intrinsically
    /// (`is_compatible` with `allow_undeclared_well_known: false` is strict), so every fixture
    /// here declares `arch` to match [`it`]'s fixture instance type.
    fn reqs_with_arch() -> RequirementSet {
        RequirementSet::from_requirements([single_value(
            stackable_autoscaler_crd::labels::LABEL_ARCH,
            "amd64",
        )])
        .unwrap()
    }

    #[test]
    fn cheapest_picks_lowest_available_price() {
        let instance = it(
            "m.small",
            vec![
                on_demand_offering("z1", 0.10, true),
                on_demand_offering("z1", 0.05, false),
                on_demand_offering("z2", 0.20, true),
            ],
        );
        let reqs = reqs_with_arch();
        assert_eq!(instance.cheapest(&reqs).unwrap().price, 0.10);
    }

    #[test]
    fn cheapest_excludes_instance_type_whose_intrinsic_requirements_go_unmentioned() {
        let instance = it("m.small", vec![on_demand_offering("z1", 0.10, true)]);
        let reqs = RequirementSet::new();
        assert!(instance.cheapest(&reqs).is_none());
    }

    #[test]
    fn worst_launch_price_prefers_spot_when_allowed() {
        let instance = it(
            "m.small",
            vec![
                offering("z1", CAPACITY_TYPE_SPOT, 0.04, true),
                offering("z1", CAPACITY_TYPE_SPOT, 0.06, true),
                on_demand_offering("z1", 0.10, true),
            ],
        );
        let reqs = reqs_with_arch();
        assert_eq!(instance.worst_launch_price(&reqs), Some(0.06));
    }

    #[test]
    fn worst_launch_price_falls_back_to_on_demand_when_spot_excluded() {
        let instance = it(
            "m.small",
            vec![
                offering("z1", CAPACITY_TYPE_SPOT, 0.04, true),
                on_demand_offering("z1", 0.10, true),
                on_demand_offering("z1", 0.12, true),
            ],
        );
        let mut reqs = reqs_with_arch();
        reqs.insert(Requirement::new(
            stackable_autoscaler_crd::labels::CAPACITY_TYPE_LABEL,
            RequirementOperator::In,
            [CAPACITY_TYPE_ON_DEMAND.to_string()],
        ))
        .unwrap();
        assert_eq!(instance.worst_launch_price(&reqs), Some(0.12));
    }

    #[test]
    fn truncate_keeps_cheapest_prefix() {
        let mut instances = vec![
            it("expensive", vec![on_demand_offering("z1", 1.0, true)]),
            it("cheap", vec![on_demand_offering("z1", 0.1, true)]),
        ];
        truncate(&mut instances, &reqs_with_arch(), 1).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "cheap");
    }
}
