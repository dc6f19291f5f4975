//! Well-known label and annotation keys.
//!
//! Modeled as `const`s rather than an enum so they can be used directly as
//! [`stackable_operator::kvp::Label`]/[`stackable_operator::kvp::Annotation`] keys, following the
//! same `concatcp!`-built-prefix convention as
//! [`stackable_operator::kvp::consts::keys`].

use const_format::concatcp;

/// The domain every label/annotation this system owns is namespaced under.
pub const GROUP: &str = "autoscaling.kubernetes.stackable.tech";

/// Labels the [`NodePool`](crate::nodepool::v1alpha1::NodePool) that launched a node.
pub const NODEPOOL_LABEL: &str = concatcp!(GROUP, "/nodepool");

/// Labels the capacity type (`on-demand`/`spot`) a node was launched as.
pub const CAPACITY_TYPE_LABEL: &str = concatcp!(GROUP, "/capacity-type");

/// Present (value `"true"`) once a [`NodeClaim`](crate::nodeclaim::v1alpha1::NodeClaim) reaches
/// `Initialized`.
pub const INITIALIZED_LABEL: &str = concatcp!(GROUP, "/initialized");

/// Present (value `"true"`) once a [`NodeClaim`](crate::nodeclaim::v1alpha1::NodeClaim) reaches
/// `Registered`.
pub const REGISTERED_LABEL: &str = concatcp!(GROUP, "/registered");

/// Annotation carrying the hash of the [`NodePool`](crate::nodepool::v1alpha1::NodePool) template
/// a [`NodeClaim`](crate::nodeclaim::v1alpha1::NodeClaim) was launched from, for drift detection.
pub const NODEPOOL_HASH_ANNOTATION: &str = concatcp!(GROUP, "/nodepool-hash");

/// Annotation carrying the hashing scheme version used to compute
/// [`NODEPOOL_HASH_ANNOTATION`], so that a hashing-algorithm change does not manifest as
/// spurious drift.
pub const NODEPOOL_HASH_VERSION_ANNOTATION: &str = concatcp!(GROUP, "/nodepool-hash-version");

/// Annotation carrying the hash of the NodeClass a NodeClaim was launched from, the
/// second-precedence drift source, set alongside [`NODEPOOL_HASH_ANNOTATION`] at launch.
pub const NODECLASS_HASH_ANNOTATION: &str = concatcp!(GROUP, "/nodeclass-hash");

/// Annotation set on first drain attempt to the deadline past which PDBs may be violated, derived
/// from the owning `NodePool`'s `terminationGracePeriod`.
pub const TERMINATION_TIMESTAMP_ANNOTATION: &str = concatcp!(GROUP, "/termination-timestamp");

pub const DISRUPTION_REASON_ANNOTATION: &str = concatcp!(GROUP, "/disruption-reason");

/// Applied to a Node once its NodeClaim begins terminating, so the default scheduler stops
/// placing new pods on it for the duration of drain.
pub const DISRUPTING_TAINT_KEY: &str = concatcp!(GROUP, "/disrupting");

/// Well-known capacity-type values.
pub const CAPACITY_TYPE_ON_DEMAND: &str = "on-demand";
pub const CAPACITY_TYPE_SPOT: &str = "spot";

/// Pod-level opt-outs.
///
/// Present on a pod (any value), makes every node hosting it ineligible for disruption.
pub const DO_NOT_DISRUPT_ANNOTATION: &str = concatcp!(GROUP, "/do-not-disrupt");

/// Present on a pod (any value), blocks eviction at drain time (but not instance deletion past
/// the NodeClaim's termination grace period).
pub const DO_NOT_EVICT_LABEL: &str = concatcp!(GROUP, "/do-not-evict");

/// Present on a NodePool or NodeClaim (any value), excludes it from every disruption method.
pub const NODE_DO_NOT_DISRUPT_ANNOTATION: &str = concatcp!(GROUP, "/node-do-not-disrupt");

/// Well-known topology/capability label keys the scheduler keys on. These are intentionally
/// spelled like the upstream Kubernetes well-known labels rather than under [`GROUP`], since they
/// describe intrinsic instance-type capabilities shared across the ecosystem.
pub const LABEL_TOPOLOGY_ZONE: &str = "topology.kubernetes.io/zone";
pub const LABEL_TOPOLOGY_REGION: &str = "topology.kubernetes.io/region";
pub const LABEL_ARCH: &str = "kubernetes.io/arch";
pub const LABEL_OS: &str = "kubernetes.io/os";
pub const LABEL_INSTANCE_TYPE: &str = "node.kubernetes.io/instance-type";

/// Reserved label domains that operator-authored requirements may not use, outside of the
/// `ALLOWED_WELL_KNOWN_LABELS` allow-list.
pub const RESERVED_LABEL_DOMAINS: &[&str] = &[GROUP, "kubernetes.io", "k8s.io"];

/// Well-known labels under a reserved domain that NodePool requirements are nonetheless allowed
/// to reference.
pub const ALLOWED_WELL_KNOWN_LABELS: &[&str] = &[
    LABEL_TOPOLOGY_ZONE,
    LABEL_TOPOLOGY_REGION,
    LABEL_ARCH,
    LABEL_OS,
    LABEL_INSTANCE_TYPE,
    CAPACITY_TYPE_LABEL,
];
