//! Disruption Engine.
//!
//! Like [`crate::scheduler`], the decision logic here is a set of pure functions over plain
//! values: budget arithmetic, candidate eligibility, emptiness/expiration/drift checks, and
//! consolidation validation (which re-invokes [`crate::scheduler::simulate`] as a replacement
//! simulator, checking whether displaced pods could be rescheduled elsewhere). Enactment —
//! tainting, annotating, creating the replacement
//! NodeClaim, deleting the originals through the orchestration queue — is I/O and lives in
//! `stackable-autoscaler-controller::disruption`.

use std::collections::BTreeMap;

use jiff::{SignedDuration, Timestamp};
use snafu::Snafu;
use stackable_autoscaler_crd::nodepool::v1alpha1::NodePool;
use stackable_autoscaler_crd::nodepool::{Budget, DisruptionReason};
use tracing::{debug, instrument};

use crate::{
    domain::PodInfo,
    requirements::RequirementSet,
    scheduler::{self, InstanceTypeSource, SimulatedNodeClaim},
    state::StateNode,
};

/// Fixed priority order in which disruption methods are evaluated.
pub const METHOD_PRIORITY: [Method; 6] = [
    Method::Expiration,
    Method::Drift,
    Method::Emptiness,
    Method::SingleNodeConsolidation,
    Method::MultiNodeConsolidation,
    Method::Unhealthy,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Method {
    Expiration,
    Drift,
    Emptiness,
    SingleNodeConsolidation,
    MultiNodeConsolidation,
    Unhealthy,
}

impl Method {
    pub fn reason(self) -> DisruptionReason {
        match self {
            Method::Expiration => DisruptionReason::Expired,
            Method::Drift => DisruptionReason::Drifted,
            Method::Emptiness => DisruptionReason::Empty,
            Method::SingleNodeConsolidation | Method::MultiNodeConsolidation => {
                DisruptionReason::Underutilized
            }
            Method::Unhealthy => DisruptionReason::Unhealthy,
        }
    }

    /// Whether this method requires the cost-reduction check:
    /// expiration and drift are disrupted unconditionally, consolidation is not.
    pub fn requires_cost_reduction(self) -> bool {
        matches!(
            self,
            Method::SingleNodeConsolidation | Method::MultiNodeConsolidation
        )
    }
}

// ---------------------------------------------------------------------------------------------
// Candidate eligibility
// ---------------------------------------------------------------------------------------------

/// Whether a `StateNode` may be considered for any disruption method at all:
/// `Initialized`, not already marked for deletion, not annotated do-not-disrupt, and not hosting
/// a do-not-disrupt pod.
pub fn is_disruption_candidate(
    node: &StateNode,
    node_annotated_do_not_disrupt: bool,
    bound_pods: &[PodInfo],
) -> bool {
    node.initialized
        && !node.marked_for_deletion
        && !node_annotated_do_not_disrupt
        && !bound_pods.iter().any(|p| p.do_not_disrupt)
}

// ---------------------------------------------------------------------------------------------
// Emptiness
// ---------------------------------------------------------------------------------------------

/// A node is empty iff every pod bound to it is daemonset/mirror/static/terminating.
pub fn is_empty(bound_pods: &[PodInfo]) -> bool {
    bound_pods.iter().all(|p| p.is_daemonset() || p.skip_on_drain())
}

/// Whether an empty node has been so for at least `consolidate_after`, measured from
/// `last_pod_event_time`.
pub fn empty_since(
    last_pod_event_time: Option<Timestamp>,
    now: Timestamp,
    consolidate_after: std::time::Duration,
) -> bool {
    match last_pod_event_time {
        None => true,
        Some(t) => now.duration_since(t).as_secs_f64() >= consolidate_after.as_secs_f64(),
    }
}

// ---------------------------------------------------------------------------------------------
// Expiration
// ---------------------------------------------------------------------------------------------

/// Whether a NodeClaim launched at `launched_at` has exceeded its pool's `expireAfter`.
pub fn is_expired(
    launched_at: Timestamp,
    expire_after: std::time::Duration,
    now: Timestamp,
) -> bool {
    now.duration_since(launched_at).as_secs_f64() >= expire_after.as_secs_f64()
}

// ---------------------------------------------------------------------------------------------
// Drift
// ---------------------------------------------------------------------------------------------

/// The source of a drift determination, in precedence order: NodePool hash mismatch first, then
/// NodeClass hash mismatch, then a cloud-provider-reported reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriftReason {
    NodePoolHashMismatch,
    NodeClassHashMismatch,
    CloudProviderReported(String),
}

/// Evaluates drift precedence: the first applicable source wins, independent of the
/// others' state.
#[instrument(level = "debug")]
pub fn drift_reason(
    nodepool_hash_matches: bool,
    nodeclass_hash_matches: bool,
    cloud_provider_drift: Option<String>,
) -> Option<DriftReason> {
    if !nodepool_hash_matches {
        debug!("drift source: NodePool hash mismatch");
        return Some(DriftReason::NodePoolHashMismatch);
    }
    if !nodeclass_hash_matches {
        debug!("drift source: NodeClass hash mismatch");
        return Some(DriftReason::NodeClassHashMismatch);
    }
    let reason = cloud_provider_drift.map(DriftReason::CloudProviderReported);
    if let Some(reason) = &reason {
        debug!(?reason, "drift source: cloud-provider-reported");
    }
    reason
}

// ---------------------------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum BudgetError {
    #[snafu(display("budget nodes value {value:?} is neither an integer nor a percentage"))]
    InvalidNodes { value: String },
}

/// Parses a `Budget::nodes` value (a bare integer or a `"N%"` percentage) against `total_nodes`,
/// rounding percentages up to mirror PodDisruptionBudget semantics.
pub fn parse_budget_nodes(nodes: &str, total_nodes: usize) -> Result<usize, BudgetError> {
    if let Some(pct) = nodes.strip_suffix('%') {
        let pct: f64 = pct
            .parse()
            .map_err(|_| BudgetError::InvalidNodes { value: nodes.to_string() })?;
        let allowed = (f64::from(u32::try_from(total_nodes).unwrap_or(u32::MAX)) * pct / 100.0).ceil();
        return Ok(allowed as usize);
    }
    nodes
        .parse()
        .map_err(|_| BudgetError::InvalidNodes { value: nodes.to_string() })
}

/// Whether `budget` is currently active: no schedule means always active; a schedule is active
/// only while `schedule_active` says so (actual cron evaluation is an external concern — the
/// cloud-agnostic core only needs the yes/no answer, matching how [`crate::state::ClusterState`]
/// takes `within_registration_window` as an injected predicate).
fn budget_active(budget: &Budget, schedule_active: &impl Fn(&str) -> bool) -> bool {
    match &budget.schedule {
        None => true,
        Some(schedule) => schedule_active(schedule),
    }
}

/// The count of NodeClaims in `reason` owned by a NodePool that may be disrupting concurrently,
/// given its `budgets` and current `total_nodes`. Active budgets intersect via
/// `min` aggregation.
#[instrument(skip(schedule_active))]
pub fn allowed_disrupting(
    budgets: &[Budget],
    reason: DisruptionReason,
    total_nodes: usize,
    schedule_active: impl Fn(&str) -> bool,
) -> usize {
    if budgets.is_empty() {
        return total_nodes;
    }

    let allowed = budgets
        .iter()
        .filter(|b| b.reasons.is_empty() || b.reasons.contains(&reason))
        .filter(|b| budget_active(b, &schedule_active))
        .filter_map(|b| parse_budget_nodes(&b.nodes, total_nodes).ok())
        .min()
        .unwrap_or(total_nodes);
    debug!(allowed, "budgets evaluated");
    allowed
}

// ---------------------------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------------------------

/// A validated disruption decision: removing `candidates` and (if any) launching `replacement`
/// is a legal disruption under the current budget and cost-reduction rules.
#[derive(Clone, Debug)]
pub struct ConsolidationPlan {
    pub candidate_provider_ids: Vec<String>,
    pub replacement: Option<SimulatedNodeClaim>,
}

/// If these candidates were removed, can the displaced pods be rescheduled elsewhere (possibly on
/// a new, cheaper NodeClaim)? Returns `None` if any displaced pod fails to reschedule, or (for
/// cost-sensitive methods) the replacement is not strictly cheaper.
///
/// `candidate_price` is the candidates' own `WorstLaunchPrice`-based cost, supplied by the caller
/// (it depends on the cloud catalog entry each candidate was launched from, which the core's
/// scheduler-facing types don't retain — see [`crate::cloud::InstanceType::worst_launch_price`]).
#[instrument(skip(remaining_nodes, candidate_price, displaced_pods, pools, instance_types, daemonset_pods), fields(method = ?method, candidates = candidate_provider_ids.len()))]
pub fn validate_consolidation(
    method: Method,
    remaining_nodes: &[StateNode],
    candidate_provider_ids: &[String],
    candidate_price: impl Fn(&str) -> f64,
    displaced_pods: Vec<PodInfo>,
    pools: &[NodePool],
    instance_types: &impl InstanceTypeSource,
    daemonset_pods: &[PodInfo],
) -> Option<ConsolidationPlan> {
    let solution = scheduler::simulate(remaining_nodes, displaced_pods, pools, instance_types, daemonset_pods);

    if !solution.unschedulable.is_empty() {
        debug!(
            unschedulable = solution.unschedulable.len(),
            "consolidation rejected: displaced pods could not all be rescheduled"
        );
        return None;
    }

    if method.requires_cost_reduction() {
        let candidate_total: f64 = candidate_provider_ids.iter().map(|id| candidate_price(id)).sum();
        let replacement_total: f64 = solution
            .new_nodeclaims
            .iter()
            .map(|claim| claim.instance_type.worst_launch_price(&claim.requirements).unwrap_or(f64::INFINITY))
            .sum();

        if !(replacement_total < candidate_total) {
            debug!(
                candidate_total,
                replacement_total, "consolidation rejected: replacement is not strictly cheaper"
            );
            return None;
        }
    }

    let replacement = solution.new_nodeclaims.into_iter().next();
    debug!(has_replacement = replacement.is_some(), "consolidation accepted");

    Some(ConsolidationPlan {
        candidate_provider_ids: candidate_provider_ids.to_vec(),
        replacement,
    })
}

// ---------------------------------------------------------------------------------------------
// Unhealthy / node repair
// ---------------------------------------------------------------------------------------------

/// A cloud-provider-published repair policy.
#[derive(Clone, Debug, PartialEq)]
pub struct RepairPolicy {
    pub condition_type: String,
    pub condition_status: String,
    pub toleration_duration: std::time::Duration,
}

/// Whether a node matching `policy`'s condition since `condition_since` is a repair candidate: it
/// must have held the condition continuously for at least `toleration_duration`.
pub fn is_repair_candidate(
    policy: &RepairPolicy,
    condition_since: Timestamp,
    now: Timestamp,
) -> bool {
    now.duration_since(condition_since).as_secs_f64() >= policy.toleration_duration.as_secs_f64()
}

/// The maximum fraction of a pool's nodes allowed to be unhealthy at once before repair is
/// withheld to avoid cascading failure.
pub const DEFAULT_MAX_UNHEALTHY_FRACTION: f64 = 0.2;

/// Whether repair may proceed for this pool right now: fewer than `max_fraction` of its nodes may
/// be unhealthy simultaneously. If not, only an event should be emitted by the caller.
pub fn unhealthy_repair_allowed(unhealthy_count: usize, pool_total: usize, max_fraction: f64) -> bool {
    if pool_total == 0 {
        return false;
    }
    let allowed = (unhealthy_count as f64 / pool_total as f64) < max_fraction;
    if !allowed {
        debug!(unhealthy_count, pool_total, "repair withheld: too many unhealthy nodes at once");
    }
    allowed
}

// ---------------------------------------------------------------------------------------------
// Pod-level helper (pure projection, mirrors `crate::state::ClusterState::pending_pods`)
// ---------------------------------------------------------------------------------------------

/// Groups pods bound to each node by `bound_node_name`, for callers (tests, the controller) that
/// already have a flat pod list and need the per-node view the disruption checks above operate
/// on.
pub fn pods_by_node(pods: &[PodInfo]) -> BTreeMap<&str, Vec<&PodInfo>> {
    let mut by_node: BTreeMap<&str, Vec<&PodInfo>> = BTreeMap::new();
    for pod in pods {
        if let Some(node_name) = pod.bound_node_name.as_deref() {
            by_node.entry(node_name).or_default().push(pod);
        }
    }
    by_node
}

/// Effective requirements a consolidation replacement must satisfy: the union of every displaced
/// pod's node-selector/affinity, so the replacement simulation in [`validate_consolidation`] is
/// only ever asked to find capacity at least as specific as what is being removed. Exposed for
/// callers building `instance_types` lookups scoped to the candidates' pool.
pub fn displaced_requirements(pods: &[PodInfo]) -> RequirementSet {
    let mut merged = RequirementSet::new();
    for pod in pods {
        if let Ok(reqs) = pod.node_selector.intersect(&pod.required_node_affinity) {
            for r in reqs.iter() {
                let _ = merged.insert(r.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use stackable_autoscaler_crd::nodepool::DisruptionReason as Reason;

    use super::*;

    fn budget(nodes: &str, reasons: Vec<Reason>) -> Budget {
        Budget {
            nodes: nodes.to_string(),
            reasons,
            schedule: None,
            duration: None,
        }
    }

    #[test]
    fn parse_budget_nodes_rounds_percentage_up() {
        assert_eq!(parse_budget_nodes("10%", 7).unwrap(), 1);
        assert_eq!(parse_budget_nodes("50%", 7).unwrap(), 4);
        assert_eq!(parse_budget_nodes("5", 7).unwrap(), 5);
    }

    #[test]
    fn allowed_disrupting_aggregates_by_min_across_active_budgets() {
        let budgets = vec![budget("5", vec![]), budget("2", vec![Reason::Empty])];
        let allowed = allowed_disrupting(&budgets, Reason::Empty, 10, |_| true);
        assert_eq!(allowed, 2);
    }

    #[test]
    fn allowed_disrupting_ignores_budgets_scoped_to_other_reasons() {
        let budgets = vec![budget("1", vec![Reason::Drifted])];
        let allowed = allowed_disrupting(&budgets, Reason::Empty, 10, |_| true);
        assert_eq!(allowed, 10, "budget scoped to Drifted should not constrain Empty");
    }

    #[test]
    fn inactive_scheduled_budget_is_unbounded() {
        let mut b = budget("1", vec![]);
        b.schedule = Some("0 0 * * *".to_string());
        let allowed = allowed_disrupting(&[b], Reason::Empty, 10, |_| false);
        assert_eq!(allowed, 10);
    }

    #[test]
    fn drift_precedence_prefers_nodepool_hash_over_nodeclass_and_cloud() {
        assert_eq!(
            drift_reason(false, false, Some("ami-rollout".into())),
            Some(DriftReason::NodePoolHashMismatch)
        );
        assert_eq!(
            drift_reason(true, false, Some("ami-rollout".into())),
            Some(DriftReason::NodeClassHashMismatch)
        );
        assert_eq!(
            drift_reason(true, true, Some("ami-rollout".into())),
            Some(DriftReason::CloudProviderReported("ami-rollout".into()))
        );
        assert_eq!(drift_reason(true, true, None), None);
    }

    #[test]
    fn empty_node_has_only_skippable_pods() {
        use crate::domain::{PodOwner, PodPhase};

        fn pod(owner: PodOwner, phase: PodPhase) -> PodInfo {
            PodInfo {
                namespace: "default".into(),
                name: "p".into(),
                requests: Default::default(),
                node_selector: Default::default(),
                required_node_affinity: Default::default(),
                tolerations: vec![],
                topology_spread_constraints: vec![],
                required_pod_affinity: vec![],
                required_pod_anti_affinity: vec![],
                host_ports: vec![],
                volume_claims: vec![],
                bound_node_name: Some("n1".into()),
                owner,
                do_not_disrupt: false,
                do_not_evict: false,
                scheduling_gates: vec![],
                phase,
            }
        }

        let only_daemonset = vec![pod(PodOwner::DaemonSet { name: "ds".into() }, PodPhase::Running)];
        assert!(is_empty(&only_daemonset));

        let with_real_pod = vec![pod(PodOwner::None, PodPhase::Running)];
        assert!(!is_empty(&with_real_pod));
    }

    #[test]
    fn candidate_excluded_when_hosting_do_not_disrupt_pod() {
        use crate::domain::{PodOwner, PodPhase};

        let mut node = StateNode {
            initialized: true,
            ..Default::default()
        };
        node.provider_id = "p1".into();

        let do_not_disrupt_pod = PodInfo {
            namespace: "default".into(),
            name: "p".into(),
            requests: Default::default(),
            node_selector: Default::default(),
            required_node_affinity: Default::default(),
            tolerations: vec![],
            topology_spread_constraints: vec![],
            required_pod_affinity: vec![],
            required_pod_anti_affinity: vec![],
            host_ports: vec![],
            volume_claims: vec![],
            bound_node_name: Some("n1".into()),
            owner: PodOwner::None,
            do_not_disrupt: true,
            do_not_evict: false,
            scheduling_gates: vec![],
            phase: PodPhase::Running,
        };

        assert!(!is_disruption_candidate(&node, false, &[do_not_disrupt_pod]));
        assert!(is_disruption_candidate(&node, false, &[]));
    }
}
