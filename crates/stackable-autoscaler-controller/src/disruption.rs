//! Disruption Engine enactment.
//!
//! Candidate eligibility, budget arithmetic, emptiness/expiration/drift checks and consolidation
//! validation all live in [`stackable_autoscaler_core::disruption`] as pure functions; this module
//! is the periodic apiserver glue that runs them pool-by-pool, in fixed method-priority order,
//! over the live `NodePool`/`NodeClaim` set. Enactment is: annotate the chosen candidates with
//! their disruption reason, create a replacement NodeClaim if the consolidation simulation asked
//! for one, then delete the candidates — [`crate::nodeclaim::reconcile`] picks up from there and
//! drains/terminates them exactly like any other NodeClaim deletion.
//!
//! Unlike [`crate::nodeclaim`], this isn't a `kube::runtime::Controller` reconciler keyed on one
//! object: disruption evaluates a whole NodePool's nodes together against its budgets, so [`tick`]
//! is driven by a plain interval, the same way [`crate::provisioner::Batcher`] drives the Scheduler.

use std::{collections::BTreeMap, sync::Arc};

use jiff::Timestamp;
use kube::{
    Api, Client, ResourceExt,
    api::{ListParams, Patch, PatchParams},
};
use snafu::ResultExt;
use stackable_autoscaler_core::{
    cloud::{self, CloudProvider},
    disruption::{self, Method, METHOD_PRIORITY},
    requirements::RequirementSet,
    scheduler::InstanceTypeSource,
    state::ClusterState,
};
use stackable_autoscaler_crd::{
    labels::{
        CAPACITY_TYPE_LABEL, CAPACITY_TYPE_ON_DEMAND, DISRUPTION_REASON_ANNOTATION, LABEL_INSTANCE_TYPE,
        NODECLASS_HASH_ANNOTATION, NODEPOOL_HASH_ANNOTATION, NODEPOOL_LABEL, NODE_DO_NOT_DISRUPT_ANNOTATION,
    },
    nodeclaim::v1alpha1::NodeClaim,
    nodepool::{ConsolidationPolicy, DisruptionReason, v1alpha1::{NodePool, NodePoolSpec}},
};
use tracing::instrument;

use crate::{
    error::{AnnotateReasonSnafu, CreateReplacementSnafu, DisruptionError, ListNodeClaimsSnafu, ListNodePoolsSnafu, MarkForDeletionSnafu},
    provisioner,
};

const FIELD_MANAGER: &str = "autoscaling.kubernetes.stackable.tech/disruption";

/// Context for one [`tick`] over every NodePool.
pub struct Context {
    pub client: Client,
    pub cluster_state: Arc<ClusterState>,
    pub cloud_provider: Arc<dyn CloudProvider>,
}

/// What one [`tick`] decided and enacted, for logging/events.
#[derive(Debug, Default)]
pub struct DisruptionRunSummary {
    pub disrupted: Vec<(String, DisruptionReason)>,
    pub replacements_created: usize,
}

/// A deterministic hash of the parts of a NodePool template that matter for drift.
/// [`crate::provisioner::provision`] stores it as [`NODEPOOL_HASH_ANNOTATION`] on every NodeClaim
/// at launch; recomputed each tick so an edited NodePool is detected as drift on its
/// already-launched nodes. `NodePoolSpec` doesn't implement `Hash` itself (it embeds
/// `Quantity`/`Duration` wrappers that don't either), so this hashes its canonical JSON form
/// instead.
pub fn nodepool_template_hash(spec: &NodePoolSpec) -> String {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    serde_json::to_vec(spec).unwrap_or_default().hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

fn annotation_value(method: Method) -> &'static str {
    match method {
        Method::Expiration => "Expired",
        Method::Drift => "Drifted",
        Method::Emptiness => "Empty",
        Method::SingleNodeConsolidation | Method::MultiNodeConsolidation => "Underutilized",
        Method::Unhealthy => "Unhealthy",
    }
}

/// The candidate's own `WorstLaunchPrice`, resolved from its `node.kubernetes.io/instance-type`
/// label against the pool's current catalog.
fn candidate_worst_launch_price(
    node: &stackable_autoscaler_core::state::StateNode,
    pool: &NodePool,
    catalog: &impl InstanceTypeSource,
) -> f64 {
    let Some(instance_type_name) = node.labels().get(LABEL_INSTANCE_TYPE) else {
        return f64::INFINITY;
    };
    let capacity_type = node
        .labels()
        .get(CAPACITY_TYPE_LABEL)
        .map(String::as_str)
        .unwrap_or(CAPACITY_TYPE_ON_DEMAND);
    let reqs = RequirementSet::from_requirements([cloud::single_value(CAPACITY_TYPE_LABEL, capacity_type)])
        .unwrap_or_else(|_| RequirementSet::new());

    catalog
        .instance_types_for(pool)
        .into_iter()
        .find(|it| &it.name == instance_type_name)
        .and_then(|it| it.worst_launch_price(&reqs))
        .unwrap_or(f64::INFINITY)
}

/// One pass of the Disruption Engine over every pool, in fixed method-priority order.
#[instrument(skip(ctx, catalog, schedule_active))]
pub async fn tick(
    ctx: &Context,
    catalog: &impl InstanceTypeSource,
    now: Timestamp,
    schedule_active: impl Fn(&str) -> bool + Copy,
) -> Result<DisruptionRunSummary, DisruptionError> {
    let nc_api: Api<NodeClaim> = Api::all(ctx.client.clone());
    let pool_api: Api<NodePool> = Api::all(ctx.client.clone());

    let pools = pool_api.list(&ListParams::default()).await.context(ListNodePoolsSnafu)?.items;
    let nodeclaims = nc_api.list(&ListParams::default()).await.context(ListNodeClaimsSnafu)?.items;

    let by_provider_id: BTreeMap<String, &NodeClaim> = nodeclaims
        .iter()
        .filter_map(|nc| Some((nc.status.as_ref()?.provider_id.clone()?, nc)))
        .collect();

    let daemonset_pods = ctx.cluster_state.daemonset_pods();
    let mut summary = DisruptionRunSummary::default();

    for method in METHOD_PRIORITY {
        for pool in &pools {
            let Some(pool_name) = pool.metadata.name.as_deref() else {
                continue;
            };

            let pool_nodes: Vec<_> = ctx
                .cluster_state
                .snapshot_nodes()
                .into_iter()
                .filter(|n| n.labels().get(NODEPOOL_LABEL).map(String::as_str) == Some(pool_name))
                .collect();
            let total_nodes = pool_nodes.len();
            if total_nodes == 0 {
                continue;
            }

            let already_disrupting = pool_nodes.iter().filter(|n| n.marked_for_deletion).count();
            let allowed = disruption::allowed_disrupting(
                &pool.spec.disruption.budgets,
                method.reason(),
                total_nodes,
                schedule_active,
            );
            let mut remaining_budget = allowed.saturating_sub(already_disrupting);
            if remaining_budget == 0 {
                continue;
            }

            if method == Method::Unhealthy {
                let repair_policies = ctx.cloud_provider.repair_policies();
                let unhealthy_count = pool_nodes
                    .iter()
                    .filter(|n| {
                        n.node
                            .as_ref()
                            .and_then(|i| i.unhealthy_condition_since)
                            .is_some_and(|since| repair_policies.iter().any(|p| disruption::is_repair_candidate(p, since, now)))
                    })
                    .count();
                if !disruption::unhealthy_repair_allowed(
                    unhealthy_count,
                    total_nodes,
                    disruption::DEFAULT_MAX_UNHEALTHY_FRACTION,
                ) {
                    tracing::warn!(pool = %pool_name, unhealthy_count, total_nodes, "withholding repair: too many unhealthy nodes at once");
                    continue;
                }
            }

            let current_hash = nodepool_template_hash(&pool.spec);

            for node in &pool_nodes {
                if remaining_budget == 0 {
                    break;
                }
                let Some(node_name) = node.node.as_ref().map(|n| n.name.as_str()) else {
                    continue;
                };
                let Some(nc) = by_provider_id.get(&node.provider_id).copied() else {
                    continue;
                };

                let node_annotated = nc.annotations().contains_key(NODE_DO_NOT_DISRUPT_ANNOTATION);
                let bound_pods = ctx.cluster_state.pods_on_node(node_name);
                if !disruption::is_disruption_candidate(node, node_annotated, &bound_pods) {
                    continue;
                }

                let eligible = match method {
                    Method::Expiration => pool.spec.expire_after.is_some_and(|expire_after| {
                        let launched_at = nc
                            .creation_timestamp()
                            .and_then(|t| t.0.to_zoned(jiff::tz::TimeZone::UTC).ok())
                            .map(|z| z.timestamp())
                            .unwrap_or(now);
                        disruption::is_expired(launched_at, expire_after.as_std(), now)
                    }),

                    Method::Drift => {
                        let nodepool_hash_matches = nc.annotations().get(NODEPOOL_HASH_ANNOTATION) == Some(&current_hash);
                        let nodeclass_hash_matches = match ctx
                            .cloud_provider
                            .node_class_hash(&pool.spec.node_class_ref)
                            .await
                        {
                            Ok(Some(current_nodeclass_hash)) => {
                                nc.annotations().get(NODECLASS_HASH_ANNOTATION) == Some(&current_nodeclass_hash)
                            }
                            // provider doesn't track a NodeClass hash, or the call failed: this
                            // source contributes no mismatch either way.
                            Ok(None) | Err(_) => true,
                        };
                        let cloud_drift = ctx.cloud_provider.is_drifted(nc).await.ok().flatten();
                        disruption::drift_reason(nodepool_hash_matches, nodeclass_hash_matches, cloud_drift).is_some()
                    }

                    Method::Emptiness => {
                        let consolidate_after = pool
                            .spec
                            .disruption
                            .consolidate_after
                            .map(|d| d.as_std())
                            .unwrap_or(std::time::Duration::ZERO);
                        disruption::is_empty(&bound_pods)
                            && disruption::empty_since(node.last_pod_event_time, now, consolidate_after)
                    }

                    Method::SingleNodeConsolidation | Method::MultiNodeConsolidation => {
                        pool.spec.disruption.consolidation_policy == ConsolidationPolicy::WhenEmptyOrUnderutilized
                            && !disruption::is_empty(&bound_pods)
                    }

                    Method::Unhealthy => {
                        let repair_policies = ctx.cloud_provider.repair_policies();
                        node.node
                            .as_ref()
                            .and_then(|i| i.unhealthy_condition_since)
                            .is_some_and(|since| repair_policies.iter().any(|p| disruption::is_repair_candidate(p, since, now)))
                    }
                };

                if !eligible {
                    continue;
                }

                let replacement = if method.requires_cost_reduction() {
                    let remaining_nodes: Vec<_> = ctx
                        .cluster_state
                        .snapshot_nodes()
                        .into_iter()
                        .filter(|n| n.provider_id != node.provider_id)
                        .collect();
                    let candidate_price = |id: &str| {
                        if id == node.provider_id {
                            candidate_worst_launch_price(node, pool, catalog)
                        } else {
                            f64::INFINITY
                        }
                    };
                    let plan = disruption::validate_consolidation(
                        method,
                        &remaining_nodes,
                        std::slice::from_ref(&node.provider_id),
                        candidate_price,
                        bound_pods,
                        &pools,
                        catalog,
                        &daemonset_pods,
                    );
                    let Some(plan) = plan else {
                        continue;
                    };
                    plan.replacement
                } else {
                    None
                };

                if let Some(simulated) = &replacement {
                    provisioner::provision(
                        &ctx.client,
                        std::slice::from_ref(simulated),
                        &pools,
                        ctx.cloud_provider.as_ref(),
                    )
                    .await
                    .context(CreateReplacementSnafu {
                        pool_name: pool_name.to_string(),
                    })?;
                    summary.replacements_created += 1;
                }

                let annotate_patch = serde_json::json!({
                    "metadata": { "annotations": { DISRUPTION_REASON_ANNOTATION: annotation_value(method) } }
                });
                nc_api
                    .patch(&nc.name_any(), &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(annotate_patch))
                    .await
                    .context(AnnotateReasonSnafu {
                        provider_id: node.provider_id.clone(),
                    })?;

                nc_api
                    .delete(&nc.name_any(), &Default::default())
                    .await
                    .context(MarkForDeletionSnafu {
                        provider_id: node.provider_id.clone(),
                    })?;
                ctx.cluster_state.set_marked_for_deletion(&node.provider_id, true);

                summary.disrupted.push((node.provider_id.clone(), method.reason()));
                remaining_budget -= 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_hash_is_stable_and_sensitive_to_changes() {
        let spec = NodePoolSpec {
            requirements: Vec::new(),
            node_class_ref: stackable_autoscaler_crd::nodeclass::NodeClassReference {
                group: "example.com".to_string(),
                kind: "ExampleNodeClass".to_string(),
                name: "default".to_string(),
            },
            taints: Vec::new(),
            startup_taints: Vec::new(),
            expire_after: None,
            termination_grace_period: None,
            limits: None,
            weight: 1,
            disruption: Default::default(),
        };
        let h1 = nodepool_template_hash(&spec);
        let h2 = nodepool_template_hash(&spec);
        assert_eq!(h1, h2);

        let mut changed = spec.clone();
        changed.weight = 5;
        assert_ne!(h1, nodepool_template_hash(&changed));
    }

    #[test]
    fn annotation_values_match_disruption_cause_spelling() {
        assert_eq!(annotation_value(Method::Expiration), "Expired");
        assert_eq!(annotation_value(Method::Drift), "Drifted");
        assert_eq!(annotation_value(Method::Emptiness), "Empty");
        assert_eq!(annotation_value(Method::SingleNodeConsolidation), "Underutilized");
        assert_eq!(annotation_value(Method::Unhealthy), "Unhealthy");
    }
}
