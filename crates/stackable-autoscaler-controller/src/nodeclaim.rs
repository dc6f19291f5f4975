//! NodeClaim Lifecycle.
//!
//! [`plan`] is the state machine as a pure function: given a NodeClaim's status, whether it is
//! already marked for deletion, and whatever the Cluster State Cache knows about its matching
//! node, it decides the next action. The `reconcile` wrapper below is the thin
//! `kube::runtime::Controller` glue that calls it and performs the resulting apiserver/eviction/
//! cloud-provider calls, mirroring how [`stackable_operator::logging::controller`] expects a
//! reconciler to be structured.

use std::sync::Arc;

use jiff::Timestamp;
use k8s_openapi::api::core::v1::{Node, Taint as K8sTaint};
use kube::{
    Api, Client, ResourceExt,
    api::{EvictParams, ListParams, Patch, PatchParams},
    runtime::controller::Action,
};
use snafu::ResultExt;
use stackable_autoscaler_core::{
    cloud::{CloudProvider, CloudProviderError},
    state::{ClusterState, StateNode},
};
use stackable_autoscaler_crd::{
    labels::DISRUPTING_TAINT_KEY,
    nodeclaim::v1alpha1::{NodeClaim, NodeClaimStatus},
};
use tracing::instrument;

use crate::error::{ApplyStatusSnafu, DeleteSnafu, EvictSnafu, NodeClaimError, RemoveFinalizerSnafu, TaintSnafu};

pub const FINALIZER: &str = "autoscaling.kubernetes.stackable.tech/nodeclaim";

/// What the reconciler should do next for one NodeClaim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeClaimAction {
    /// No matching Node has registered yet; requeue before the registration grace period elapses.
    AwaitRegistration,

    /// The Node registered but kubelet hasn't reported Ready yet.
    AwaitInitialization,

    /// Everything lined up: flip `Initialized=True` (and `Ready` by extension).
    MarkInitialized,

    /// The registration grace period elapsed with no matching Node: delete the NodeClaim, which
    /// begins termination.
    Delete,

    /// The apiserver observed a deletion request; drain hasn't started yet. Taint the node (if
    /// any) and record `termination_timestamp = now + terminationGracePeriod`.
    BeginTermination,

    /// Drain is underway: list and evict pods still bound to `node_name`.
    ContinueDraining { node_name: String },

    /// Drain finished (or its TerminationGracePeriod elapsed): call the cloud provider to
    /// terminate the instance, removing the finalizer once it confirms the instance is gone.
    FinalizeTermination,

    /// Nothing to do until the next watch event or requeue.
    Noop,
}

/// The pure decision function.
#[allow(clippy::too_many_arguments)]
pub fn plan(
    status: &NodeClaimStatus,
    state_node: Option<&StateNode>,
    bound_pod_count: usize,
    deleting: bool,
    now: Timestamp,
    registration_grace_period: std::time::Duration,
    termination_grace_period: std::time::Duration,
) -> NodeClaimAction {
    if deleting {
        let Some(terminated_at) = status.termination_timestamp.as_deref() else {
            return NodeClaimAction::BeginTermination;
        };

        let drain_deadline = terminated_at
            .parse::<Timestamp>()
            .ok()
            .and_then(|ts| ts.checked_add(jiff::SignedDuration::from(termination_grace_period)).ok())
            .unwrap_or(now);

        let still_has_bound_pods = bound_pod_count > 0;

        return match status.node_name.clone() {
            Some(node_name) if now < drain_deadline && still_has_bound_pods => {
                NodeClaimAction::ContinueDraining { node_name }
            }
            _ => NodeClaimAction::FinalizeTermination,
        };
    }

    if !status.is_true(NodeClaimStatus::REGISTERED_CONDITION)
        && state_node.and_then(|n| n.node.as_ref()).is_none()
    {
        let launched_at = status
            .condition(NodeClaimStatus::LAUNCHED_CONDITION)
            .and_then(|c| c.last_transition_time.0.to_zoned(jiff::tz::TimeZone::UTC).ok())
            .map(|zoned| zoned.timestamp())
            .unwrap_or(now);

        let deadline = launched_at
            .checked_add(jiff::SignedDuration::from(registration_grace_period))
            .unwrap_or(now);

        if now >= deadline {
            return NodeClaimAction::Delete;
        }
        return NodeClaimAction::AwaitRegistration;
    }

    if !status.is_true(NodeClaimStatus::INITIALIZED_CONDITION) {
        return match state_node {
            Some(node) if node.ready() => NodeClaimAction::MarkInitialized,
            _ => NodeClaimAction::AwaitInitialization,
        };
    }

    NodeClaimAction::Noop
}

/// Reconciler context shared across all NodeClaim reconciles.
pub struct Context {
    pub client: Client,
    pub cluster_state: Arc<ClusterState>,
    pub cloud_provider: Arc<dyn CloudProvider>,
    pub registration_grace_period: std::time::Duration,
    pub default_termination_grace_period: std::time::Duration,
}

#[instrument(skip(nodeclaim, ctx))]
pub async fn reconcile(
    nodeclaim: Arc<NodeClaim>,
    ctx: Arc<Context>,
) -> Result<Action, NodeClaimError> {
    let api: Api<NodeClaim> = Api::all(ctx.client.clone());
    let status = nodeclaim.status.clone().unwrap_or_default();
    let deleting = nodeclaim.meta().deletion_timestamp.is_some();
    let state_node = status
        .provider_id
        .as_deref()
        .and_then(|id| ctx.cluster_state.get_node(id));
    let bound_pod_count = status
        .node_name
        .as_deref()
        .map(|node_name| ctx.cluster_state.pods_on_node(node_name).len())
        .unwrap_or(0);

    let action = plan(
        &status,
        state_node.as_ref(),
        bound_pod_count,
        deleting,
        Timestamp::now(),
        ctx.registration_grace_period,
        ctx.default_termination_grace_period,
    );

    match action {
        NodeClaimAction::AwaitRegistration | NodeClaimAction::AwaitInitialization => {
            Ok(Action::requeue(std::time::Duration::from_secs(5)))
        }

        NodeClaimAction::MarkInitialized => {
            if !status.permits_forward_transition(NodeClaimStatus::INITIALIZED_CONDITION) {
                tracing::warn!(
                    name = %nodeclaim.name_any(),
                    "refusing to set Initialized=True: a later lifecycle condition is already True"
                );
                return Ok(Action::requeue(std::time::Duration::from_secs(30)));
            }

            let patch = serde_json::json!({
                "status": {
                    "conditions": [{
                        "type": NodeClaimStatus::INITIALIZED_CONDITION,
                        "status": "True",
                    }]
                }
            });
            api.patch_status(
                &nodeclaim.name_any(),
                &PatchParams::apply(FINALIZER),
                &Patch::Merge(patch),
            )
            .await
            .context(ApplyStatusSnafu)?;
            Ok(Action::requeue(std::time::Duration::from_secs(30)))
        }

        NodeClaimAction::Delete => {
            api.delete(&nodeclaim.name_any(), &Default::default())
                .await
                .context(DeleteSnafu)?;
            Ok(Action::await_change())
        }

        NodeClaimAction::BeginTermination => {
            if let Some(node_name) = &status.node_name {
                taint_node_for_termination(&ctx.client, node_name).await?;
            }

            let deadline = Timestamp::now()
                .checked_add(jiff::SignedDuration::from(ctx.default_termination_grace_period))
                .unwrap_or_else(|_| Timestamp::now());
            let patch = serde_json::json!({
                "status": { "terminationTimestamp": deadline.to_string() }
            });
            api.patch_status(
                &nodeclaim.name_any(),
                &PatchParams::apply(FINALIZER),
                &Patch::Merge(patch),
            )
            .await
            .context(ApplyStatusSnafu)?;
            Ok(Action::requeue(std::time::Duration::from_secs(5)))
        }

        NodeClaimAction::ContinueDraining { node_name } => {
            evict_bound_pods(&ctx.client, &node_name).await?;
            Ok(Action::requeue(std::time::Duration::from_secs(5)))
        }

        NodeClaimAction::FinalizeTermination => {
            match ctx.cloud_provider.delete(&nodeclaim).await {
                Ok(()) => Ok(Action::requeue(std::time::Duration::from_secs(5))),
                Err(CloudProviderError::NodeClaimNotFound { .. }) => {
                    remove_finalizer(&api, &nodeclaim).await?;
                    Ok(Action::await_change())
                }
                Err(source) => Err(NodeClaimError::CloudProviderCall { source }),
            }
        }

        NodeClaimAction::Noop => Ok(Action::requeue(std::time::Duration::from_secs(300))),
    }
}

/// Applies the [`DISRUPTING_TAINT_KEY`] `NoSchedule` taint once, so the default scheduler stops
/// placing new pods on the node while it drains.
async fn taint_node_for_termination(client: &Client, node_name: &str) -> Result<(), NodeClaimError> {
    let api: Api<Node> = Api::all(client.clone());
    let node = api.get(node_name).await.context(TaintSnafu {
        node_name: node_name.to_string(),
    })?;

    let mut taints = node.spec.and_then(|s| s.taints).unwrap_or_default();
    if taints.iter().any(|t| t.key == DISRUPTING_TAINT_KEY) {
        return Ok(());
    }

    taints.push(K8sTaint {
        key: DISRUPTING_TAINT_KEY.to_string(),
        value: Some("true".to_string()),
        effect: "NoSchedule".to_string(),
        time_added: None,
    });

    let patch = serde_json::json!({ "spec": { "taints": taints } });
    api.patch(node_name, &PatchParams::apply(FINALIZER), &Patch::Merge(patch))
        .await
        .context(TaintSnafu {
            node_name: node_name.to_string(),
        })?;
    Ok(())
}

async fn remove_finalizer(api: &Api<NodeClaim>, nodeclaim: &NodeClaim) -> Result<(), NodeClaimError> {
    let remaining: Vec<&String> = nodeclaim
        .finalizers()
        .iter()
        .filter(|f| f.as_str() != FINALIZER)
        .collect();
    let patch = serde_json::json!({ "metadata": { "finalizers": remaining } });
    api.patch(
        &nodeclaim.name_any(),
        &PatchParams::default(),
        &Patch::Merge(patch),
    )
    .await
    .context(RemoveFinalizerSnafu)?;
    Ok(())
}

/// Lists Pods bound to `node_name` and evicts every one that isn't a DaemonSet/static/mirror pod
/// and doesn't carry the `do-not-evict` label.
async fn evict_bound_pods(client: &Client, node_name: &str) -> Result<(), NodeClaimError> {
    use k8s_openapi::api::core::v1::Pod;

    let pods: Api<Pod> = Api::all(client.clone());
    let bound = pods
        .list(&ListParams::default().fields(&format!("spec.nodeName={node_name}")))
        .await
        .map_err(|source| NodeClaimError::Evict {
            source,
            pod_key: (String::new(), node_name.to_string()),
        })?;

    for pod in bound {
        if !is_evictable(&pod) {
            continue;
        }
        let namespace = pod.namespace().unwrap_or_default();
        let name = pod.name_any();
        let namespaced: Api<Pod> = Api::namespaced(client.clone(), &namespace);
        namespaced
            .evict(&name, &EvictParams::default())
            .await
            .context(EvictSnafu {
                pod_key: (namespace, name),
            })?;
    }

    Ok(())
}

fn is_evictable(pod: &k8s_openapi::api::core::v1::Pod) -> bool {
    if pod.metadata.deletion_timestamp.is_some() {
        return false;
    }
    let labels = pod.metadata.labels.clone().unwrap_or_default();
    if labels.contains_key(stackable_autoscaler_crd::labels::DO_NOT_EVICT_LABEL) {
        return false;
    }
    let is_daemonset_or_static = pod
        .metadata
        .owner_references
        .as_ref()
        .is_some_and(|owners| owners.iter().any(|o| o.kind == "DaemonSet"));
    !is_daemonset_or_static
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;

    use super::*;

    fn condition(type_: &str, status: &str) -> Condition {
        Condition {
            last_transition_time: k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
                "2024-01-01T00:00:00Z".parse().unwrap(),
            ),
            message: String::new(),
            observed_generation: None,
            reason: "Test".to_string(),
            status: status.to_string(),
            type_: type_.to_string(),
        }
    }

    #[test]
    fn awaits_registration_without_matching_node() {
        let status = NodeClaimStatus {
            conditions: vec![condition(NodeClaimStatus::LAUNCHED_CONDITION, "True")],
            ..Default::default()
        };
        let now: Timestamp = "2024-01-01T00:05:00Z".parse().unwrap();
        let action = plan(
            &status,
            None,
            0,
            false,
            now,
            std::time::Duration::from_secs(900),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(action, NodeClaimAction::AwaitRegistration);
    }

    #[test]
    fn deletes_once_registration_grace_period_elapses() {
        let status = NodeClaimStatus {
            conditions: vec![condition(NodeClaimStatus::LAUNCHED_CONDITION, "True")],
            ..Default::default()
        };
        let now: Timestamp = "2024-01-01T01:00:00Z".parse().unwrap();
        let action = plan(
            &status,
            None,
            0,
            false,
            now,
            std::time::Duration::from_secs(900),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(action, NodeClaimAction::Delete);
    }

    #[test]
    fn marks_initialized_once_node_is_ready() {
        let status = NodeClaimStatus {
            conditions: vec![
                condition(NodeClaimStatus::LAUNCHED_CONDITION, "True"),
                condition(NodeClaimStatus::REGISTERED_CONDITION, "True"),
            ],
            ..Default::default()
        };
        let node = StateNode {
            node: Some(stackable_autoscaler_core::domain::NodeInfo {
                provider_id: "p1".into(),
                name: "n1".into(),
                labels: Default::default(),
                taints: vec![],
                ready: true,
                allocatable: Default::default(),
                unhealthy_condition_since: None,
            }),
            ..Default::default()
        };
        let now: Timestamp = "2024-01-01T00:05:00Z".parse().unwrap();
        let action = plan(
            &status,
            Some(&node),
            0,
            false,
            now,
            std::time::Duration::from_secs(900),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(action, NodeClaimAction::MarkInitialized);
    }

    #[test]
    fn begins_termination_on_first_observed_deletion() {
        let status = NodeClaimStatus {
            node_name: Some("n1".to_string()),
            ..Default::default()
        };
        let now: Timestamp = "2024-01-01T00:05:00Z".parse().unwrap();
        let action = plan(
            &status,
            None,
            0,
            true,
            now,
            std::time::Duration::from_secs(900),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(action, NodeClaimAction::BeginTermination);
    }

    #[test]
    fn finalizes_immediately_once_grace_period_elapses_with_no_pods() {
        let status = NodeClaimStatus {
            termination_timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            node_name: Some("n1".to_string()),
            ..Default::default()
        };
        let now: Timestamp = "2024-01-01T01:00:00Z".parse().unwrap();
        let action = plan(
            &status,
            None,
            0,
            true,
            now,
            std::time::Duration::from_secs(900),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(action, NodeClaimAction::FinalizeTermination);
    }

    #[test]
    fn keeps_draining_while_pods_remain_bound_within_grace_period() {
        let status = NodeClaimStatus {
            termination_timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            node_name: Some("n1".to_string()),
            ..Default::default()
        };
        let now: Timestamp = "2024-01-01T00:05:00Z".parse().unwrap();
        let action = plan(
            &status,
            None,
            1,
            true,
            now,
            std::time::Duration::from_secs(900),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(
            action,
            NodeClaimAction::ContinueDraining {
                node_name: "n1".to_string()
            }
        );
    }

    /// A pod with no resource requests (e.g. a minimal sidecar) still counts as bound: the drain
    /// decision must use the actual bound-pod count, not the node's aggregate resource requests.
    #[test]
    fn keeps_draining_for_a_bound_pod_with_no_resource_requests() {
        let status = NodeClaimStatus {
            termination_timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            node_name: Some("n1".to_string()),
            ..Default::default()
        };
        let node = StateNode {
            pod_requests: stackable_autoscaler_core::cloud::ResourceList::new(),
            ..Default::default()
        };
        let now: Timestamp = "2024-01-01T00:05:00Z".parse().unwrap();
        let action = plan(
            &status,
            Some(&node),
            1,
            true,
            now,
            std::time::Duration::from_secs(900),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(
            action,
            NodeClaimAction::ContinueDraining {
                node_name: "n1".to_string()
            }
        );
    }
}
