//! Cluster State Cache.
//!
//! Grounded on `kube::runtime::reflector::Store` as the literal "watched projection" the system
//! calls for: each watched resource type (NodeClaim, Node, Pod, DaemonSet, PVC/VolumeAttachment)
//! is fed into this cache via [`ClusterState::apply_pod`]/[`apply_node`]/... consumers, keeping
//! the apiserver watch transport itself an external collaborator while the
//! projection logic here is fully implemented and testable with synthetic inputs.
//!
//! The node index is guarded by a single [`RwLock`]: hot-path operations take the read lock and
//! copy out what they need rather than holding it across await points.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::RwLock,
};

use indexmap::IndexMap;
use stackable_autoscaler_crd::requirement::Taint;
use tracing::{debug, instrument};

use crate::{
    cloud::ResourceList,
    domain::{HostPort, NodeInfo, PodInfo, PodOwner},
};

/// In-memory union of (NodeClaim, Node) keyed by `providerID`.
#[derive(Clone, Debug, Default)]
pub struct StateNode {
    pub provider_id: String,
    pub nodeclaim_name: Option<String>,
    pub node: Option<NodeInfo>,

    pub allocatable: ResourceList,
    pub pod_requests: ResourceList,
    pub daemonset_requests: ResourceList,

    pub host_port_usage: BTreeSet<HostPort>,
    /// driver -> set of PVC keys.
    pub volume_usage: BTreeMap<String, BTreeSet<String>>,

    pub marked_for_deletion: bool,
    pub initialized: bool,

    pub last_pod_event_time: Option<jiff::Timestamp>,
}

impl StateNode {
    /// `available = allocatable - Σ pod_requests`.
    pub fn available(&self) -> ResourceList {
        let mut available = self.allocatable.clone();
        for (key, requested) in &self.pod_requests {
            if let Some(existing) = available.get(key).copied() {
                available.insert(key.clone(), existing - *requested);
            }
        }
        available
    }

    pub fn taints(&self) -> &[Taint] {
        self.node
            .as_ref()
            .map(|n| n.taints.as_slice())
            .unwrap_or_default()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.node.as_ref().map(|n| &n.labels).unwrap_or(&EMPTY)
    }

    pub fn ready(&self) -> bool {
        self.node.as_ref().is_some_and(|n| n.ready)
    }

    /// Whether `requests` fit in this node's current `available`, for every resource
    /// `requests` names.
    pub fn fits(&self, requests: &ResourceList) -> bool {
        let available = self.available();
        requests
            .iter()
            .all(|(key, req_qty)| available.get(key).is_some_and(|avail| *avail >= *req_qty))
    }

    pub fn bind_pod(&mut self, requests: &ResourceList, is_daemonset: bool) {
        let target = if is_daemonset {
            &mut self.daemonset_requests
        } else {
            &mut self.pod_requests
        };
        for (key, qty) in requests {
            target
                .entry(key.clone())
                .and_modify(|existing| *existing += *qty)
                .or_insert(*qty);
        }
    }

    pub fn unbind_pod(&mut self, requests: &ResourceList, is_daemonset: bool) {
        let target = if is_daemonset {
            &mut self.daemonset_requests
        } else {
            &mut self.pod_requests
        };
        for (key, qty) in requests {
            if let Some(existing) = target.get_mut(key) {
                *existing = *existing - *qty;
            }
        }
    }
}

/// Per-pod scheduling telemetry, cleared on bind or pod
/// deletion.
#[derive(Clone, Debug, Default)]
pub struct PodSchedulingTelemetry {
    pub ack_time: Option<jiff::Timestamp>,
    pub decision_time: Option<jiff::Timestamp>,
    pub success_time: Option<jiff::Timestamp>,
}

#[derive(Default)]
struct Indexes {
    by_provider_id: IndexMap<String, StateNode>,
    node_name_to_provider_id: BTreeMap<String, String>,
    nodeclaim_name_to_provider_id: BTreeMap<String, String>,

    pods: IndexMap<(String, String), PodInfo>,
    pod_telemetry: BTreeMap<(String, String), PodSchedulingTelemetry>,

    nodeclaim_synced: bool,
    node_synced: bool,
    pod_synced: bool,
    daemonset_synced: bool,
    volume_synced: bool,
}

/// The process-wide, mutex-guarded (here: `RwLock`-guarded) cluster state store.
pub struct ClusterState {
    inner: RwLock<Indexes>,
}

impl Default for ClusterState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterState {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Indexes::default()),
        }
    }

    /// `Synced()`: true only once every resource type's initial list has been ingested and
    /// every observed NodeClaim either has a matching Node or is still within its registration
    /// grace window. Provisioning and Disruption must not run until this is true.
    #[instrument(skip_all)]
    pub fn synced(&self, within_registration_window: impl Fn(&str) -> bool) -> bool {
        let idx = self.inner.read().expect("cluster state lock poisoned");
        if !(idx.nodeclaim_synced && idx.node_synced && idx.pod_synced && idx.daemonset_synced && idx.volume_synced)
        {
            debug!("not synced: initial list of at least one watched resource type still outstanding");
            return false;
        }
        let is_settled = |n: &StateNode| {
            n.node.is_some()
                || n.nodeclaim_name
                    .as_deref()
                    .is_some_and(&within_registration_window)
        };
        if idx.by_provider_id.values().all(is_settled) {
            true
        } else {
            let waiting: Vec<&str> = idx
                .by_provider_id
                .values()
                .filter(|n| !is_settled(n))
                .map(|n| n.nodeclaim_name.as_deref().unwrap_or(&n.provider_id))
                .collect();
            debug!(nodeclaims = ?waiting, "not synced: nodeclaim has no matching node and is past its registration grace window");
            false
        }
    }

    pub fn mark_nodeclaims_synced(&self) {
        self.inner.write().expect("lock poisoned").nodeclaim_synced = true;
    }
    pub fn mark_nodes_synced(&self) {
        self.inner.write().expect("lock poisoned").node_synced = true;
    }
    pub fn mark_pods_synced(&self) {
        self.inner.write().expect("lock poisoned").pod_synced = true;
    }
    pub fn mark_daemonsets_synced(&self) {
        self.inner.write().expect("lock poisoned").daemonset_synced = true;
    }
    pub fn mark_volumes_synced(&self) {
        self.inner.write().expect("lock poisoned").volume_synced = true;
    }

    /// `ForEachNode(fn)`: iterates a copy-on-read snapshot so callers cannot mutate state.
    pub fn snapshot_nodes(&self) -> Vec<StateNode> {
        let idx = self.inner.read().expect("cluster state lock poisoned");
        idx.by_provider_id.values().cloned().collect()
    }

    pub fn get_node(&self, provider_id: &str) -> Option<StateNode> {
        let idx = self.inner.read().expect("cluster state lock poisoned");
        idx.by_provider_id.get(provider_id).cloned()
    }

    pub fn upsert_nodeclaim(&self, provider_id: &str, nodeclaim_name: &str) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        idx.nodeclaim_name_to_provider_id
            .insert(nodeclaim_name.to_string(), provider_id.to_string());
        idx.by_provider_id
            .entry(provider_id.to_string())
            .or_insert_with(|| StateNode {
                provider_id: provider_id.to_string(),
                ..Default::default()
            })
            .nodeclaim_name = Some(nodeclaim_name.to_string());
    }

    pub fn remove_nodeclaim(&self, nodeclaim_name: &str) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        if let Some(provider_id) = idx.nodeclaim_name_to_provider_id.remove(nodeclaim_name) {
            if let Some(node) = idx.by_provider_id.get_mut(&provider_id) {
                node.nodeclaim_name = None;
                if node.node.is_none() {
                    debug!(%provider_id, nodeclaim_name, "dropping index entry: neither NodeClaim nor Node remain");
                    idx.by_provider_id.shift_remove(&provider_id);
                }
            }
        }
    }

    pub fn upsert_node(&self, provider_id: &str, node: NodeInfo) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        idx.node_name_to_provider_id
            .insert(node.name.clone(), provider_id.to_string());
        let entry = idx
            .by_provider_id
            .entry(provider_id.to_string())
            .or_insert_with(|| StateNode {
                provider_id: provider_id.to_string(),
                ..Default::default()
            });
        entry.allocatable = node.allocatable.clone();
        entry.node = Some(node);
    }

    pub fn remove_node(&self, node_name: &str) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        if let Some(provider_id) = idx.node_name_to_provider_id.remove(node_name) {
            if let Some(node) = idx.by_provider_id.get_mut(&provider_id) {
                node.node = None;
                if node.nodeclaim_name.is_none() {
                    debug!(%provider_id, node_name, "dropping index entry: neither NodeClaim nor Node remain");
                    idx.by_provider_id.shift_remove(&provider_id);
                }
            }
        }
    }

    pub fn set_marked_for_deletion(&self, provider_id: &str, marked: bool) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        if let Some(node) = idx.by_provider_id.get_mut(provider_id) {
            node.marked_for_deletion = marked;
        }
    }

    pub fn set_initialized(&self, provider_id: &str, initialized: bool) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        if let Some(node) = idx.by_provider_id.get_mut(provider_id) {
            node.initialized = initialized;
        }
    }

    /// Binds `pod` to `node_name`, tracked by `spec.nodeName`; DaemonSet pods are tracked
    /// separately because the Scheduler pre-deducts them when sizing a new node.
    #[instrument(skip(self, pod), fields(namespace = %key.0, pod = %key.1, node_name))]
    pub fn bind_pod(&self, key: (String, String), node_name: &str, pod: PodInfo) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        let provider_id = idx.node_name_to_provider_id.get(node_name).cloned();
        let is_daemonset = matches!(pod.owner, PodOwner::DaemonSet { .. });
        let requests = pod.requests.clone();
        let host_ports: Vec<HostPort> = pod.host_ports.clone();
        let volume_claims = pod.volume_claims.clone();

        if let Some(provider_id) = provider_id {
            if let Some(node) = idx.by_provider_id.get_mut(&provider_id) {
                node.bind_pod(&requests, is_daemonset);
                node.host_port_usage.extend(host_ports);
                for claim in volume_claims {
                    node.volume_usage
                        .entry(claim.driver)
                        .or_default()
                        .insert(claim.pvc_key);
                }
                node.last_pod_event_time = Some(now());
            }
        } else {
            debug!(node_name, "bound pod references a node not yet present in the index");
        }

        idx.pods.insert(key.clone(), pod);
        idx.pod_telemetry.remove(&key);
    }

    pub fn unbind_pod(&self, key: &(String, String)) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        let Some(pod) = idx.pods.shift_remove(key) else {
            return;
        };
        let Some(node_name) = &pod.bound_node_name else {
            return;
        };
        let is_daemonset = matches!(pod.owner, PodOwner::DaemonSet { .. });
        if let Some(provider_id) = idx.node_name_to_provider_id.get(node_name).cloned() {
            if let Some(node) = idx.by_provider_id.get_mut(&provider_id) {
                node.unbind_pod(&pod.requests, is_daemonset);
                for hp in &pod.host_ports {
                    node.host_port_usage.remove(hp);
                }
            }
        }
        idx.pod_telemetry.remove(key);
    }

    pub fn upsert_pending_pod(&self, key: (String, String), pod: PodInfo) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        idx.pods.insert(key, pod);
    }

    pub fn pending_pods(&self) -> Vec<PodInfo> {
        let idx = self.inner.read().expect("cluster state lock poisoned");
        idx.pods.values().filter(|p| p.is_pending()).cloned().collect()
    }

    /// Every pod currently bound to `node_name`, for the Disruption Engine's emptiness and
    /// do-not-disrupt candidate checks and for drain.
    pub fn pods_on_node(&self, node_name: &str) -> Vec<PodInfo> {
        let idx = self.inner.read().expect("cluster state lock poisoned");
        idx.pods
            .values()
            .filter(|p| p.bound_node_name.as_deref() == Some(node_name))
            .cloned()
            .collect()
    }

    /// Every currently bound DaemonSet pod, for [`crate::scheduler::simulate`]'s pre-deduction of
    /// DaemonSet overhead when sizing a hypothetical new node.
    pub fn daemonset_pods(&self) -> Vec<PodInfo> {
        let idx = self.inner.read().expect("cluster state lock poisoned");
        idx.pods.values().filter(|p| p.is_daemonset()).cloned().collect()
    }

    pub fn record_ack(&self, key: (String, String)) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        idx.pod_telemetry.entry(key).or_default().ack_time = Some(now());
    }

    pub fn record_scheduling_decision(&self, key: (String, String)) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        idx.pod_telemetry.entry(key).or_default().decision_time = Some(now());
    }

    pub fn record_scheduling_success(&self, key: (String, String)) {
        let mut idx = self.inner.write().expect("cluster state lock poisoned");
        idx.pod_telemetry.entry(key).or_default().success_time = Some(now());
    }
}

fn now() -> jiff::Timestamp {
    jiff::Timestamp::now()
}

#[cfg(test)]
mod tests {
    use stackable_operator::quantity::Quantity;

    use super::*;
    use crate::domain::PodPhase;

    fn qty(n: &str) -> Quantity {
        n.parse().unwrap()
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

    #[test]
    fn bind_and_unbind_updates_available() {
        let state = ClusterState::new();
        state.upsert_node(
            "provider-1",
            NodeInfo {
                provider_id: "provider-1".into(),
                name: "node-1".into(),
                labels: Default::default(),
                taints: vec![],
                ready: true,
                allocatable: ResourceList::from([("cpu".to_string(), qty("4"))]),
                unhealthy_condition_since: None,
            },
        );

        let mut p = pod("a", "1");
        p.bound_node_name = Some("node-1".into());
        let key = (p.namespace.clone(), p.name.clone());
        state.bind_pod(key.clone(), "node-1", p.clone());

        let node = state.get_node("provider-1").unwrap();
        assert_eq!(node.available().get("cpu").copied(), Some(qty("3")));

        state.unbind_pod(&key);
        let node = state.get_node("provider-1").unwrap();
        assert_eq!(node.available().get("cpu").copied(), Some(qty("4")));
    }

    #[test]
    fn pods_on_node_filters_by_bound_node_name() {
        let state = ClusterState::new();
        let mut p = pod("a", "1");
        p.bound_node_name = Some("node-1".into());
        state.upsert_pending_pod((p.namespace.clone(), p.name.clone()), p.clone());

        let mut other = pod("b", "1");
        other.bound_node_name = Some("node-2".into());
        state.upsert_pending_pod((other.namespace.clone(), other.name.clone()), other);

        let bound = state.pods_on_node("node-1");
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].name, "a");
    }

    #[test]
    fn synced_requires_matching_node_or_grace_window() {
        let state = ClusterState::new();
        state.mark_nodeclaims_synced();
        state.mark_nodes_synced();
        state.mark_pods_synced();
        state.mark_daemonsets_synced();
        state.mark_volumes_synced();
        assert!(state.synced(|_| true));

        state.upsert_nodeclaim("provider-2", "claim-2");
        assert!(!state.synced(|_| false));
        assert!(state.synced(|_| true));
    }
}
