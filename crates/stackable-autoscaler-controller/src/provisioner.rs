//! Provisioner.
//!
//! [`Batcher`] decides *when* to run the Scheduler over the currently pending pods; the actual
//! `CloudProvider::launch` call and NodeClaim creation ([`provision`]) are kept separate so the
//! batching policy stays unit-testable without a fake apiserver.

use jiff::Timestamp;
use k8s_openapi::{
    apimachinery::pkg::api::resource::Quantity as K8sQuantity, apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{Api, Client, api::PostParams};
use snafu::ResultExt;
use stackable_autoscaler_core::{
    cloud::CloudProvider,
    scheduler::{InstanceTypeSource, SimulatedNodeClaim},
};
use stackable_autoscaler_crd::{
    labels::{NODECLASS_HASH_ANNOTATION, NODEPOOL_HASH_ANNOTATION},
    nodeclaim::{
        NodeClaimResources, default_registration_grace_period,
        v1alpha1::{NodeClaim, NodeClaimSpec},
    },
    nodepool::v1alpha1::NodePool,
};
use tracing::instrument;

use crate::{
    disruption::nodepool_template_hash,
    error::{CreateNodeClaimSnafu, ProvisionerError},
};

/// Decides when the Provisioner should run the Scheduler over the currently pending batch.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    idle: std::time::Duration,
    max: std::time::Duration,
    batch_started: Option<Timestamp>,
    last_arrival: Option<Timestamp>,
}

impl Batcher {
    pub fn new(idle: std::time::Duration, max: std::time::Duration) -> Self {
        Self {
            idle,
            max,
            batch_started: None,
            last_arrival: None,
        }
    }

    /// Call when a pending pod is observed. Starts the batch window if one isn't already open.
    pub fn record_arrival(&mut self, now: Timestamp) {
        if self.batch_started.is_none() {
            self.batch_started = Some(now);
        }
        self.last_arrival = Some(now);
    }

    /// Whether the batch should be flushed now: either the idle window has elapsed since the last
    /// arrival, or the max duration since the batch opened has elapsed.
    pub fn should_flush(&self, now: Timestamp) -> bool {
        let Some(last_arrival) = self.last_arrival else {
            return false;
        };
        let Some(batch_started) = self.batch_started else {
            return false;
        };

        let idle_elapsed = now.duration_since(last_arrival).as_secs_f64() >= self.idle.as_secs_f64();
        let max_elapsed = now.duration_since(batch_started).as_secs_f64() >= self.max.as_secs_f64();
        idle_elapsed || max_elapsed
    }

    /// Resets the batch window once its contents have been handed to the Scheduler.
    pub fn flush(&mut self) {
        self.batch_started = None;
        self.last_arrival = None;
    }
}

/// Creates one NodeClaim per [`SimulatedNodeClaim`] the Scheduler decided to add, stamping each with the NodePool- and NodeClass-hash annotations the Disruption
/// Engine's Drift check later compares against.
#[instrument(skip(client, simulated, pools, cloud_provider))]
pub async fn provision(
    client: &Client,
    simulated: &[SimulatedNodeClaim],
    pools: &[NodePool],
    cloud_provider: &dyn CloudProvider,
) -> Result<Vec<NodeClaim>, ProvisionerError> {
    let api: Api<NodeClaim> = Api::all(client.clone());
    let mut created = Vec::with_capacity(simulated.len());

    for claim in simulated {
        let Some(pool) = pools
            .iter()
            .find(|p| p.metadata.name.as_deref() == Some(claim.pool_name.as_str()))
        else {
            tracing::warn!(pool = %claim.pool_name, "pool has no known NodeClass, skipping");
            continue;
        };

        let mut annotations = std::collections::BTreeMap::new();
        annotations.insert(
            NODEPOOL_HASH_ANNOTATION.to_string(),
            nodepool_template_hash(&pool.spec),
        );
        if let Ok(Some(nodeclass_hash)) = cloud_provider.node_class_hash(&pool.spec.node_class_ref).await {
            annotations.insert(NODECLASS_HASH_ANNOTATION.to_string(), nodeclass_hash);
        }

        let nodeclaim = NodeClaim {
            metadata: ObjectMeta {
                generate_name: Some(generate_name(&claim.pool_name)),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: NodeClaimSpec {
                requirements: Vec::new(),
                resources: NodeClaimResources {
                    requests: claim
                        .pod_requests
                        .iter()
                        .map(|(key, qty)| (key.clone(), K8sQuantity::from(qty)))
                        .collect(),
                },
                taints: Vec::new(),
                startup_taints: Vec::new(),
                node_class_ref: pool.spec.node_class_ref.clone(),
            },
            status: None,
        };

        let created_claim = api
            .create(&PostParams::default(), &nodeclaim)
            .await
            .context(CreateNodeClaimSnafu {
                pool_name: claim.pool_name.clone(),
            })?;
        created.push(created_claim);
    }

    Ok(created)
}

fn generate_name(pool_name: &str) -> String {
    format!("{pool_name}-")
}

/// A [`InstanceTypeSource`] backed by a NodePool-keyed lookup table, the shape the cloud provider
/// integration would populate each reconcile.
pub struct CatalogInstanceTypeSource<'a> {
    pub catalog: &'a indexmap::IndexMap<String, Vec<stackable_autoscaler_core::cloud::InstanceType>>,
}

impl InstanceTypeSource for CatalogInstanceTypeSource<'_> {
    fn instance_types_for(&self, pool: &NodePool) -> Vec<stackable_autoscaler_core::cloud::InstanceType> {
        pool.metadata
            .name
            .as_deref()
            .and_then(|name| self.catalog.get(name))
            .cloned()
            .unwrap_or_default()
    }
}

/// Registration grace window used by [`crate::nodeclaim`] when deciding `Synced()`.
pub fn registration_grace_period() -> std::time::Duration {
    default_registration_grace_period().as_std()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn flushes_after_idle_window() {
        let mut batcher = Batcher::new(
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(10),
        );
        batcher.record_arrival(t("2024-01-01T00:00:00Z"));
        assert!(!batcher.should_flush(t("2024-01-01T00:00:00.5Z")));
        assert!(batcher.should_flush(t("2024-01-01T00:00:01.5Z")));
    }

    #[test]
    fn flushes_at_max_duration_even_with_continuous_arrivals() {
        let mut batcher = Batcher::new(
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(5),
        );
        batcher.record_arrival(t("2024-01-01T00:00:00Z"));
        batcher.record_arrival(t("2024-01-01T00:00:04.9Z"));
        assert!(batcher.should_flush(t("2024-01-01T00:00:05.1Z")));
    }

    #[test]
    fn flush_resets_window() {
        let mut batcher = Batcher::new(
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(10),
        );
        batcher.record_arrival(t("2024-01-01T00:00:00Z"));
        batcher.flush();
        assert!(!batcher.should_flush(t("2024-01-01T00:05:00Z")));
    }
}
