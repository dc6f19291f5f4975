//! Error taxonomy: every fallible operation in this crate's reconcilers is classified as
//! terminal for the object, transient, or operator-actionable, so the orchestration queue
//! ([`crate::queue`]) and the Kubernetes-event reporting path can treat each accordingly.

use stackable_autoscaler_core::cloud::CloudProviderError;
use stackable_operator::logging::controller::ReconcilerError;
use strum::{EnumDiscriminants, IntoStaticStr};

/// How a reconcile error should be handled by the orchestration queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// The object itself is unschedulable or invalid; retrying without a change to the object or
    /// the cluster will not help. Surfaced as a `Ready=False`-style condition, not requeued on a
    /// fixed backoff.
    TerminalForObject,

    /// A watch gap, apiserver conflict, or cloud-provider rate limit; requeue with exponential
    /// backoff.
    Transient,

    /// A misconfiguration (bad NodeClass reference, invalid requirements on a NodePool) that only
    /// a human editing the object can fix. Surfaced as a Kubernetes event and a status condition,
    /// requeued on a long, fixed interval so the condition clears once the human acts.
    OperatorActionable,
}

/// Errors raised while reconciling a single [`stackable_autoscaler_crd::NodeClaim`].
#[derive(Debug, snafu::Snafu, EnumDiscriminants)]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum NodeClaimError {
    #[snafu(display("failed to apply NodeClaim status patch"))]
    ApplyStatus { source: kube::Error },

    #[snafu(display("failed to delete NodeClaim"))]
    Delete { source: kube::Error },

    #[snafu(display("failed to evict pod {pod_key:?} while draining"))]
    Evict {
        source: kube::Error,
        pod_key: (String, String),
    },

    #[snafu(display("NodeClaim references NodeClass {node_class:?}, which does not exist or is not Ready"))]
    NodeClassNotReady { node_class: String },

    #[snafu(display("drain exceeded its TerminationGracePeriod"))]
    DrainTimedOut,

    #[snafu(display("failed to taint Node {node_name:?} for termination"))]
    Taint {
        source: kube::Error,
        node_name: String,
    },

    #[snafu(display("failed to remove the finalizer from NodeClaim"))]
    RemoveFinalizer { source: kube::Error },

    #[snafu(display("cloud provider call failed while terminating the instance"))]
    CloudProviderCall { source: CloudProviderError },
}

impl NodeClaimError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ApplyStatus { .. }
            | Self::Delete { .. }
            | Self::Evict { .. }
            | Self::Taint { .. }
            | Self::RemoveFinalizer { .. }
            | Self::CloudProviderCall { .. } => ErrorClass::Transient,
            Self::NodeClassNotReady { .. } => ErrorClass::OperatorActionable,
            Self::DrainTimedOut => ErrorClass::TerminalForObject,
        }
    }
}

impl ReconcilerError for NodeClaimError {
    fn category(&self) -> &'static str {
        NodeClaimErrorDiscriminants::from(self).into()
    }
}

/// Errors raised while evaluating or enacting disruption decisions.
#[derive(Debug, snafu::Snafu, EnumDiscriminants)]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum DisruptionError {
    #[snafu(display("failed to list candidate NodeClaims"))]
    ListNodeClaims { source: kube::Error },

    #[snafu(display("failed to annotate NodeClaim {provider_id:?} with its disruption reason"))]
    AnnotateReason {
        source: kube::Error,
        provider_id: String,
    },

    #[snafu(display("failed to mark NodeClaim {provider_id:?} for deletion"))]
    MarkForDeletion {
        source: kube::Error,
        provider_id: String,
    },

    #[snafu(display("failed to list NodePools"))]
    ListNodePools { source: kube::Error },

    #[snafu(display("failed to create replacement NodeClaim for pool {pool_name:?}"))]
    CreateReplacement {
        source: kube::Error,
        pool_name: String,
    },
}

impl ReconcilerError for DisruptionError {
    fn category(&self) -> &'static str {
        DisruptionErrorDiscriminants::from(self).into()
    }
}

/// Errors raised while provisioning new nodes for a scheduling solution.
#[derive(Debug, snafu::Snafu, EnumDiscriminants)]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum ProvisionerError {
    #[snafu(display("failed to create NodeClaim for pool {pool_name:?}"))]
    CreateNodeClaim {
        source: kube::Error,
        pool_name: String,
    },

    #[snafu(display("failed to fetch NodePools"))]
    ListNodePools { source: kube::Error },

    #[snafu(display("no NodePool produced a viable instance type for this batch"))]
    NoViableNodePool,
}

impl ReconcilerError for ProvisionerError {
    fn category(&self) -> &'static str {
        ProvisionerErrorDiscriminants::from(self).into()
    }
}
