//! `NodeClass` is cloud-specific configuration (subnets, images, security groups, user data). It
//! is opaque to this crate: per Design Note 9, rather than modeling an open trait hierarchy over
//! every possible cloud-specific CRD kind, the core only ever needs a `{group, kind, name}`
//! reference plus the referenced object's readiness condition.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A reference to a cloud-specific `NodeClass` object, carried on
/// [`NodePoolSpec::node_class_ref`](crate::nodepool::v1alpha1::NodePoolSpec::node_class_ref).
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClassReference {
    /// The API group of the referenced NodeClass, e.g. `ec2.autoscaling.stackable.tech`.
    pub group: String,

    /// The kind of the referenced NodeClass, e.g. `Ec2NodeClass`.
    pub kind: String,

    /// The name of the referenced NodeClass object.
    pub name: String,
}

/// A projection of the parts of a cloud-specific NodeClass' status this crate reads.
///
/// Cloud providers expose far more than this (subnet discovery, AMI resolution, ...), but the
/// core only ever inspects whether the NodeClass is `Ready`.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClassStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl NodeClassStatus {
    pub const READY_CONDITION: &'static str = "Ready";

    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.type_ == Self::READY_CONDITION && c.status == "True")
    }
}
