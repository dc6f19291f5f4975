//! The wire representation of a single scheduling requirement, as carried on
//! [`crate::nodepool::v1alpha1::NodePoolSpec`] and
//! [`crate::nodeclaim::v1alpha1::NodeClaimSpec`].
//!
//! This is deliberately a thin, serializable shape. The actual algebra (intersection,
//! compatibility, `minValues` resolution) lives in `stackable-autoscaler-core::requirements`,
//! which is kept free of Kubernetes types so it stays unit-testable in isolation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A single label-keyed scheduling requirement.
///
/// Mirrors a Kubernetes `NodeSelectorRequirement`, extended with an optional `minValues` the way
/// Karpenter-style provisioners extend it: when present, a requirement is only satisfiable by a
/// set of instance types that collectively span at least `minValues` distinct values for `key`.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorRequirement {
    pub key: String,

    pub operator: RequirementOperator,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    /// The minimum number of distinct values for `key` that a launched set of candidate
    /// instance types must collectively offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_values: Option<u32>,
}

/// The comparison semantics of a [`NodeSelectorRequirement`].
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, JsonSchema, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RequirementOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    Gt,
    Lt,
}

/// A Kubernetes-style taint, as carried on `NodePool.spec.taints`/`startupTaints` and
/// `NodeClaim.spec.taints`.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Taint {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    pub effect: TaintEffect,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, JsonSchema, PartialEq, Serialize,
)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}
