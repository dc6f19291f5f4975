//! Requirements algebra, instance-type catalog, cluster state cache and scheduler for the
//! just-in-time node autoscaler.
//!
//! This crate has no I/O: every module here is a pure, synchronous simulation or in-memory
//! index. The apiserver watch transport and the cloud provider implementation are external
//! collaborators consumed through the [`scheduler::InstanceTypeSource`] trait and
//! the `apply_*` methods on [`state::ClusterState`], fed by `stackable-autoscaler-controller`.

pub mod cloud;
pub mod disruption;
pub mod domain;
pub mod requirements;
pub mod scheduler;
pub mod state;

pub use cloud::{CloudProvider, InstanceType, Offering};
pub use requirements::{Requirement, RequirementSet};
pub use scheduler::{Solution, UnschedulableReason};
pub use state::{ClusterState, StateNode};
