//! NodeClaim lifecycle, disruption engine and provisioner for the just-in-time node autoscaler.
//!
//! Every reconciler here is I/O glue around the pure decision functions in
//! `stackable-autoscaler-core`: this crate owns the apiserver calls, the orchestration queue, and
//! the [`Configuration`](config) surface, but never re-implements the algorithms those functions
//! already cover.

pub mod config;
pub mod disruption;
pub mod error;
pub mod nodeclaim;
pub mod provisioner;
pub mod queue;
