//! Custom resource definitions for the just-in-time node autoscaler.
//!
//! This crate is deliberately thin: it carries the wire shapes
//! ([`nodepool::v1alpha1::NodePool`], [`nodeclaim::v1alpha1::NodeClaim`], [`nodeclass`]) and the
//! well-known [`labels`] this system owns. The algebra over these shapes (requirement
//! intersection, instance-type selection, scheduling) lives in `stackable-autoscaler-core`, which
//! depends on this crate but not vice versa.

pub mod labels;
pub mod nodeclaim;
pub mod nodeclass;
pub mod nodepool;
pub mod requirement;

pub use nodeclaim::v1alpha1::{NodeClaim, NodeClaimSpec};
pub use nodeclass::{NodeClassReference, NodeClassStatus};
pub use nodepool::v1alpha1::{NodePool, NodePoolSpec};
