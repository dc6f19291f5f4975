//! This module provides common datastructures or CRDs shared between all the operators

pub mod affinity;
pub mod cache;
pub mod networking;
pub mod observability;
pub mod telemetry;
