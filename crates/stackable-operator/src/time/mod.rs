//! Duration parsing and display in the style used throughout Kubernetes manifests.

mod duration;
mod serde_impl;

pub use duration::{Duration, ParseDurationError};
