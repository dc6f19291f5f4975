//! Helpers for working with [`kube::runtime::Controller`] reconcilers.

use kube::runtime::reflector::ObjectRef;

/// A reconciliation error that can be reported back to the cluster as a Kubernetes event.
///
/// Implement this for the error type returned by a reconciler's `reconcile` function so that
/// [`super::k8s_events::publish_controller_error_as_k8s_event`] can turn it into a human-readable
/// event on the offending object.
pub trait ReconcilerError: std::error::Error {
    /// A short, machine-readable name for this error, used as the Kubernetes event's `reason`.
    ///
    /// This is usually implemented by deriving [`strum::IntoStaticStr`] on the error enum's
    /// discriminant (see [`strum::EnumDiscriminants`]) and delegating to that.
    fn category(&self) -> &'static str;

    /// The object that should be considered the subject of the error, if different from the
    /// object that is currently being reconciled.
    fn secondary_object(&self) -> Option<ObjectRef<kube::core::DynamicObject>> {
        None
    }
}
