//! Fallible counterparts to [`FromIterator`]/[`Extend`].

/// A fallible counterpart to [`FromIterator`], for cases where construction of an individual
/// item can fail (for example when validating Kubernetes key/value pairs).
pub trait TryFromIterator<A>: Sized {
    type Error;

    fn try_from_iter<I: IntoIterator<Item = A>>(iter: I) -> Result<Self, Self::Error>;
}
