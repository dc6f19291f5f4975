use std::{
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
};

/// A validated value of a Kubernetes key/value pair, such as a label or annotation value.
///
/// Implementors must guarantee that any successfully parsed [`Value`] is valid according to the
/// Kubernetes spec for the kind of key/value pair it is used in.
pub trait Value: Clone + Debug + Deref<Target = str> + Display + FromStr<Err = Self::Error> {
    type Error: std::error::Error;
}
