use std::{
    convert::Infallible,
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
};

use crate::kvp::Value;

/// A validated Kubernetes annotation value.
///
/// Unlike [`LabelValue`](crate::kvp::LabelValue), an annotation value can contain any valid UTF-8
/// data, so parsing can never fail.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnnotationValue(String);

impl Value for AnnotationValue {
    type Error = Infallible;
}

impl Debug for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl FromStr for AnnotationValue {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(Self(input.to_string()))
    }
}

impl Deref for AnnotationValue {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_utf8_is_valid() {
        let value = AnnotationValue::from_str("Stäckable").unwrap();
        assert_eq!(value.to_string(), "Stäckable");
    }
}
