//! Deep-merging of partially specified (["fragment"](super::fragment)) configuration values.
use std::collections::{BTreeMap, HashMap};

/// Marker trait for types that cannot be merged any further ("leaf" values).
///
/// [`Atomic`] types automatically get a [`FromFragment`](super::fragment::FromFragment)
/// implementation where the fragment type is `Option<Self>`.
pub trait Atomic {}

macro_rules! atomic_impl {
    ($($ty:ty),* $(,)?) => {
        $(impl Atomic for $ty {})*
    };
}

atomic_impl!(
    bool, char, str, String, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize,
);

/// Deeply merges `self` with a set of (lower-priority) defaults.
///
/// Any field that is not set in `self` is filled in from `defaults`, recursing into nested
/// structs and collections. [`Atomic`] values are simply kept as-is if already set.
pub trait Merge {
    /// Merges `self` with `defaults`, using `self`'s values whenever both are set.
    fn merge(&mut self, defaults: &Self);

    /// Merges a chain of layers (from highest to lowest priority) into a single value.
    fn merge_with_default(&self, default: Self) -> Self
    where
        Self: Clone,
    {
        let mut merged = self.clone();
        merged.merge(&default);
        merged
    }
}

impl<T: Merge + Clone> Merge for Option<T> {
    fn merge(&mut self, defaults: &Self) {
        match (self.as_mut(), defaults) {
            (Some(current), Some(defaults)) => current.merge(defaults),
            (None, Some(defaults)) => *self = Some(defaults.clone()),
            (_, None) => {}
        }
    }
}

impl<K, V> Merge for HashMap<K, V>
where
    K: Eq + std::hash::Hash + Clone,
    V: Merge + Clone,
{
    fn merge(&mut self, defaults: &Self) {
        for (key, default_value) in defaults {
            match self.get_mut(key) {
                Some(value) => value.merge(default_value),
                None => {
                    self.insert(key.clone(), default_value.clone());
                }
            }
        }
    }
}

impl<K, V> Merge for BTreeMap<K, V>
where
    K: Eq + Ord + Clone,
    V: Merge + Clone,
{
    fn merge(&mut self, defaults: &Self) {
        for (key, default_value) in defaults {
            match self.get_mut(key) {
                Some(value) => value.merge(default_value),
                None => {
                    self.insert(key.clone(), default_value.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Numbers(Option<i32>);

    impl Merge for Numbers {
        fn merge(&mut self, defaults: &Self) {
            self.0.merge(&defaults.0);
        }
    }

    #[test]
    fn option_prefers_self() {
        let mut value = Some(1);
        value.merge(&Some(2));
        assert_eq!(value, Some(1));
    }

    #[test]
    fn option_falls_back_to_default() {
        let mut value: Option<i32> = None;
        value.merge(&Some(2));
        assert_eq!(value, Some(2));
    }

    #[test]
    fn map_merges_per_key() {
        let mut value = BTreeMap::from([("a".to_string(), Numbers(Some(1)))]);
        let defaults = BTreeMap::from([
            ("a".to_string(), Numbers(Some(2))),
            ("b".to_string(), Numbers(Some(3))),
        ]);

        value.merge(&defaults);

        assert_eq!(
            value,
            BTreeMap::from([
                ("a".to_string(), Numbers(Some(1))),
                ("b".to_string(), Numbers(Some(3))),
            ])
        );
    }
}
