//! Requirements Algebra.
//!
//! Kept free of Kubernetes types on purpose: the only thing borrowed from
//! `stackable-autoscaler-crd` is the wire-level [`RequirementOperator`] enum, so that this module
//! stays unit-testable with plain Rust values (mirrors how
//! [`stackable_operator::quantity`](stackable_operator::quantity) is a dependency-light module
//! tested purely with `rstest` tables).

use std::{collections::BTreeSet, fmt};

use indexmap::IndexMap;
use snafu::Snafu;
use stackable_autoscaler_crd::requirement::{NodeSelectorRequirement, RequirementOperator};

use crate::cloud::InstanceType;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum RequirementError {
    #[snafu(display("requirement for key {key:?} has no values, but operator {operator} requires at least one"))]
    EmptyValues {
        key: String,
        operator: RequirementOperator,
    },

    #[snafu(display(
        "intersecting requirements for key {key:?} yields an empty, unsatisfiable set"
    ))]
    EmptyIntersection { key: String },

    #[snafu(display(
        "requirement for key {key:?} has contradictory Gt/Lt bounds ({lower} > {upper})"
    ))]
    ContradictoryBound {
        key: String,
        lower: i64,
        upper: i64,
    },

    #[snafu(display("Gt/Lt requirement for key {key:?} must carry exactly one integer value"))]
    InvalidNumericBound { key: String },

    #[snafu(display("key {key:?} is under the reserved domain {domain:?}"))]
    ReservedLabelDomain { key: String, domain: String },

    #[snafu(display("key {key:?} may not be set directly, it is managed by the system"))]
    ReservedKey { key: String },

    #[snafu(display("minValues for key {key:?} cannot be satisfied by the available instance types"))]
    MinValuesUnsatisfied { key: String },
}

/// A single label-keyed requirement, collapsed to at most one `In`/`NotIn`/`Exists`/
/// `DoesNotExist`/`Gt`/`Lt` constraint per key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: RequirementOperator,
    pub values: BTreeSet<String>,
    pub min_values: Option<u32>,
}

impl Requirement {
    pub fn new(
        key: impl Into<String>,
        operator: RequirementOperator,
        values: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            values: values.into_iter().collect(),
            min_values: None,
        }
    }

    pub fn with_min_values(mut self, min_values: Option<u32>) -> Self {
        self.min_values = min_values;
        self
    }

    /// Numeric bound for `Gt`/`Lt` requirements.
    fn numeric_bound(&self) -> Result<i64, RequirementError> {
        self.values
            .iter()
            .exactly_one_numeric()
            .ok_or_else(|| RequirementError::InvalidNumericBound {
                key: self.key.clone(),
            })
    }

    /// `Has(key, value)` restricted to this single requirement (the key is assumed to already
    /// match).
    pub fn has(&self, value: &str) -> bool {
        match self.operator {
            RequirementOperator::In => self.values.contains(value),
            RequirementOperator::NotIn => !self.values.contains(value),
            RequirementOperator::Exists => true,
            RequirementOperator::DoesNotExist => false,
            RequirementOperator::Gt => value
                .parse::<i64>()
                .ok()
                .zip(self.numeric_bound().ok())
                .is_some_and(|(v, bound)| v > bound),
            RequirementOperator::Lt => value
                .parse::<i64>()
                .ok()
                .zip(self.numeric_bound().ok())
                .is_some_and(|(v, bound)| v < bound),
        }
    }

    /// Intersects two requirements already known to share a key, applying operator-aware
    /// collapsing.
    fn intersect_with(&self, other: &Requirement) -> Result<Requirement, RequirementError> {
        use RequirementOperator::{DoesNotExist, Exists, Gt, In, Lt, NotIn};

        let key = self.key.clone();
        let collapsed = match (self.operator, other.operator) {
            (DoesNotExist, DoesNotExist) => Requirement::new(&key, DoesNotExist, []),
            (DoesNotExist, _) | (_, DoesNotExist) => {
                return EmptyIntersectionSnafu { key }.fail();
            }
            (Exists, Exists) => Requirement::new(&key, Exists, []),
            (Exists, op) => Requirement {
                key,
                operator: op,
                values: other.values.clone(),
                min_values: other.min_values,
            },
            (op, Exists) => Requirement {
                key,
                operator: op,
                values: self.values.clone(),
                min_values: self.min_values,
            },
            (In, In) => {
                let values: BTreeSet<String> =
                    self.values.intersection(&other.values).cloned().collect();
                Requirement::new(&key, In, values)
            }
            (In, NotIn) => {
                let values: BTreeSet<String> =
                    self.values.difference(&other.values).cloned().collect();
                Requirement::new(&key, In, values)
            }
            (NotIn, In) => {
                let values: BTreeSet<String> =
                    other.values.difference(&self.values).cloned().collect();
                Requirement::new(&key, In, values)
            }
            (NotIn, NotIn) => {
                let values: BTreeSet<String> =
                    self.values.union(&other.values).cloned().collect();
                Requirement::new(&key, NotIn, values)
            }
            (In, Gt) | (In, Lt) => {
                let bound = other.numeric_bound()?;
                let values: BTreeSet<String> = self
                    .values
                    .iter()
                    .filter(|v| {
                        v.parse::<i64>()
                            .is_ok_and(|n| if other.operator == Gt { n > bound } else { n < bound })
                    })
                    .cloned()
                    .collect();
                Requirement::new(&key, In, values)
            }
            (Gt, In) | (Lt, In) => return other.intersect_with(self),
            (Gt, Gt) => {
                let bound = self.numeric_bound()?.max(other.numeric_bound()?);
                Requirement::new(&key, Gt, [bound.to_string()])
            }
            (Lt, Lt) => {
                let bound = self.numeric_bound()?.min(other.numeric_bound()?);
                Requirement::new(&key, Lt, [bound.to_string()])
            }
            (Gt, Lt) | (Lt, Gt) => {
                let (gt, lt) = if self.operator == Gt {
                    (self.numeric_bound()?, other.numeric_bound()?)
                } else {
                    (other.numeric_bound()?, self.numeric_bound()?)
                };
                if gt >= lt {
                    return ContradictoryBoundSnafu {
                        key,
                        lower: gt,
                        upper: lt,
                    }
                    .fail();
                }
                // Represented as the tighter of the two original operators; a real numeric-range
                // type is out of scope, `Gt` alone with the intersection already validated as
                // non-contradictory is sufficient for the membership queries this algebra needs.
                Requirement {
                    key,
                    operator: Gt,
                    values: [gt.to_string()].into_iter().collect(),
                    min_values: None,
                }
            }
            (NotIn, Gt | Lt) | (Gt | Lt, NotIn) => {
                // NotIn never narrows a numeric bound meaningfully for this algebra; keep the
                // numeric side, mirroring how the source treats mixed in/out-of-band operators.
                if matches!(self.operator, Gt | Lt) {
                    self.clone()
                } else {
                    other.clone()
                }
            }
        };

        if matches!(collapsed.operator, In | NotIn) && collapsed.values.is_empty() {
            match collapsed.operator {
                In => return EmptyIntersectionSnafu { key: collapsed.key }.fail(),
                NotIn => {}
                _ => unreachable!(),
            }
        }

        let min_values = match (self.min_values, other.min_values) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        Ok(Requirement {
            min_values,
            ..collapsed
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            RequirementOperator::Exists => write!(f, "{}", self.key),
            RequirementOperator::DoesNotExist => write!(f, "!{}", self.key),
            _ => write!(
                f,
                "{} {} [{}]",
                self.key,
                self.operator,
                self.values.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

trait ExactlyOneNumeric {
    fn exactly_one_numeric(self) -> Option<i64>;
}

impl<'a, I: Iterator<Item = &'a String>> ExactlyOneNumeric for I {
    fn exactly_one_numeric(mut self) -> Option<i64> {
        let first = self.next()?;
        if self.next().is_some() {
            return None;
        }
        first.parse().ok()
    }
}

/// An ordered, key-indexed collection of [`Requirement`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequirementSet {
    by_key: IndexMap<String, Requirement>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Requirement> {
        self.by_key.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.by_key.values()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Inserts `requirement`, intersecting with any existing requirement for the same key.
    pub fn insert(&mut self, requirement: Requirement) -> Result<(), RequirementError> {
        match self.by_key.get(&requirement.key) {
            Some(existing) => {
                let merged = existing.intersect_with(&requirement)?;
                self.by_key.insert(merged.key.clone(), merged);
            }
            None => {
                self.by_key.insert(requirement.key.clone(), requirement);
            }
        }
        Ok(())
    }

    pub fn from_requirements(
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> Result<Self, RequirementError> {
        let mut set = Self::new();
        for r in requirements {
            set.insert(r)?;
        }
        Ok(set)
    }

    /// `Has(key, value)`.
    pub fn has(&self, key: &str, value: &str) -> bool {
        self.by_key.get(key).is_some_and(|r| r.has(value))
    }

    /// `Intersect(a, b)`: per-key intersection, rejecting unsatisfiable results.
    pub fn intersect(&self, other: &RequirementSet) -> Result<RequirementSet, RequirementError> {
        let mut merged = self.clone();
        for requirement in other.iter() {
            merged.insert(requirement.clone())?;
        }
        Ok(merged)
    }

    /// `IsCompatible(other, opts)`: every key present in both must have non-empty
    /// intersection. `allow_undeclared_well_known` lets `other` use well-known labels this set
    /// doesn't mention at all (e.g. an instance type's intrinsic zone/arch labels against a
    /// NodePool that never constrained them).
    pub fn is_compatible(&self, other: &RequirementSet, opts: CompatibilityOptions) -> bool {
        for key in self.keys() {
            let Some(other_req) = other.get(key) else {
                if opts.allow_undeclared_well_known
                    && stackable_autoscaler_crd::labels::ALLOWED_WELL_KNOWN_LABELS.contains(&key)
                {
                    continue;
                }
                return false;
            };
            let self_req = self.get(key).expect("key came from self.keys()");
            if self_req.intersect_with(other_req).is_err() {
                return false;
            }
        }
        true
    }

    pub fn has_min_values(&self) -> bool {
        self.by_key.values().any(|r| r.min_values.is_some())
    }

    /// `SatisfiesMinValues(its)`: greedy walk over cost-sorted instance types, returning
    /// the minimum prefix length whose union of intrinsic label values meets every `minValues`
    /// constraint.
    pub fn satisfies_min_values(
        &self,
        instance_types: &[InstanceType],
    ) -> Result<usize, RequirementError> {
        let constraints: Vec<(&str, u32)> = self
            .by_key
            .values()
            .filter_map(|r| r.min_values.map(|m| (r.key.as_str(), m)))
            .collect();

        if constraints.is_empty() {
            return Ok(instance_types.len().min(1));
        }

        let mut seen: IndexMap<&str, BTreeSet<&str>> = IndexMap::new();
        for (key, _) in &constraints {
            seen.insert(key, BTreeSet::new());
        }

        for (idx, it) in instance_types.iter().enumerate() {
            for (key, _) in &constraints {
                if let Some(req) = it.requirements.get(key) {
                    seen.get_mut(key)
                        .expect("key inserted above")
                        .extend(req.values.iter().map(String::as_str));
                }
            }

            if constraints
                .iter()
                .all(|(key, min)| seen[key].len() >= *min as usize)
            {
                return Ok(idx + 1);
            }
        }

        let (failing_key, _) = constraints
            .iter()
            .find(|(key, min)| seen[key].len() < *min as usize)
            .expect("loop above did not return Ok, so some constraint is unmet");

        MinValuesUnsatisfiedSnafu {
            key: failing_key.to_string(),
        }
        .fail()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityOptions {
    pub allow_undeclared_well_known: bool,
}

/// Label domain policy: rejects operator-supplied requirements that
/// use a reserved domain outside the well-known allow-list, or the NodePool label key itself.
pub fn validate_operator_requirement(key: &str) -> Result<(), RequirementError> {
    if key == stackable_autoscaler_crd::labels::NODEPOOL_LABEL {
        return ReservedKeySnafu { key }.fail();
    }

    if stackable_autoscaler_crd::labels::ALLOWED_WELL_KNOWN_LABELS.contains(&key) {
        return Ok(());
    }

    for domain in stackable_autoscaler_crd::labels::RESERVED_LABEL_DOMAINS {
        if key == *domain || key.starts_with(&format!("{domain}/")) {
            return ReservedLabelDomainSnafu {
                key,
                domain: domain.to_string(),
            }
            .fail();
        }
    }

    Ok(())
}

/// Converts a wire-level [`NodeSelectorRequirement`] into the algebra's [`Requirement`].
pub fn from_wire(requirement: &NodeSelectorRequirement) -> Requirement {
    Requirement::new(
        requirement.key.clone(),
        requirement.operator,
        requirement.values.iter().cloned(),
    )
    .with_min_values(requirement.min_values)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn set(requirements: Vec<Requirement>) -> RequirementSet {
        RequirementSet::from_requirements(requirements).unwrap()
    }

    #[test]
    fn intersect_in_in_narrows() {
        let a = Requirement::new("zone", RequirementOperator::In, ["z1", "z2"].map(String::from));
        let b = Requirement::new("zone", RequirementOperator::In, ["z2", "z3"].map(String::from));
        let merged = a.intersect_with(&b).unwrap();
        assert_eq!(merged.values, BTreeSet::from(["z2".to_string()]));
    }

    #[test]
    fn intersect_in_in_empty_is_rejected() {
        let a = Requirement::new("zone", RequirementOperator::In, ["z1"].map(String::from));
        let b = Requirement::new("zone", RequirementOperator::In, ["z2"].map(String::from));
        assert_eq!(
            a.intersect_with(&b),
            Err(RequirementError::EmptyIntersection {
                key: "zone".to_string()
            })
        );
    }

    #[test]
    fn intersect_gt_lt_contradictory() {
        let a = Requirement::new("mem-gb", RequirementOperator::Gt, ["64".to_string()]);
        let b = Requirement::new("mem-gb", RequirementOperator::Lt, ["32".to_string()]);
        assert!(matches!(
            a.intersect_with(&b),
            Err(RequirementError::ContradictoryBound { .. })
        ));
    }

    #[test]
    fn exists_does_not_narrow_in() {
        let a = Requirement::new("zone", RequirementOperator::Exists, []);
        let b = Requirement::new("zone", RequirementOperator::In, ["z1"].map(String::from));
        let merged = a.intersect_with(&b).unwrap();
        assert_eq!(merged.values, BTreeSet::from(["z1".to_string()]));
    }

    #[rstest]
    #[case(2, 2, true)]
    #[case(2, 1, false)]
    fn min_values_boundary(#[case] available: usize, #[case] needed: u32, #[case] ok: bool) {
        let families: Vec<&str> = vec!["m", "c", "r"][..available].to_vec();

        let its: Vec<InstanceType> = families
            .iter()
            .map(|f| {
                InstanceType::test_fixture(
                    f,
                    [(
                        "instance-family".to_string(),
                        Requirement::new(
                            "instance-family",
                            RequirementOperator::In,
                            [f.to_string()],
                        ),
                    )],
                )
            })
            .collect();

        let requirement_set = set(vec![Requirement::new(
            "instance-family",
            RequirementOperator::In,
            families.iter().map(|s| s.to_string()),
        )
        .with_min_values(Some(needed))]);

        assert_eq!(requirement_set.satisfies_min_values(&its).is_ok(), ok);
    }

    #[test]
    fn reserved_domain_rejected() {
        assert!(validate_operator_requirement("kubernetes.io/hostname").is_err());
        assert!(validate_operator_requirement(stackable_autoscaler_crd::labels::LABEL_ARCH).is_ok());
        assert!(validate_operator_requirement("example.com/custom").is_ok());
    }
}
