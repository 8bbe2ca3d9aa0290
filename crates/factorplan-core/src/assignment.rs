//! Factor sets and assignments (§3 of the specification).
//!
//! A [`FactorSet`] is an ordered sequence of positive variable sizes. A
//! [`FullAssignment`] gives a value to every variable; a [`PartialAssignment`]
//! gives values to a strictly-increasing subsequence of variables. Both are
//! convertible to a flat mixed-radix index with the earliest key as the
//! least-significant digit, matching the ordering used throughout the
//! factored solvers for cross-sum enumeration.

use factorplan_error::{FactorplanError, FactorplanResult, factorplan_err};

/// An ordered sequence of positive variable domain sizes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactorSet(Vec<usize>);

impl FactorSet {
    pub fn new(sizes: impl Into<Vec<usize>>) -> FactorplanResult<Self> {
        let sizes = sizes.into();
        if sizes.iter().any(|&s| s == 0) {
            return Err(factorplan_err!(
                InvalidArgument: "every variable must have a positive domain size, got {:?}",
                sizes
            ));
        }
        Ok(Self(sizes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn size(&self, var: usize) -> usize {
        self.0[var]
    }

    pub fn sizes(&self) -> &[usize] {
        &self.0
    }

    /// Total number of full assignments (product of all sizes).
    pub fn space_size(&self) -> usize {
        self.0.iter().product()
    }

    /// Size of the space restricted to `keys` (product of the sizes at those
    /// indices, in `keys` order).
    pub fn space_size_of(&self, keys: &[usize]) -> usize {
        keys.iter().map(|&k| self.0[k]).product()
    }

    /// Mixed-radix flat index of `values` restricted to `keys`, with `keys[0]`
    /// as the least-significant digit.
    pub fn flat_index(&self, keys: &[usize], values: &[usize]) -> usize {
        debug_assert_eq!(keys.len(), values.len());
        let mut index = 0usize;
        let mut stride = 1usize;
        for (&key, &value) in keys.iter().zip(values.iter()) {
            index += value * stride;
            stride *= self.0[key];
        }
        index
    }

    /// Inverse of [`FactorSet::flat_index`]: decode a flat index back into
    /// per-key values, in `keys` order.
    pub fn unflatten(&self, keys: &[usize], mut index: usize) -> Vec<usize> {
        let mut values = Vec::with_capacity(keys.len());
        for &key in keys {
            let size = self.0[key];
            values.push(index % size);
            index /= size;
        }
        values
    }

    /// Iterate every full assignment in mixed-radix order (variable 0 is the
    /// least-significant digit).
    pub fn iter_full(&self) -> FullAssignmentIter<'_> {
        FullAssignmentIter {
            sizes: &self.0,
            current: Some(vec![0; self.0.len()]),
        }
    }
}

pub struct FullAssignmentIter<'a> {
    sizes: &'a [usize],
    current: Option<Vec<usize>>,
}

impl<'a> Iterator for FullAssignmentIter<'a> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.clone()?;
        let cur = self.current.as_mut().unwrap();
        let mut i = 0;
        loop {
            if i == cur.len() {
                self.current = None;
                break;
            }
            cur[i] += 1;
            if cur[i] < self.sizes[i] {
                break;
            }
            cur[i] = 0;
            i += 1;
        }
        Some(out)
    }
}

/// A partial assignment: a strictly-increasing sequence of variable indices
/// and their matching values. Invariant: `keys` is sorted and unique, and
/// `values[i]` is a valid index into the domain of `keys[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PartialAssignment {
    keys: Vec<usize>,
    values: Vec<usize>,
}

impl PartialAssignment {
    pub fn new(keys: Vec<usize>, values: Vec<usize>) -> FactorplanResult<Self> {
        if keys.len() != values.len() {
            return Err(factorplan_err!(
                InvalidArgument: "keys and values must have equal length, got {} and {}",
                keys.len(),
                values.len()
            ));
        }
        if !keys.windows(2).all(|w| w[0] < w[1]) {
            return Err(factorplan_err!(
                InvalidArgument: "partial assignment keys must be strictly increasing, got {:?}",
                keys
            ));
        }
        Ok(Self { keys, values })
    }

    pub fn single(key: usize, value: usize) -> Self {
        Self {
            keys: vec![key],
            values: vec![value],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[usize] {
        &self.keys
    }

    pub fn values(&self) -> &[usize] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn value_of(&self, key: usize) -> Option<usize> {
        self.keys
            .binary_search(&key)
            .ok()
            .map(|i| self.values[i])
    }

    /// Merge with another partial assignment over a disjoint key set,
    /// producing a new assignment with keys in sorted order. Used when a
    /// `cross_sum` concatenates tags from distinct factors.
    pub fn merge(&self, other: &PartialAssignment) -> PartialAssignment {
        let mut merged: Vec<(usize, usize)> = self
            .keys
            .iter()
            .zip(self.values.iter())
            .chain(other.keys.iter().zip(other.values.iter()))
            .map(|(&k, &v)| (k, v))
            .collect();
        merged.sort_unstable_by_key(|&(k, _)| k);
        let (keys, values) = merged.into_iter().unzip();
        PartialAssignment { keys, values }
    }

    pub fn with(&self, key: usize, value: usize) -> PartialAssignment {
        self.merge(&PartialAssignment::single(key, value))
    }

    /// Extend this partial assignment into a full assignment over `set`.
    /// Every variable index in `0..set.len()` not present in this assignment
    /// must be filled by the caller-provided default, since an unconstrained
    /// variable has no canonical value.
    pub fn to_full(&self, set: &FactorSet, default: impl Fn(usize) -> usize) -> Vec<usize> {
        let mut full = vec![0usize; set.len()];
        for v in 0..set.len() {
            full[v] = self.value_of(v).unwrap_or_else(|| default(v));
        }
        full
    }
}

impl From<Vec<usize>> for FactorSet {
    fn from(sizes: Vec<usize>) -> Self {
        FactorSet::new(sizes).expect("FactorSet::from requires positive sizes")
    }
}

pub fn invalid_argument(message: impl Into<String>) -> FactorplanError {
    factorplan_err!(InvalidArgument: "{}", message.into())
}
