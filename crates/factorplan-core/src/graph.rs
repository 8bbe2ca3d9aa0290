//! The bipartite variable/factor graph (§3, §4.3) that backs variable
//! elimination and local search.
//!
//! Variables are indexed `0..num_variables` and carry only a per-variable
//! adjacency list of factor handles. Factors live in an [`Arena`] so that
//! handles stay stable across insertions and removals elsewhere in the
//! graph; adjacency lists store those handles, never raw references, per
//! the arena-allocation redesign note. Lookup-or-create hashes on the
//! sorted `keys` tuple, so each `keys` signature maps to at most one factor
//! node in the graph at a time.

use std::collections::HashMap;

use factorplan_utils::{Arena, ArenaKey};

pub struct FactorNode<P> {
    pub keys: Vec<usize>,
    pub payload: P,
}

pub struct FactorGraph<P> {
    num_variables: usize,
    factors: Arena<FactorNode<P>>,
    adjacency: Vec<Vec<ArenaKey>>,
    by_keys: HashMap<Vec<usize>, ArenaKey>,
    active: Vec<bool>,
}

impl<P> FactorGraph<P> {
    pub fn new(num_variables: usize) -> Self {
        Self {
            num_variables,
            factors: Arena::new(),
            adjacency: vec![Vec::new(); num_variables],
            by_keys: HashMap::new(),
            active: vec![true; num_variables],
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn is_active(&self, var: usize) -> bool {
        self.active[var]
    }

    pub fn active_variables(&self) -> Vec<usize> {
        (0..self.num_variables).filter(|&v| self.active[v]).collect()
    }

    pub fn factor(&self, key: ArenaKey) -> Option<&FactorNode<P>> {
        self.factors.get(key)
    }

    pub fn factor_mut(&mut self, key: ArenaKey) -> Option<&mut FactorNode<P>> {
        self.factors.get_mut(key)
    }

    /// Every factor currently adjacent to `var`.
    pub fn neighbors(&self, var: usize) -> &[ArenaKey] {
        &self.adjacency[var]
    }

    /// Look up the factor whose scope is exactly `keys` (which must already
    /// be sorted and unique), creating one with `make()`'s payload if none
    /// exists yet.
    pub fn get_or_create_factor(
        &mut self,
        keys: Vec<usize>,
        make: impl FnOnce() -> P,
    ) -> ArenaKey {
        debug_assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys must be sorted and unique");
        if let Some(&existing) = self.by_keys.get(&keys) {
            return existing;
        }
        let handle = self.factors.insert(FactorNode {
            keys: keys.clone(),
            payload: make(),
        });
        for &var in &keys {
            self.adjacency[var].push(handle);
        }
        self.by_keys.insert(keys, handle);
        handle
    }

    /// The sorted union of every variable touched by the given factors.
    pub fn variables_touched(&self, factor_keys: &[ArenaKey]) -> Vec<usize> {
        let mut vars: Vec<usize> = factor_keys
            .iter()
            .filter_map(|&k| self.factors.get(k))
            .flat_map(|node| node.keys.iter().copied())
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars
    }

    /// Remove a single factor from the graph, detaching it from every
    /// variable's adjacency list.
    pub fn remove_factor(&mut self, key: ArenaKey) -> Option<FactorNode<P>> {
        let node = self.factors.remove(key)?;
        for &var in &node.keys {
            if let Some(pos) = self.adjacency[var].iter().position(|&k| k == key) {
                self.adjacency[var].swap_remove(pos);
            }
        }
        if self.by_keys.get(&node.keys) == Some(&key) {
            self.by_keys.remove(&node.keys);
        }
        Some(node)
    }

    /// Look up the factor whose scope is exactly `keys`, without creating
    /// one. Unlike [`get_or_create_factor`](Self::get_or_create_factor) this
    /// never inserts, so callers that need to *merge into* rather than
    /// *replace* a same-scope factor can tell the two cases apart.
    pub fn factor_key_for(&self, keys: &[usize]) -> Option<ArenaKey> {
        self.by_keys.get(keys).copied()
    }

    /// Remove `var` and every factor adjacent to it, returning those
    /// factors' nodes. The adjacency list is snapshotted before any removal
    /// begins, since `remove_factor` mutates adjacency lists as it runs.
    pub fn eliminate_variable(&mut self, var: usize) -> Vec<FactorNode<P>> {
        let snapshot = self.adjacency[var].clone();
        let mut removed = Vec::with_capacity(snapshot.len());
        for key in snapshot {
            if let Some(node) = self.remove_factor(key) {
                removed.push(node);
            }
        }
        self.active[var] = false;
        self.adjacency[var].clear();
        removed
    }

    pub fn all_factors(&self) -> impl Iterator<Item = (ArenaKey, &FactorNode<P>)> {
        self.factors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent_per_keys() {
        let mut g: FactorGraph<f64> = FactorGraph::new(3);
        let a = g.get_or_create_factor(vec![0, 1], || 1.0);
        let b = g.get_or_create_factor(vec![0, 1], || 99.0);
        assert_eq!(a, b);
        assert_eq!(g.factor(a).unwrap().payload, 1.0);
    }

    #[test]
    fn neighbors_and_variables_touched() {
        let mut g: FactorGraph<f64> = FactorGraph::new(3);
        let f01 = g.get_or_create_factor(vec![0, 1], || 1.0);
        let f12 = g.get_or_create_factor(vec![1, 2], || 2.0);
        assert_eq!(g.neighbors(1).len(), 2);
        assert_eq!(g.neighbors(0), &[f01]);
        let touched = g.variables_touched(&[f01, f12]);
        assert_eq!(touched, vec![0, 1, 2]);
    }

    #[test]
    fn removing_a_factor_frees_its_keys_signature_for_reuse() {
        let mut g: FactorGraph<f64> = FactorGraph::new(2);
        let first = g.get_or_create_factor(vec![0, 1], || 1.0);
        g.remove_factor(first);
        assert_eq!(g.factor_key_for(&[0, 1]), None);

        let second = g.get_or_create_factor(vec![0, 1], || 2.0);
        assert_ne!(first, second);
        assert_eq!(g.factor(second).unwrap().payload, 2.0);
    }

    #[test]
    fn eliminate_variable_removes_adjacent_factors_and_detaches_others() {
        let mut g: FactorGraph<f64> = FactorGraph::new(3);
        let f01 = g.get_or_create_factor(vec![0, 1], || 1.0);
        let _f12 = g.get_or_create_factor(vec![1, 2], || 2.0);

        let removed = g.eliminate_variable(1);
        assert_eq!(removed.len(), 2);
        assert!(!g.is_active(1));
        assert!(g.factor(f01).is_none());
        // Variable 0's adjacency no longer references the removed factor.
        assert!(g.neighbors(0).is_empty());
        assert!(g.neighbors(2).is_empty());
    }
}
