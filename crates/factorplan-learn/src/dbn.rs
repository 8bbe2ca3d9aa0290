//! A dynamic Bayesian network transition model (§4.6): per next-state
//! variable, a conditional table keyed by the flattened assignment of that
//! variable's parents (a subset of the current state and the local joint
//! action).

use rand::RngCore;

use factorplan_core::sample_categorical;

/// The conditional table for one next-state variable `i`: its parent scope
/// (state and action variable indices it depends on) and a row-stochastic
/// table, one row per flattened parent assignment.
pub struct VariableModel {
    pub state_parents: Vec<usize>,
    pub action_parents: Vec<usize>,
    pub domain_size: usize,
    /// `rows[parent_index]` is a distribution of length `domain_size`.
    rows: Vec<Vec<f64>>,
}

impl VariableModel {
    pub fn new(
        state_parents: Vec<usize>,
        action_parents: Vec<usize>,
        domain_size: usize,
        rows: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == domain_size));
        Self { state_parents, action_parents, domain_size, rows }
    }

    fn parent_index(&self, state: &[usize], action: &[usize], state_sizes: &[usize], action_sizes: &[usize]) -> usize {
        let mut index = 0usize;
        let mut stride = 1usize;
        for &v in &self.state_parents {
            index += state[v] * stride;
            stride *= state_sizes[v];
        }
        for &v in &self.action_parents {
            index += action[v] * stride;
            stride *= action_sizes[v];
        }
        index
    }

    pub fn distribution<'a>(
        &'a self,
        state: &[usize],
        action: &[usize],
        state_sizes: &[usize],
        action_sizes: &[usize],
    ) -> &'a [f64] {
        let idx = self.parent_index(state, action, state_sizes, action_sizes);
        &self.rows[idx]
    }
}

/// The full factored transition model: one [`VariableModel`] per
/// next-state variable.
pub struct Dbn {
    state_sizes: Vec<usize>,
    action_sizes: Vec<usize>,
    variables: Vec<VariableModel>,
}

impl Dbn {
    pub fn new(state_sizes: Vec<usize>, action_sizes: Vec<usize>, variables: Vec<VariableModel>) -> Self {
        debug_assert_eq!(state_sizes.len(), variables.len());
        Self { state_sizes, action_sizes, variables }
    }

    pub fn state_sizes(&self) -> &[usize] {
        &self.state_sizes
    }

    /// Draws each `s'_i` independently from its row conditional on the
    /// projection of `state` onto `parents(i, action)`.
    pub fn sample_s_prime(&self, state: &[usize], action: &[usize], rng: &mut impl RngCore) -> Vec<usize> {
        self.variables
            .iter()
            .map(|v| {
                let dist = v.distribution(state, action, &self.state_sizes, &self.action_sizes);
                sample_categorical(dist, rng)
            })
            .collect()
    }

    /// `Πᵢ Pᵢ(s'ᵢ | s_parents(i,a), a)`.
    pub fn transition_probability(&self, state: &[usize], action: &[usize], next_state: &[usize]) -> f64 {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let dist = v.distribution(state, action, &self.state_sizes, &self.action_sizes);
                dist[next_state[i]]
            })
            .product()
    }

    /// Back-projects a basis function `phi` (a table over `scope`, a subset
    /// of next-state variables) through one step of the DBN for a fixed
    /// action: the pre-image's scope is the union over `i ∈ scope` of
    /// `parents(i, action)`, and its value at a given parent assignment is
    /// `Σ_{s'_scope} phi(s'_scope) · Πᵢ Pᵢ(s'ᵢ | …)`.
    pub fn back_project(
        &self,
        scope: &[usize],
        action: &[usize],
        phi: impl Fn(&[usize]) -> f64,
    ) -> (Vec<usize>, Vec<f64>) {
        let mut preimage_scope: Vec<usize> = scope
            .iter()
            .flat_map(|&i| self.variables[i].state_parents.iter().copied())
            .collect();
        preimage_scope.sort_unstable();
        preimage_scope.dedup();

        let preimage_sizes: Vec<usize> = preimage_scope.iter().map(|&v| self.state_sizes[v]).collect();
        let preimage_space: usize = preimage_sizes.iter().product::<usize>().max(1);
        let scope_sizes: Vec<usize> = scope.iter().map(|&v| self.state_sizes[v]).collect();
        let scope_space: usize = scope_sizes.iter().product::<usize>().max(1);

        let mut values = vec![0.0; preimage_space];
        for parent_idx in 0..preimage_space {
            let mut state = vec![0usize; self.state_sizes.len()];
            let mut remaining = parent_idx;
            for (&v, &size) in preimage_scope.iter().zip(preimage_sizes.iter()) {
                state[v] = remaining % size;
                remaining /= size;
            }

            let mut total = 0.0;
            for next_idx in 0..scope_space {
                let mut next_values = vec![0usize; scope.len()];
                let mut remaining = next_idx;
                for (slot, &size) in next_values.iter_mut().zip(scope_sizes.iter()) {
                    *slot = remaining % size;
                    remaining /= size;
                }
                let weight: f64 = scope
                    .iter()
                    .zip(next_values.iter())
                    .map(|(&i, &val)| {
                        let dist = self.variables[i].distribution(&state, action, &self.state_sizes, &self.action_sizes);
                        dist[val]
                    })
                    .product();
                total += weight * phi(&next_values);
            }
            values[parent_idx] = total;
        }

        (preimage_scope, values)
    }
}
