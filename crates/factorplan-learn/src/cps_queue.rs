//! Cooperative Prioritized Sweeping Queue (§4.7). Finding the single
//! globally highest-priority compatible `(i, a, parents)` tuple across every
//! variable is NP-hard in general (it is a coordination problem in its own
//! right); this queue instead picks the true best update for *one* variable
//! and a compatible-with-that choice for everywhere else, which is what
//! prioritized sweeping actually needs on each step.

use rand::RngCore;
use rand::seq::SliceRandom;

use factorplan_core::sample_uniform_index;

fn decode(mut index: usize, scope: &[usize], sizes: &[usize]) -> Vec<usize> {
    let mut values = Vec::with_capacity(scope.len());
    for &v in scope {
        let size = sizes[v];
        values.push(index % size);
        index /= size;
    }
    values
}

fn consistent(scope: &[usize], values: &[usize], committed: &[usize], sentinel_at: impl Fn(usize) -> usize) -> bool {
    scope
        .iter()
        .zip(values.iter())
        .all(|(&v, &val)| committed[v] == sentinel_at(v) || committed[v] == val)
}

fn commit(scope: &[usize], values: &[usize], committed: &mut [usize], sentinel_at: impl Fn(usize) -> usize) {
    for (&v, &val) in scope.iter().zip(values.iter()) {
        if committed[v] == sentinel_at(v) {
            committed[v] = val;
        }
    }
}

struct VariableQueue {
    state_parents: Vec<usize>,
    action_parents: Vec<usize>,
    num_local_actions: usize,
    /// `priorities[a][parent_index]`.
    priorities: Vec<Vec<f64>>,
    /// `(parent_index, value)` argmax per local action.
    best_per_action: Vec<(usize, f64)>,
    /// `(local_action, parent_index, value)` argmax over local actions.
    best_overall: (usize, usize, f64),
}

/// The full cooperative prioritized sweeping queue: one [`VariableQueue`]
/// per next-state variable.
pub struct CpsQueue {
    state_sizes: Vec<usize>,
    action_sizes: Vec<usize>,
    variables: Vec<VariableQueue>,
    nonzero_count: usize,
}

impl CpsQueue {
    /// `state_parents`/`action_parents` give each variable's DBN parent
    /// scope (matching [`crate::dbn::VariableModel`]); priorities start at
    /// zero everywhere.
    pub fn new(
        state_sizes: Vec<usize>,
        action_sizes: Vec<usize>,
        state_parents: Vec<Vec<usize>>,
        action_parents: Vec<Vec<usize>>,
    ) -> Self {
        let variables = state_parents
            .into_iter()
            .zip(action_parents)
            .map(|(sp, ap)| {
                let num_local_actions = ap.iter().map(|&v| action_sizes[v]).product::<usize>().max(1);
                let parent_space = sp.iter().map(|&v| state_sizes[v]).product::<usize>().max(1);
                VariableQueue {
                    state_parents: sp,
                    action_parents: ap,
                    num_local_actions,
                    priorities: vec![vec![0.0; parent_space]; num_local_actions],
                    best_per_action: vec![(0, 0.0); num_local_actions],
                    best_overall: (0, 0, 0.0),
                }
            })
            .collect();
        Self { state_sizes, action_sizes, variables, nonzero_count: 0 }
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn nonzero_priorities(&self) -> usize {
        self.nonzero_count
    }

    /// `priorities[i][a][s_parents_index] += delta`, refreshing the
    /// per-`(i,a)` and per-`i` argmax caches.
    pub fn update(&mut self, i: usize, a: usize, s_parents_index: usize, delta: f64) {
        let was_positive = self.variables[i].priorities[a][s_parents_index] > 0.0;
        self.variables[i].priorities[a][s_parents_index] += delta;
        let is_positive = self.variables[i].priorities[a][s_parents_index] > 0.0;
        match (was_positive, is_positive) {
            (false, true) => self.nonzero_count += 1,
            (true, false) => self.nonzero_count -= 1,
            _ => {}
        }

        let var = &mut self.variables[i];
        let row = &var.priorities[a];
        let (best_idx, best_val) = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(idx, &val)| (idx, val))
            .unwrap_or((0, 0.0));
        var.best_per_action[a] = (best_idx, best_val);

        var.best_overall = var
            .best_per_action
            .iter()
            .enumerate()
            .map(|(action, &(parent_idx, val))| (action, parent_idx, val))
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap())
            .unwrap();
    }

    /// The sentinel value marking an unconstrained state variable.
    fn state_sentinel(&self, v: usize) -> usize {
        self.state_sizes[v]
    }

    /// The sentinel value marking an unconstrained action variable.
    fn action_sentinel(&self, v: usize) -> usize {
        self.action_sizes[v]
    }

    /// Reconstructs one `(state, action)` sample: commits the global
    /// highest-priority variable's argmax exactly, then greedily extends a
    /// compatible choice to every other variable, falling back to a random
    /// local action (and the best parent assignment consistent with what is
    /// already committed) when the stored best is inconsistent. Components
    /// untouched by any picked entry stay at their sentinel ("unconstrained")
    /// value.
    pub fn reconstruct(&self, rng: &mut impl RngCore) -> (Vec<usize>, Vec<usize>) {
        let mut state: Vec<usize> = (0..self.state_sizes.len()).map(|v| self.state_sentinel(v)).collect();
        let mut action: Vec<usize> = (0..self.action_sizes.len()).map(|v| self.action_sentinel(v)).collect();

        let Some(best_var) = self
            .variables
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.best_overall.2.partial_cmp(&b.1.best_overall.2).unwrap())
            .map(|(i, _)| i)
        else {
            return (state, action);
        };

        tracing::trace!(best_var, "cps_queue reconstruct");

        let mut order: Vec<usize> = (0..self.variables.len()).filter(|&i| i != best_var).collect();
        order.shuffle(rng);
        order.insert(0, best_var);

        for i in order {
            let var = &self.variables[i];
            let (best_action, best_parent_idx, _) = var.best_overall;
            let action_values = decode(best_action, &var.action_parents, &self.action_sizes);
            let state_values = decode(best_parent_idx, &var.state_parents, &self.state_sizes);

            let action_ok = consistent(&var.action_parents, &action_values, &action, |v| self.action_sentinel(v));
            let state_ok = consistent(&var.state_parents, &state_values, &state, |v| self.state_sentinel(v));

            if action_ok && state_ok {
                commit(&var.action_parents, &action_values, &mut action, |v| self.action_sentinel(v));
                commit(&var.state_parents, &state_values, &mut state, |v| self.state_sentinel(v));
                continue;
            }

            let random_action = sample_uniform_index(var.num_local_actions, rng);
            let random_action_values = decode(random_action, &var.action_parents, &self.action_sizes);

            let consistent_parent = var.priorities[random_action]
                .iter()
                .enumerate()
                .filter(|&(idx, _)| {
                    let values = decode(idx, &var.state_parents, &self.state_sizes);
                    consistent(&var.state_parents, &values, &state, |v| self.state_sentinel(v))
                })
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            let consistent_state_values = decode(consistent_parent, &var.state_parents, &self.state_sizes);

            commit(&var.action_parents, &random_action_values, &mut action, |v| self.action_sentinel(v));
            commit(&var.state_parents, &consistent_state_values, &mut state, |v| self.state_sentinel(v));
        }

        (state, action)
    }
}
