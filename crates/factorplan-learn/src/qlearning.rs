//! Cooperative Q-learning (§4.8): one dense value table per factor, updated
//! by a TD rule whose credit assignment splits each variable's reward and
//! backup contribution across every factor that touches it.

use rand::RngCore;

use factorplan_core::{FactorGraph, FactorSet, sample_uniform_index};
use factorplan_error::{FactorplanResult, ensure};
use factorplan_solve::{LocalTable, local_search};

/// One factor's dense value table, indexed by `(state restriction, action
/// restriction)` via [`FactorSet::flat_index`].
struct QFactor {
    state_scope: Vec<usize>,
    action_scope: Vec<usize>,
    action_space: usize,
    table: Vec<f64>,
}

impl QFactor {
    fn index(&self, state_set: &FactorSet, action_set: &FactorSet, state: &[usize], action: &[usize]) -> usize {
        let s_values: Vec<usize> = self.state_scope.iter().map(|&v| state[v]).collect();
        let a_values: Vec<usize> = self.action_scope.iter().map(|&v| action[v]).collect();
        let s_idx = state_set.flat_index(&self.state_scope, &s_values);
        let a_idx = action_set.flat_index(&self.action_scope, &a_values);
        s_idx * self.action_space + a_idx
    }
}

/// Cooperative Q-learning over dense per-factor value tables. Each factor's
/// scope pairs a state restriction with an action restriction; the total
/// Q-value of `(s, a)` is the sum of every factor's table entry.
pub struct CooperativeQLearning {
    state_set: FactorSet,
    action_set: FactorSet,
    factors: Vec<QFactor>,
    touch_count: Vec<usize>,
    discount: f64,
    learning_rate: f64,
}

impl CooperativeQLearning {
    /// `scopes` gives, per factor, its `(state_scope, action_scope)` pair.
    /// `discount` must lie in `(0, 1]` and `learning_rate` in `(0, 1]`,
    /// validated eagerly.
    pub fn new(
        state_sizes: Vec<usize>,
        action_sizes: Vec<usize>,
        scopes: Vec<(Vec<usize>, Vec<usize>)>,
        discount: f64,
        learning_rate: f64,
    ) -> FactorplanResult<Self> {
        ensure!(discount > 0.0 && discount <= 1.0, InvalidArgument: "discount {} must lie in (0, 1]", discount);
        ensure!(
            learning_rate > 0.0 && learning_rate <= 1.0,
            InvalidArgument: "learning rate {} must lie in (0, 1]", learning_rate
        );

        let state_set = FactorSet::new(state_sizes).expect("state sizes must be non-empty");
        let action_set = FactorSet::new(action_sizes).expect("action sizes must be non-empty");

        let mut touch_count = vec![0usize; action_set.len()];
        for (_, action_scope) in &scopes {
            for &v in action_scope {
                touch_count[v] += 1;
            }
        }

        let factors = scopes
            .into_iter()
            .map(|(state_scope, action_scope)| {
                let state_space = state_set.space_size_of(&state_scope).max(1);
                let action_space = action_set.space_size_of(&action_scope).max(1);
                QFactor {
                    state_scope,
                    action_scope,
                    action_space,
                    table: vec![0.0; state_space * action_space],
                }
            })
            .collect();

        Ok(Self { state_set, action_set, factors, touch_count, discount, learning_rate })
    }

    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }

    pub fn q_value(&self, factor: usize, state: &[usize], action: &[usize]) -> f64 {
        let f = &self.factors[factor];
        f.table[f.index(&self.state_set, &self.action_set, state, action)]
    }

    /// Total value of `(state, action)`: the sum over every factor.
    pub fn total_value(&self, state: &[usize], action: &[usize]) -> f64 {
        self.factors.iter().map(|f| f.table[f.index(&self.state_set, &self.action_set, state, action)]).sum()
    }

    fn local_graph_at(&self, state: &[usize]) -> FactorGraph<LocalTable> {
        let mut graph: FactorGraph<LocalTable> = FactorGraph::new(self.action_set.len());
        for f in &self.factors {
            let s_values: Vec<usize> = f.state_scope.iter().map(|&v| state[v]).collect();
            let s_idx = self.state_set.flat_index(&f.state_scope, &s_values);
            let row = f.table[s_idx * f.action_space..(s_idx + 1) * f.action_space].to_vec();
            let keys = f.action_scope.clone();
            graph.get_or_create_factor(keys, || row);
        }
        graph
    }

    /// Greedily coordinates the action maximizing the total table value at
    /// `state` (via [`local_search`]), or, with probability `epsilon`,
    /// returns a uniformly random joint action instead.
    pub fn select_action(&self, state: &[usize], epsilon: f64, rng: &mut impl RngCore) -> Vec<usize> {
        if epsilon > 0.0 && factorplan_core::bernoulli(epsilon, rng) {
            return (0..self.action_set.len()).map(|v| sample_uniform_index(self.action_set.size(v), rng)).collect();
        }
        let graph = self.local_graph_at(state);
        let (action, _) = local_search(&graph, &self.action_set, None, rng);
        action
    }

    /// One TD update given a transition `(state, action, next_state,
    /// reward)`, where `reward` is a per-variable reward vector of length
    /// `action_set.len()`. `next_action` is the (already selected) next
    /// joint action used for the bootstrap term.
    pub fn update(&mut self, state: &[usize], action: &[usize], next_state: &[usize], next_action: &[usize], reward: &[f64]) {
        let num_vars = self.action_set.len();
        let mut residual = vec![0.0; num_vars];

        for v in 0..num_vars {
            let c_v = self.touch_count[v].max(1) as f64;
            residual[v] = reward[v] / c_v;
        }

        let mut current_indices = Vec::with_capacity(self.factors.len());
        for f in &self.factors {
            let scale = 1.0 / f.action_scope.len() as f64;
            let next_q = f.table[f.index(&self.state_set, &self.action_set, next_state, next_action)];
            let current_idx = f.index(&self.state_set, &self.action_set, state, action);
            let current_q = f.table[current_idx];
            current_indices.push(current_idx);
            for &v in &f.action_scope {
                residual[v] += self.discount * scale * next_q;
                residual[v] -= scale * current_q;
            }
        }

        for r in residual.iter_mut() {
            *r *= self.learning_rate;
        }

        for (f, &idx) in self.factors.iter_mut().zip(current_indices.iter()) {
            let delta: f64 = f.action_scope.iter().map(|&v| residual[v]).sum();
            f.table[idx] += delta;
        }

        tracing::trace!(factors = self.factors.len(), "cooperative q-learning step complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn single_factor_learner() -> CooperativeQLearning {
        // One state variable, one action variable, one factor covering both.
        CooperativeQLearning::new(vec![1], vec![2], vec![(vec![0], vec![0])], 0.9, 0.5).unwrap()
    }

    #[test]
    fn update_moves_q_value_toward_the_td_target() {
        let mut q = single_factor_learner();
        let state = [0];
        let action = [0];
        let next_state = [0];
        let next_action = [1];
        q.update(&state, &action, &next_state, &next_action, &[1.0]);
        // residual = reward/1 + discount*next_q(0) - current_q(0) = 1.0, scaled by lr 0.5.
        assert!((q.q_value(0, &state, &action) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn repeated_updates_converge_toward_a_fixed_reward() {
        let mut q = single_factor_learner();
        let s = [0];
        let a = [0];
        for _ in 0..200 {
            q.update(&s, &a, &s, &a, &[1.0]);
        }
        // Fixed point of Q <- Q + lr*(r + discount*Q - Q) at s=s', a=a' is r/(1-discount).
        let expected = 1.0 / (1.0 - 0.9);
        assert!((q.q_value(0, &s, &a) - expected).abs() < 1e-2);
    }

    #[test]
    fn select_action_with_epsilon_one_is_uniformly_random_but_valid() {
        let q = single_factor_learner();
        let mut rng = StdRng::seed_from_u64(5);
        let action = q.select_action(&[0], 1.0, &mut rng);
        assert!(action[0] < 2);
    }

    #[test]
    fn touch_count_splits_credit_across_two_factors_sharing_a_variable() {
        // Two factors both touch action variable 0: reward should be halved per factor.
        let mut q = CooperativeQLearning::new(
            vec![1, 1],
            vec![2],
            vec![(vec![0], vec![0]), (vec![1], vec![0])],
            0.5,
            1.0,
        )
        .unwrap();
        q.update(&[0, 0], &[0], &[0, 0], &[0], &[1.0]);
        assert!((q.q_value(0, &[0, 0], &[0]) - 0.5).abs() < 1e-9);
        assert!((q.q_value(1, &[0, 0], &[0]) - 0.5).abs() < 1e-9);
    }
}
