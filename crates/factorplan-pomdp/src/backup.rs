//! Value-function backup primitives (§4.10): the belief-update projection
//! and per-action reward vector shared by every backup variant, plus a
//! naive full cross-product backup used as a reference implementation for
//! small models.

use factorplan_core::{AlphaVector, Pomdp};

/// `r_a(s) = sum_{s'} T(s,a,s') R(s,a,s')`: the expected immediate reward
/// of taking `action` in each state.
pub fn reward_vector(model: &impl Pomdp, action: usize) -> Vec<f64> {
    (0..model.state_count())
        .map(|s| {
            (0..model.state_count())
                .map(|sp| model.transition_probability(s, action, sp) * model.expected_reward(s, action, sp))
                .sum()
        })
        .collect()
}

/// `tau_{a,o}(alpha)(s) = sum_{s'} T(s,a,s') O(s',a,o) alpha(s')`: the
/// one-step belief-space projection of `alpha` through `action` and
/// `observation`.
pub fn project(model: &impl Pomdp, alpha: &AlphaVector, action: usize, observation: usize) -> Vec<f64> {
    (0..model.state_count())
        .map(|s| {
            (0..model.state_count())
                .map(|sp| {
                    model.transition_probability(s, action, sp)
                        * model.observation_probability(sp, action, observation)
                        * alpha.values[sp]
                })
                .sum()
        })
        .collect()
}

/// The naive full backup: for each action, the candidate set is the entire
/// cross-product over observations of projected vectors from the previous
/// horizon, `r_a + gamma * sum_o tau_{a,o}(alpha_o)`. `O(|V|^|O|)` per
/// action — a reference implementation for tiny models and tests;
/// `incremental_pruning` folds observations in one at a time instead.
pub fn full_backup(model: &impl Pomdp, previous: &[AlphaVector]) -> Vec<AlphaVector> {
    let discount = model.discount();
    let state_count = model.state_count();
    let observation_count = model.observation_count();
    let mut result = Vec::new();
    for action in 0..model.action_count() {
        let r_a = reward_vector(model, action);
        let projections: Vec<Vec<Vec<f64>>> = (0..observation_count)
            .map(|o| previous.iter().map(|alpha| project(model, alpha, action, o)).collect())
            .collect();
        let mut choices = vec![0usize; observation_count];
        combine_observations(&projections, 0, &mut choices, state_count, discount, &r_a, action, &mut result);
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn combine_observations(
    projections: &[Vec<Vec<f64>>],
    observation: usize,
    choices: &mut Vec<usize>,
    state_count: usize,
    discount: f64,
    r_a: &[f64],
    action: usize,
    out: &mut Vec<AlphaVector>,
) {
    if observation == projections.len() {
        let mut values = r_a.to_vec();
        for (o, &chosen) in choices.iter().enumerate() {
            for s in 0..state_count {
                values[s] += discount * projections[o][chosen][s];
            }
        }
        out.push(AlphaVector::new(values, action, choices.clone()));
        return;
    }
    for candidate in 0..projections[observation].len() {
        choices[observation] = candidate;
        combine_observations(projections, observation + 1, choices, state_count, discount, r_a, action, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorplan_core::Mdp;

    /// Two-state, two-action, two-observation model with no discrimination
    /// between observations (`O` uniform): lets the horizon-1 backup reduce
    /// to a pure reward check.
    struct FlatPomdp;

    impl Mdp for FlatPomdp {
        fn state_count(&self) -> usize {
            2
        }
        fn action_count(&self) -> usize {
            2
        }
        fn discount(&self) -> f64 {
            0.9
        }
        fn is_terminal(&self, _s: usize) -> bool {
            false
        }
        fn transition_probability(&self, _s: usize, _a: usize, sp: usize) -> f64 {
            if sp == 0 { 1.0 } else { 0.0 }
        }
        fn expected_reward(&self, _s: usize, action: usize, _sp: usize) -> f64 {
            if action == 0 { 1.0 } else { -1.0 }
        }
    }

    impl Pomdp for FlatPomdp {
        fn observation_count(&self) -> usize {
            2
        }
        fn observation_probability(&self, _sp: usize, _a: usize, o: usize) -> f64 {
            if o == 0 { 1.0 } else { 0.0 }
        }
    }

    #[test]
    fn reward_vector_matches_the_deterministic_transition() {
        let model = FlatPomdp;
        assert_eq!(reward_vector(&model, 0), vec![1.0, 1.0]);
        assert_eq!(reward_vector(&model, 1), vec![-1.0, -1.0]);
    }

    #[test]
    fn projecting_the_zero_vector_is_always_zero() {
        let model = FlatPomdp;
        let zero = AlphaVector::zeros(2);
        assert_eq!(project(&model, &zero, 0, 0), vec![0.0, 0.0]);
    }

    #[test]
    fn full_backup_from_horizon_zero_equals_the_reward_vector() {
        let model = FlatPomdp;
        let horizon0 = vec![AlphaVector::zeros(2)];
        let backed_up = full_backup(&model, &horizon0);
        // One candidate per action (only one previous vector to choose per
        // observation), value equal to the undiscounted reward since the
        // projected term is zero.
        assert_eq!(backed_up.len(), 2);
        let action0 = backed_up.iter().find(|a| a.action == 0).unwrap();
        assert_eq!(action0.values, vec![1.0, 1.0]);
    }
}
