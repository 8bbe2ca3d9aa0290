//! Point-based value iteration (§4.10.2): backs up a fixed set of belief
//! points instead of the full belief simplex. For each belief, picks —
//! independently per observation — the α-vector maximizing
//! `tau_{a,o}(alpha) . b`, which lets the per-action candidate be built
//! without enumerating the full observation cross-product (the "crucial
//! PBVI shortcut").

use factorplan_core::alpha::AlphaVector;
use factorplan_core::model::Pomdp;
use factorplan_core::polytope::best_at_point;

use crate::backup::{project, reward_vector};

/// Backs up a single belief point against `previous`. Note this degenerates
/// correctly to plain policy evaluation when `previous` is the single
/// all-zero horizon-0 vector: every projection is zero, so each action's
/// candidate is exactly its reward vector, with no special-casing needed.
pub fn backup_point(model: &impl Pomdp, previous: &[AlphaVector], belief: &[f64]) -> AlphaVector {
    let discount = model.discount();
    let state_count = model.state_count();

    let mut candidates = Vec::with_capacity(model.action_count());
    for action in 0..model.action_count() {
        let mut values = reward_vector(model, action);
        let mut backpointers = Vec::with_capacity(model.observation_count());

        for observation in 0..model.observation_count() {
            let mut best_index = 0usize;
            let mut best_proj = vec![0.0; state_count];
            let mut best_dot = f64::NEG_INFINITY;
            for (index, alpha) in previous.iter().enumerate() {
                let proj = project(model, alpha, action, observation);
                let dot: f64 = proj.iter().zip(belief.iter()).map(|(a, b)| a * b).sum();
                if dot > best_dot {
                    best_dot = dot;
                    best_index = index;
                    best_proj = proj;
                }
            }
            backpointers.push(best_index);
            for s in 0..state_count {
                values[s] += discount * best_proj[s];
            }
        }

        candidates.push(AlphaVector::new(values, action, backpointers));
    }

    let (winner_index, _) = best_at_point(belief, &candidates).expect("every model has at least one action");
    candidates.swap_remove(winner_index)
}

/// Backs up every belief in `beliefs`, merging duplicate results.
pub fn backup(model: &impl Pomdp, previous: &[AlphaVector], beliefs: &[Vec<f64>]) -> Vec<AlphaVector> {
    let span = tracing::debug_span!("pbvi_backup", beliefs = beliefs.len());
    let _guard = span.enter();

    let mut result: Vec<AlphaVector> = Vec::new();
    for belief in beliefs {
        let alpha = backup_point(model, previous, belief);
        if !result.iter().any(|existing| existing.values == alpha.values) {
            result.push(alpha);
        }
    }
    tracing::trace!(survivors = result.len(), "pbvi backup complete");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorplan_core::model::Mdp;

    struct TwoArm;

    impl Mdp for TwoArm {
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
        fn expected_reward(&self, state: usize, action: usize, _sp: usize) -> f64 {
            if action == state { 1.0 } else { -1.0 }
        }
    }

    impl Pomdp for TwoArm {
        fn observation_count(&self) -> usize {
            0
        }
        fn observation_probability(&self, _sp: usize, _a: usize, _o: usize) -> f64 {
            0.0
        }
    }

    #[test]
    fn a_single_belief_reduces_to_policy_evaluation_at_that_point() {
        let model = TwoArm;
        let horizon0 = vec![AlphaVector::zeros(2)];
        let belief = vec![1.0, 0.0];
        let alpha = backup_point(&model, &horizon0, &belief);
        // With zero observations, every action's candidate is exactly its
        // reward vector; action 0 (matching state 0) wins at this belief.
        assert_eq!(alpha.action, 0);
        assert_eq!(alpha.values, vec![1.0, -1.0]);
    }

    #[test]
    fn backup_merges_duplicate_results_across_beliefs() {
        let model = TwoArm;
        let horizon0 = vec![AlphaVector::zeros(2)];
        let beliefs = vec![vec![1.0, 0.0], vec![0.9, 0.1]];
        let result = backup(&model, &horizon0, &beliefs);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn opposite_beliefs_yield_distinct_alpha_vectors() {
        let model = TwoArm;
        let horizon0 = vec![AlphaVector::zeros(2)];
        let beliefs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let result = backup(&model, &horizon0, &beliefs);
        assert_eq!(result.len(), 2);
    }
}
