//! Incremental pruning (§4.10.1): per action, folds observations into the
//! candidate set one at a time, pruning after each fold instead of
//! materializing the full `|V_{h-1}|^|O|` cross-product up front.

use factorplan_core::alpha::AlphaVector;
use factorplan_core::model::Pomdp;

use crate::backup::{project, reward_vector};
use crate::pruner::prune;

/// Backs up one action's candidate set by folding observations in
/// incrementally, pruning the running set after every fold.
fn fold_action(model: &impl Pomdp, previous: &[AlphaVector], action: usize) -> Vec<AlphaVector> {
    let discount = model.discount();
    let state_count = model.state_count();
    let r_a = reward_vector(model, action);

    let mut partials: Vec<AlphaVector> = vec![AlphaVector::new(r_a, action, Vec::new())];

    for observation in 0..model.observation_count() {
        let projected: Vec<Vec<f64>> =
            previous.iter().map(|alpha| project(model, alpha, action, observation)).collect();

        let mut folded = Vec::with_capacity(partials.len() * projected.len().max(1));
        for partial in &partials {
            for (index, proj) in projected.iter().enumerate() {
                let mut values = partial.values.clone();
                for s in 0..state_count {
                    values[s] += discount * proj[s];
                }
                let mut backpointers = partial.backpointers.clone();
                backpointers.push(index);
                folded.push(AlphaVector::new(values, action, backpointers));
            }
        }

        partials = if folded.is_empty() { partials } else { prune(state_count, folded) };
    }

    partials
}

/// Full incremental-pruning backup (§4.10): computes each action's
/// candidate set independently, then prunes the union once more.
pub fn backup(model: &impl Pomdp, previous: &[AlphaVector]) -> Vec<AlphaVector> {
    let span = tracing::debug_span!("incremental_pruning_backup", actions = model.action_count());
    let _guard = span.enter();

    let mut union = Vec::new();
    for action in 0..model.action_count() {
        let per_action = fold_action(model, previous, action);
        tracing::trace!(action, candidates = per_action.len(), "folded observations for action");
        union.extend(per_action);
    }
    let pruned = prune(model.state_count(), union);
    tracing::trace!(survivors = pruned.len(), "pruned union across actions");
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorplan_core::model::Mdp;

    /// The canonical two-state, three-action, two-observation Tiger
    /// problem (Kaelbling, Littman & Cassandra 1998): listening is
    /// accurate 85% of the time and costs 1, opening the correct door
    /// pays 10, opening the wrong door costs 100, and either door reset
    /// the tiger's position uniformly at random.
    struct Tiger {
        discount: f64,
    }

    const LISTEN: usize = 0;
    const OPEN_LEFT: usize = 1;
    const OPEN_RIGHT: usize = 2;
    const TIGER_LEFT: usize = 0;
    const TIGER_RIGHT: usize = 1;
    const HEAR_LEFT: usize = 0;
    const HEAR_RIGHT: usize = 1;

    impl Mdp for Tiger {
        fn state_count(&self) -> usize {
            2
        }
        fn action_count(&self) -> usize {
            3
        }
        fn discount(&self) -> f64 {
            self.discount
        }
        fn is_terminal(&self, _state: usize) -> bool {
            false
        }
        fn transition_probability(&self, state: usize, action: usize, next_state: usize) -> f64 {
            if action == LISTEN {
                if next_state == state { 1.0 } else { 0.0 }
            } else {
                0.5
            }
        }
        fn expected_reward(&self, state: usize, action: usize, _next_state: usize) -> f64 {
            match action {
                LISTEN => -1.0,
                OPEN_LEFT => {
                    if state == TIGER_LEFT {
                        -100.0
                    } else {
                        10.0
                    }
                }
                OPEN_RIGHT => {
                    if state == TIGER_RIGHT {
                        -100.0
                    } else {
                        10.0
                    }
                }
                _ => unreachable!(),
            }
        }
    }

    impl Pomdp for Tiger {
        fn observation_count(&self) -> usize {
            2
        }
        fn observation_probability(&self, next_state: usize, action: usize, observation: usize) -> f64 {
            if action != LISTEN {
                return 0.5;
            }
            let correct = (next_state == TIGER_LEFT && observation == HEAR_LEFT)
                || (next_state == TIGER_RIGHT && observation == HEAR_RIGHT);
            if correct { 0.85 } else { 0.15 }
        }
    }

    #[test]
    fn horizon_one_backup_has_one_vector_per_action() {
        let model = Tiger { discount: 1.0 };
        let horizon0 = vec![AlphaVector::zeros(2)];
        let horizon1 = backup(&model, &horizon0);
        assert_eq!(horizon1.len(), 3);
    }

    #[test]
    fn horizon_two_incremental_pruning_matches_the_published_tiger_result() {
        let model = Tiger { discount: 1.0 };
        let horizon0 = vec![AlphaVector::zeros(2)];
        let horizon1 = backup(&model, &horizon0);
        let horizon2 = backup(&model, &horizon1);

        assert_eq!(horizon2.len(), 5, "expected the canonical 5-vector horizon-2 Tiger value function");

        let mut values: Vec<(f64, f64)> = horizon2.iter().map(|a| (a.values[0], a.values[1])).collect();
        values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        let expected = [
            (-101.0, 9.0),
            (-16.85, 7.35),
            (-2.0, -2.0),
            (7.35, -16.85),
            (9.0, -101.0),
        ];
        for (got, want) in values.iter().zip(expected.iter()) {
            assert!((got.0 - want.0).abs() < 1e-6, "state0: got {:?} want {:?}", got, want);
            assert!((got.1 - want.1).abs() < 1e-6, "state1: got {:?} want {:?}", got, want);
        }
    }
}
