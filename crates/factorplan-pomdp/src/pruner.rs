//! The α-vector pruner (§4.11): a pointwise-dominance pass followed by an
//! exact witness-LP search, producing a minimal parsimonious set where
//! every survivor is optimal at some belief and no two survivors duplicate
//! each other's value.

use factorplan_core::alpha::AlphaVector;
use factorplan_core::polytope::{best_at_point, extract_best_at_simplex_corners, extract_dominated};
use factorplan_solve::witness::WitnessLp;

/// Prunes `candidates` in place (conceptually) and returns the survivors.
/// `state_count` is the belief dimension every vector is indexed over.
pub fn prune(state_count: usize, mut candidates: Vec<AlphaVector>) -> Vec<AlphaVector> {
    let kept = extract_dominated(&mut candidates);
    candidates.truncate(kept);
    if candidates.is_empty() {
        return candidates;
    }

    let seeded = extract_best_at_simplex_corners(state_count, &mut candidates);
    let mut best: Vec<AlphaVector> = candidates[..seeded].to_vec();
    let mut remaining: Vec<AlphaVector> = candidates[seeded..].to_vec();

    let mut witness = WitnessLp::new(state_count);
    for alpha in &best {
        witness.push_permanent(&alpha.values);
    }

    while let Some(candidate) = remaining.pop() {
        witness.push_temporary(&candidate.values);
        let found = witness.solve();
        witness.pop_temporary();

        let Some(belief) = found else { continue };

        // The candidate has a witness, but it may not be the vector that
        // actually wins there -- find the true winner among everything
        // still in play and promote that one instead.
        let mut pool = remaining.clone();
        pool.push(candidate);
        let (winner_index, _) = best_at_point(&belief, &pool).expect("pool is non-empty");
        let winner = pool.swap_remove(winner_index);
        remaining = pool;

        witness.push_permanent(&winner.values);
        best.push(winner);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointwise_dominated_vectors_never_reach_the_witness_search() {
        let candidates = vec![
            AlphaVector::new(vec![1.0, 1.0], 0, vec![]),
            AlphaVector::new(vec![2.0, 2.0], 1, vec![]),
        ];
        let survivors = prune(2, candidates);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].action, 1);
    }

    #[test]
    fn two_crossing_vectors_both_survive() {
        let candidates = vec![
            AlphaVector::new(vec![10.0, 0.0], 0, vec![]),
            AlphaVector::new(vec![0.0, 10.0], 1, vec![]),
        ];
        let survivors = prune(2, candidates);
        assert_eq!(survivors.len(), 2);
    }

    #[test]
    fn a_vector_with_no_witness_anywhere_is_dropped() {
        // Vector b is pointwise-equal-or-worse to a everywhere except it is
        // never strictly better at any simplex corner or crossing point,
        // so it should never win a witness search even though it is not
        // pointwise-dominated by a single vector alone.
        let candidates = vec![
            AlphaVector::new(vec![5.0, 0.0], 0, vec![]),
            AlphaVector::new(vec![0.0, 5.0], 1, vec![]),
            AlphaVector::new(vec![2.0, 2.0], 2, vec![]),
        ];
        let survivors = prune(2, candidates);
        // The middle vector (2,2) never maximizes b*alpha against the
        // crossing pair above it: at b=(0.5,0.5) both extremes already tie
        // at 2.5, strictly above (2,2)'s constant value of 2.0 everywhere.
        assert_eq!(survivors.len(), 2);
        assert!(survivors.iter().all(|a| a.action != 2));
    }

    #[test]
    fn duplicate_vectors_collapse_to_one() {
        let candidates = vec![
            AlphaVector::new(vec![1.0, 2.0], 0, vec![]),
            AlphaVector::new(vec![1.0, 2.0], 1, vec![]),
        ];
        let survivors = prune(2, candidates);
        assert_eq!(survivors.len(), 1);
    }
}
