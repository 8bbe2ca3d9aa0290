//! Multi-Objective Variable Elimination (§4.4.2): carries a Pareto frontier
//! of `(reward vector, tag)` pairs through elimination instead of a single
//! scalar. Cross-sums over factors form the Minkowski sum of frontiers;
//! `end_cross_sum` and the final merge both keep only the non-dominated
//! subset.

use factorplan_core::{FactorGraph, FactorSet, PartialAssignment, prune_pairwise_dominated};

use crate::gve::{self, CombinerProtocol, RuleSet};

/// One point of a Pareto frontier: a reward vector plus the tag of
/// eliminated-variable choices that achieves it.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontierPoint {
    pub rewards: Vec<f64>,
    pub tag: PartialAssignment,
}

pub type MovePayload = Vec<FrontierPoint>;

/// `true` iff `a` pointwise-dominates `b` (`aᵢ ≥ bᵢ` everywhere, strictly
/// greater somewhere) — the same rule [`factorplan_core::AlphaVector::dominates`]
/// uses, applied here to plain reward vectors instead of α-vectors.
fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_greater = false;
    for (x, y) in a.iter().zip(b.iter()) {
        if x < y {
            return false;
        }
        if x > y {
            strictly_greater = true;
        }
    }
    strictly_greater
}

/// Removes every dominated point, keeping the non-dominated frontier. Among
/// exact duplicates only the first survives.
fn prune_to_frontier(points: Vec<FrontierPoint>) -> Vec<FrontierPoint> {
    prune_pairwise_dominated(&points, |other, candidate, j, i| {
        dominates(&other.rewards, &candidate.rewards) || (other.rewards == candidate.rewards && j < i)
    })
}

fn minkowski_sum(a: &[FrontierPoint], b: &[FrontierPoint]) -> Vec<FrontierPoint> {
    let mut out = Vec::with_capacity(a.len() * b.len().max(1));
    for x in a {
        for y in b {
            let rewards = x
                .rewards
                .iter()
                .zip(y.rewards.iter())
                .map(|(p, q)| p + q)
                .collect();
            out.push(FrontierPoint {
                rewards,
                tag: x.tag.merge(&y.tag),
            });
        }
    }
    out
}

#[derive(Default)]
struct MoveCombiner {
    num_objectives: usize,
    current_var: usize,
    cross: MovePayload,
    accumulated: MovePayload,
}

impl CombinerProtocol for MoveCombiner {
    type Payload = MovePayload;

    fn begin_removal(&mut self, var: usize) {
        self.current_var = var;
    }

    fn init_new_factor(&mut self) {
        self.accumulated.clear();
    }

    fn begin_cross_sum(&mut self, var_value: usize) {
        self.cross = vec![FrontierPoint {
            rewards: vec![0.0; self.num_objectives],
            tag: PartialAssignment::single(self.current_var, var_value),
        }];
    }

    fn cross_sum(&mut self, factor: &MovePayload) {
        self.cross = minkowski_sum(&self.cross, factor);
    }

    fn end_cross_sum(&mut self) {
        self.accumulated.append(&mut self.cross);
        self.accumulated = prune_to_frontier(std::mem::take(&mut self.accumulated));
    }

    fn is_valid_new_factor(&self) -> bool {
        !self.accumulated.is_empty()
    }

    fn take_new_factor(&mut self) -> MovePayload {
        std::mem::take(&mut self.accumulated)
    }

    fn merge_factors(acc: MovePayload, other: MovePayload) -> MovePayload {
        prune_to_frontier(minkowski_sum(&acc, &other))
    }

    fn make_result(final_factors: Vec<MovePayload>) -> MovePayload {
        final_factors.into_iter().next().expect("single merged frontier")
    }
}

/// Solves a multi-objective coordination problem, returning the
/// non-dominated frontier of `(reward vector, full joint action)` pairs.
pub fn solve(
    graph: FactorGraph<RuleSet<MovePayload>>,
    factor_set: &FactorSet,
    num_objectives: usize,
) -> Vec<(Vec<f64>, Vec<usize>)> {
    let frontier = gve::eliminate(
        graph,
        factor_set,
        MoveCombiner {
            num_objectives,
            ..Default::default()
        },
    );
    frontier
        .into_iter()
        .map(|point| (point.rewards, point.tag.to_full(factor_set, |_| 0)))
        .collect()
}
