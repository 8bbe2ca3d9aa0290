//! Variable Elimination over a scalar objective (§4.4.1).
//!
//! Payload carried through elimination is `(value, tag)`, where `tag`
//! records the eliminated variables' chosen values. Correctness depends on
//! every partial assignment with non-zero reward appearing explicitly as a
//! leaf rule — a negative rule without matching zero-rules for its scope's
//! other assignments will look "missing" to [`gve::restrict`]'s lookup and
//! the solver will prefer it by omission, exactly as the specification
//! warns.

use factorplan_core::{FactorGraph, FactorSet, PartialAssignment};

use crate::gve::{self, CombinerProtocol, RuleSet};

pub type VePayload = (f64, PartialAssignment);

#[derive(Default)]
struct VeCombiner {
    current_var: usize,
    value: f64,
    tag: PartialAssignment,
    best_value: f64,
    best_tag: PartialAssignment,
    any_valid: bool,
}

impl CombinerProtocol for VeCombiner {
    type Payload = VePayload;

    fn begin_removal(&mut self, var: usize) {
        self.current_var = var;
    }

    fn init_new_factor(&mut self) {
        self.best_value = f64::NEG_INFINITY;
        self.best_tag = PartialAssignment::empty();
        self.any_valid = false;
    }

    fn begin_cross_sum(&mut self, var_value: usize) {
        self.value = 0.0;
        self.tag = PartialAssignment::single(self.current_var, var_value);
    }

    fn cross_sum(&mut self, factor: &VePayload) {
        self.value += factor.0;
        self.tag = self.tag.merge(&factor.1);
    }

    fn end_cross_sum(&mut self) {
        if self.value > self.best_value {
            self.best_value = self.value;
            self.best_tag = self.tag.clone();
            self.any_valid = true;
        }
    }

    fn is_valid_new_factor(&self) -> bool {
        self.any_valid
    }

    fn take_new_factor(&mut self) -> VePayload {
        (self.best_value, std::mem::take(&mut self.best_tag))
    }

    fn merge_factors(acc: VePayload, other: VePayload) -> VePayload {
        (acc.0 + other.0, acc.1.merge(&other.1))
    }

    fn make_result(final_factors: Vec<VePayload>) -> VePayload {
        final_factors.into_iter().next().expect("single merged payload")
    }
}

/// Solves a scalar coordination problem: eliminates every variable in
/// `graph` and returns the optimal value together with the full joint
/// action it was achieved at. Reading the final tag into a full joint
/// action (filling any variable no surviving factor constrains with its
/// default value 0) stands in for `make_result`'s context-free hook, which
/// has no access to `factor_set`.
pub fn solve(graph: FactorGraph<RuleSet<VePayload>>, factor_set: &FactorSet) -> (f64, Vec<usize>) {
    let (value, tag) = gve::eliminate(graph, factor_set, VeCombiner::default());
    let joint = tag.to_full(factor_set, |_| 0);
    (value, joint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorplan_core::Rule;

    fn rule(keys: Vec<usize>, values: Vec<usize>, value: f64) -> Rule<VePayload> {
        Rule::new(
            PartialAssignment::new(keys, values).unwrap(),
            (value, PartialAssignment::empty()),
        )
    }

    #[test]
    fn three_variable_chain_picks_the_best_joint_action() {
        // Two binary agents coordinate via a shared factor rewarding
        // matching actions; a third, disconnected agent always prefers 1.
        let factor_set = FactorSet::new(vec![2, 2, 2]).unwrap();
        let mut graph: FactorGraph<RuleSet<VePayload>> = FactorGraph::new(3);
        graph.get_or_create_factor(vec![0, 1], || {
            vec![
                rule(vec![0, 1], vec![0, 0], 5.0),
                rule(vec![0, 1], vec![0, 1], 0.0),
                rule(vec![0, 1], vec![1, 0], 0.0),
                rule(vec![0, 1], vec![1, 1], 5.0),
            ]
        });
        graph.get_or_create_factor(vec![2], || {
            vec![rule(vec![2], vec![0], 0.0), rule(vec![2], vec![1], 3.0)]
        });

        let (value, joint) = solve(graph, &factor_set);
        assert_eq!(value, 8.0);
        assert_eq!(joint[0], joint[1]);
        assert_eq!(joint[2], 1);
    }

    #[test]
    fn fully_disconnected_variables_each_pick_their_own_best() {
        let factor_set = FactorSet::new(vec![2, 3]).unwrap();
        let mut graph: FactorGraph<RuleSet<VePayload>> = FactorGraph::new(2);
        graph.get_or_create_factor(vec![0], || {
            vec![rule(vec![0], vec![0], 1.0), rule(vec![0], vec![1], 4.0)]
        });
        graph.get_or_create_factor(vec![1], || {
            vec![
                rule(vec![1], vec![0], 2.0),
                rule(vec![1], vec![1], 9.0),
                rule(vec![1], vec![2], 0.0),
            ]
        });

        let (value, joint) = solve(graph, &factor_set);
        assert_eq!(value, 13.0);
        assert_eq!(joint, vec![1, 1]);
    }

    #[test]
    fn triangle_of_factors_combines_rather_than_drops_a_scope_collision() {
        // F_AB rewards 10 for (A=1,B=1), F_AC rewards 10 for (A=1,C=1), F_BC
        // is all zero. Eliminating A first produces a new {B,C} factor from
        // F_AB and F_AC's contributions — the same scope F_BC already
        // occupies. The two must combine (10+10 at B=1,C=1) rather than one
        // silently overwriting the other.
        let factor_set = FactorSet::new(vec![2, 2, 2]).unwrap();
        let mut graph: FactorGraph<RuleSet<VePayload>> = FactorGraph::new(3);
        graph.get_or_create_factor(vec![0, 1], || {
            vec![
                rule(vec![0, 1], vec![0, 0], 0.0),
                rule(vec![0, 1], vec![0, 1], 0.0),
                rule(vec![0, 1], vec![1, 0], 0.0),
                rule(vec![0, 1], vec![1, 1], 10.0),
            ]
        });
        graph.get_or_create_factor(vec![0, 2], || {
            vec![
                rule(vec![0, 2], vec![0, 0], 0.0),
                rule(vec![0, 2], vec![0, 1], 0.0),
                rule(vec![0, 2], vec![1, 0], 0.0),
                rule(vec![0, 2], vec![1, 1], 10.0),
            ]
        });
        graph.get_or_create_factor(vec![1, 2], || {
            vec![
                rule(vec![1, 2], vec![0, 0], 0.0),
                rule(vec![1, 2], vec![0, 1], 0.0),
                rule(vec![1, 2], vec![1, 0], 0.0),
                rule(vec![1, 2], vec![1, 1], 0.0),
            ]
        });

        let (value, joint) = solve(graph, &factor_set);
        assert_eq!(value, 20.0);
        assert_eq!(joint, vec![1, 1, 1]);
    }

    #[test]
    fn four_disconnected_singletons_each_pick_their_own_best() {
        // x0=2:4, x1=0:2, x2=0:3, x3=1:7 over sizes (3,2,3,4); every other
        // assignment of each variable is implicitly 0 (no matching rule).
        let factor_set = FactorSet::new(vec![3, 2, 3, 4]).unwrap();
        let mut graph: FactorGraph<RuleSet<VePayload>> = FactorGraph::new(4);
        graph.get_or_create_factor(vec![0], || vec![rule(vec![0], vec![2], 4.0)]);
        graph.get_or_create_factor(vec![1], || vec![rule(vec![1], vec![0], 2.0)]);
        graph.get_or_create_factor(vec![2], || vec![rule(vec![2], vec![0], 3.0)]);
        graph.get_or_create_factor(vec![3], || vec![rule(vec![3], vec![1], 7.0)]);

        let (value, joint) = solve(graph, &factor_set);
        assert_eq!(value, 16.0);
        assert_eq!(joint, vec![2, 0, 0, 1]);
    }
}

