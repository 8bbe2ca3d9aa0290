//! LLR (§4.9): an upper-confidence bandit over local factor rules, whose
//! joint action is picked by invoking [Variable Elimination](factorplan_solve::ve).

use factorplan_core::{FactorGraph, FactorSet, PartialAssignment, Rule};
use factorplan_learn::FactoredStatistics;
use factorplan_solve::gve::RuleSet;
use factorplan_solve::ve::{self, VePayload};

/// The number of simultaneous actions the coordination problem allows;
/// the specification fixes this at 1 for LLR.
const SIMULTANEOUS_ACTIONS: f64 = 1.0;

/// Upper-confidence bandit policy driven by per-factor rolling statistics.
/// Each factor's local joint actions are scored `μ + √((L+1)·ln(t)/n)`
/// and the joint action maximizing the coordinated sum is found via VE.
pub struct LlrPolicy {
    factor_scopes: Vec<Vec<usize>>,
}

impl LlrPolicy {
    /// `factor_scopes` gives, per factor, the action-variable indices its
    /// rolling statistics are keyed by (matching the scopes used to build
    /// `stats`).
    pub fn new(factor_scopes: Vec<Vec<usize>>) -> Self {
        Self { factor_scopes }
    }

    /// `t` is the current decision count (visible actions taken so far);
    /// unvisited `(factor, local action)` pairs (`n = 0`) get an infinite
    /// bonus, forcing exploration before any exploitation.
    pub fn select(&self, stats: &FactoredStatistics, action_sizes: &[usize], t: f64) -> (f64, Vec<usize>) {
        let factor_set = FactorSet::new(action_sizes.to_vec()).expect("action sizes must be non-empty");
        let bonus_term = (SIMULTANEOUS_ACTIONS + 1.0) * t.max(1.0).ln().max(0.0);

        let mut graph: FactorGraph<RuleSet<VePayload>> = FactorGraph::new(action_sizes.len());
        for (f_idx, scope) in self.factor_scopes.iter().enumerate() {
            let space = factor_set.space_size_of(scope);
            let rules: Vec<Rule<VePayload>> = (0..space)
                .map(|flat| {
                    let local_values = factor_set.unflatten(scope, flat);
                    let mut joint_action = vec![0usize; action_sizes.len()];
                    for (&v, &val) in scope.iter().zip(local_values.iter()) {
                        joint_action[v] = val;
                    }
                    let n = stats.count_at(f_idx, &joint_action);
                    let mean = stats.mean_at(f_idx, &joint_action);
                    let bonus = if n > 0 { (bonus_term / n as f64).sqrt() } else { f64::INFINITY };
                    Rule::new(
                        PartialAssignment::new(scope.clone(), local_values).unwrap(),
                        (mean + bonus, PartialAssignment::empty()),
                    )
                })
                .collect();
            graph.get_or_create_factor(scope.clone(), || rules);
        }

        let (score, joint) = ve::solve(graph, &factor_set);
        tracing::trace!(t, score, ?joint, "llr selection");
        (score, joint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unvisited_actions_are_preferred_via_the_infinite_bonus() {
        let mut stats = FactoredStatistics::new(vec![2], vec![vec![0]]);
        stats.record(&PartialAssignment::single(0, 0), 1.0);
        // Action 1 has never been visited; its bonus is infinite.
        let policy = LlrPolicy::new(vec![vec![0]]);
        let (_, joint) = policy.select(&stats, &[2], 5.0);
        assert_eq!(joint, vec![1]);
    }

    #[test]
    fn prefers_the_higher_mean_once_both_actions_are_visited() {
        let mut stats = FactoredStatistics::new(vec![2], vec![vec![0]]);
        for _ in 0..100 {
            stats.record(&PartialAssignment::single(0, 0), 10.0);
            stats.record(&PartialAssignment::single(0, 1), 1.0);
        }
        let policy = LlrPolicy::new(vec![vec![0]]);
        let (_, joint) = policy.select(&stats, &[2], 200.0);
        assert_eq!(joint, vec![0]);
    }
}
