//! MAUCE (§4.9): like [`LlrPolicy`](crate::llr::LlrPolicy), but the
//! exploration bonus is a variance-range bound carried through
//! [UCVE](factorplan_solve::ucve) rather than a scalar VE rule value.

use factorplan_core::{FactorGraph, FactorSet, PartialAssignment, Rule};
use factorplan_error::{FactorplanResult, ensure};
use factorplan_learn::FactoredStatistics;
use factorplan_solve::gve::RuleSet;
use factorplan_solve::ucve::{self, UcveEntry, UcvePayload};

/// Upper-confidence policy using a `range²/n` variance-range bound as the
/// UCVE entry's uncertainty term.
pub struct MaucePolicy {
    factor_scopes: Vec<Vec<usize>>,
    reward_range: f64,
}

impl MaucePolicy {
    pub fn new(factor_scopes: Vec<Vec<usize>>, reward_range: f64) -> FactorplanResult<Self> {
        ensure!(reward_range > 0.0, InvalidArgument: "reward range {} must be > 0", reward_range);
        Ok(Self { factor_scopes, reward_range })
    }

    /// `t` is the current decision count, `action_count` the size of the
    /// joint action space — both feed UCVE's `log(t·|A|)` term.
    pub fn select(
        &self,
        stats: &FactoredStatistics,
        action_sizes: &[usize],
        t: f64,
        action_count: usize,
    ) -> (Vec<usize>, UcveEntry) {
        let factor_set = FactorSet::new(action_sizes.to_vec()).expect("action sizes must be non-empty");
        let range_sq = self.reward_range * self.reward_range;

        let mut graph: FactorGraph<RuleSet<UcvePayload>> = FactorGraph::new(action_sizes.len());
        for (f_idx, scope) in self.factor_scopes.iter().enumerate() {
            let space = factor_set.space_size_of(scope);
            let rules: Vec<Rule<UcvePayload>> = (0..space)
                .map(|flat| {
                    let local_values = factor_set.unflatten(scope, flat);
                    let mut joint_action = vec![0usize; action_sizes.len()];
                    for (&v, &val) in scope.iter().zip(local_values.iter()) {
                        joint_action[v] = val;
                    }
                    let n = stats.count_at(f_idx, &joint_action);
                    let mean = stats.mean_at(f_idx, &joint_action);
                    let inverse_weighted_count = if n > 0 { range_sq / n as f64 } else { f64::INFINITY };
                    Rule::new(
                        PartialAssignment::new(scope.clone(), local_values).unwrap(),
                        vec![UcveEntry { mean, inverse_weighted_count, tag: PartialAssignment::empty() }],
                    )
                })
                .collect();
            graph.get_or_create_factor(scope.clone(), || rules);
        }

        let (joint, entry) = ucve::solve(graph, &factor_set, t, action_count);
        tracing::trace!(t, mean = entry.mean, ?joint, "mauce selection");
        (joint, entry)
    }
}
