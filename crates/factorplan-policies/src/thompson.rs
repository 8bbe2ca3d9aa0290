//! Factored Thompson sampling (§4.9): draws one mean sample per factor's
//! local joint action from its Student-t posterior, then invokes VE over
//! the sampled rule set.

use rand::RngCore;
use rand_distr::{Distribution, StandardNormal, StudentT};

use factorplan_core::{FactorGraph, FactorSet, PartialAssignment, Rule};
use factorplan_learn::FactoredStatistics;
use factorplan_solve::gve::RuleSet;
use factorplan_solve::ve::{self, VePayload};

/// Draws from a Student-t distribution with `df` degrees of freedom. `df <=
/// 0` (too few observations for a variance estimate) degenerates to a
/// standard normal draw, since `StudentT` is only defined for positive df.
fn student_t_sample(df: f64, rng: &mut impl RngCore) -> f64 {
    if df <= 0.0 {
        return StandardNormal.sample(rng);
    }
    StudentT::new(df).expect("df > 0 checked above").sample(rng)
}

/// Thompson sampling policy driven by per-factor rolling statistics.
pub struct ThompsonPolicy {
    factor_scopes: Vec<Vec<usize>>,
}

impl ThompsonPolicy {
    pub fn new(factor_scopes: Vec<Vec<usize>>) -> Self {
        Self { factor_scopes }
    }

    /// Draws one mean sample per `(factor, local action)` pair from
    /// `Student-t(μ, σ² ≈ M₂/n, ν = n−1)` and finds the VE-optimal joint
    /// action over the sampled rule set.
    pub fn select(
        &self,
        stats: &FactoredStatistics,
        action_sizes: &[usize],
        rng: &mut impl RngCore,
    ) -> (f64, Vec<usize>) {
        let factor_set = FactorSet::new(action_sizes.to_vec()).expect("action sizes must be non-empty");

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
                    let variance = if n > 0 { stats.m2_at(f_idx, &joint_action) / n as f64 } else { 0.0 };
                    let df = n as f64 - 1.0;
                    let sample = mean + variance.sqrt() * student_t_sample(df, rng);
                    Rule::new(
                        PartialAssignment::new(scope.clone(), local_values).unwrap(),
                        (sample, PartialAssignment::empty()),
                    )
                })
                .collect();
            graph.get_or_create_factor(scope.clone(), || rules);
        }

        let (score, joint) = ve::solve(graph, &factor_set);
        tracing::trace!(score, ?joint, "thompson selection");
        (score, joint)
    }
}
