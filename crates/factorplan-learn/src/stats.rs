//! Rolling statistics (§4.5): Welford's online mean/variance update, in a
//! single-agent (per-action) form and a factored (per-factor-scope) form.
//! Grounded on the teacher's Kahan-compensated `Adder`/`Statistic` pair
//! (`radiate-core`'s `stats/statistics.rs`) for the idiom of carrying a
//! running accumulator struct with cheap incremental updates; reworked here
//! around Welford's algorithm, which the specification calls for directly,
//! rather than the teacher's raw-moment (`m1..m4`) accumulation.

use factorplan_core::PartialAssignment;

/// One running mean/variance estimate, updated one sample at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RollingStatistic {
    mean: f64,
    m2: f64,
    n: u64,
}

impl RollingStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: f64) {
        self.n += 1;
        let delta = value - self.mean;
        self.mean += delta / self.n as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn m2(&self) -> f64 {
        self.m2
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    /// Sample variance; `0.0` until at least two observations have landed.
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            self.m2 / (self.n - 1) as f64
        }
    }
}

/// Per-action rolling statistics for a single unfactored agent: one
/// [`RollingStatistic`] per action.
#[derive(Clone, Debug)]
pub struct SingleAgentStatistics {
    stats: Vec<RollingStatistic>,
}

impl SingleAgentStatistics {
    pub fn new(action_count: usize) -> Self {
        Self {
            stats: vec![RollingStatistic::new(); action_count],
        }
    }

    pub fn record(&mut self, action: usize, reward: f64) {
        self.stats[action].update(reward);
    }

    pub fn get(&self, action: usize) -> &RollingStatistic {
        &self.stats[action]
    }

    pub fn action_count(&self) -> usize {
        self.stats.len()
    }
}

/// One factor's action scope: the joint-action variable indices its table
/// depends on, and the table's flat size (product of those variables'
/// action sizes).
struct FactorScope {
    variables: Vec<usize>,
    size: usize,
}

/// Factored rolling statistics: one dense `μ`/`M₂`/`n` table per factor
/// scope, each sized to the product of its scope's action sizes.
/// `record` dispatches a single joint-action sample to every factor whose
/// scope is covered by the supplied (possibly partial) assignment — the
/// "prebuilt lookup trie" of the specification, realized here as a linear
/// scan over the (typically small) factor list rather than an actual trie,
/// since the factor count is small and fixed once built.
pub struct FactoredStatistics {
    action_sizes: Vec<usize>,
    scopes: Vec<FactorScope>,
    mean: Vec<Vec<f64>>,
    m2: Vec<Vec<f64>>,
    n: Vec<Vec<u64>>,
}

impl FactoredStatistics {
    pub fn new(action_sizes: Vec<usize>, factor_scopes: Vec<Vec<usize>>) -> Self {
        let scopes: Vec<FactorScope> = factor_scopes
            .into_iter()
            .map(|variables| {
                let size = variables.iter().map(|&v| action_sizes[v]).product::<usize>().max(1);
                FactorScope { variables, size }
            })
            .collect();
        let mean = scopes.iter().map(|f| vec![0.0; f.size]).collect();
        let m2 = scopes.iter().map(|f| vec![0.0; f.size]).collect();
        let n = scopes.iter().map(|f| vec![0u64; f.size]).collect();
        Self { action_sizes, scopes, mean, m2, n }
    }

    pub fn factor_count(&self) -> usize {
        self.scopes.len()
    }

    fn flat_index(&self, factor: usize, joint_action: &[usize]) -> usize {
        let scope = &self.scopes[factor].variables;
        let mut index = 0usize;
        let mut stride = 1usize;
        for &v in scope {
            index += joint_action[v] * stride;
            stride *= self.action_sizes[v];
        }
        index
    }

    fn flat_index_partial(&self, factor: usize, assignment: &PartialAssignment) -> Option<usize> {
        let scope = &self.scopes[factor].variables;
        let mut index = 0usize;
        let mut stride = 1usize;
        for &v in scope {
            index += assignment.value_of(v)? * stride;
            stride *= self.action_sizes[v];
        }
        Some(index)
    }

    /// Applies a Welford update to every factor whose scope is covered by
    /// `assignment`, at that factor's projection of `assignment`.
    pub fn record(&mut self, assignment: &PartialAssignment, reward: f64) {
        for f in 0..self.scopes.len() {
            if let Some(idx) = self.flat_index_partial(f, assignment) {
                let n = &mut self.n[f][idx];
                *n += 1;
                let delta = reward - self.mean[f][idx];
                self.mean[f][idx] += delta / *n as f64;
                let delta2 = reward - self.mean[f][idx];
                self.m2[f][idx] += delta * delta2;
            }
        }
    }

    pub fn mean_at(&self, factor: usize, joint_action: &[usize]) -> f64 {
        self.mean[factor][self.flat_index(factor, joint_action)]
    }

    pub fn m2_at(&self, factor: usize, joint_action: &[usize]) -> f64 {
        self.m2[factor][self.flat_index(factor, joint_action)]
    }

    pub fn count_at(&self, factor: usize, joint_action: &[usize]) -> u64 {
        self.n[factor][self.flat_index(factor, joint_action)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_statistic_matches_textbook_mean_and_variance() {
        let mut stat = RollingStatistic::new();
        for &v in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stat.update(v);
        }
        assert!((stat.mean() - 5.0).abs() < 1e-9);
        assert!((stat.variance() - 4.571428571428571).abs() < 1e-9);
        assert_eq!(stat.count(), 8);
    }

    #[test]
    fn single_agent_statistics_track_each_action_independently() {
        let mut stats = SingleAgentStatistics::new(2);
        stats.record(0, 1.0);
        stats.record(0, 3.0);
        stats.record(1, 10.0);
        assert!((stats.get(0).mean() - 2.0).abs() < 1e-9);
        assert_eq!(stats.get(1).count(), 1);
    }

    #[test]
    fn factored_statistics_only_updates_factors_fully_covered_by_the_assignment() {
        let mut stats = FactoredStatistics::new(vec![2, 2, 3], vec![vec![0, 1], vec![2]]);
        // Only variable 0 is assigned: neither factor's scope is covered.
        stats.record(&PartialAssignment::single(0, 1), 5.0);
        assert_eq!(stats.count_at(0, &[1, 0, 0]), 0);

        stats.record(&PartialAssignment::new(vec![0, 1], vec![1, 0]).unwrap(), 5.0);
        assert_eq!(stats.count_at(0, &[1, 0, 0]), 1);
        assert!((stats.mean_at(0, &[1, 0, 0]) - 5.0).abs() < 1e-9);
        assert_eq!(stats.count_at(1, &[0, 0, 2]), 0);
    }
}
