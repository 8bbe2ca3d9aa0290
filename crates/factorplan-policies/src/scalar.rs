//! Scalar action-selection policies (§4.9): Q-greedy, Q-softmax, and
//! ε-greedy wrapping any other [`ScalarPolicy`]. Each operates on a flat
//! slice of per-action values for one fixed state — the projection of
//! `Q(s, ·)` the specification describes — so the same policy works
//! whether that slice comes from [`factorplan_learn::SingleAgentStatistics`]
//! or one factor's row of a cooperative Q-table.

use rand::{Rng, RngCore};

use factorplan_core::sample_uniform_index;
use factorplan_error::{FactorplanResult, ensure};

/// A policy choosing one action index out of `q_values.len()` at a fixed
/// state.
pub trait ScalarPolicy {
    fn select(&self, q_values: &[f64], rng: &mut impl RngCore) -> usize;
}

/// Picks the action maximizing `q_values`, breaking ties uniformly at
/// random among the exact maxima.
#[derive(Default, Clone, Copy)]
pub struct QGreedy;

impl ScalarPolicy for QGreedy {
    fn select(&self, q_values: &[f64], rng: &mut impl RngCore) -> usize {
        let best = q_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let maxima: Vec<usize> = q_values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == best)
            .map(|(i, _)| i)
            .collect();
        maxima[sample_uniform_index(maxima.len(), rng)]
    }
}

/// Boltzmann exploration with temperature `t`. At `t = 0` this defers to
/// [`QGreedy`]; for finite `t` it samples proportional to
/// `exp(Q(s,a)/t)`, and when any exponential overflows to infinity,
/// distributes uniformly among the actions that overflowed.
pub struct QSoftmax {
    temperature: f64,
}

impl QSoftmax {
    pub fn new(temperature: f64) -> FactorplanResult<Self> {
        ensure!(temperature >= 0.0, InvalidArgument: "temperature {} must be >= 0", temperature);
        Ok(Self { temperature })
    }
}

impl ScalarPolicy for QSoftmax {
    fn select(&self, q_values: &[f64], rng: &mut impl RngCore) -> usize {
        if self.temperature == 0.0 {
            return QGreedy.select(q_values, rng);
        }

        let weights: Vec<f64> = q_values.iter().map(|&q| (q / self.temperature).exp()).collect();
        let infinities: Vec<usize> = weights.iter().enumerate().filter(|&(_, &w)| w.is_infinite()).map(|(i, _)| i).collect();
        if !infinities.is_empty() {
            return infinities[sample_uniform_index(infinities.len(), rng)];
        }

        let total: f64 = weights.iter().sum();
        let mut draw = rng.random::<f64>() * total;
        for (i, &w) in weights.iter().enumerate() {
            if draw < w {
                return i;
            }
            draw -= w;
        }
        weights.len() - 1
    }
}

/// With probability `epsilon`, acts uniformly at random over
/// `0..action_count`; otherwise consults the wrapped policy. The wrapped
/// policy is borrowed, not owned, so it must outlive the wrapper.
pub struct EpsilonGreedy<'p, P: ScalarPolicy> {
    epsilon: f64,
    action_count: usize,
    wrapped: &'p P,
}

impl<'p, P: ScalarPolicy> EpsilonGreedy<'p, P> {
    pub fn new(epsilon: f64, action_count: usize, wrapped: &'p P) -> FactorplanResult<Self> {
        ensure!(
            (0.0..=1.0).contains(&epsilon),
            InvalidArgument: "epsilon {} must lie in [0, 1]", epsilon
        );
        Ok(Self { epsilon, action_count, wrapped })
    }
}

impl<P: ScalarPolicy> ScalarPolicy for EpsilonGreedy<'_, P> {
    fn select(&self, q_values: &[f64], rng: &mut impl RngCore) -> usize {
        use factorplan_core::bernoulli;
        if bernoulli(self.epsilon, rng) {
            sample_uniform_index(self.action_count, rng)
        } else {
            self.wrapped.select(q_values, rng)
        }
    }
}
