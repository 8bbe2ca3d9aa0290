//! Belief states (§3) and the forward belief-update recursion.

use factorplan_error::{FactorplanResult, factorplan_err};

/// A probability distribution over states, represented densely.
#[derive(Clone, Debug, PartialEq)]
pub struct Belief(Vec<f64>);

const PROBABILITY_TOLERANCE: f64 = 1e-9;

impl Belief {
    pub fn new(probabilities: Vec<f64>) -> FactorplanResult<Self> {
        if probabilities.iter().any(|&p| p < -PROBABILITY_TOLERANCE) {
            return Err(factorplan_err!(
                InvalidProbability: "belief has a negative component: {:?}",
                probabilities
            ));
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(factorplan_err!(
                InvalidProbability: "belief must sum to 1, got {}",
                sum
            ));
        }
        Ok(Self(probabilities))
    }

    pub fn uniform(state_count: usize) -> Self {
        Self(vec![1.0 / state_count as f64; state_count])
    }

    pub fn point_mass(state_count: usize, state: usize) -> Self {
        let mut v = vec![0.0; state_count];
        v[state] = 1.0;
        Self(v)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Forward belief update: `b'(s') ∝ O(s',a,o) · Σ_s T(s,a,s') · b(s)`.
    /// Fails with `InvalidObservation` if the normalizer is 0 — the (a, o)
    /// pair was impossible under this belief and this model.
    pub fn update(
        &self,
        transition: impl Fn(usize, usize) -> f64,
        observation: impl Fn(usize) -> f64,
        state_count: usize,
    ) -> FactorplanResult<Belief> {
        let mut unnormalized = vec![0.0; state_count];
        for s_prime in 0..state_count {
            let predicted: f64 = (0..self.0.len())
                .map(|s| transition(s, s_prime) * self.0[s])
                .sum();
            unnormalized[s_prime] = observation(s_prime) * predicted;
        }
        let normalizer: f64 = unnormalized.iter().sum();
        if normalizer <= 0.0 {
            return Err(factorplan_err!(
                InvalidObservation: "predicted probability of this observation is 0"
            ));
        }
        for v in unnormalized.iter_mut() {
            *v /= normalizer;
        }
        Ok(Belief(unnormalized))
    }
}
