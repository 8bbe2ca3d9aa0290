//! Randomness helpers (§9: "pass a mutable reference to a generator into
//! every randomized solver call; do not rely on a hidden global"). Every
//! function here takes `&mut impl RngCore` explicitly; nothing in this
//! workspace stashes a generator behind a thread-local or a `OnceLock`.

use rand::Rng;

/// Samples an index in `0..weights.len()` proportional to `weights`. Falls
/// back to the last index on floating-point rounding at the tail.
pub fn sample_categorical(weights: &[f64], rng: &mut impl rand::RngCore) -> usize {
    let total: f64 = weights.iter().sum();
    debug_assert!(total > 0.0, "sample_categorical: weights must sum to > 0");
    let draw: f64 = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if draw <= cumulative {
            return i;
        }
    }
    weights.len() - 1
}

/// Samples uniformly from `0..count`.
pub fn sample_uniform_index(count: usize, rng: &mut impl rand::RngCore) -> usize {
    rng.random_range(0..count)
}

/// `true` with probability `p` (clamped to `[0, 1]`).
pub fn bernoulli(p: f64, rng: &mut impl rand::RngCore) -> bool {
    rng.random::<f64>() < p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng(f64);

    impl rand::RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            (self.0 * u32::MAX as f64) as u32
        }
        fn next_u64(&mut self) -> u64 {
            (self.0 * u64::MAX as f64) as u64
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    #[test]
    fn sample_categorical_picks_first_bucket_covering_the_draw() {
        let mut rng = FixedRng(0.0);
        let idx = sample_categorical(&[1.0, 1.0, 1.0], &mut rng);
        assert_eq!(idx, 0);
    }

    #[test]
    fn sample_categorical_picks_last_bucket_near_the_top() {
        let mut rng = FixedRng(0.999);
        let idx = sample_categorical(&[1.0, 1.0, 1.0], &mut rng);
        assert_eq!(idx, 2);
    }

    #[test]
    fn bernoulli_respects_extreme_probabilities() {
        let mut rng = FixedRng(0.5);
        assert!(!bernoulli(0.0, &mut rng));
        assert!(bernoulli(1.0, &mut rng));
    }
}
