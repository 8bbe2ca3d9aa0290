//! Blind-policy value bounds (§4.10.3): the value of committing to one
//! action forever, ignoring every observation. Iterated from `V_0 = r_a`
//! (so "horizon `h`" means `h` Bellman applications past the immediate
//! reward, matching the convention the rest of this crate's backups use),
//! with an optional direct linear-system solve for the converged value.

use factorplan_core::alpha::AlphaVector;
use factorplan_core::model::Pomdp;
use factorplan_core::solve_square_system;
use factorplan_error::{FactorplanResult, factorplan_bail};

use crate::backup::reward_vector;

fn bellman_step(model: &impl Pomdp, action: usize, r_a: &[f64], previous: &[f64]) -> Vec<f64> {
    let discount = model.discount();
    (0..model.state_count())
        .map(|s| {
            let expectation: f64 = (0..model.state_count())
                .map(|sp| model.transition_probability(s, action, sp) * previous[sp])
                .sum();
            r_a[s] + discount * expectation
        })
        .collect()
}

fn sup_norm_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// The blind-policy value of always taking `action`, after `horizon`
/// Bellman applications starting from `V_0 = r_a`.
pub fn horizon_value(model: &impl Pomdp, action: usize, horizon: usize) -> AlphaVector {
    let r_a = reward_vector(model, action);
    let mut values = r_a.clone();
    for _ in 0..horizon {
        values = bellman_step(model, action, &r_a, &values);
    }
    AlphaVector::new(values, action, Vec::new())
}

/// Iterates `horizon_value` until the sup-norm change between successive
/// iterates drops below `tolerance`. Convergence is part of this
/// function's contract (§7), so exhausting `max_iterations` without
/// reaching `tolerance` is an `Unconverged` error, not a best-effort
/// return.
pub fn converge(model: &impl Pomdp, action: usize, tolerance: f64, max_iterations: usize) -> FactorplanResult<AlphaVector> {
    let span = tracing::debug_span!("blind_converge", action);
    let _guard = span.enter();

    let r_a = reward_vector(model, action);
    let mut values = r_a.clone();
    for iteration in 0..max_iterations {
        let next = bellman_step(model, action, &r_a, &values);
        let delta = sup_norm_diff(&next, &values);
        values = next;
        if delta < tolerance {
            tracing::trace!(iteration, delta, "blind policy converged");
            return Ok(AlphaVector::new(values, action, Vec::new()));
        }
    }
    factorplan_bail!(Unconverged: "blind policy for action {} did not reach tolerance {} within {} iterations", action, tolerance, max_iterations)
}

/// Solves `(I - gamma*T_a) alpha = r_a` directly via Gaussian elimination
/// with partial pivoting, short-circuiting the fixed-point iteration when
/// an exact converged value is wanted.
pub fn direct(model: &impl Pomdp, action: usize) -> AlphaVector {
    let n = model.state_count();
    let discount = model.discount();
    let r_a = reward_vector(model, action);

    let mut matrix = vec![vec![0.0f64; n + 1]; n];
    for s in 0..n {
        for sp in 0..n {
            let identity = if s == sp { 1.0 } else { 0.0 };
            matrix[s][sp] = identity - discount * model.transition_probability(s, action, sp);
        }
        matrix[s][n] = r_a[s];
    }

    let values = solve_square_system(matrix).unwrap_or(r_a);
    AlphaVector::new(values, action, Vec::new())
}

/// One blind-policy α-vector per action, computed directly.
pub fn blind_value_function(model: &impl Pomdp) -> Vec<AlphaVector> {
    (0..model.action_count()).map(|action| direct(model, action)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorplan_core::model::Mdp;

    const LISTEN: usize = 0;
    const OPEN_LEFT: usize = 1;
    const TIGER_LEFT: usize = 0;

    struct Tiger;

    impl Mdp for Tiger {
        fn state_count(&self) -> usize {
            2
        }
        fn action_count(&self) -> usize {
            2
        }
        fn discount(&self) -> f64 {
            0.95
        }
        fn is_terminal(&self, _s: usize) -> bool {
            false
        }
        fn transition_probability(&self, state: usize, action: usize, next_state: usize) -> f64 {
            if action == LISTEN {
                if next_state == state { 1.0 } else { 0.0 }
            } else {
                0.5
            }
        }
        fn expected_reward(&self, state: usize, action: usize, _next_state: usize) -> f64 {
            if action == LISTEN {
                -1.0
            } else if state == TIGER_LEFT {
                -100.0
            } else {
                10.0
            }
        }
    }

    impl Pomdp for Tiger {
        fn observation_count(&self) -> usize {
            2
        }
        fn observation_probability(&self, _sp: usize, _a: usize, _o: usize) -> f64 {
            0.5
        }
    }

    #[test]
    fn listen_forever_horizon_one_matches_the_published_value() {
        let model = Tiger;
        let alpha = horizon_value(&model, LISTEN, 1);
        assert!((alpha.values[0] - (-1.95)).abs() < 1e-9);
        assert!((alpha.values[1] - (-1.95)).abs() < 1e-9);
    }

    #[test]
    fn open_left_forever_horizon_one_matches_the_published_value() {
        let model = Tiger;
        let alpha = horizon_value(&model, OPEN_LEFT, 1);
        let expected_0 = -100.0 + 0.95 * (0.5 * 10.0 - 0.5 * 100.0);
        let expected_1 = 10.0 + 0.95 * (0.5 * 10.0 - 0.5 * 100.0);
        assert!((alpha.values[0] - expected_0).abs() < 1e-9);
        assert!((alpha.values[1] - expected_1).abs() < 1e-9);
    }

    #[test]
    fn direct_solve_matches_iterative_convergence() {
        let model = Tiger;
        let iterated = converge(&model, LISTEN, 1e-10, 10_000).unwrap();
        let solved = direct(&model, LISTEN);
        assert!((iterated.values[0] - solved.values[0]).abs() < 1e-6);
        assert!((iterated.values[1] - solved.values[1]).abs() < 1e-6);
    }

    #[test]
    fn converge_reports_unconverged_when_the_budget_is_too_small() {
        let model = Tiger;
        let err = converge(&model, LISTEN, 1e-10, 1).unwrap_err();
        assert!(err.to_string().contains("did not reach tolerance"));
    }

    #[test]
    fn listening_forever_fixed_point_is_minus_twenty() {
        // V = -1 + 0.95*V  =>  V = -1 / 0.05 = -20.
        let model = Tiger;
        let solved = direct(&model, LISTEN);
        assert!((solved.values[0] - (-20.0)).abs() < 1e-6);
    }
}
