//! The witness LP (§4.11): a belief-simplex search for a point where a
//! candidate α-vector strictly beats every member of an established "best"
//! set. Encapsulates the permanent/temporary row stack described in §9 so
//! callers never interleave row types directly against [`LpProblem`].
//!
//! Columns are laid out `b_0..b_{S-1}` (the belief, non-negative, summing to
//! one via a fixed row), an unbounded `K`, and an unbounded `δ` (the
//! objective). Each permanent row encodes `α_best·b − K + δ ≤ 0` for one
//! established-best vector; the single temporary row pins `K = α*·b` for the
//! candidate under test. A solution exists with `δ > 0` exactly when some
//! belief makes the candidate beat every permanent member simultaneously.

use crate::lp::{LpProblem, RowType};

pub struct WitnessLp {
    lp: LpProblem,
    belief_vars: usize,
    k_col: usize,
    delta_col: usize,
    has_temporary: bool,
}

impl WitnessLp {
    pub fn new(state_count: usize) -> Self {
        let mut lp = LpProblem::new(state_count);
        let k_col = lp.add_column();
        lp.set_unbounded(k_col);
        let delta_col = lp.add_column();
        lp.set_unbounded(delta_col);
        lp.set_objective(delta_col, true);

        for i in 0..state_count {
            lp.row_buffer[i] = 1.0;
        }
        lp.row_buffer[k_col] = 0.0;
        lp.row_buffer[delta_col] = 0.0;
        lp.push_row(RowType::Eq, 1.0);

        Self { lp, belief_vars: state_count, k_col, delta_col, has_temporary: false }
    }

    pub fn belief_vars(&self) -> usize {
        self.belief_vars
    }

    /// Registers `alpha` as a permanent member of the "best" set: the row
    /// `alpha·b - K + delta <= 0`.
    pub fn push_permanent(&mut self, alpha: &[f64]) {
        debug_assert_eq!(alpha.len(), self.belief_vars);
        for (i, &v) in alpha.iter().enumerate() {
            self.lp.row_buffer[i] = v;
        }
        self.lp.row_buffer[self.k_col] = -1.0;
        self.lp.row_buffer[self.delta_col] = 1.0;
        self.lp.push_row(RowType::Le, 0.0);
    }

    pub fn pop_permanent(&mut self) {
        self.lp.pop_row();
    }

    /// Pins `K = candidate·b`, the value the candidate under test achieves
    /// at the witness belief. Only one temporary row may be active at a
    /// time; pop it before pushing another.
    pub fn push_temporary(&mut self, candidate: &[f64]) {
        assert!(!self.has_temporary, "a temporary row is already active");
        debug_assert_eq!(candidate.len(), self.belief_vars);
        for (i, &v) in candidate.iter().enumerate() {
            self.lp.row_buffer[i] = v;
        }
        self.lp.row_buffer[self.k_col] = -1.0;
        self.lp.row_buffer[self.delta_col] = 0.0;
        self.lp.push_row(RowType::Eq, 0.0);
        self.has_temporary = true;
    }

    pub fn pop_temporary(&mut self) {
        assert!(self.has_temporary, "no temporary row to pop");
        self.lp.pop_row();
        self.has_temporary = false;
    }

    /// Solves for a witness belief. `Some(belief)` means `delta > 0` is
    /// achievable: the tested candidate strictly beats every permanent
    /// member at `belief`. `None` means no witness exists.
    pub fn solve(&self) -> Option<Vec<f64>> {
        self.lp.solve(self.belief_vars)
    }
}
