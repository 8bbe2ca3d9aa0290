//! A [`Rule`] pairs a partial assignment with a numeric payload (§3). The
//! payload shape varies by solver: a scalar for VE, a `(mean,
//! inverse-weighted-count)` pair for UCVE, a reward vector for MOVE — each
//! solver crate defines its own payload type and uses this generic carrier.

use crate::assignment::PartialAssignment;

#[derive(Clone, Debug, PartialEq)]
pub struct Rule<P> {
    pub assignment: PartialAssignment,
    pub payload: P,
}

impl<P> Rule<P> {
    pub fn new(assignment: PartialAssignment, payload: P) -> Self {
        Self { assignment, payload }
    }
}
