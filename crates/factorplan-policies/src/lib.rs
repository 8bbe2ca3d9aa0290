//! Learning policies (§4.9): scalar action selection over a flat Q-value
//! slice (Q-greedy, Q-softmax, ε-greedy), and three factored policies that
//! coordinate a joint action by invoking a `factorplan-solve` solver.

pub mod llr;
pub mod mauce;
pub mod scalar;
pub mod thompson;

pub use llr::LlrPolicy;
pub use mauce::MaucePolicy;
pub use scalar::{EpsilonGreedy, QGreedy, QSoftmax, ScalarPolicy};
pub use thompson::ThompsonPolicy;
