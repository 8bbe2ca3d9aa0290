//! A Rust library for factored coordination and POMDP planning.
//!
//! Re-exports the whole workspace: the factored coordination solvers
//! (variable elimination, local search), the factored learning loop
//! (rolling statistics, cooperative prioritized sweeping, cooperative
//! Q-learning), the learning policies that close it (MAUCE, Thompson
//! sampling, LLR, epsilon-greedy), and the POMDP value-backup core
//! (incremental pruning, PBVI, blind-policy bounds, the witness-LP
//! pruner).

pub use factorplan_core::*;
pub use factorplan_error::*;
pub use factorplan_learn::*;
pub use factorplan_policies::*;
pub use factorplan_pomdp::*;
pub use factorplan_solve::*;
