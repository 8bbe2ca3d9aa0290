//! The POMDP value-backup core (§4.10-4.11): α-vector backups (naive full,
//! incremental pruning, point-based, blind-policy bounds), the witness-LP
//! pruner, and the α-vector-list text codec.
//!
//! The witness LP itself ([`factorplan_solve::witness`]) lives in
//! `factorplan-solve` alongside the [`factorplan_solve::LpProblem`] driver
//! it is built on; this crate's [`pruner`] is the one-level-up protocol
//! that drives it.

pub mod backup;
pub mod blind;
pub mod incremental_pruning;
pub mod pbvi;
pub mod pruner;
pub mod serialize;

pub use backup::{full_backup, project, reward_vector};
pub use blind::{blind_value_function, converge as blind_converge, direct as blind_direct, horizon_value as blind_horizon_value};
pub use pruner::prune;
pub use serialize::{read_horizons, write_horizons};
