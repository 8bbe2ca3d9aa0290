//! Factored coordination solvers (§4.2–§4.4): the LP driver, Generic
//! Variable Elimination and its three instantiations, and local search.

pub mod gve;
pub mod local_search;
pub mod lp;
pub mod move_;
pub mod ucve;
pub mod ve;
pub mod witness;

pub use gve::{CombinerProtocol, RuleSet};
pub use local_search::{LocalTable, ReusingIterativeLocalSearch, local_search, total_value};
pub use lp::{LpProblem, RowType};
pub use move_::{FrontierPoint, MovePayload};
pub use ucve::{UcveEntry, UcvePayload};
pub use ve::VePayload;
pub use witness::WitnessLp;
