//! Shared data model for the factorplan workspace (§3): factor sets and
//! assignments, α-vectors and value functions, beliefs, the factor graph,
//! polytope primitives, ground-model contracts, and explicit-RNG helpers.
//! Every other crate in the workspace depends on this one.

pub mod alpha;
pub mod assignment;
pub mod belief;
pub mod graph;
pub mod model;
pub mod polytope;
pub mod rng;
pub mod rule;

pub use alpha::{AlphaVector, VList, ValueFunction};
pub use assignment::{FactorSet, PartialAssignment};
pub use belief::Belief;
pub use graph::{FactorGraph, FactorNode};
pub use model::{FactoredModel, Mdp, Pomdp, RewardBasis, TransitionBasis};
pub use polytope::{
    best_at_point, extract_best_at_simplex_corners, extract_dominated, find_vertices_naive,
    prune_pairwise_dominated, solve_square_system,
};
pub use rng::{bernoulli, sample_categorical, sample_uniform_index};
pub use rule::Rule;

pub mod prelude {
    pub use super::alpha::{AlphaVector, VList, ValueFunction};
    pub use super::assignment::{FactorSet, PartialAssignment};
    pub use super::belief::Belief;
    pub use super::graph::{FactorGraph, FactorNode};
    pub use super::model::{FactoredModel, Mdp, Pomdp, RewardBasis, TransitionBasis};
    pub use super::polytope::{
        best_at_point, extract_best_at_simplex_corners, extract_dominated, find_vertices_naive,
        prune_pairwise_dominated, solve_square_system,
    };
    pub use super::rng::{bernoulli, sample_categorical, sample_uniform_index};
    pub use super::rule::Rule;
}
