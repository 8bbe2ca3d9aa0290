//! Local Search and Reusing Iterative Local Search (§4.4.4). Both operate
//! directly on a factor graph whose payloads are dense local value tables —
//! unlike [`gve`](crate::gve), there is no elimination here, only
//! coordinate-ascent over the joint assignment.

use rand::RngCore;
use rand::seq::SliceRandom;

use factorplan_core::{FactorGraph, FactorSet, bernoulli, sample_uniform_index};

/// A dense local value table, indexed by the flat index of the factor's own
/// scope (see [`FactorSet::flat_index`]).
pub type LocalTable = Vec<f64>;

fn local_delta(
    graph: &FactorGraph<LocalTable>,
    factor_set: &FactorSet,
    assignment: &[usize],
    var: usize,
    candidate_value: usize,
) -> f64 {
    graph
        .neighbors(var)
        .iter()
        .filter_map(|&key| graph.factor(key))
        .map(|node| {
            let values: Vec<usize> = node
                .keys
                .iter()
                .map(|&k| if k == var { candidate_value } else { assignment[k] })
                .collect();
            node.payload[factor_set.flat_index(&node.keys, &values)]
        })
        .sum()
}

/// Total value of `assignment`: the sum of every factor's table entry at its
/// restriction of `assignment`, each factor counted exactly once.
pub fn total_value(graph: &FactorGraph<LocalTable>, factor_set: &FactorSet, assignment: &[usize]) -> f64 {
    graph
        .all_factors()
        .map(|(_, node)| {
            let values: Vec<usize> = node.keys.iter().map(|&k| assignment[k]).collect();
            node.payload[factor_set.flat_index(&node.keys, &values)]
        })
        .sum()
}

fn random_assignment(factor_set: &FactorSet, rng: &mut impl RngCore) -> Vec<usize> {
    (0..factor_set.len())
        .map(|v| sample_uniform_index(factor_set.size(v), rng))
        .collect()
}

/// Coordinate-ascent local search: starting from `seed` (or a uniformly
/// random assignment if `None`), repeatedly sweeps variables in a shuffled
/// order, holding all but one fixed and switching it to its local argmax.
/// Terminates when a full sweep makes no strict improvement. Returns the
/// final assignment and its total value.
pub fn local_search(
    graph: &FactorGraph<LocalTable>,
    factor_set: &FactorSet,
    seed: Option<Vec<usize>>,
    rng: &mut impl RngCore,
) -> (Vec<usize>, f64) {
    let mut assignment = seed.unwrap_or_else(|| random_assignment(factor_set, rng));

    loop {
        let mut order: Vec<usize> = (0..factor_set.len()).collect();
        order.shuffle(rng);

        let mut improved = false;
        for var in order {
            let current_value = local_delta(graph, factor_set, &assignment, var, assignment[var]);
            let mut best_choice = assignment[var];
            let mut best_value = current_value;
            for candidate in 0..factor_set.size(var) {
                if candidate == assignment[var] {
                    continue;
                }
                let value = local_delta(graph, factor_set, &assignment, var, candidate);
                if value > best_value {
                    best_value = value;
                    best_choice = candidate;
                }
            }
            if best_choice != assignment[var] {
                assignment[var] = best_choice;
                improved = true;
            }
        }
        if !improved {
            break;
        }
    }

    let value = total_value(graph, factor_set, &assignment);
    (assignment, value)
}

/// Reuses the incumbent assignment across calls rather than restarting from
/// scratch, trading a little per-call exploration for much cheaper repeated
/// re-optimization (e.g. inside a learning loop's action-selection step).
pub struct ReusingIterativeLocalSearch {
    incumbent: Vec<usize>,
    incumbent_value: f64,
}

impl ReusingIterativeLocalSearch {
    pub fn new(graph: &FactorGraph<LocalTable>, factor_set: &FactorSet, rng: &mut impl RngCore) -> Self {
        let (incumbent, incumbent_value) = local_search(graph, factor_set, None, rng);
        Self { incumbent, incumbent_value }
    }

    pub fn incumbent(&self) -> (&[usize], f64) {
        (&self.incumbent, self.incumbent_value)
    }

    /// Runs `trial_num` iterations. Each iteration seeds local search either
    /// from a fresh uniform-random assignment (probability
    /// `reset_action_probability`) or from the incumbent perturbed by
    /// randomizing each factor's local variables independently (probability
    /// `randomize_factor_probability` per factor). Any result strictly
    /// beating the incumbent replaces it.
    pub fn run(
        &mut self,
        graph: &FactorGraph<LocalTable>,
        factor_set: &FactorSet,
        trial_num: usize,
        reset_action_probability: f64,
        randomize_factor_probability: f64,
        rng: &mut impl RngCore,
    ) {
        for _ in 0..trial_num {
            let seed = if bernoulli(reset_action_probability, rng) {
                random_assignment(factor_set, rng)
            } else {
                let mut candidate = self.incumbent.clone();
                for (_, node) in graph.all_factors() {
                    if bernoulli(randomize_factor_probability, rng) {
                        for &v in &node.keys {
                            candidate[v] = sample_uniform_index(factor_set.size(v), rng);
                        }
                    }
                }
                candidate
            };

            let (result, value) = local_search(graph, factor_set, Some(seed), rng);
            if value > self.incumbent_value {
                self.incumbent = result;
                self.incumbent_value = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_two_variable_graph() -> (FactorGraph<LocalTable>, FactorSet) {
        let factor_set = FactorSet::new(vec![2, 2]).unwrap();
        let mut graph: FactorGraph<LocalTable> = FactorGraph::new(2);
        // Coordination game: matching actions score 10, mismatches score 0.
        graph.get_or_create_factor(vec![0, 1], || vec![10.0, 0.0, 0.0, 10.0]);
        (graph, factor_set)
    }

    #[test]
    fn local_search_converges_to_the_coordinated_optimum() {
        let (graph, factor_set) = build_two_variable_graph();
        let mut rng = StdRng::seed_from_u64(7);
        let (assignment, value) =
            local_search(&graph, &factor_set, Some(vec![0, 1]), &mut rng);
        assert_eq!(value, 10.0);
        assert_eq!(assignment[0], assignment[1]);
    }

    #[test]
    fn reusing_iterative_local_search_never_regresses() {
        let (graph, factor_set) = build_two_variable_graph();
        let mut rng = StdRng::seed_from_u64(3);
        let mut rils = ReusingIterativeLocalSearch::new(&graph, &factor_set, &mut rng);
        let (_, initial_value) = rils.incumbent();
        rils.run(&graph, &factor_set, 20, 0.3, 0.5, &mut rng);
        let (_, final_value) = rils.incumbent();
        assert!(final_value >= initial_value);
        assert_eq!(final_value, 10.0);
    }
}
