//! Generic Variable Elimination (§4.4, §9 "combiner protocol"). A single
//! skeleton drives [`VE`](crate::ve), [`MOVE`](crate::move_), and
//! [`UCVE`](crate::ucve); each supplies its own [`CombinerProtocol`] instead
//! of the duck typing the original relied on.
//!
//! A graph node's payload is a *rule set*: a sparse list of
//! `(partial assignment over the node's own scope, combiner payload)`
//! pairs. Leaf factors are supplied by the caller; every factor produced
//! during elimination is built the same way, one rule per joint assignment
//! of its new scope.

use factorplan_core::{FactorGraph, FactorSet, PartialAssignment, Rule};

/// The eight operations a solver implements to ride the GVE skeleton.
pub trait CombinerProtocol {
    type Payload: Clone;

    fn begin_removal(&mut self, var: usize);
    fn init_new_factor(&mut self);
    fn begin_cross_sum(&mut self, var_value: usize);
    fn cross_sum(&mut self, factor: &Self::Payload);
    fn end_cross_sum(&mut self);
    fn is_valid_new_factor(&self) -> bool;
    /// Extracts the accumulator built by `init_new_factor`/`cross_sum`. Only
    /// called when `is_valid_new_factor` holds.
    fn take_new_factor(&mut self) -> Self::Payload;
    fn merge_factors(acc: Self::Payload, other: Self::Payload) -> Self::Payload;
    fn make_result(final_factors: Vec<Self::Payload>) -> Self::Payload;
}

/// A graph factor's payload: one rule per assignment of the factor's scope
/// that the combiner has deemed worth keeping.
pub type RuleSet<P> = Vec<Rule<P>>;

/// Finds the rule in `rules` whose assignment exactly matches `keys`
/// projected out of `full_values` (indexed by variable). Every rule set GVE
/// builds covers its scope exhaustively, so a missing match means the
/// caller supplied an incomplete leaf factor.
fn restrict<'a, P>(keys: &[usize], rules: &'a [Rule<P>], full_values: &[usize]) -> Option<&'a P> {
    rules.iter().find_map(|rule| {
        let matches = keys
            .iter()
            .all(|&k| rule.assignment.value_of(k) == Some(full_values[k]));
        matches.then_some(&rule.payload)
    })
}

/// Picks the next variable to eliminate via the "min-fill" heuristic: the
/// variable whose removal would touch the fewest other variables in its
/// replacement factor. Ties favor the lowest index (the order `active` is
/// already enumerated in).
fn choose_min_fill<P>(graph: &FactorGraph<RuleSet<P>>, active: &[usize]) -> usize {
    active
        .iter()
        .copied()
        .min_by_key(|&v| {
            let neighbors = graph.neighbors(v).to_vec();
            graph
                .variables_touched(&neighbors)
                .into_iter()
                .filter(|&u| u != v)
                .count()
        })
        .expect("choose_min_fill: active variable set must be non-empty")
}

/// Combines two rule sets over the same `scope` into one, joining per joint
/// assignment: both sides present combines via `C::merge_factors` (the same
/// "independent contributions at one assignment" operation each instance
/// already uses to merge GVE's final factors); only one side present keeps
/// that side as-is; neither side present stays absent, preserving `restrict`'s
/// "no matching rule" semantics.
fn merge_rule_sets<C: CombinerProtocol>(
    scope: &[usize],
    scope_sizes: &[usize],
    factor_set: &FactorSet,
    existing: RuleSet<C::Payload>,
    incoming: RuleSet<C::Payload>,
) -> RuleSet<C::Payload> {
    let mut merged = Vec::new();
    for scope_values in assignments_of(scope_sizes) {
        let mut full_values = vec![0usize; factor_set.len()];
        for (&v, &val) in scope.iter().zip(scope_values.iter()) {
            full_values[v] = val;
        }
        let a = restrict(scope, &existing, &full_values).cloned();
        let b = restrict(scope, &incoming, &full_values).cloned();
        let combined = match (a, b) {
            (Some(pa), Some(pb)) => Some(C::merge_factors(pa, pb)),
            (Some(pa), None) => Some(pa),
            (None, Some(pb)) => Some(pb),
            (None, None) => None,
        };
        if let Some(payload) = combined {
            let assignment = PartialAssignment::new(scope.to_vec(), scope_values)
                .expect("scope is sorted by construction");
            merged.push(Rule::new(assignment, payload));
        }
    }
    merged
}

/// Runs GVE to completion over `graph`, using `factor_set` for variable
/// domain sizes, and returns the combiner's final result.
pub fn eliminate<C: CombinerProtocol>(
    mut graph: FactorGraph<RuleSet<C::Payload>>,
    factor_set: &FactorSet,
    mut combiner: C,
) -> C::Payload {
    let mut final_factors: Vec<C::Payload> = Vec::new();
    let span = tracing::debug_span!("gve_eliminate", variables = factor_set.len());
    let _guard = span.enter();

    loop {
        let active = graph.active_variables();
        if active.is_empty() {
            break;
        }
        let var = choose_min_fill(&graph, &active);
        tracing::trace!(var, remaining = active.len(), "eliminating variable");
        combiner.begin_removal(var);

        let neighbor_keys = graph.neighbors(var).to_vec();
        let mut new_scope = graph.variables_touched(&neighbor_keys);
        new_scope.retain(|&v| v != var);

        let new_scope_sizes: Vec<usize> = new_scope.iter().map(|&v| factor_set.size(v)).collect();
        let var_size = factor_set.size(var);

        let mut new_rules: Vec<Rule<C::Payload>> = Vec::new();

        for scope_values in assignments_of(&new_scope_sizes) {
            combiner.init_new_factor();

            let mut full_values = vec![0usize; factor_set.len()];
            for (&v, &val) in new_scope.iter().zip(scope_values.iter()) {
                full_values[v] = val;
            }

            for value in 0..var_size {
                combiner.begin_cross_sum(value);
                full_values[var] = value;
                for &factor_key in &neighbor_keys {
                    let node = graph
                        .factor(factor_key)
                        .expect("GVE: adjacency referenced a removed factor");
                    if let Some(payload) = restrict(&node.keys, &node.payload, &full_values) {
                        combiner.cross_sum(payload);
                    }
                }
                combiner.end_cross_sum();
            }

            if combiner.is_valid_new_factor() {
                let payload = combiner.take_new_factor();
                if new_scope.is_empty() {
                    final_factors.push(payload);
                } else {
                    let assignment =
                        PartialAssignment::new(new_scope.clone(), scope_values.clone())
                            .expect("new_scope is sorted by construction");
                    new_rules.push(Rule::new(assignment, payload));
                }
            }
        }

        graph.eliminate_variable(var);
        if !new_scope.is_empty() {
            match graph.factor_key_for(&new_scope) {
                // `new_scope` already names a factor untouched by this
                // elimination step (e.g. a leaf factor whose own scope
                // happens to coincide with the one just produced) — merge
                // the two independent contributions per joint assignment
                // rather than silently discarding whichever was built
                // second, which is what plain insert-if-absent would do.
                Some(existing_key) => {
                    let existing_rules = std::mem::take(
                        &mut graph
                            .factor_mut(existing_key)
                            .expect("factor_key_for returned a live key")
                            .payload,
                    );
                    let merged = merge_rule_sets::<C>(
                        &new_scope,
                        &new_scope_sizes,
                        factor_set,
                        existing_rules,
                        new_rules,
                    );
                    graph
                        .factor_mut(existing_key)
                        .expect("factor_key_for returned a live key")
                        .payload = merged;
                }
                None => {
                    graph.get_or_create_factor(new_scope, || new_rules);
                }
            }
        }
    }

    let merged = final_factors
        .into_iter()
        .reduce(C::merge_factors)
        .expect("GVE: elimination produced no final factor");
    C::make_result(vec![merged])
}

/// Enumerates every joint assignment of a (possibly empty) list of variable
/// sizes, least-significant variable first.
fn assignments_of(sizes: &[usize]) -> Vec<Vec<usize>> {
    if sizes.is_empty() {
        return vec![Vec::new()];
    }
    let total: usize = sizes.iter().product();
    let mut out = Vec::with_capacity(total);
    for mut idx in 0..total {
        let mut values = vec![0usize; sizes.len()];
        for (i, &size) in sizes.iter().enumerate() {
            values[i] = idx % size;
            idx /= size;
        }
        out.push(values);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sums scalar leaf factors and reports the running sum: verifies the
    /// elimination loop itself (scope bookkeeping, rule lookup) independent
    /// of any real solver's payload semantics.
    struct SumCombiner {
        acc: f64,
    }

    impl CombinerProtocol for SumCombiner {
        type Payload = f64;

        fn begin_removal(&mut self, _var: usize) {}
        fn init_new_factor(&mut self) {
            self.acc = 0.0;
        }
        fn begin_cross_sum(&mut self, _var_value: usize) {}
        fn cross_sum(&mut self, factor: &f64) {
            self.acc += factor;
        }
        fn end_cross_sum(&mut self) {}
        fn is_valid_new_factor(&self) -> bool {
            true
        }
        fn take_new_factor(&mut self) -> f64 {
            self.acc
        }
        fn merge_factors(acc: f64, other: f64) -> f64 {
            acc + other
        }
        fn make_result(final_factors: Vec<f64>) -> f64 {
            final_factors[0]
        }
    }

    #[test]
    fn eliminates_a_two_variable_chain() {
        let factor_set = FactorSet::new(vec![2, 2]).unwrap();
        let mut graph: FactorGraph<RuleSet<f64>> = FactorGraph::new(2);
        graph.get_or_create_factor(vec![0, 1], || {
            vec![
                Rule::new(PartialAssignment::new(vec![0, 1], vec![0, 0]).unwrap(), 1.0),
                Rule::new(PartialAssignment::new(vec![0, 1], vec![0, 1]).unwrap(), 2.0),
                Rule::new(PartialAssignment::new(vec![0, 1], vec![1, 0]).unwrap(), 3.0),
                Rule::new(PartialAssignment::new(vec![0, 1], vec![1, 1]).unwrap(), 4.0),
            ]
        });

        let result = eliminate(graph, &factor_set, SumCombiner { acc: 0.0 });
        assert_eq!(result, 1.0 + 2.0 + 3.0 + 4.0);
    }

    #[test]
    fn assignments_of_enumerates_mixed_radix() {
        let all = assignments_of(&[2, 3]);
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], vec![0, 0]);
        assert_eq!(all[1], vec![1, 0]);
        assert_eq!(all[2], vec![0, 1]);
    }

    #[test]
    fn assignments_of_empty_scope_yields_single_empty_assignment() {
        assert_eq!(assignments_of(&[]), vec![Vec::<usize>::new()]);
    }
}
