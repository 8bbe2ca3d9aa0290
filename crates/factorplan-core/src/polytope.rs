//! Polytope primitives (§4.1) operating on plain α-vectors and beliefs:
//! best-vector-at-a-point search, seeding the "useful" set from simplex
//! corners, pointwise-domination pruning, and naive vertex enumeration of
//! the α-vector upper surface. These are the shared subroutines used by
//! both the POMDP pruner and (for domination only) UCVE's branch-and-bound.

use factorplan_error::{FactorplanResult, factorplan_err};

use crate::alpha::AlphaVector;

/// Returns the index into `list` of the α-vector maximizing `b · α`, with
/// ties broken by lexicographic order over the α-vector's own components so
/// the result is deterministic regardless of input order. Fails with an
/// `InvalidArgument` error ("empty list") if `list` is empty.
pub fn best_at_point(belief: &[f64], list: &[AlphaVector]) -> FactorplanResult<(usize, f64)> {
    if list.is_empty() {
        return Err(factorplan_err!(InvalidArgument: "best_at_point: empty α-vector list"));
    }
    let mut best_index = 0usize;
    let mut best_value = list[0].dot(belief);
    for (i, alpha) in list.iter().enumerate().skip(1) {
        let value = alpha.dot(belief);
        if value > best_value
            || (value == best_value && lexicographically_greater(&alpha.values, &list[best_index].values))
        {
            best_value = value;
            best_index = i;
        }
    }
    Ok((best_index, best_value))
}

fn lexicographically_greater(a: &[f64], b: &[f64]) -> bool {
    for (x, y) in a.iter().zip(b.iter()) {
        if x > y {
            return true;
        }
        if x < y {
            return false;
        }
    }
    false
}

/// Seeds the "useful" set from the simplex corners: for each corner `e_i`
/// (the belief concentrated on state `i`), finds the maximizing α within
/// `range[front..]` and swaps it into the front segment. Duplicates are
/// never re-moved, because once an α is swapped into the front segment it
/// falls outside the search range for subsequent corners. Returns the index
/// separating the "useful" front segment from the remaining candidates.
pub fn extract_best_at_simplex_corners(state_count: usize, range: &mut [AlphaVector]) -> usize {
    let mut front = 0usize;
    for corner in 0..state_count {
        if front >= range.len() {
            break;
        }
        let mut best_in_remaining = front;
        let mut best_value = range[front].values[corner];
        for i in (front + 1)..range.len() {
            let value = range[i].values[corner];
            if value > best_value {
                best_value = value;
                best_in_remaining = i;
            }
        }
        range.swap(front, best_in_remaining);
        front += 1;
    }
    front
}

/// Generic O(n²) pairwise-domination filter: an item survives unless some
/// other item in the slice "wins" against it. `wins(other, candidate,
/// other_index, candidate_index)` embeds both the domination predicate and
/// any index tie-break for exact duplicates; callers outside this module
/// supply their own predicate over their own payload (a Pareto-frontier
/// reward vector, a UCB acquisition value, ...) instead of duplicating the
/// O(n²) skeleton itself.
pub fn prune_pairwise_dominated<T: Clone>(items: &[T], wins: impl Fn(&T, &T, usize, usize) -> bool) -> Vec<T> {
    let mut survivors: Vec<T> = Vec::with_capacity(items.len());
    'outer: for (i, candidate) in items.iter().enumerate() {
        for (j, other) in items.iter().enumerate() {
            if i == j {
                continue;
            }
            if wins(other, candidate, j, i) {
                continue 'outer;
            }
        }
        survivors.push(candidate.clone());
    }
    survivors
}

/// Removes every α in `range` that is pointwise-dominated by another α in
/// the same range (`α' >= α` everywhere, `α' != α`). This is *not* LP
/// (convex-combination) domination — only componentwise domination.
/// Re-orders `range` in place so the surviving, non-dominated vectors occupy
/// `range[..new_end]`; stable in the sense that among equal vectors only the
/// first copy is kept. Returns `new_end`.
pub fn extract_dominated(range: &mut Vec<AlphaVector>) -> usize {
    let survivors = prune_pairwise_dominated(range, |other, candidate, j, i| {
        other.dominates(candidate) || (other.values == candidate.values && j < i)
    });
    let new_end = survivors.len();
    range.splice(.., survivors);
    new_end
}

/// Naively enumerates every `state_count`-subset of `bag`, solving the
/// resulting square linear system `b · (α_i - α_{i+1}) = 0` (for consecutive
/// pairs in the subset) plus `Σb = 1` for the belief vertex at which all
/// chosen α-vectors tie. Keeps only solutions that are valid probability
/// vectors, evaluates the best candidate value there, and deduplicates by
/// belief. `O(S · |range|)` per the specification's complexity note refers
/// to the seeding step above; this routine is inherently combinatorial in
/// `|bag|` choose `state_count` and is meant for small bags.
pub fn find_vertices_naive(
    state_count: usize,
    bag: &[AlphaVector],
    candidates: &[AlphaVector],
) -> Vec<(Vec<f64>, f64)> {
    let mut results: Vec<(Vec<f64>, f64)> = Vec::new();
    if bag.len() < state_count || state_count == 0 {
        return results;
    }

    for subset in combinations(bag.len(), state_count) {
        let mut matrix = vec![vec![0.0; state_count + 1]; state_count];
        for row in 0..state_count.saturating_sub(1) {
            let a = &bag[subset[row]].values;
            let b = &bag[subset[row + 1]].values;
            for col in 0..state_count {
                matrix[row][col] = a[col] - b[col];
            }
            matrix[row][state_count] = 0.0;
        }
        let last = state_count - 1;
        for col in 0..state_count {
            matrix[last][col] = 1.0;
        }
        matrix[last][state_count] = 1.0;

        let Some(belief) = solve_square_system(matrix) else {
            continue;
        };
        if belief.iter().any(|&p| p < -1e-7) {
            continue;
        }
        let sum: f64 = belief.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            continue;
        }
        let clamped: Vec<f64> = belief.iter().map(|&p| p.max(0.0)).collect();

        if results.iter().any(|(b, _): &(Vec<f64>, f64)| approx_eq(b, &clamped)) {
            continue;
        }

        let Ok((_, value)) = best_at_point(&clamped, candidates) else {
            continue;
        };
        results.push((clamped, value));
    }
    results
}

fn approx_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-7)
}

/// Gaussian elimination with partial pivoting on an `n x (n+1)` augmented
/// matrix. Returns `None` if the system is singular to numerical precision.
/// Shared by [`find_vertices_naive`]'s per-subset belief solve and
/// `factorplan-pomdp::blind::direct`'s `(I - gamma T_a) alpha = r_a` solve.
pub fn solve_square_system(mut matrix: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let n = matrix.len();
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&a, &b| {
            matrix[a][col]
                .abs()
                .partial_cmp(&matrix[b][col].abs())
                .unwrap()
        })?;
        if matrix[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        matrix.swap(col, pivot_row);
        let pivot = matrix[col][col];
        for j in col..=n {
            matrix[col][j] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = matrix[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..=n {
                matrix[row][j] -= factor * matrix[col][j];
            }
        }
    }
    Some(matrix.iter().map(|row| row[n]).collect())
}

fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }
    let mut result = Vec::new();
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        result.push(current.clone());
        let mut i = k;
        loop {
            if i == 0 {
                return result;
            }
            i -= 1;
            if current[i] != i + n - k {
                break;
            }
            if i == 0 {
                return result;
            }
        }
        current[i] += 1;
        for j in (i + 1)..k {
            current[j] = current[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn av(values: Vec<f64>) -> AlphaVector {
        AlphaVector::new(values, 0, vec![])
    }

    #[test]
    fn best_at_point_breaks_ties_lexicographically() {
        let list = vec![av(vec![1.0, 0.0]), av(vec![0.0, 1.0])];
        let (idx, value) = best_at_point(&[0.5, 0.5], &list).unwrap();
        // Both score 0.5; [1.0, 0.0] is lexicographically greater.
        assert_eq!(idx, 0);
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn best_at_point_rejects_empty_list() {
        assert!(best_at_point(&[1.0], &[]).is_err());
    }

    #[test]
    fn extract_dominated_removes_pointwise_dominated() {
        let mut list = vec![
            av(vec![1.0, 1.0]),
            av(vec![2.0, 2.0]), // dominates the first
            av(vec![0.0, 5.0]), // incomparable with the second
        ];
        let new_end = extract_dominated(&mut list);
        assert_eq!(new_end, 2);
        assert!(list[..new_end].iter().any(|a| a.values == vec![2.0, 2.0]));
        assert!(list[..new_end].iter().any(|a| a.values == vec![0.0, 5.0]));
    }

    #[test]
    fn extract_best_at_simplex_corners_seeds_front_segment() {
        let mut list = vec![av(vec![5.0, 0.0]), av(vec![0.0, 5.0]), av(vec![1.0, 1.0])];
        let front = extract_best_at_simplex_corners(2, &mut list);
        assert_eq!(front, 2);
        assert_eq!(list[0].values, vec![5.0, 0.0]);
        assert_eq!(list[1].values, vec![0.0, 5.0]);
    }

    #[test]
    fn find_vertices_naive_finds_crossing_of_two_lines() {
        // Two 2-state α-vectors crossing in the interior of the simplex.
        let bag = vec![av(vec![0.0, 10.0]), av(vec![10.0, 0.0])];
        let vertices = find_vertices_naive(2, &bag, &bag);
        assert_eq!(vertices.len(), 1);
        let (belief, value) = &vertices[0];
        assert!((belief[0] - 0.5).abs() < 1e-6);
        assert!((value - 5.0).abs() < 1e-6);
    }
}
