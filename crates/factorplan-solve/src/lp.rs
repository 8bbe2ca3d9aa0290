//! A narrow dense simplex LP driver (§4.2), the shared primitive behind the
//! POMDP witness search. Deliberately not a general-purpose LP library:
//! just the operations the witness LP and pruner need — construct with a
//! fixed variable count, grow it with `add_column`, accumulate constraint
//! rows through a reusable buffer, and solve by Big-M simplex.
//!
//! §9's design note about the witness LP's "permanent/temporary row stack"
//! is enforced one level up, by [`crate::witness`]; this driver only
//! exposes the generic `push_row`/`pop_row` stack operations it is built
//! from.

const BIG_M: f64 = 1.0e6;
const EPSILON: f64 = 1.0e-7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowType {
    Le,
    Ge,
    Eq,
}

#[derive(Clone, Debug)]
struct Row {
    kind: RowType,
    coefficients: Vec<f64>,
    rhs: f64,
}

/// A dense LP in the form "maximize the objective subject to pushed rows,
/// all structural variables non-negative unless marked unbounded".
pub struct LpProblem {
    num_vars: usize,
    objective: Vec<f64>,
    unbounded: Vec<bool>,
    rows: Vec<Row>,
    /// Reused scratch buffer of length `num_vars + 1` (coefficients, then
    /// rhs), mutated by the caller before each `push_row`.
    pub row_buffer: Vec<f64>,
}

impl LpProblem {
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            objective: vec![0.0; num_vars],
            unbounded: vec![false; num_vars],
            rows: Vec::new(),
            row_buffer: vec![0.0; num_vars + 1],
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Sets whether column `col` is maximized (coefficient 1) in the
    /// objective, or excluded from it (coefficient 0). Exactly the objective
    /// shapes the witness LP needs: maximize a single slack variable.
    pub fn set_objective(&mut self, col: usize, maximize: bool) {
        self.objective[col] = if maximize { 1.0 } else { 0.0 };
    }

    pub fn set_unbounded(&mut self, col: usize) {
        self.unbounded[col] = true;
    }

    /// Appends a new structural variable (non-negative by default),
    /// extending every already-pushed row's coefficients with a 0 in the
    /// new column. Returns the new column's index.
    pub fn add_column(&mut self) -> usize {
        self.num_vars += 1;
        self.objective.push(0.0);
        self.unbounded.push(false);
        for row in &mut self.rows {
            row.coefficients.push(0.0);
        }
        self.row_buffer.push(0.0);
        self.num_vars - 1
    }

    /// Pushes `row_buffer[..num_vars]` as a new constraint row of the given
    /// type, with right-hand side `rhs`. The buffer is left as-is for the
    /// caller to overwrite before the next call.
    pub fn push_row(&mut self, kind: RowType, rhs: f64) {
        self.rows.push(Row {
            kind,
            coefficients: self.row_buffer[..self.num_vars].to_vec(),
            rhs,
        });
    }

    pub fn pop_row(&mut self) {
        self.rows.pop();
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Solves the current LP. Returns the primal values of the first `n`
    /// variables when the LP is feasible and, if an objective was set
    /// (`set_objective` made any column's coefficient 1), the optimal value
    /// is strictly positive. Returns `None` when infeasible, unbounded, or
    /// (in maximizing mode) optimal-but-non-positive.
    pub fn solve(&self, n: usize) -> Option<Vec<f64>> {
        let maximizing = self.objective.iter().any(|&c| c != 0.0);
        let solution = self.solve_split_variables()?;
        if maximizing {
            let objective_value: f64 = self
                .objective
                .iter()
                .zip(solution.iter())
                .map(|(&c, &x)| c * x)
                .sum();
            if objective_value <= EPSILON {
                return None;
            }
        }
        Some(solution[..n.min(solution.len())].to_vec())
    }

    fn solve_split_variables(&self) -> Option<Vec<f64>> {
        // Column layout: for each original variable, one column (>= 0) or
        // two columns plus/minus (unbounded); then one slack/surplus column
        // per row; then one artificial column per Ge/Eq row.
        let mut split_cols: Vec<(usize, Option<usize>)> = Vec::with_capacity(self.num_vars);
        let mut next_col = 0usize;
        for &free in &self.unbounded {
            if free {
                split_cols.push((next_col, Some(next_col + 1)));
                next_col += 2;
            } else {
                split_cols.push((next_col, None));
                next_col += 1;
            }
        }
        let structural_cols = next_col;

        let m = self.rows.len();
        if m == 0 {
            // No constraints: feasible iff every variable is bounded (else
            // an unbounded-maximize objective is itself unbounded), trivial
            // zero solution otherwise.
            return Some(vec![0.0; self.num_vars]);
        }

        let mut extra_cols = 0usize;
        let mut slack_col = vec![0usize; m];
        let mut artificial_col = vec![None; m];
        for (i, row) in self.rows.iter().enumerate() {
            match row.kind {
                RowType::Le => {
                    slack_col[i] = structural_cols + extra_cols;
                    extra_cols += 1;
                }
                RowType::Ge => {
                    slack_col[i] = structural_cols + extra_cols; // surplus, coefficient -1
                    extra_cols += 1;
                    artificial_col[i] = Some(structural_cols + extra_cols);
                    extra_cols += 1;
                }
                RowType::Eq => {
                    artificial_col[i] = Some(structural_cols + extra_cols);
                    extra_cols += 1;
                }
            }
        }
        let total_cols = structural_cols + extra_cols;

        let mut tableau = vec![vec![0.0f64; total_cols + 1]; m];
        let mut basis = vec![0usize; m];
        let mut cost = vec![0.0f64; total_cols];

        for (j, &(plus, minus)) in split_cols.iter().enumerate() {
            cost[plus] = self.objective[j];
            if let Some(minus_col) = minus {
                cost[minus_col] = -self.objective[j];
            }
        }
        for i in 0..m {
            if let Some(art) = artificial_col[i] {
                cost[art] = -BIG_M;
            }
        }

        for (i, row) in self.rows.iter().enumerate() {
            let mut rhs = row.rhs;
            let mut sign = 1.0;
            if rhs < 0.0 {
                rhs = -rhs;
                sign = -1.0;
            }
            for (j, &(plus, minus)) in split_cols.iter().enumerate() {
                let value = sign * row.coefficients[j];
                tableau[i][plus] = value;
                if let Some(minus_col) = minus {
                    tableau[i][minus_col] = -value;
                }
            }
            let effective_kind = if sign < 0.0 {
                match row.kind {
                    RowType::Le => RowType::Ge,
                    RowType::Ge => RowType::Le,
                    RowType::Eq => RowType::Eq,
                }
            } else {
                row.kind
            };
            match effective_kind {
                RowType::Le => tableau[i][slack_col[i]] = 1.0,
                RowType::Ge => {
                    tableau[i][slack_col[i]] = -1.0;
                    tableau[i][artificial_col[i].unwrap()] = 1.0;
                }
                RowType::Eq => tableau[i][artificial_col[i].unwrap()] = 1.0,
            }
            tableau[i][total_cols] = rhs;
            basis[i] = artificial_col[i].unwrap_or(slack_col[i]);
        }

        let mut objective_row = vec![0.0f64; total_cols + 1];
        for j in 0..total_cols {
            objective_row[j] = (0..m).map(|i| cost[basis[i]] * tableau[i][j]).sum::<f64>() - cost[j];
        }
        objective_row[total_cols] = (0..m).map(|i| cost[basis[i]] * tableau[i][total_cols]).sum();

        let max_iterations = 500 + 50 * total_cols;
        for _ in 0..max_iterations {
            let entering = (0..total_cols)
                .filter(|&j| objective_row[j] < -EPSILON)
                .min_by(|&a, &b| objective_row[a].partial_cmp(&objective_row[b]).unwrap());
            let Some(entering) = entering else { break };

            let leaving = (0..m)
                .filter(|&i| tableau[i][entering] > EPSILON)
                .map(|i| (tableau[i][total_cols] / tableau[i][entering], i))
                .min_by(|a, b| a.partial_cmp(b).unwrap());
            let Some((_, pivot_row)) = leaving else {
                return None; // unbounded
            };

            let pivot_value = tableau[pivot_row][entering];
            for j in 0..=total_cols {
                tableau[pivot_row][j] /= pivot_value;
            }
            for i in 0..m {
                if i == pivot_row {
                    continue;
                }
                let factor = tableau[i][entering];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..=total_cols {
                    tableau[i][j] -= factor * tableau[pivot_row][j];
                }
            }
            let factor = objective_row[entering];
            for j in 0..=total_cols {
                objective_row[j] -= factor * tableau[pivot_row][j];
            }
            basis[pivot_row] = entering;
        }

        for i in 0..m {
            if let Some(art) = artificial_col[i] {
                if basis[i] == art && tableau[i][total_cols] > EPSILON {
                    return None; // infeasible: artificial variable stuck positive
                }
            }
        }

        let mut structural_values = vec![0.0f64; structural_cols];
        for i in 0..m {
            if basis[i] < structural_cols {
                structural_values[basis[i]] = tableau[i][total_cols];
            }
        }

        let mut solution = Vec::with_capacity(self.num_vars);
        for &(plus, minus) in &split_cols {
            let value = structural_values[plus]
                - minus.map(|m| structural_values[m]).unwrap_or(0.0);
            solution.push(value);
        }
        Some(solution)
    }
}
