use ::highs::{ColProblem, HighsModelStatus, Model, Sense};
use itertools::Itertools as _;
use log::trace;

use super::*;

#[derive(Clone, Debug)]
struct ColumnData {
    kind: VarKind,
    lower: f64,
    upper: f64,
    objective: f64,
    entries: Vec<(usize, f64)>,
}

#[derive(Clone, Debug, Default)]
struct LastSolution {
    columns: Vec<f64>,
    duals: Option<Vec<f64>>,
    objective: f64,
}

/// [`LinearModel`] backed by HiGHS.
///
/// The model keeps its own column-wise description; each solve hands a fresh
/// [`ColProblem`] to HiGHS, so rows and columns added after a solve are picked up by the next one.
#[derive(Clone, Debug)]
pub struct HighsModel {
    options: SolverOptions,
    columns: Vec<ColumnData>,
    rows: Vec<(f64, f64)>,
    solution: Option<LastSolution>,
}

impl HighsModel {
    fn build_problem(&self, mode: SolveMode) -> ColProblem {
        let mut problem = ColProblem::default();

        let rows = self
            .rows
            .iter()
            .map(|&(lower, upper)| problem.add_row(lower..=upper))
            .collect_vec();

        for col in &self.columns {
            let factors = col.entries.iter().map(|&(r, c)| (rows[r], c));
            let integral = mode == SolveMode::Integral && col.kind != VarKind::Continuous;
            if integral {
                problem.add_integer_column(col.objective, col.lower..=col.upper, factors);
            } else {
                problem.add_column(col.objective, col.lower..=col.upper, factors);
            }
        }

        problem
    }

    /// HiGHS refuses to work on models without columns; the all-zero solution is feasible
    /// iff every row admits zero activity
    fn solve_empty(&mut self, mode: SolveMode) -> LpStatus {
        if self.rows.iter().any(|&(l, u)| l > 0.0 || u < 0.0) {
            return LpStatus::Infeasible;
        }

        self.solution = Some(LastSolution {
            columns: Vec::new(),
            duals: (mode == SolveMode::Relaxed).then(|| vec![0.0; self.rows.len()]),
            objective: 0.0,
        });
        LpStatus::Optimal
    }

    fn solution(&self) -> Result<&LastSolution, LpError> {
        self.solution.as_ref().ok_or(LpError::NotSolved)
    }
}

/// HiGHS aborts on option values it rejects, so they are checked up front
fn checked_options(options: &SolverOptions) -> Result<(Option<f64>, i32), LpError> {
    if let Some(t) = options.time_limit {
        if !t.is_finite() || t < 0.0 {
            return Err(LpError::InvalidOption(format!("time_limit = {t}")));
        }
    }

    let threads = i32::try_from(options.threads)
        .map_err(|_| LpError::InvalidOption(format!("threads = {}", options.threads)))?;

    Ok((options.time_limit, threads))
}

impl LinearModel for HighsModel {
    fn with_options(options: &SolverOptions) -> Self {
        Self {
            options: options.clone(),
            columns: Vec::new(),
            rows: Vec::new(),
            solution: None,
        }
    }

    fn add_variable(&mut self, kind: VarKind, lower: f64, upper: f64, objective: f64) -> VarId {
        self.add_column(kind, lower, upper, objective, &mut std::iter::empty())
    }

    fn add_constraint(
        &mut self,
        lower: f64,
        upper: f64,
        terms: &mut dyn Iterator<Item = (VarId, f64)>,
    ) -> RowId {
        let row = self.rows.len();
        self.rows.push((lower, upper));
        for (VarId(var), coef) in terms {
            self.columns[var].entries.push((row, coef));
        }
        self.solution = None;
        RowId(row)
    }

    fn add_column(
        &mut self,
        kind: VarKind,
        lower: f64,
        upper: f64,
        objective: f64,
        entries: &mut dyn Iterator<Item = (RowId, f64)>,
    ) -> VarId {
        let (lower, upper) = match kind {
            VarKind::Binary => (lower.max(0.0), upper.min(1.0)),
            _ => (lower, upper),
        };

        let entries = entries
            .map(|(RowId(row), coef)| {
                debug_assert!(row < self.rows.len());
                (row, coef)
            })
            .collect();

        self.columns.push(ColumnData {
            kind,
            lower,
            upper,
            objective,
            entries,
        });
        self.solution = None;
        VarId(self.columns.len() - 1)
    }

    fn set_objective(&mut self, var: VarId, objective: f64) {
        self.columns[var.0].objective = objective;
        self.solution = None;
    }

    fn set_bounds(&mut self, var: VarId, lower: f64, upper: f64) {
        let col = &mut self.columns[var.0];
        col.lower = lower;
        col.upper = upper;
        self.solution = None;
    }

    fn number_of_variables(&self) -> usize {
        self.columns.len()
    }

    fn number_of_constraints(&self) -> usize {
        self.rows.len()
    }

    fn solve(&mut self, mode: SolveMode) -> Result<LpStatus, LpError> {
        self.solution = None;
        let (time_limit, threads) = checked_options(&self.options)?;

        if self.columns.is_empty() {
            return Ok(self.solve_empty(mode));
        }

        if self.columns.iter().any(|c| c.lower > c.upper) {
            return Ok(LpStatus::Infeasible);
        }

        trace!(
            "Solve {mode:?} model with {} columns and {} rows",
            self.columns.len(),
            self.rows.len()
        );

        let mut model = Model::try_new(self.build_problem(mode))
            .map_err(|e| LpError::Status(format!("{e:?}")))?;
        model.make_quiet();
        model.set_sense(Sense::Minimise);
        if let Some(tme) = time_limit {
            model.set_option("time_limit", tme);
        }
        model.set_option("threads", threads);
        if threads <= 1 {
            model.set_option("parallel", "off");
        }
        if mode == SolveMode::Integral {
            model.set_option("mip_rel_gap", 0.0);
        }

        let solved = model
            .try_solve()
            .map_err(|e| LpError::Status(format!("{e:?}")))?;
        match solved.status() {
            HighsModelStatus::Optimal => {}
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                return Ok(LpStatus::Infeasible);
            }
            e => return Err(LpError::Status(format!("{e:?}"))),
        }

        let solution = solved.get_solution();
        let columns = solution.columns().to_vec();
        let objective: f64 = self
            .columns
            .iter()
            .zip(&columns)
            .map(|(c, &x)| c.objective * x)
            .sum();

        self.solution = Some(LastSolution {
            columns,
            duals: (mode == SolveMode::Relaxed).then(|| solution.dual_rows().to_vec()),
            objective,
        });

        Ok(LpStatus::Optimal)
    }

    fn value(&self, var: VarId) -> Result<f64, LpError> {
        Ok(self.solution()?.columns[var.0])
    }

    fn dual(&self, row: RowId) -> Result<f64, LpError> {
        self.solution()?
            .duals
            .as_ref()
            .map(|d| d[row.0])
            .ok_or(LpError::NotSolved)
    }

    fn objective_value(&self) -> Result<f64, LpError> {
        Ok(self.solution()?.objective)
    }
}
