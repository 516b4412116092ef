//! The narrow contract between the column generation and an LP/MIP engine.
//!
//! A [`LinearModel`] is a minimization problem that can be grown between solves: variables,
//! constraints and columns (variables together with their coefficients in existing rows) may be
//! added to a model that was already solved, and objective coefficients or bounds may change.
//! The next call to [`LinearModel::solve`] incorporates all modifications.

pub mod highs;

pub use highs::HighsModel;

use thiserror::Error;

use crate::config::SolverOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl RowId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Binary,
    Integer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveMode {
    /// Integrality of binary and integer variables is dropped; dual values are available
    Relaxed,
    /// Integrality is enforced; dual values are not available
    Integral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
}

#[derive(Debug, Error)]
pub enum LpError {
    #[error("solver terminated with status {0}")]
    Status(String),

    #[error("invalid solver option {0}")]
    InvalidOption(String),

    #[error("no solution available; the model has not been solved since its last modification")]
    NotSolved,
}

pub trait LinearModel: Send {
    /// Creates an empty model
    fn with_options(options: &SolverOptions) -> Self
    where
        Self: Sized;

    fn add_variable(&mut self, kind: VarKind, lower: f64, upper: f64, objective: f64) -> VarId;

    /// Adds the constraint `lower <= sum(coef * var) <= upper`; use infinite bounds for
    /// one-sided constraints and `lower == upper` for equalities
    fn add_constraint(
        &mut self,
        lower: f64,
        upper: f64,
        terms: &mut dyn Iterator<Item = (VarId, f64)>,
    ) -> RowId;

    /// Adds a variable together with its coefficients in existing constraints
    fn add_column(
        &mut self,
        kind: VarKind,
        lower: f64,
        upper: f64,
        objective: f64,
        entries: &mut dyn Iterator<Item = (RowId, f64)>,
    ) -> VarId;

    fn set_objective(&mut self, var: VarId, objective: f64);

    fn set_bounds(&mut self, var: VarId, lower: f64, upper: f64);

    fn number_of_variables(&self) -> usize;

    fn number_of_constraints(&self) -> usize;

    /// Solves the model (minimization). Infeasibility is a regular outcome; every other
    /// non-optimal termination is an error.
    fn solve(&mut self, mode: SolveMode) -> Result<LpStatus, LpError>;

    /// Value of `var` in the last optimal solution
    fn value(&self, var: VarId) -> Result<f64, LpError>;

    /// Dual value of `row` in the last optimal relaxed solution. With `c` the objective,
    /// `A` the constraint matrix and `y` the dual values, the reduced cost of column `j` is
    /// `c_j - sum_i A_ij y_i`.
    fn dual(&self, row: RowId) -> Result<f64, LpError>;

    /// Objective value of the last optimal solution
    fn objective_value(&self) -> Result<f64, LpError>;
}
