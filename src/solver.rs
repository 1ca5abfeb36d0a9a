//! Solver adapter.
//!
//! The compiler and decoder never talk to an LP engine directly; they go
//! through the [`Solver`] trait. Any engine that accepts nonnegative
//! continuous variables, linear (in)equalities and a minimized linear
//! objective can implement it. [`MinilpSolver`] is the built-in backend.

use std::fmt;

use crate::error::{Error, Result};
use crate::lp::{Comparison, LpModel, VarId};

/// Termination status of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The engine failed for another reason
    Error,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Error => "solver error",
        };
        f.write_str(text)
    }
}

/// A solve result: status plus one value per model variable.
///
/// Non-optimal results carry no values.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedModel {
    pub status: SolveStatus,
    values: Vec<f64>,
    objective: Option<f64>,
}

impl SolvedModel {
    /// An optimal result with one value per variable, in declaration order.
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        SolvedModel {
            status: SolveStatus::Optimal,
            values,
            objective: Some(objective),
        }
    }

    /// A result without a solution.
    pub fn failed(status: SolveStatus) -> Self {
        SolvedModel {
            status,
            values: Vec::new(),
            objective: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Solved value of `var`; zero when the solve was not optimal.
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn objective(&self) -> Option<f64> {
        self.objective
    }

    /// Whether every bound and constraint of `model` holds within `tolerance`.
    pub fn satisfies(&self, model: &LpModel, tolerance: f64) -> bool {
        if !self.is_optimal() || self.values.len() != model.variable_count() {
            return false;
        }
        let bounds_hold = model
            .bounds()
            .iter()
            .zip(&self.values)
            .all(|(b, &v)| v >= b.lower - tolerance && v <= b.upper + tolerance);
        bounds_hold && model.constraints().all(|c| c.is_satisfied(&self.values, tolerance))
    }
}

/// An LP engine.
///
/// `solve` returns `Err` only when the engine itself cannot be reached;
/// infeasible or unbounded problems come back as a [`SolvedModel`] status.
/// One call is one attempt; adapters do not retry.
pub trait Solver: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Solves `model` once.
    ///
    /// # Arguments
    ///
    /// * `model` - The model to minimize, base and overlay constraints alike
    ///
    /// # Returns
    ///
    /// A [`SolvedModel`] whose status says whether values are present.
    fn solve(&self, model: &LpModel) -> Result<SolvedModel>;
}

/// Pure-Rust dual simplex backend built on `minilp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinilpSolver;

impl Solver for MinilpSolver {
    fn name(&self) -> &str {
        "minilp"
    }

    fn solve(&self, model: &LpModel) -> Result<SolvedModel> {
        let mut problem = minilp::Problem::new(minilp::OptimizationDirection::Minimize);
        let objective = model.objective();

        let vars: Vec<minilp::Variable> = model
            .index()
            .vars()
            .zip(model.bounds())
            .map(|(var, b)| problem.add_var(objective.coefficient(var), (b.lower, b.upper)))
            .collect();

        for constraint in model.constraints() {
            let mut expr = minilp::LinearExpr::empty();
            for (var, coeff) in constraint.lhs.terms() {
                expr.add(vars[var.index()], coeff);
            }
            let op = match constraint.op {
                Comparison::Eq => minilp::ComparisonOp::Eq,
                Comparison::Le => minilp::ComparisonOp::Le,
                Comparison::Ge => minilp::ComparisonOp::Ge,
            };
            problem.add_constraint(expr, op, constraint.rhs);
        }

        let solved = match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = vars.iter().map(|&v| *solution.var_value(v)).collect();
                // minilp can report an unbounded ray as a solution with infinite values
                if solution.objective().is_finite() && values.iter().all(|v| v.is_finite()) {
                    SolvedModel::optimal(values, solution.objective())
                } else {
                    SolvedModel::failed(SolveStatus::Unbounded)
                }
            }
            Err(minilp::Error::Infeasible) => SolvedModel::failed(SolveStatus::Infeasible),
            Err(minilp::Error::Unbounded) => SolvedModel::failed(SolveStatus::Unbounded),
        };
        tracing::debug!(status = %solved.status, "minilp finished");
        Ok(solved)
    }
}

/// Picks a backend by name.
///
/// # Errors
///
/// [`Error::SolverUnavailable`] for any backend not built into this crate.
///
/// ```
/// use flowplan::solver::solver_for;
///
/// assert!(solver_for("minilp").is_ok());
/// assert!(solver_for("glpk").is_err());
/// ```
pub fn solver_for(name: &str) -> Result<Box<dyn Solver>> {
    match name.to_ascii_lowercase().as_str() {
        "minilp" | "default" => Ok(Box::new(MinilpSolver)),
        other => Err(Error::SolverUnavailable(format!(
            "backend '{}' is not available (built-in: minilp)",
            other
        ))),
    }
}
