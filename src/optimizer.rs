//! Production optimization pipeline.
//!
//! Ties the stages together: compile the dataset and settings into a model,
//! hand it to a solver once, and decode whatever comes back. Compilation
//! errors stop the pipeline before the solver is touched; infeasible or
//! unbounded solves come back as a report with that status.

use crate::compiler::compile;
use crate::decoder::{decode, Report};
use crate::error::Result;
use crate::lp::LpModel;
use crate::models::Dataset;
use crate::settings::Settings;
use crate::solver::{SolvedModel, Solver};

/// Everything one solve request produced.
#[derive(Debug, Clone)]
pub struct ProductionPlan {
    pub model: LpModel,
    pub solved: SolvedModel,
    pub report: Report,
}

/// Compiles, solves and decodes, keeping the intermediate model and raw
/// solution alongside the report.
///
/// # Arguments
///
/// * `dataset` - The static catalog
/// * `settings` - One solve request
/// * `solver` - The LP backend to run
///
/// # Returns
///
/// A [`ProductionPlan`]. Infeasible and unbounded requests are not errors;
/// check `plan.solved.status`.
///
/// # Errors
///
/// Compilation errors, and backend errors from `solver`.
pub fn plan_production(
    dataset: &Dataset,
    settings: &Settings,
    solver: &dyn Solver,
) -> Result<ProductionPlan> {
    let model = compile(dataset, settings)?;
    let solved = solver.solve(&model)?;
    tracing::info!(
        solver = solver.name(),
        status = %solved.status,
        objective = ?solved.objective(),
        "solved production model"
    );

    let report = decode(dataset, settings, &model, &solved);
    Ok(ProductionPlan {
        model,
        solved,
        report,
    })
}

/// Runs one optimization request and returns the decoded report.
///
/// Same as [`plan_production`], keeping only the report.
///
/// # Example
///
/// ```
/// use flowplan::models::{Dataset, Item, Recipe};
/// use flowplan::optimizer::optimize_production;
/// use flowplan::settings::{Settings, Weights};
/// use flowplan::solver::MinilpSolver;
///
/// let dataset = Dataset::new()
///     .with_resource("Ore", Item::solid("Iron Ore"))
///     .with_item("Ingot", Item::solid("Iron Ingot"))
///     .with_recipe("Smelt", Recipe::new("Iron Ingot", 60.0).ingredient("Ore", 1.0).product("Ingot", 1.0));
/// let settings = Settings::new()
///     .limit("Ore", 100.0)
///     .output("Ingot", 5.0)
///     .weights(Weights::recommended());
///
/// let report = optimize_production(&dataset, &settings, &MinilpSolver).unwrap();
/// assert!(report.is_optimal());
/// assert!((report.recipes_used["Iron Ingot"] - 5.0).abs() < 1e-6);
/// ```
pub fn optimize_production(
    dataset: &Dataset,
    settings: &Settings,
    solver: &dyn Solver,
) -> Result<Report> {
    plan_production(dataset, settings, solver).map(|plan| plan.report)
}
