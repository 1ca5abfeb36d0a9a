//! Recipe ranking explorer.
//!
//! For every item with competing recipes, each candidate recipe is scored by
//! re-solving the base model with the rest of its group forced to zero. The
//! resulting rows form a sensitivity table: one row per (item, recipe)
//! choice, one column per cost aggregate and per raw resource.
//!
//! Perturbed models share the compiled base and differ only in their zeroing
//! overlay, so the solves are independent and run on a `rayon` pool.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compiler::compile;
use crate::decoder::Aggregates;
use crate::display::round_to;
use crate::error::{ReferenceKind, Result};
use crate::lp::{Family, LpModel};
use crate::models::Dataset;
use crate::settings::Settings;
use crate::solver::Solver;

/// Adjustments to the competing-recipe groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingOptions {
    /// Recipes left out of an item's group (they only make it as a byproduct)
    pub group_exclusions: BTreeMap<String, BTreeSet<String>>,
    /// `(item, recipe)` pairs whose candidate is zeroed along with its
    /// competitors, giving a "neither recipe" baseline row
    pub self_exclusions: BTreeSet<(String, String)>,
}

impl Default for RankingOptions {
    fn default() -> Self {
        let mut group_exclusions = BTreeMap::new();
        group_exclusions.insert(
            "Desc_HeavyOilResidue_C".to_string(),
            ["Recipe_Plastic_C", "Recipe_Rubber_C"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let self_exclusions = [
            ("Desc_PolymerResin_C", "Recipe_Alternate_HeavyOilResidue_C"),
            ("Desc_HeavyOilResidue_C", "Recipe_Alternate_PolymerResin_C"),
        ]
        .iter()
        .map(|(item, recipe)| (item.to_string(), recipe.to_string()))
        .collect();

        RankingOptions {
            group_exclusions,
            self_exclusions,
        }
    }
}

impl RankingOptions {
    /// No exclusions at all.
    pub fn none() -> Self {
        RankingOptions {
            group_exclusions: BTreeMap::new(),
            self_exclusions: BTreeSet::new(),
        }
    }

    fn zeroes_self(&self, item: &str, recipe: &str) -> bool {
        self.self_exclusions
            .contains(&(item.to_string(), recipe.to_string()))
    }

    fn excludes(&self, item: &str, recipe: &str) -> bool {
        self.group_exclusions
            .get(item)
            .map_or(false, |recipes| recipes.contains(recipe))
    }
}

/// Groups recipes by each catalog item they produce.
///
/// Groups follow item id order and list recipes in id order, each once.
pub fn competing_recipes(
    dataset: &Dataset,
    options: &RankingOptions,
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (id, recipe) in &dataset.recipes {
        for stack in &recipe.products {
            if dataset.item(&stack.item).is_none() || options.excludes(&stack.item, id) {
                continue;
            }
            let group = groups.entry(stack.item.clone()).or_default();
            if !group.contains(id) {
                group.push(id.clone());
            }
        }
    }
    groups
}

/// A clone of `base` in which every recipe of `group` except `candidate` is
/// forced to zero utilization.
///
/// # Errors
///
/// [`Error::UnknownReference`](crate::error::Error::UnknownReference) if a
/// grouped recipe has no variable in `base`.
pub fn perturb(
    base: &LpModel,
    item: &str,
    candidate: &str,
    group: &[String],
    options: &RankingOptions,
) -> Result<LpModel> {
    let mut model = base.clone();
    for other in group {
        if other != candidate || options.zeroes_self(item, candidate) {
            let var = model
                .index()
                .require(Family::Recipe, other, ReferenceKind::Recipe)?;
            model = model.with_zero(var);
        }
    }
    Ok(model)
}

/// One scored recipe choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub item: String,
    pub recipe: String,
    pub aggregates: Aggregates,
    /// Post-solve throughput per raw resource id
    pub resources: BTreeMap<String, f64>,
}

/// Scores every candidate recipe of every competing group.
///
/// Candidates whose perturbed model is not solved to optimality are left
/// out of the table.
///
/// # Arguments
///
/// * `dataset` - The static catalog
/// * `settings` - The base solve request every candidate is compared under
/// * `solver` - Backend shared by all worker threads
/// * `options` - Group and self exclusions
///
/// # Returns
///
/// One [`RankingRow`] per optimal candidate, in item id, then recipe id
/// order.
///
/// # Errors
///
/// Compilation errors of the base model, and solver availability errors.
pub fn rank_recipes(
    dataset: &Dataset,
    settings: &Settings,
    solver: &dyn Solver,
    options: &RankingOptions,
) -> Result<Vec<RankingRow>> {
    let base = compile(dataset, settings)?;
    let groups = competing_recipes(dataset, options);

    let mut jobs = Vec::new();
    for (item, group) in &groups {
        for candidate in group {
            let model = perturb(&base, item, candidate, group, options)?;
            jobs.push((item.as_str(), candidate.as_str(), model));
        }
    }
    tracing::info!(
        items = groups.len(),
        candidates = jobs.len(),
        solver = solver.name(),
        "ranking recipe alternatives"
    );

    let rows = jobs
        .par_iter()
        .map(|(item, recipe, model)| {
            let solved = solver.solve(model)?;
            if !solved.is_optimal() {
                tracing::warn!(item = %item, recipe = %recipe, status = %solved.status, "skipping ranking row");
                return Ok(None);
            }
            tracing::debug!(item = %item, recipe = %recipe, "ranked candidate");

            let index = model.index();
            let resources = dataset
                .resources
                .keys()
                .filter_map(|id| index.intermediate(id).map(|var| (id.clone(), solved.value(var))))
                .collect();
            Ok(Some(RankingRow {
                item: item.to_string(),
                recipe: recipe.to_string(),
                aggregates: Aggregates::read(index, &solved),
                resources,
            }))
        })
        .collect::<Result<Vec<Option<RankingRow>>>>()?;

    let rows: Vec<RankingRow> = rows.into_iter().flatten().collect();
    tracing::info!(rows = rows.len(), "ranking finished");
    Ok(rows)
}

/// Writes the ranking table as CSV.
///
/// Columns are the item and recipe display names, the cost aggregates, then
/// one column per dataset resource (ordered by resource id, titled with its
/// display name). Numbers are rounded to one decimal.
///
/// # Arguments
///
/// * `rows` - Output of [`rank_recipes`]
/// * `dataset` - Catalog used for display names and resource columns
/// * `writer` - Destination, e.g. a file or an in-memory buffer
pub fn write_ranking_csv<W: io::Write>(
    rows: &[RankingRow],
    dataset: &Dataset,
    writer: W,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = [
        "Item",
        "Recipe",
        "Power",
        "Items",
        "Buildings",
        "Resources",
        "Buildings Scaled",
        "Resources Scaled",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(dataset.resources.values().map(|r| r.name.clone()));
    csv.write_record(&header)?;

    let cell = |value: f64| format!("{:.1}", round_to(value, 1));
    for row in rows {
        let a = &row.aggregates;
        let mut record = vec![
            dataset.item_name(&row.item).to_string(),
            dataset.recipe_name(&row.recipe).to_string(),
            cell(a.power_use),
            cell(a.item_use),
            cell(a.buildings),
            cell(a.resources),
            cell(a.buildings_scaled),
            cell(a.resources_scaled),
        ];
        record.extend(
            dataset
                .resources
                .keys()
                .map(|id| cell(row.resources.get(id).copied().unwrap_or(0.0))),
        );
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}
