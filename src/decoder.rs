//! Turns a solved model back into display-named production figures.
//!
//! Decoding only renames, filters and sums. Every number in a [`Report`]
//! is a solved variable value or a rate derived from one; nothing is
//! re-optimized.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::lp::{Aggregate, Family, LpModel, VariableIndex};
use crate::models::Dataset;
use crate::settings::Settings;
use crate::solver::{SolveStatus, SolvedModel};

/// Scalar cost figures, read straight from the aggregate variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregates {
    pub power_use: f64,
    pub item_use: f64,
    pub buildings: f64,
    pub resources: f64,
    pub buildings_scaled: f64,
    pub resources_scaled: f64,
    pub sink_points: f64,
}

impl Aggregates {
    /// Reads every aggregate variable of a solved model.
    pub fn read(index: &VariableIndex, solved: &SolvedModel) -> Self {
        let value = |a: Aggregate| solved.value(index.aggregate(a));
        Aggregates {
            power_use: value(Aggregate::PowerUse),
            item_use: value(Aggregate::ItemUse),
            buildings: value(Aggregate::BuildingUse),
            resources: value(Aggregate::ResourceUse),
            buildings_scaled: value(Aggregate::BuildingsScaled),
            resources_scaled: value(Aggregate::ResourcesScaled),
            sink_points: value(Aggregate::SinkPoints),
        }
    }
}

/// Flow amounts keyed by display name.
pub type FlowMap = BTreeMap<String, f64>;

/// Decoded view of one solve.
///
/// A non-optimal solve decodes to an empty report carrying only its status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub status: SolveStatus,
    pub aggregates: Aggregates,
    /// Output of every power pseudo-item, summed
    pub power_produced: f64,
    pub items_input: FlowMap,
    pub items_output: FlowMap,
    /// Throughput of every capped resource
    pub resources_needed: FlowMap,
    /// Throughput of everything else except power
    pub items_needed: FlowMap,
    /// Utilization per recipe
    pub recipes_used: FlowMap,
    /// Item → producing recipe → rate
    pub products_map: BTreeMap<String, FlowMap>,
    /// Recipe → consumed item → rate
    pub ingredients_map: BTreeMap<String, FlowMap>,
}

impl Report {
    pub fn empty(status: SolveStatus) -> Self {
        Report {
            status,
            aggregates: Aggregates::default(),
            power_produced: 0.0,
            items_input: FlowMap::new(),
            items_output: FlowMap::new(),
            resources_needed: FlowMap::new(),
            items_needed: FlowMap::new(),
            recipes_used: FlowMap::new(),
            products_map: BTreeMap::new(),
            ingredients_map: BTreeMap::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Decodes `solved` against the model it was solved from.
///
/// Values at or below the profile's noise threshold are left out of every
/// map. Entries whose display names collide are summed.
///
/// # Arguments
///
/// * `dataset` - Catalog used to turn ids into display names
/// * `settings` - Source of the noise threshold, caps and power items
/// * `model` - The model `solved` came from
/// * `solved` - Solver output for `model`
///
/// # Returns
///
/// A [`Report`]. Non-optimal solves give an empty report carrying only the
/// status.
pub fn decode(
    dataset: &Dataset,
    settings: &Settings,
    model: &LpModel,
    solved: &SolvedModel,
) -> Report {
    if !solved.is_optimal() {
        return Report::empty(solved.status);
    }

    let index = model.index();
    let threshold = settings.profile.noise_threshold;
    let limits = &settings.resource_limits;
    let flows = move |family: Family| {
        index
            .entries(family)
            .map(move |(key, var)| (key, solved.value(var)))
            .filter(move |&(_, value)| value > threshold)
    };
    let item_map = |family: Family, keep: &dyn Fn(&str) -> bool| {
        let mut map = FlowMap::new();
        for (item, value) in flows(family).filter(|&(item, _)| keep(item)) {
            *map.entry(dataset.item_name(item).to_string()).or_insert(0.0) += value;
        }
        map
    };

    let items_input = item_map(Family::Input, &|_| true);
    let items_output = item_map(Family::Output, &|_| true);
    let resources_needed = item_map(Family::Intermediate, &|item| limits.contains_key(item));
    let items_needed = item_map(Family::Intermediate, &|item| {
        !limits.contains_key(item) && !settings.profile.is_power_item(item)
    });

    let mut recipes_used = FlowMap::new();
    let mut products_map: BTreeMap<String, FlowMap> = BTreeMap::new();
    let mut ingredients_map: BTreeMap<String, FlowMap> = BTreeMap::new();
    for (id, utilization) in flows(Family::Recipe) {
        let Some(recipe) = dataset.recipes.get(id) else {
            continue;
        };
        let recipe_name = dataset.recipe_name(id).to_string();
        *recipes_used.entry(recipe_name.clone()).or_insert(0.0) += utilization;

        for stack in &recipe.products {
            let item_flow = index.intermediate(&stack.item).map_or(0.0, |v| solved.value(v));
            if item_flow <= threshold {
                continue;
            }
            let rate = recipe.per_minute(stack.amount) * utilization;
            *products_map
                .entry(dataset.item_name(&stack.item).to_string())
                .or_default()
                .entry(recipe_name.clone())
                .or_insert(0.0) += rate;
        }

        let consumed = ingredients_map.entry(recipe_name).or_default();
        for stack in &recipe.ingredients {
            let rate = recipe.per_minute(stack.amount) * utilization;
            *consumed
                .entry(dataset.item_name(&stack.item).to_string())
                .or_insert(0.0) += rate;
        }
    }

    let power_produced = settings
        .profile
        .power_items
        .iter()
        .filter_map(|item| index.output(item))
        .map(|var| solved.value(var))
        .sum();

    Report {
        status: solved.status,
        aggregates: Aggregates::read(index, solved),
        power_produced,
        items_input,
        items_output,
        resources_needed,
        items_needed,
        recipes_used,
        products_map,
        ingredients_map,
    }
}
