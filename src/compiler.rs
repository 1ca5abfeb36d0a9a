//! Model compiler: turns a dataset and settings into a linear program.
//!
//! The model has four variable families per item/recipe (see
//! [`Family`](crate::lp::Family)) plus the scalar cost aggregates, and is
//! assembled step by step on a [`ModelBuilder`]:
//!
//! 1. fix external inputs, fixed outputs and disabled recipes
//! 2. balance every product against its producers
//! 3. balance every item against its consumers and final output
//! 4. cap configured resources
//! 5. tie each aggregate to its defining expression
//! 6. pick the objective mode from [`MaxItem`]
//!
//! Compilation is deterministic: the same inputs always yield an identical
//! model, constraint for constraint.

use std::collections::BTreeMap;

use crate::error::{Error, ReferenceKind, Result};
use crate::lp::{
    Aggregate, Constraint, Family, LinearExpr, LpModel, ModelBuilder, VarId, VariableIndex,
};
use crate::models::{Dataset, Form, Recipe};
use crate::network::{FlowNetwork, ItemClass};
use crate::settings::{MaxItem, ModelProfile, Settings};

/// Compiles a model for one solve request.
///
/// # Arguments
///
/// * `dataset` - The static catalog of items, resources and recipes
/// * `settings` - Caps, requested flows, disabled recipes, weights and profile
///
/// # Returns
///
/// An [`LpModel`] with one variable per item family, recipe and aggregate,
/// ready to hand to any [`Solver`](crate::solver::Solver).
///
/// # Errors
///
/// Fails with [`Error::UnknownReference`] when any input, output, resource
/// limit, disabled recipe, power share or maximized item names a key the
/// flow network does not contain, and with [`Error::InvalidRecipe`] for
/// recipes with a non-positive cycle time. Nothing reaches a solver in
/// either case.
///
/// # Example
///
/// ```
/// use flowplan::compiler::compile;
/// use flowplan::models::{Dataset, Item, Recipe};
/// use flowplan::settings::{Settings, Weights};
///
/// let dataset = Dataset::new()
///     .with_resource("Ore", Item::solid("Ore"))
///     .with_item("Ingot", Item::solid("Ingot"))
///     .with_recipe("Smelt", Recipe::new("Smelt", 60.0).ingredient("Ore", 2.0).product("Ingot", 1.0));
/// let settings = Settings::new()
///     .limit("Ore", 100.0)
///     .output("Ingot", 10.0)
///     .weights(Weights::recommended());
///
/// let model = compile(&dataset, &settings).unwrap();
/// assert!(model.index().recipe("Smelt").is_some());
/// ```
pub fn compile(dataset: &Dataset, settings: &Settings) -> Result<LpModel> {
    let network = FlowNetwork::build(dataset, &settings.profile)?;
    compile_network(dataset, settings, &network)
}

/// Compiles against an already partitioned network.
pub fn compile_network(
    dataset: &Dataset,
    settings: &Settings,
    network: &FlowNetwork,
) -> Result<LpModel> {
    let compiler = Compiler {
        dataset,
        settings,
        network,
        profile: &settings.profile,
    };

    let builder = ModelBuilder::new(VariableIndex::declare(network.items(), network.recipes()));
    let builder = compiler.fix_inputs(builder)?;
    let builder = compiler.fix_outputs(builder)?;
    let builder = compiler.disable_recipes(builder)?;
    let builder = compiler.balance_products(builder)?;
    let builder = compiler.balance_items(builder)?;
    let builder = compiler.cap_resources(builder)?;
    let builder = compiler.define_aggregates(builder)?;
    let builder = compiler.share_power(builder)?;
    let builder = compiler.set_objective(builder)?;
    let model = builder.build();

    tracing::info!(
        variables = model.variable_count(),
        constraints = model.constraint_count(),
        "compiled production model"
    );
    Ok(model)
}

/// Per-unit scarcity weight of each capped resource.
///
/// Every capped resource is weighted by `average cap / its cap`, where the
/// average leaves out the profile's unlimited resource. Non-positive caps
/// are replaced by the profile's epsilon so the division stays finite.
/// Resources without a cap carry no weight.
///
/// # Returns
///
/// A map from resource id to its weight in `resources_scaled`.
pub fn resource_weights(dataset: &Dataset, settings: &Settings) -> BTreeMap<String, f64> {
    let limits = &settings.resource_limits;
    let unlimited = settings.profile.unlimited_resource.as_deref();

    let mut considered: Vec<f64> = limits
        .iter()
        .filter(|(id, _)| Some(id.as_str()) != unlimited)
        .map(|(_, &limit)| limit)
        .collect();
    if considered.is_empty() {
        considered = limits.values().copied().collect();
    }
    if considered.is_empty() {
        return BTreeMap::new();
    }
    let average = considered.iter().sum::<f64>() / considered.len() as f64;

    dataset
        .resources
        .keys()
        .filter_map(|id| limits.get(id).map(|&limit| (id, limit)))
        .map(|(id, limit)| {
            let limit = if limit > 0.0 {
                limit
            } else {
                tracing::warn!(resource = %id, limit, "non-positive resource cap, weighting with epsilon");
                settings.profile.limit_epsilon
            };
            (id.clone(), average / limit)
        })
        .collect()
}

/// Complexity penalty of one machine running `recipe`.
///
/// ```
/// use flowplan::compiler::buildings_factor;
/// use flowplan::models::Recipe;
/// use flowplan::settings::ModelProfile;
///
/// let refinery = Recipe::new("Refinery", 6.0)
///     .ingredient("Oil", 3.0)
///     .product("Plastic", 2.0)
///     .product("Residue", 1.0);
/// let profile = ModelProfile::legacy();
///
/// // (1 + 2 - 1)^2 * 4.1
/// assert!((buildings_factor(&refinery, &profile) - 16.4).abs() < 1e-9);
/// ```
pub fn buildings_factor(recipe: &Recipe, profile: &ModelProfile) -> f64 {
    let stacks = recipe.arity().saturating_sub(1) as f64;
    stacks.powf(profile.buildings_exponent) * profile.buildings_scale
}

struct Compiler<'a> {
    dataset: &'a Dataset,
    settings: &'a Settings,
    network: &'a FlowNetwork,
    profile: &'a ModelProfile,
}

impl Compiler<'_> {
    fn fix_inputs(&self, builder: ModelBuilder) -> Result<ModelBuilder> {
        for item in self.settings.inputs.keys() {
            if !self.network.contains(item) {
                return Err(Error::unknown(ReferenceKind::Input, item.clone()));
            }
        }

        let fixes: Vec<_> = builder
            .index()
            .entries(Family::Input)
            .map(|(item, var)| (var, self.settings.inputs.get(item).copied().unwrap_or(0.0)))
            .collect();
        Ok(fixes
            .into_iter()
            .fold(builder, |builder, (var, amount)| builder.fix(var, amount)))
    }

    fn fix_outputs(&self, mut builder: ModelBuilder) -> Result<ModelBuilder> {
        for (item, &amount) in self.settings.fixed_outputs() {
            let var = builder
                .index()
                .require(Family::Output, item, ReferenceKind::Output)?;
            builder = builder.fix(var, amount);
        }
        Ok(builder)
    }

    fn disable_recipes(&self, mut builder: ModelBuilder) -> Result<ModelBuilder> {
        for recipe in &self.settings.recipes_off {
            let var = builder
                .index()
                .require(Family::Recipe, recipe, ReferenceKind::Recipe)?;
            builder = builder.fix(var, 0.0);
        }
        Ok(builder)
    }

    /// `input + Σ production = intermediate` for every product.
    fn balance_products(&self, builder: ModelBuilder) -> Result<ModelBuilder> {
        let index = builder.index();
        let constraints = self
            .network
            .products()
            .map(|item| {
                let mut expr = LinearExpr::new().term(var(index, Family::Input, item)?, 1.0);
                for flow in self.network.producers(item) {
                    expr.add(var(index, Family::Recipe, &flow.recipe)?, flow.rate);
                }
                Ok(Constraint::defines(
                    format!("produce[{}]", item),
                    var(index, Family::Intermediate, item)?,
                    expr,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(builder.with_all(constraints))
    }

    /// `output + Σ consumption = intermediate` for every item, resources
    /// and unused products included.
    fn balance_items(&self, builder: ModelBuilder) -> Result<ModelBuilder> {
        let index = builder.index();
        let constraints = self
            .network
            .items()
            .map(|item| {
                let mut expr = LinearExpr::new().term(var(index, Family::Output, item)?, 1.0);
                for flow in self.network.consumers(item) {
                    expr.add(var(index, Family::Recipe, &flow.recipe)?, flow.rate);
                }
                Ok(Constraint::defines(
                    format!("consume[{}]", item),
                    var(index, Family::Intermediate, item)?,
                    expr,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(builder.with_all(constraints))
    }

    fn cap_resources(&self, mut builder: ModelBuilder) -> Result<ModelBuilder> {
        for (resource, &limit) in &self.settings.resource_limits {
            let var = builder.index().require(
                Family::Intermediate,
                resource,
                ReferenceKind::ResourceLimit,
            )?;
            builder = builder.with(Constraint::le(
                format!("cap[{}]", resource),
                LinearExpr::new().term(var, 1.0),
                limit,
            ));
        }
        Ok(builder)
    }

    fn define_aggregates(&self, builder: ModelBuilder) -> Result<ModelBuilder> {
        let index = builder.index();
        let intermediate = |item: &str| var(index, Family::Intermediate, item);

        let mut power = LinearExpr::new();
        let mut buildings = LinearExpr::new();
        let mut buildings_scaled = LinearExpr::new();
        for (id, recipe) in &self.dataset.recipes {
            let r = var(index, Family::Recipe, id)?;
            power.add(r, recipe.power_use);
            buildings.add(r, 1.0);
            buildings_scaled.add(r, buildings_factor(recipe, self.profile));
        }
        for resource in self.network.items_of(ItemClass::Resource) {
            power.add(intermediate(resource)?, self.profile.extraction_power);
        }

        let mut items = LinearExpr::new();
        for item in self.network.items() {
            if self.network.class(item) != Some(ItemClass::PowerPseudoItem) {
                items.add(intermediate(item)?, 1.0);
            }
        }

        let mut resources = LinearExpr::new();
        for resource in self.settings.resource_limits.keys() {
            resources.add(intermediate(resource)?, 1.0);
        }

        let weights = resource_weights(self.dataset, self.settings);
        tracing::debug!(?weights, "resource scarcity weights");
        let mut resources_scaled = LinearExpr::new();
        for (resource, weight) in &weights {
            resources_scaled.add(intermediate(resource)?, *weight);
        }

        let mut sink_points = LinearExpr::new();
        for item in self.network.products() {
            if let Some(data) = self.dataset.items.get(item) {
                if data.points > 0.0 && data.form == Form::Solid {
                    sink_points.add(var(index, Family::Output, item)?, data.points);
                }
            }
        }

        let definitions = [
            (Aggregate::PowerUse, power),
            (Aggregate::ItemUse, items),
            (Aggregate::BuildingUse, buildings),
            (Aggregate::ResourceUse, resources),
            (Aggregate::BuildingsScaled, buildings_scaled),
            (Aggregate::ResourcesScaled, resources_scaled),
            (Aggregate::SinkPoints, sink_points),
        ];
        let constraints: Vec<_> = definitions
            .into_iter()
            .map(|(aggregate, expr)| {
                Constraint::defines(aggregate.name(), index.aggregate(aggregate), expr)
            })
            .collect();
        Ok(builder.with_all(constraints))
    }

    /// `output[power item] = share × power_use` for each configured share.
    fn share_power(&self, mut builder: ModelBuilder) -> Result<ModelBuilder> {
        for (item, &share) in &self.settings.power_shares {
            let output = builder
                .index()
                .require(Family::Output, item, ReferenceKind::PowerShare)?;
            let power = builder.index().aggregate(Aggregate::PowerUse);
            builder = builder.with(Constraint::eq(
                format!("share[{}]", item),
                LinearExpr::new().term(output, 1.0).term(power, -share),
                0.0,
            ));
        }
        Ok(builder)
    }

    fn waste_penalty(&self, index: &VariableIndex) -> LinearExpr {
        let mut waste = LinearExpr::new();
        for (item, weight) in self.settings.waste_items() {
            match index.output(item) {
                Some(x) => waste.add(x, weight),
                None => tracing::warn!(item = %item, "waste item not in flow network, skipping"),
            }
        }
        waste
    }

    fn set_objective(&self, mut builder: ModelBuilder) -> Result<ModelBuilder> {
        let weights = &self.settings.weights;
        let index = builder.index();
        let aggregate = |a: Aggregate| index.aggregate(a);
        let waste = self.waste_penalty(index);

        let mut objective = LinearExpr::new().term(aggregate(Aggregate::PowerUse), weights.power_use);
        objective.add_scaled(&waste, weights.waste);

        match self.settings.max_item {
            MaxItem::Disabled => {
                objective.add(aggregate(Aggregate::ItemUse), weights.item_use);
                objective.add(aggregate(Aggregate::BuildingUse), weights.building_use);
                objective.add(aggregate(Aggregate::ResourceUse), weights.resource_use);
                objective.add(aggregate(Aggregate::BuildingsScaled), weights.buildings_scaled);
                objective.add(aggregate(Aggregate::ResourcesScaled), weights.resources_scaled);
                objective.add(aggregate(Aggregate::SinkPoints), weights.sink_points);
            }
            MaxItem::Item(ref target) => {
                let x = index.require(Family::Output, target, ReferenceKind::MaxItem)?;
                objective.add(x, -self.profile.max_item_reward);
                tracing::debug!(item = %target, "maximizing single item");
            }
            MaxItem::SinkPoints => {
                objective.add(aggregate(Aggregate::SinkPoints), -1.0);
                let mut fixes = Vec::new();
                for item in &self.profile.non_farmable {
                    match (index.input(item), index.intermediate(item)) {
                        (Some(n), Some(i)) => fixes.extend([n, i]),
                        _ => tracing::warn!(item = %item, "non-farmable item not in flow network, skipping"),
                    }
                }
                builder = fixes
                    .into_iter()
                    .fold(builder, |builder, var| builder.fix(var, 0.0));
                tracing::debug!("maximizing sink points");
            }
        }

        Ok(builder.minimize(objective))
    }
}

/// Looks up a variable declared from the network.
fn var(index: &VariableIndex, family: Family, key: &str) -> Result<VarId> {
    let kind = match family {
        Family::Recipe => ReferenceKind::Recipe,
        _ => ReferenceKind::RecipeItem,
    };
    index.require(family, key, kind)
}
