//! Data models for the game dataset.
//!
//! This module contains the static catalog a plan is computed from: items,
//! raw resources, recipes and machines. The catalog is produced once by an
//! external parser and treated as read-only afterwards.
//!
//! # Parser helpers
//!
//! Raw game data measures fluids per 1000 units and gives variable-power
//! machines a range instead of a single draw. [`Form::normalize_amount`],
//! [`Form::normalize_energy`], [`variable_power_use`] and
//! [`variable_recipe_power`] convert those raw values into the normalized
//! numbers a [`Dataset`] stores. The planner itself reads only normalized
//! values, so these are for the code that builds the dataset file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of the pseudo-item generator recipes produce.
pub const POWER_ITEM: &str = "Power_Produced";

/// Physical form of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Form {
    #[default]
    #[serde(rename = "RF_SOLID")]
    Solid,
    #[serde(rename = "RF_LIQUID")]
    Liquid,
    #[serde(rename = "RF_GAS")]
    Gas,
    #[serde(rename = "RF_INVALID")]
    Invalid,
}

impl Form {
    /// Liquids and gases are measured per 1000 units in the raw game data.
    pub fn is_fluid(self) -> bool {
        matches!(self, Form::Liquid | Form::Gas)
    }

    /// Converts a raw recipe amount to the per-unit basis used by the model.
    /// Parser-side; dataset amounts are already normalized.
    ///
    /// ```
    /// use flowplan::models::Form;
    ///
    /// assert_eq!(Form::Liquid.normalize_amount(3000.0), 3.0);
    /// assert_eq!(Form::Solid.normalize_amount(3.0), 3.0);
    /// ```
    pub fn normalize_amount(self, raw: f64) -> f64 {
        if self.is_fluid() {
            raw / 1000.0
        } else {
            raw
        }
    }

    /// Scales a raw energy value so fluids share the solid per-unit basis.
    /// Parser-side, like [`Form::normalize_amount`].
    pub fn normalize_energy(self, raw: f64) -> f64 {
        if self.is_fluid() {
            raw * 1000.0
        } else {
            raw
        }
    }
}

/// An item (or raw resource) in the catalog.
///
/// Resources use the same shape; they are told apart only by the dataset
/// bucket they live in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Display name (e.g. "Iron Plate")
    pub name: String,
    /// Energy value per unit, already normalized for fluids
    pub energy: f64,
    /// Solid, liquid or gas
    pub form: Form,
    /// Sink points awarded per unit (0 if the item cannot be sunk)
    pub points: f64,
}

impl Item {
    /// Creates a solid item with no energy and no sink value.
    pub fn solid(name: impl Into<String>) -> Self {
        Item {
            name: name.into(),
            ..Item::default()
        }
    }

    /// Creates an item of the given form.
    pub fn with_form(name: impl Into<String>, form: Form) -> Self {
        Item {
            name: name.into(),
            form,
            ..Item::default()
        }
    }

    pub fn energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    pub fn points(mut self, points: f64) -> Self {
        self.points = points;
        self
    }
}

/// An (item, amount) pair in a recipe's ingredient or product list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub item: String,
    pub amount: f64,
}

impl Stack {
    pub fn new(item: impl Into<String>, amount: f64) -> Self {
        Stack {
            item: item.into(),
            amount,
        }
    }
}

/// A recipe that converts ingredients into products in a machine.
///
/// # Example
///
/// ```
/// use flowplan::models::Recipe;
///
/// let plate = Recipe::new("Iron Plate", 6.0)
///     .ingredient("Desc_IronIngot_C", 3.0)
///     .product("Desc_IronPlate_C", 2.0)
///     .machine("Build_ConstructorMk1_C", 4.0);
///
/// // 2 plates every 6 seconds is 20 plates per minute.
/// assert_eq!(plate.per_minute(2.0), 20.0);
/// assert_eq!(plate.arity(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Display name
    pub name: String,
    /// Cycle time in seconds
    pub time: f64,
    /// Consumed stacks, in dataset order
    #[serde(default)]
    pub ingredients: Vec<Stack>,
    /// Produced stacks, in dataset order
    #[serde(default)]
    pub products: Vec<Stack>,
    /// Owning machine identifier
    #[serde(default)]
    pub machine: String,
    /// Average power draw of one machine running this recipe
    #[serde(default)]
    pub power_use: f64,
}

impl Recipe {
    pub fn new(name: impl Into<String>, time: f64) -> Self {
        Recipe {
            name: name.into(),
            time,
            ingredients: Vec::new(),
            products: Vec::new(),
            machine: String::new(),
            power_use: 0.0,
        }
    }

    pub fn ingredient(mut self, item: impl Into<String>, amount: f64) -> Self {
        self.ingredients.push(Stack::new(item, amount));
        self
    }

    pub fn product(mut self, item: impl Into<String>, amount: f64) -> Self {
        self.products.push(Stack::new(item, amount));
        self
    }

    pub fn machine(mut self, machine: impl Into<String>, power_use: f64) -> Self {
        self.machine = machine.into();
        self.power_use = power_use;
        self
    }

    /// Rate of a per-cycle amount expressed per 60 time units.
    pub fn per_minute(&self, amount: f64) -> f64 {
        amount * 60.0 / self.time
    }

    /// Number of distinct ingredient and product stacks.
    pub fn arity(&self) -> usize {
        self.ingredients.len() + self.products.len()
    }

    /// Total per-cycle amount of `item` among the products.
    pub fn produced(&self, item: &str) -> f64 {
        self.products
            .iter()
            .filter(|s| s.item == item)
            .map(|s| s.amount)
            .sum()
    }

    /// Total per-cycle amount of `item` among the ingredients.
    pub fn consumed(&self, item: &str) -> f64 {
        self.ingredients
            .iter()
            .filter(|s| s.item == item)
            .map(|s| s.amount)
            .sum()
    }
}

/// A building that runs recipes or burns fuel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Machine {
    pub name: String,
    /// MW drawn (0 for pure generators)
    pub power_use: f64,
    /// MW produced (0 for pure consumers)
    pub power_produced: f64,
}

/// Average draw of a variable-power machine over its cycle, for parsers
/// filling [`Machine::power_use`].
///
/// ```
/// use flowplan::models::variable_power_use;
///
/// assert_eq!(variable_power_use(250.0, 750.0), 500.0);
/// ```
pub fn variable_power_use(min: f64, max: f64) -> f64 {
    min + (max - min) / 2.0
}

/// Average draw of a recipe whose power varies over its cycle, for parsers
/// filling [`Recipe::power_use`].
pub fn variable_recipe_power(constant: f64, factor: f64) -> f64 {
    constant + factor / 2.0
}

/// One fuel a generator accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorFuel {
    pub fuel: String,
    /// Resource consumed alongside the fuel (e.g. water)
    #[serde(default)]
    pub supplemental: Option<String>,
    /// Item left over per unit of fuel burned, with its amount
    #[serde(default)]
    pub byproduct: Option<Stack>,
}

/// A power generator as described by the raw game data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    pub name: String,
    /// MW produced while running
    pub power_production: f64,
    /// Supplemental resource consumed per MW
    #[serde(default)]
    pub supplemental_to_power_ratio: f64,
    pub fuels: Vec<GeneratorFuel>,
}

/// Synthesizes the pseudo-recipe for burning one fuel in a generator.
///
/// One unit of fuel lasts `energy / power_production` seconds; the recipe
/// produces that much energy as [`POWER_ITEM`] per minute-normalized cycle.
/// # Arguments
///
/// * `generator` - The generator burning the fuel
/// * `fuel` - The fuel entry, with its optional supplemental and byproduct
/// * `fuel_item` - Catalog entry of the fuel, for its name and energy
///
/// # Returns
///
/// The pseudo-recipe, or `None` when the generator produces no power or the
/// fuel holds no energy (either would give a zero cycle time).
pub fn generator_fuel_recipe(
    generator: &Generator,
    fuel: &GeneratorFuel,
    fuel_item: &Item,
) -> Option<Recipe> {
    let power = generator.power_production;
    if power <= 0.0 || fuel_item.energy <= 0.0 {
        return None;
    }
    let time = fuel_item.energy / power;

    let mut recipe = Recipe::new(format!("{} ({})", generator.name, fuel_item.name), time)
        .ingredient(fuel.fuel.clone(), 1.0)
        .machine(generator.id.clone(), 0.0);
    if let Some(ref supplemental) = fuel.supplemental {
        let per_second = (60.0 / (1000.0 / power)) * generator.supplemental_to_power_ratio / 60.0;
        recipe = recipe.ingredient(supplemental.clone(), per_second * time);
    }
    recipe = recipe.product(POWER_ITEM, power * time / 60.0);
    if let Some(ref byproduct) = fuel.byproduct {
        recipe = recipe.product(byproduct.item.clone(), byproduct.amount);
    }
    Some(recipe)
}

/// The complete static catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub items: BTreeMap<String, Item>,
    pub resources: BTreeMap<String, Item>,
    pub recipes: BTreeMap<String, Recipe>,
    pub machines: BTreeMap<String, Machine>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: adds an item.
    pub fn with_item(mut self, id: impl Into<String>, item: Item) -> Self {
        self.items.insert(id.into(), item);
        self
    }

    /// Builder: adds a raw resource.
    pub fn with_resource(mut self, id: impl Into<String>, item: Item) -> Self {
        self.resources.insert(id.into(), item);
        self
    }

    /// Builder: adds a recipe.
    pub fn with_recipe(mut self, id: impl Into<String>, recipe: Recipe) -> Self {
        self.recipes.insert(id.into(), recipe);
        self
    }

    /// Builder: adds a machine.
    pub fn with_machine(mut self, id: impl Into<String>, machine: Machine) -> Self {
        self.machines.insert(id.into(), machine);
        self
    }

    /// Looks an id up among items first, then resources.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id).or_else(|| self.resources.get(id))
    }

    pub fn is_resource(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// Display name of an item or resource, falling back to its id.
    pub fn item_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.item(id).map(|i| i.name.as_str()).unwrap_or(id)
    }

    /// Display name of a recipe, falling back to its id.
    pub fn recipe_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.recipes.get(id).map(|r| r.name.as_str()).unwrap_or(id)
    }

    /// Registers a generator and one pseudo-recipe per known fuel.
    ///
    /// Fuels missing from the catalog or holding no energy are skipped. The power pseudo-item is
    /// added on first use. Returns the number of recipes added.
    pub fn add_generator(&mut self, generator: &Generator) -> usize {
        self.machines.insert(
            generator.id.clone(),
            Machine {
                name: generator.name.clone(),
                power_use: 0.0,
                power_produced: generator.power_production,
            },
        );
        self.items
            .entry(POWER_ITEM.to_string())
            .or_insert_with(|| Item::solid("Power"));

        let mut added = 0;
        for fuel in &generator.fuels {
            let Some(fuel_item) = self.item(&fuel.fuel).cloned() else {
                tracing::debug!(generator = %generator.id, fuel = %fuel.fuel, "fuel not in catalog, skipping");
                continue;
            };
            match generator_fuel_recipe(generator, fuel, &fuel_item) {
                Some(recipe) => {
                    self.recipes
                        .insert(format!("{}_{}", generator.id, fuel.fuel), recipe);
                    added += 1;
                }
                None => tracing::debug!(
                    generator = %generator.id,
                    fuel = %fuel.fuel,
                    energy = fuel_item.energy,
                    "fuel yields no burn cycle, skipping"
                ),
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluid_energy_is_scaled_up() {
        assert_eq!(Form::Gas.normalize_energy(0.5), 500.0);
        assert_eq!(Form::Solid.normalize_energy(0.5), 0.5);
    }

    #[test]
    fn form_uses_game_tags() {
        let form: Form = serde_json::from_str("\"RF_LIQUID\"").unwrap();
        assert_eq!(form, Form::Liquid);
        assert_eq!(serde_json::to_string(&Form::Gas).unwrap(), "\"RF_GAS\"");
    }

    #[test]
    fn recipe_totals_repeated_stacks() {
        let recipe = Recipe::new("Odd", 10.0)
            .product("A", 1.0)
            .product("A", 2.0)
            .ingredient("B", 4.0);
        assert_eq!(recipe.produced("A"), 3.0);
        assert_eq!(recipe.consumed("B"), 4.0);
        assert_eq!(recipe.consumed("A"), 0.0);
    }
}
