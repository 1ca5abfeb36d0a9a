//! Flow network derived from the dataset.
//!
//! Partitions every id the recipes touch into resources, products and
//! ingredients, tags each item once, and indexes which recipes produce and
//! consume it so the compiler never scans the recipe list per item.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, ReferenceKind, Result};
use crate::models::Dataset;
use crate::settings::ModelProfile;

/// Role of an item in the flow network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemClass {
    /// Raw extractable material, possibly capped
    Resource,
    /// Produced by at least one recipe (it may also be consumed)
    Product,
    /// Only ever consumed
    Ingredient,
    /// Carries generated power, not material
    PowerPseudoItem,
}

/// A recipe's per-cycle contribution to one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub recipe: String,
    /// Amount per 60 time units at utilization 1
    pub rate: f64,
}

/// Items, recipes and their connections.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNetwork {
    classes: BTreeMap<String, ItemClass>,
    products: BTreeSet<String>,
    recipes: Vec<String>,
    production: BTreeMap<String, Vec<Flow>>,
    consumption: BTreeMap<String, Vec<Flow>>,
}

impl FlowNetwork {
    /// Partitions the dataset.
    ///
    /// Fails if a recipe names an item missing from the catalog or has a
    /// non-positive cycle time.
    pub fn build(dataset: &Dataset, profile: &ModelProfile) -> Result<Self> {
        let mut products = BTreeSet::new();
        let mut ingredients = BTreeSet::new();
        let mut production: BTreeMap<String, Vec<Flow>> = BTreeMap::new();
        let mut consumption: BTreeMap<String, Vec<Flow>> = BTreeMap::new();

        for (id, recipe) in &dataset.recipes {
            if !(recipe.time > 0.0) {
                return Err(Error::InvalidRecipe {
                    recipe: id.clone(),
                    reason: format!("cycle time must be positive, got {}", recipe.time),
                });
            }
            for stack in recipe.ingredients.iter().chain(&recipe.products) {
                if dataset.item(&stack.item).is_none() {
                    return Err(Error::unknown(ReferenceKind::RecipeItem, stack.item.clone()));
                }
            }

            let outputs: BTreeSet<&str> = recipe.products.iter().map(|s| s.item.as_str()).collect();
            let inputs: BTreeSet<&str> = recipe.ingredients.iter().map(|s| s.item.as_str()).collect();
            for item in outputs {
                if !dataset.is_resource(item) {
                    products.insert(item.to_string());
                }
                production.entry(item.to_string()).or_default().push(Flow {
                    recipe: id.clone(),
                    rate: recipe.per_minute(recipe.produced(item)),
                });
            }
            for item in inputs {
                if !dataset.is_resource(item) {
                    ingredients.insert(item.to_string());
                }
                consumption.entry(item.to_string()).or_default().push(Flow {
                    recipe: id.clone(),
                    rate: recipe.per_minute(recipe.consumed(item)),
                });
            }
        }

        let mut classes = BTreeMap::new();
        for id in dataset.resources.keys() {
            classes.insert(id.clone(), ItemClass::Resource);
        }
        for id in &ingredients {
            classes.insert(id.clone(), ItemClass::Ingredient);
        }
        for id in &products {
            let class = if profile.is_power_item(id) {
                ItemClass::PowerPseudoItem
            } else {
                ItemClass::Product
            };
            classes.insert(id.clone(), class);
        }
        for (id, class) in classes.iter_mut() {
            if profile.is_power_item(id) {
                *class = ItemClass::PowerPseudoItem;
            }
        }

        tracing::debug!(
            resources = dataset.resources.len(),
            products = products.len(),
            ingredients = ingredients.len(),
            recipes = dataset.recipes.len(),
            "partitioned dataset"
        );

        Ok(FlowNetwork {
            classes,
            products,
            recipes: dataset.recipes.keys().cloned().collect(),
            production,
            consumption,
        })
    }

    /// Every item with flow variables, in id order.
    pub fn items(&self) -> impl Iterator<Item = &str> + '_ {
        self.classes.keys().map(String::as_str)
    }

    /// Items tagged with `class`, in id order.
    pub fn items_of(&self, class: ItemClass) -> impl Iterator<Item = &str> + '_ {
        self.classes
            .iter()
            .filter(move |(_, c)| **c == class)
            .map(|(id, _)| id.as_str())
    }

    /// Items produced by some recipe (resources excluded), in id order.
    pub fn products(&self) -> impl Iterator<Item = &str> + '_ {
        self.products.iter().map(String::as_str)
    }

    /// Every recipe id in the dataset, sorted.
    pub fn recipes(&self) -> impl Iterator<Item = &str> + '_ {
        self.recipes.iter().map(String::as_str)
    }

    /// Role of `id`, or `None` if no recipe or resource entry mentions it.
    pub fn class(&self, id: &str) -> Option<ItemClass> {
        self.classes.get(id).copied()
    }

    /// Whether `id` has flow variables.
    pub fn contains(&self, id: &str) -> bool {
        self.classes.contains_key(id)
    }

    /// Whether `id` is a known recipe. Recipe ids are kept sorted, so this
    /// is a binary search.
    pub fn has_recipe(&self, id: &str) -> bool {
        self.recipes.binary_search_by(|r| r.as_str().cmp(id)).is_ok()
    }

    /// Recipes producing `item`, with their per-minute rates.
    pub fn producers(&self, item: &str) -> &[Flow] {
        self.production.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Recipes consuming `item`, with their per-minute rates.
    pub fn consumers(&self, item: &str) -> &[Flow] {
        self.consumption.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of classified items.
    pub fn item_count(&self) -> usize {
        self.classes.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}
