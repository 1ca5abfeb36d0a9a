//! User settings and tunable model constants.
//!
//! Settings are rebuilt for every solve request. They use the same JSON
//! shape as the saved settings files of the desktop tool, so an existing
//! `saved.json` deserializes directly into [`Settings`], including its
//! `checkbox_Nuclear Waste` toggle. Keys the planner has no use for are
//! ignored.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::models::POWER_ITEM;

/// Objective weights, keyed by the display names used in settings files.
///
/// Keys missing from a settings file weigh zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    #[serde(rename = "Power Use")]
    pub power_use: f64,
    #[serde(rename = "Item Use")]
    pub item_use: f64,
    #[serde(rename = "Building Use")]
    pub building_use: f64,
    #[serde(rename = "Resource Use")]
    pub resource_use: f64,
    #[serde(rename = "Buildings Scaled")]
    pub buildings_scaled: f64,
    #[serde(rename = "Resources Scaled")]
    pub resources_scaled: f64,
    /// Penalty on hazardous byproducts left as output; meant to be huge
    #[serde(rename = "Nuclear Waste", alias = "Uranium Waste")]
    pub waste: f64,
    #[serde(rename = "Sink Points")]
    pub sink_points: f64,
}

impl Weights {
    /// The weights the desktop tool ships with.
    ///
    /// ```
    /// use flowplan::settings::Weights;
    ///
    /// let w = Weights::recommended();
    /// assert_eq!(w.item_use, 0.3);
    /// assert_eq!(w.building_use, 0.0);
    /// ```
    pub fn recommended() -> Self {
        Weights {
            power_use: 0.1,
            item_use: 0.3,
            building_use: 0.0,
            resource_use: 0.0,
            buildings_scaled: 1.0,
            resources_scaled: 1.0,
            waste: 999_999.0,
            sink_points: 0.0,
        }
    }
}

/// Selects the objective mode.
///
/// Serialized as `false`, `"Points"` or an item id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MaxItem {
    /// Weighted-sum minimization
    #[default]
    Disabled,
    /// Maximize the sink-point total
    SinkPoints,
    /// Maximize the output of one item
    Item(String),
}

impl Serialize for MaxItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxItem::Disabled => serializer.serialize_bool(false),
            MaxItem::SinkPoints => serializer.serialize_str("Points"),
            MaxItem::Item(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for MaxItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Ok(MaxItem::Disabled),
            Repr::Flag(true) => Err(de::Error::custom(
                "max_item must be an item id, \"Points\" or false",
            )),
            Repr::Name(name) if name == "Points" => Ok(MaxItem::SinkPoints),
            Repr::Name(name) => Ok(MaxItem::Item(name)),
        }
    }
}

/// Older settings files store "no outputs" as an empty list.
fn map_or_empty_list<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Map(BTreeMap<String, f64>),
        List(Vec<serde_json::Value>),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Map(map) => Ok(map),
        Repr::List(list) if list.is_empty() => Ok(BTreeMap::new()),
        Repr::List(_) => Err(de::Error::custom("expected a map of item amounts")),
    }
}

/// Game-balance constants that shape the objective.
///
/// These differ between game versions, so they travel with the settings
/// instead of being baked into the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelProfile {
    /// Exponent applied to `(ingredients + products - 1)` in the complexity penalty
    pub buildings_exponent: f64,
    /// Multiplier applied after the exponent
    pub buildings_scale: f64,
    /// MW drawn by extraction equipment per unit of raw resource
    pub extraction_power: f64,
    /// Resource left out of the average cap (abundant, effectively unlimited)
    pub unlimited_resource: Option<String>,
    /// Reward per unit of the maximized item
    pub max_item_reward: f64,
    /// Solved values at or below this are dropped from reports
    pub noise_threshold: f64,
    /// Stand-in for non-positive caps when computing scarcity weights
    pub limit_epsilon: f64,
    /// Pseudo-items that carry generated power
    pub power_items: Vec<String>,
    /// Hazardous byproducts and their penalty multipliers
    pub waste_items: BTreeMap<String, f64>,
    /// Extra waste counted only when [`Settings::penalize_fuel_rods`] is set
    pub fuel_rod_waste: BTreeMap<String, f64>,
    /// Items excluded from sink-point farming
    pub non_farmable: Vec<String>,
}

impl Default for ModelProfile {
    fn default() -> Self {
        ModelProfile {
            buildings_exponent: 3f64.log2(),
            buildings_scale: 1.0 / 3.0,
            extraction_power: 0.168,
            unlimited_resource: Some("Desc_Water_C".to_string()),
            max_item_reward: 99_999.0,
            noise_threshold: 0.001,
            limit_epsilon: 1e-5,
            power_items: [
                POWER_ITEM,
                "Power_Produced_Other",
                "Power_Produced_Fuel",
                "Power_Produced_Nuclear",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            waste_items: [
                "Desc_NuclearWaste_C",
                "Desc_NonFissibleUranium_C",
                "Desc_PlutoniumPellet_C",
                "Desc_PlutoniumCell_C",
                "Desc_PlutoniumWaste_C",
                "Desc_Ficsonium_C",
            ]
            .iter()
            .map(|s| (s.to_string(), 1.0))
            .collect(),
            fuel_rod_waste: [("Desc_PlutoniumFuelRod_C".to_string(), 0.1)]
                .into_iter()
                .collect(),
            non_farmable: [
                "Desc_AlienProtein_C",
                "Desc_Gift_C",
                "Desc_Wood_C",
                "Desc_StingerParts_C",
                "Desc_SpitterParts_C",
                "Desc_HogParts_C",
                "Desc_HatcherParts_C",
                "Desc_Mycelia_C",
                "Desc_Leaves_C",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ModelProfile {
    /// The older balance profile: squared complexity penalty, a heavier
    /// scale, and plutonium fuel rods counted as partial waste.
    pub fn legacy() -> Self {
        let mut profile = ModelProfile {
            buildings_exponent: 2.0,
            buildings_scale: 4.1,
            extraction_power: 0.167,
            ..ModelProfile::default()
        };
        profile
            .waste_items
            .insert("Desc_PlutoniumFuelRod_C".to_string(), 0.1);
        profile
    }

    /// Whether `id` is one of the power pseudo-items.
    pub fn is_power_item(&self, id: &str) -> bool {
        self.power_items.iter().any(|p| p == id)
    }
}

/// Everything a single solve request needs besides the dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cap per raw resource
    pub resource_limits: BTreeMap<String, f64>,
    /// Fixed external supply per item (absent in older files: all zero)
    pub inputs: BTreeMap<String, f64>,
    /// Fixed demand per item
    #[serde(deserialize_with = "map_or_empty_list")]
    pub outputs: BTreeMap<String, f64>,
    /// Disabled recipe ids
    pub recipes_off: BTreeSet<String>,
    pub weights: Weights,
    pub max_item: MaxItem,
    /// Pins a power pseudo-item's output to a fraction of total power use
    pub power_shares: BTreeMap<String, f64>,
    /// Counts plutonium fuel rods as partial waste
    #[serde(rename = "checkbox_Nuclear Waste")]
    pub penalize_fuel_rods: bool,
    pub profile: ModelProfile,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recommended weights and the default map resource caps.
    pub fn recommended() -> Self {
        Settings {
            resource_limits: default_resource_limits(),
            weights: Weights::recommended(),
            ..Settings::default()
        }
    }

    /// Penalty multiplier per waste item.
    ///
    /// The profile's waste items always count; its fuel rod items join them
    /// when `penalize_fuel_rods` is set, without overriding a multiplier the
    /// profile already gives.
    pub fn waste_items(&self) -> BTreeMap<&str, f64> {
        let mut items: BTreeMap<&str, f64> = self
            .profile
            .waste_items
            .iter()
            .map(|(item, &weight)| (item.as_str(), weight))
            .collect();
        if self.penalize_fuel_rods {
            for (item, &weight) in &self.profile.fuel_rod_waste {
                items.entry(item.as_str()).or_insert(weight);
            }
        }
        items
    }

    /// Builder: caps a raw resource.
    pub fn limit(mut self, resource: impl Into<String>, cap: f64) -> Self {
        self.resource_limits.insert(resource.into(), cap);
        self
    }

    /// Builder: feeds an item into the chain at a fixed rate.
    pub fn input(mut self, item: impl Into<String>, amount: f64) -> Self {
        self.inputs.insert(item.into(), amount);
        self
    }

    /// Builder: demands a fixed output rate.
    pub fn output(mut self, item: impl Into<String>, amount: f64) -> Self {
        self.outputs.insert(item.into(), amount);
        self
    }

    /// Builder: disables a recipe.
    pub fn recipe_off(mut self, recipe: impl Into<String>) -> Self {
        self.recipes_off.insert(recipe.into());
        self
    }

    /// Builder: replaces the objective weights.
    pub fn weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    /// Builder: switches the objective mode.
    pub fn maximize(mut self, max_item: MaxItem) -> Self {
        self.max_item = max_item;
        self
    }

    /// Builder: swaps the balance profile, e.g. for [`ModelProfile::legacy`].
    pub fn profile(mut self, profile: ModelProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Outputs to fix, minus the maximized item (it is maximized, not fixed).
    pub fn fixed_outputs(&self) -> impl Iterator<Item = (&String, &f64)> + '_ {
        self.outputs.iter().filter(move |(item, _)| match self.max_item {
            MaxItem::Item(ref target) => *item != target,
            _ => true,
        })
    }
}

/// Extraction caps of the full game map.
pub fn default_resource_limits() -> BTreeMap<String, f64> {
    [
        ("Desc_Water_C", 100_000.0),
        ("Desc_OreGold_C", 11_040.0),
        ("Desc_RawQuartz_C", 10_500.0),
        ("Desc_Coal_C", 30_120.0),
        ("Desc_NitrogenGas_C", 12_000.0),
        ("Desc_OreIron_C", 70_380.0),
        ("Desc_Sulfur_C", 6_840.0),
        ("Desc_OreBauxite_C", 9_780.0),
        ("Desc_OreUranium_C", 2_100.0),
        ("Desc_Stone_C", 52_860.0),
        ("Desc_LiquidOil_C", 11_700.0),
        ("Desc_OreCopper_C", 28_860.0),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), *v))
    .collect()
}
