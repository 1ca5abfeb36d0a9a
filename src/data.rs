//! Data loading functionality for flowplan.
//!
//! The dataset and the settings are both JSON documents. The dataset file
//! is the extracted game catalog (`items`, `resources`, `recipes`,
//! `machines`), optionally with a `generators` list; every generator is
//! expanded into one pseudo-recipe per fuel while loading.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::models::{Dataset, Generator};
use crate::settings::Settings;

/// On-disk shape of the dataset.
#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(flatten)]
    dataset: Dataset,
    #[serde(default)]
    generators: Vec<Generator>,
}

/// Parses a dataset from JSON text.
///
/// # Example
///
/// ```
/// use flowplan::data::parse_dataset;
///
/// let json = r#"{
///     "resources": {"Desc_OreIron_C": {"name": "Iron Ore"}},
///     "items": {"Desc_IronIngot_C": {"name": "Iron Ingot", "points": 2}},
///     "recipes": {
///         "Recipe_IngotIron_C": {
///             "name": "Iron Ingot",
///             "time": 2,
///             "ingredients": [{"item": "Desc_OreIron_C", "amount": 1}],
///             "products": [{"item": "Desc_IronIngot_C", "amount": 1}],
///             "machine": "Build_SmelterMk1_C",
///             "power_use": 4
///         }
///     }
/// }"#;
///
/// let dataset = parse_dataset(json).unwrap();
/// assert_eq!(dataset.recipes["Recipe_IngotIron_C"].per_minute(1.0), 30.0);
/// assert_eq!(dataset.item_name("Desc_OreIron_C"), "Iron Ore");
/// ```
pub fn parse_dataset(json: &str) -> Result<Dataset> {
    let file: DatasetFile = serde_json::from_str(json)?;
    let mut dataset = file.dataset;
    for generator in &file.generators {
        let added = dataset.add_generator(generator);
        tracing::debug!(generator = %generator.id, recipes = added, "expanded generator fuels");
    }
    tracing::debug!(
        items = dataset.items.len(),
        resources = dataset.resources.len(),
        recipes = dataset.recipes.len(),
        machines = dataset.machines.len(),
        "parsed dataset"
    );
    Ok(dataset)
}

/// Loads a dataset from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the dataset JSON file
///
/// # Returns
///
/// The parsed [`Dataset`] with generator recipes expanded, or an I/O or JSON
/// error.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = fs::read_to_string(path)?;
    let dataset = parse_dataset(&text)?;
    tracing::info!(path = %path.display(), recipes = dataset.recipes.len(), "loaded dataset");
    Ok(dataset)
}

/// Parses settings from JSON text. Missing fields take their defaults.
///
/// # Example
///
/// ```
/// use flowplan::data::parse_settings;
/// use flowplan::settings::MaxItem;
///
/// let json = r#"{
///     "resource_limits": {"Desc_OreIron_C": 70380},
///     "outputs": {"Desc_IronIngot_C": 10},
///     "weights": {"Power Use": 0.1, "Item Use": 0.3},
///     "recipes_off": ["Recipe_Alternate_PureIronIngot_C"],
///     "max_item": false
/// }"#;
///
/// let settings = parse_settings(json).unwrap();
/// assert_eq!(settings.max_item, MaxItem::Disabled);
/// assert!(settings.inputs.is_empty());
/// assert_eq!(settings.weights.item_use, 0.3);
/// ```
pub fn parse_settings(json: &str) -> Result<Settings> {
    Ok(serde_json::from_str(json)?)
}

/// Loads settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)?;
    let settings = parse_settings(&text)?;
    tracing::info!(
        path = %path.display(),
        limits = settings.resource_limits.len(),
        outputs = settings.outputs.len(),
        "loaded settings"
    );
    Ok(settings)
}
