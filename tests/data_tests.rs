//! Tests for data loading functionality.

use flowplan::data::{load_dataset, load_settings, parse_dataset, parse_settings};
use flowplan::models::{Form, POWER_ITEM};
use flowplan::settings::{MaxItem, ModelProfile};
use flowplan::Error;
use std::fs;

const DATASET: &str = r#"{
    "items": {
        "Desc_IronIngot_C": {"name": "Iron Ingot", "energy": 0, "form": "RF_SOLID", "points": 2}
    },
    "resources": {
        "Desc_OreIron_C": {"name": "Iron Ore", "form": "RF_SOLID", "points": 1},
        "Desc_Coal_C": {"name": "Coal", "energy": 300, "form": "RF_SOLID"},
        "Desc_Water_C": {"name": "Water", "form": "RF_LIQUID"}
    },
    "recipes": {
        "Recipe_IngotIron_C": {
            "name": "Iron Ingot",
            "time": 2,
            "ingredients": [{"item": "Desc_OreIron_C", "amount": 1}],
            "products": [{"item": "Desc_IronIngot_C", "amount": 1}],
            "machine": "Build_SmelterMk1_C",
            "power_use": 4
        }
    },
    "machines": {
        "Build_SmelterMk1_C": {"name": "Smelter", "power_use": 4, "power_produced": 0}
    },
    "generators": [
        {
            "id": "Build_GeneratorCoal_C",
            "name": "Coal Generator",
            "power_production": 75,
            "supplemental_to_power_ratio": 0.2,
            "fuels": [{"fuel": "Desc_Coal_C", "supplemental": "Desc_Water_C"}]
        }
    ]
}"#;

#[test]
fn test_parse_dataset() {
    let dataset = parse_dataset(DATASET).expect("Failed to parse dataset");

    assert_eq!(dataset.resources.len(), 3);
    assert_eq!(dataset.resources["Desc_Water_C"].form, Form::Liquid);
    assert_eq!(dataset.items["Desc_IronIngot_C"].points, 2.0);
    assert_eq!(dataset.machines["Build_SmelterMk1_C"].name, "Smelter");

    let smelt = &dataset.recipes["Recipe_IngotIron_C"];
    assert_eq!(smelt.power_use, 4.0);
    assert_eq!(smelt.per_minute(smelt.products[0].amount), 30.0);
}

#[test]
fn test_generators_become_recipes() {
    let dataset = parse_dataset(DATASET).expect("Failed to parse dataset");

    let burn = &dataset.recipes["Build_GeneratorCoal_C_Desc_Coal_C"];
    assert_eq!(burn.name, "Coal Generator (Coal)");
    assert_eq!(burn.products[0].item, POWER_ITEM);
    assert!(dataset.items.contains_key(POWER_ITEM));
    assert_eq!(dataset.machines["Build_GeneratorCoal_C"].power_produced, 75.0);
}

#[test]
fn test_parse_dataset_rejects_bad_json() {
    let err = parse_dataset("{\"recipes\": 3}").unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_parse_saved_settings() {
    let json = r#"{
        "resource_limits": {"Desc_OreIron_C": 70380, "Desc_Water_C": 100000},
        "weights": {
            "Power Use": 0.1,
            "Item Use": 0.3,
            "Building Use": 0,
            "Resource Use": 0,
            "Buildings Scaled": 1,
            "Resources Scaled": 1,
            "Uranium Waste": 999999
        },
        "recipes_off": ["Recipe_Alternate_PureIronIngot_C"],
        "outputs": [],
        "max_item": "Points"
    }"#;

    let settings = parse_settings(json).expect("Failed to parse settings");

    assert_eq!(settings.resource_limits["Desc_OreIron_C"], 70380.0);
    assert_eq!(settings.weights.waste, 999999.0);
    assert_eq!(settings.weights.sink_points, 0.0);
    assert!(settings.recipes_off.contains("Recipe_Alternate_PureIronIngot_C"));
    assert!(settings.outputs.is_empty());
    assert!(settings.inputs.is_empty());
    assert_eq!(settings.max_item, MaxItem::SinkPoints);
    assert_eq!(settings.profile, ModelProfile::default());
}

#[test]
fn test_settings_carry_a_profile() {
    let json = r#"{"profile": {"buildings_exponent": 2, "buildings_scale": 4.1}}"#;

    let settings = parse_settings(json).expect("Failed to parse settings");

    assert_eq!(settings.profile.buildings_exponent, 2.0);
    assert_eq!(settings.profile.buildings_scale, 4.1);
    assert_eq!(settings.profile.noise_threshold, 0.001);
}

#[test]
fn test_load_from_files() {
    let dir = std::env::temp_dir().join(format!("flowplan-data-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let data_path = dir.join("data.json");
    let settings_path = dir.join("saved.json");
    fs::write(&data_path, DATASET).unwrap();
    fs::write(&settings_path, r#"{"outputs": {"Desc_IronIngot_C": 10}}"#).unwrap();

    let dataset = load_dataset(&data_path).expect("Failed to load dataset");
    let settings = load_settings(&settings_path).expect("Failed to load settings");

    assert_eq!(dataset.recipes.len(), 2);
    assert_eq!(settings.outputs["Desc_IronIngot_C"], 10.0);

    let missing = load_dataset(&dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, Error::Io(_)));

    fs::remove_dir_all(&dir).unwrap();
}
