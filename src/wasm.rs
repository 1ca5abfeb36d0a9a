//! WebAssembly bindings for flowplan.
//!
//! This module provides JavaScript-accessible functions for the production
//! optimizer. Inputs and outputs are JSON strings.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::data::{parse_dataset, parse_settings};
use crate::decoder::Report;
use crate::optimizer::optimize_production;
use crate::solver::MinilpSolver;

/// JavaScript-friendly optimization result.
#[derive(Debug, Clone, Serialize)]
pub struct JsOptimizeResult {
    pub success: bool,
    pub error: Option<String>,
    pub report: Option<Report>,
}

impl JsOptimizeResult {
    fn failure(message: String) -> Self {
        JsOptimizeResult {
            success: false,
            error: Some(message),
            report: None,
        }
    }
}

/// Run the production optimizer on a dataset and a settings document.
///
/// A model the solver reports as infeasible or unbounded still returns its
/// report, with `success` false and the status as the error.
///
/// # Arguments
///
/// * `dataset_json` - JSON string of the dataset (generators allowed)
/// * `settings_json` - JSON string of one settings document
///
/// # Returns
///
/// JSON string of a [`JsOptimizeResult`].
#[wasm_bindgen]
pub fn optimize(dataset_json: &str, settings_json: &str) -> String {
    let result = match run(dataset_json, settings_json) {
        Ok(report) if report.is_optimal() => JsOptimizeResult {
            success: true,
            error: None,
            report: Some(report),
        },
        Ok(report) => JsOptimizeResult {
            success: false,
            error: Some(format!("No optimal plan: {}", report.status)),
            report: Some(report),
        },
        Err(message) => JsOptimizeResult::failure(message),
    };
    serde_json::to_string(&result).unwrap_or_default()
}

fn run(dataset_json: &str, settings_json: &str) -> Result<Report, String> {
    let dataset = parse_dataset(dataset_json).map_err(|e| format!("Invalid dataset: {}", e))?;
    let settings = parse_settings(settings_json).map_err(|e| format!("Invalid settings: {}", e))?;
    optimize_production(&dataset, &settings, &MinilpSolver).map_err(|e| e.to_string())
}

/// Get the version of the optimizer.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get the selectable items of a dataset, sorted by display name.
/// Returns a JSON array of `{id, name}` objects.
#[wasm_bindgen]
pub fn get_available_items(dataset_json: &str) -> String {
    #[derive(Serialize)]
    struct ItemInfo<'a> {
        id: &'a str,
        name: &'a str,
    }

    let dataset = match parse_dataset(dataset_json) {
        Ok(d) => d,
        Err(_) => return "[]".to_string(),
    };
    let mut available: Vec<ItemInfo> = dataset
        .items
        .iter()
        .map(|(id, item)| ItemInfo {
            id,
            name: &item.name,
        })
        .collect();
    available.sort_by(|a, b| a.name.cmp(b.name).then(a.id.cmp(b.id)));

    serde_json::to_string(&available).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "resources": {"Ore": {"name": "Ore"}},
        "items": {"Ingot": {"name": "Ingot"}},
        "recipes": {
            "Smelt": {
                "name": "Smelt",
                "time": 60,
                "ingredients": [{"item": "Ore", "amount": 1}],
                "products": [{"item": "Ingot", "amount": 1}]
            }
        }
    }"#;

    #[test]
    fn optimize_returns_report_json() {
        let out = optimize(
            DATASET,
            r#"{"resource_limits": {"Ore": 10}, "outputs": {"Ingot": 4}, "weights": {"Item Use": 1}}"#,
        );
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["report"]["status"], "Optimal");
    }

    #[test]
    fn optimize_reports_reference_errors() {
        let out = optimize(DATASET, r#"{"outputs": {"Nope": 1}}"#);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "unknown output item 'Nope'");
    }

    #[test]
    fn infeasible_plans_are_not_successes() {
        let out = optimize(DATASET, r#"{"resource_limits": {"Ore": 1}, "outputs": {"Ingot": 4}}"#);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["report"]["status"], "Infeasible");
    }

    #[test]
    fn available_items_are_sorted_by_name() {
        let out = get_available_items(DATASET);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], "Ingot");
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(get_available_items("not json"), "[]");
    }
}
