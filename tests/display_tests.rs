//! Tests for display and formatting utilities.

use flowplan::decoder::Report;
use flowplan::display::{format_amount, render_report, round_to, ReportPanel};
use flowplan::models::{Dataset, Item, Recipe};
use flowplan::optimizer::optimize_production;
use flowplan::settings::{Settings, Weights};
use flowplan::solver::{MinilpSolver, SolveStatus};

#[test]
fn test_round_to() {
    assert_eq!(round_to(1.2345, 2), 1.23);
    assert_eq!(round_to(1.25, 1), 1.3);
    assert_eq!(round_to(99.96, 1), 100.0);
}

#[test]
fn test_round_to_never_negative_zero() {
    assert_eq!(format_amount(-0.0004, 2), "0.00");
    assert_eq!(format_amount(-0.0, 1), "0.0");
}

#[test]
fn test_format_amount_places() {
    assert_eq!(format_amount(20.0, 2), "20.00");
    assert_eq!(format_amount(13.04, 1), "13.0");
    assert_eq!(format_amount(0.6666, 2), "0.67");
}

#[test]
fn test_render_optimal_report() {
    let dataset = Dataset::new()
        .with_resource("Desc_OreIron_C", Item::solid("Iron Ore"))
        .with_item("Desc_IronIngot_C", Item::solid("Iron Ingot"))
        .with_recipe(
            "Recipe_IngotIron_C",
            Recipe::new("Smelt Iron", 2.0)
                .ingredient("Desc_OreIron_C", 1.0)
                .product("Desc_IronIngot_C", 1.0)
                .machine("Build_SmelterMk1_C", 4.0),
        );
    let settings = Settings::new()
        .limit("Desc_OreIron_C", 100.0)
        .output("Desc_IronIngot_C", 45.0)
        .weights(Weights::recommended());
    let report = optimize_production(&dataset, &settings, &MinilpSolver).unwrap();

    let text = render_report(&report);

    assert!(text.starts_with("Status: optimal\n"));
    assert!(text.contains("[ITEMS OUTPUT]\n"));
    assert!(text.contains("  Iron Ingot: 45.00\n"));
    assert!(text.contains("[RESOURCES NEEDED]\n"));
    assert!(text.contains("  Iron Ore: 45.00\n"));
    assert!(text.contains("  Smelt Iron: 1.50\n"));
    assert!(text.contains("Buildings:      1.5\n"));

    let output = text.find("[ITEMS OUTPUT]").unwrap();
    let recipes = text.find("[RECIPES USED]").unwrap();
    let summary = text.find("[SUMMARY]").unwrap();
    assert!(output < recipes && recipes < summary);
}

#[test]
fn test_render_failed_report() {
    let text = render_report(&Report::empty(SolveStatus::Infeasible));
    assert_eq!(text, "Status: infeasible\n");
}

#[test]
fn test_panel_formats_inline() {
    let report = Report::empty(SolveStatus::Unbounded);
    assert_eq!(format!("{}", ReportPanel(&report)), "Status: unbounded\n");
    assert_eq!(ReportPanel(&report).to_string(), render_report(&report));
}
