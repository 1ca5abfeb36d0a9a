//! Tests for model compilation.

use flowplan::compiler::compile;
use flowplan::error::{Error, ReferenceKind};
use flowplan::lp::{Aggregate, Comparison};
use flowplan::models::{Dataset, Item, Recipe};
use flowplan::settings::{MaxItem, ModelProfile, Settings, Weights};

fn iron_dataset() -> Dataset {
    Dataset::new()
        .with_resource("Desc_OreIron_C", Item::solid("Iron Ore"))
        .with_item("Desc_IronIngot_C", Item::solid("Iron Ingot").points(2.0))
        .with_item("Desc_IronPlate_C", Item::solid("Iron Plate").points(6.0))
        .with_recipe(
            "Recipe_IngotIron_C",
            Recipe::new("Smelt Iron", 2.0)
                .ingredient("Desc_OreIron_C", 1.0)
                .product("Desc_IronIngot_C", 1.0)
                .machine("Build_SmelterMk1_C", 4.0),
        )
        .with_recipe(
            "Recipe_IronPlate_C",
            Recipe::new("Press Plate", 6.0)
                .ingredient("Desc_IronIngot_C", 3.0)
                .product("Desc_IronPlate_C", 2.0)
                .machine("Build_ConstructorMk1_C", 4.0),
        )
}

fn plate_settings() -> Settings {
    Settings::new()
        .limit("Desc_OreIron_C", 300.0)
        .output("Desc_IronPlate_C", 20.0)
        .weights(Weights::recommended())
}

fn reference_error(settings: Settings) -> (ReferenceKind, String) {
    match compile(&iron_dataset(), &settings) {
        Err(Error::UnknownReference { kind, key }) => (kind, key),
        other => panic!("expected a reference error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_compilation_is_deterministic() {
    let first = compile(&iron_dataset(), &plate_settings()).unwrap();
    let second = compile(&iron_dataset(), &plate_settings()).unwrap();

    assert_eq!(first, second);
    let labels = |m: &flowplan::lp::LpModel| -> Vec<String> {
        m.constraints().map(|c| c.label.clone()).collect()
    };
    assert_eq!(labels(&first), labels(&second));
}

#[test]
fn test_variables_per_item_and_recipe() {
    let model = compile(&iron_dataset(), &plate_settings()).unwrap();
    let index = model.index();

    // 3 items x 3 families + 2 recipes + 7 aggregates
    assert_eq!(model.variable_count(), 18);
    assert!(index.recipe("Recipe_IronPlate_C").is_some());
    assert!(index.intermediate("Desc_OreIron_C").is_some());
}

#[test]
fn test_inputs_and_outputs_are_fixed() {
    let settings = plate_settings().input("Desc_IronIngot_C", 5.0);
    let model = compile(&iron_dataset(), &settings).unwrap();
    let index = model.index();

    let plate_out = model.bounds()[index.output("Desc_IronPlate_C").unwrap().index()];
    assert!(plate_out.is_fixed());
    assert_eq!(plate_out.lower, 20.0);

    let ingot_in = model.bounds()[index.input("Desc_IronIngot_C").unwrap().index()];
    assert_eq!(ingot_in.lower, 5.0);
    assert!(ingot_in.is_fixed());

    let ore_in = model.bounds()[index.input("Desc_OreIron_C").unwrap().index()];
    assert_eq!((ore_in.lower, ore_in.upper), (0.0, 0.0));

    let ingot_out = model.bounds()[index.output("Desc_IronIngot_C").unwrap().index()];
    assert!(!ingot_out.is_fixed());
}

#[test]
fn test_resource_caps_are_inequalities() {
    let model = compile(&iron_dataset(), &plate_settings()).unwrap();

    let cap = model
        .constraints()
        .find(|c| c.label == "cap[Desc_OreIron_C]")
        .expect("missing resource cap");
    assert_eq!(cap.op, Comparison::Le);
    assert_eq!(cap.rhs, 300.0);
}

#[test]
fn test_balance_rows_use_per_minute_rates() {
    let model = compile(&iron_dataset(), &plate_settings()).unwrap();
    let index = model.index();
    let press = index.recipe("Recipe_IronPlate_C").unwrap();

    let produce = model
        .constraints()
        .find(|c| c.label == "produce[Desc_IronPlate_C]")
        .unwrap();
    assert_eq!(produce.lhs.coefficient(press), 20.0);

    let consume = model
        .constraints()
        .find(|c| c.label == "consume[Desc_IronIngot_C]")
        .unwrap();
    assert_eq!(consume.lhs.coefficient(press), 30.0);

    // raw resources are never produced
    assert!(model
        .constraints()
        .all(|c| c.label != "produce[Desc_OreIron_C]"));
}

#[test]
fn test_weighted_objective() {
    let model = compile(&iron_dataset(), &plate_settings()).unwrap();
    let index = model.index();
    let objective = model.objective();

    assert_eq!(objective.coefficient(index.aggregate(Aggregate::PowerUse)), 0.1);
    assert_eq!(objective.coefficient(index.aggregate(Aggregate::ItemUse)), 0.3);
    assert_eq!(objective.coefficient(index.aggregate(Aggregate::BuildingUse)), 0.0);
    assert_eq!(objective.coefficient(index.aggregate(Aggregate::ResourcesScaled)), 1.0);
}

#[test]
fn test_max_item_objective_drops_fixed_output() {
    let settings = plate_settings().maximize(MaxItem::Item("Desc_IronPlate_C".to_string()));
    let model = compile(&iron_dataset(), &settings).unwrap();
    let index = model.index();
    let plate_out = index.output("Desc_IronPlate_C").unwrap();

    assert!(!model.bounds()[plate_out.index()].is_fixed());
    assert_eq!(model.objective().coefficient(plate_out), -99_999.0);
    assert_eq!(model.objective().coefficient(index.aggregate(Aggregate::ItemUse)), 0.0);
}

#[test]
fn test_sink_points_objective() {
    let settings = plate_settings().maximize(MaxItem::SinkPoints);
    let model = compile(&iron_dataset(), &settings).unwrap();
    let index = model.index();
    let points = index.aggregate(Aggregate::SinkPoints);

    assert_eq!(model.objective().coefficient(points), -1.0);
    let definition = model.constraints().find(|c| c.label == "sink_points").unwrap();
    assert_eq!(
        definition.lhs.coefficient(index.output("Desc_IronPlate_C").unwrap()),
        6.0
    );
    assert_eq!(definition.lhs.coefficient(index.output("Desc_OreIron_C").unwrap()), 0.0);
}

#[test]
fn test_disabled_recipes_are_pinned_to_zero() {
    let settings = plate_settings().recipe_off("Recipe_IngotIron_C");
    let model = compile(&iron_dataset(), &settings).unwrap();
    let smelt = model.index().recipe("Recipe_IngotIron_C").unwrap();

    let bounds = model.bounds()[smelt.index()];
    assert_eq!((bounds.lower, bounds.upper), (0.0, 0.0));
}

#[test]
fn test_unknown_output_is_rejected() {
    let (kind, key) = reference_error(plate_settings().output("Desc_Ghost_C", 1.0));
    assert_eq!(kind, ReferenceKind::Output);
    assert_eq!(key, "Desc_Ghost_C");
}

#[test]
fn test_unknown_input_is_rejected() {
    let (kind, _) = reference_error(plate_settings().input("Desc_Ghost_C", 1.0));
    assert_eq!(kind, ReferenceKind::Input);
}

#[test]
fn test_unknown_resource_limit_is_rejected() {
    let (kind, _) = reference_error(plate_settings().limit("Desc_Ghost_C", 1.0));
    assert_eq!(kind, ReferenceKind::ResourceLimit);
}

#[test]
fn test_unknown_recipe_toggle_is_rejected() {
    let (kind, key) = reference_error(plate_settings().recipe_off("Recipe_Ghost_C"));
    assert_eq!(kind, ReferenceKind::Recipe);
    assert_eq!(key, "Recipe_Ghost_C");
}

#[test]
fn test_unknown_max_item_is_rejected() {
    let (kind, _) = reference_error(plate_settings().maximize(MaxItem::Item("Desc_Ghost_C".into())));
    assert_eq!(kind, ReferenceKind::MaxItem);
}

#[test]
fn test_unknown_power_share_is_rejected() {
    let mut settings = plate_settings();
    settings.power_shares.insert("Power_Produced_Ghost".to_string(), 0.5);
    let (kind, _) = reference_error(settings);
    assert_eq!(kind, ReferenceKind::PowerShare);
}

#[test]
fn test_recipe_with_unknown_item_is_rejected() {
    let dataset = iron_dataset().with_recipe(
        "Recipe_Ghost_C",
        Recipe::new("Ghost", 1.0).product("Desc_Ghost_C", 1.0),
    );
    let err = compile(&dataset, &plate_settings()).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownReference { kind: ReferenceKind::RecipeItem, .. }
    ));
}

#[test]
fn test_zero_time_recipe_is_rejected() {
    let dataset = iron_dataset().with_recipe(
        "Recipe_Instant_C",
        Recipe::new("Instant", 0.0).product("Desc_IronPlate_C", 1.0),
    );
    let err = compile(&dataset, &plate_settings()).unwrap_err();
    assert!(matches!(err, Error::InvalidRecipe { ref recipe, .. } if recipe == "Recipe_Instant_C"));
}

fn nuclear_dataset() -> Dataset {
    Dataset::new()
        .with_resource("Desc_OreUranium_C", Item::solid("Uranium"))
        .with_item("Desc_NuclearFuelRod_C", Item::solid("Uranium Fuel Rod"))
        .with_item("Desc_NuclearWaste_C", Item::solid("Uranium Waste"))
        .with_item("Desc_PlutoniumFuelRod_C", Item::solid("Plutonium Fuel Rod"))
        .with_recipe(
            "Recipe_NuclearFuelRod_C",
            Recipe::new("Uranium Fuel Rod", 60.0)
                .ingredient("Desc_OreUranium_C", 10.0)
                .product("Desc_NuclearFuelRod_C", 1.0),
        )
        .with_recipe(
            "Recipe_Burn_C",
            Recipe::new("Burn Rod", 60.0)
                .ingredient("Desc_NuclearFuelRod_C", 1.0)
                .product("Desc_NuclearWaste_C", 50.0),
        )
        .with_recipe(
            "Recipe_PlutoniumFuelRod_C",
            Recipe::new("Plutonium Fuel Rod", 60.0)
                .ingredient("Desc_NuclearWaste_C", 100.0)
                .product("Desc_PlutoniumFuelRod_C", 1.0),
        )
}

#[test]
fn test_waste_output_is_penalized_by_weight() {
    let settings = Settings::new().limit("Desc_OreUranium_C", 100.0).weights(Weights::recommended());
    let model = compile(&nuclear_dataset(), &settings).unwrap();
    let index = model.index();

    let waste = index.output("Desc_NuclearWaste_C").unwrap();
    assert_eq!(model.objective().coefficient(waste), settings.weights.waste);
    let rod = index.output("Desc_PlutoniumFuelRod_C").unwrap();
    assert_eq!(model.objective().coefficient(rod), 0.0);
}

#[test]
fn test_waste_penalty_applies_when_maximizing() {
    let settings = Settings::new()
        .limit("Desc_OreUranium_C", 100.0)
        .weights(Weights::recommended())
        .maximize(MaxItem::Item("Desc_NuclearFuelRod_C".to_string()));
    let model = compile(&nuclear_dataset(), &settings).unwrap();

    let waste = model.index().output("Desc_NuclearWaste_C").unwrap();
    assert_eq!(model.objective().coefficient(waste), 999_999.0);
}

#[test]
fn test_fuel_rods_count_as_partial_waste() {
    let mut checked = Settings::new().limit("Desc_OreUranium_C", 100.0).weights(Weights::recommended());
    checked.penalize_fuel_rods = true;
    let model = compile(&nuclear_dataset(), &checked).unwrap();
    let rod = model.index().output("Desc_PlutoniumFuelRod_C").unwrap();
    assert!((model.objective().coefficient(rod) - 0.1 * 999_999.0).abs() < 1e-6);

    let legacy = Settings::new()
        .limit("Desc_OreUranium_C", 100.0)
        .weights(Weights::recommended())
        .profile(ModelProfile::legacy());
    let model = compile(&nuclear_dataset(), &legacy).unwrap();
    let rod = model.index().output("Desc_PlutoniumFuelRod_C").unwrap();
    assert!((model.objective().coefficient(rod) - 0.1 * 999_999.0).abs() < 1e-6);
}
