//! Setup-time resolution scenarios: duplicate providers, missing required
//! inputs, optional references and indexed vector lookups, all driven
//! through the full connect() path.

mod common;

use common::{
    InternalLoadsModel, LocationModel, SurfaceHeatingModel, WindowRadiationModel, ZoneModel,
};
use wallflux::error::SetupError;
use wallflux::graph::{connect, ModelGraph};
use wallflux::model::{Model, StateDependency, PRIORITY_HEAD, PRIORITY_OFFSET_TAIL};
use wallflux::quantity::QuantityArena;
use wallflux::sim::balance::{ConstructionBalanceModel, ZoneCouplingArea};
use wallflux::sim::construction::{ConstructionInstance, Interface, Material, MaterialLayer};
use wallflux::sim::mesh::DiscretizationOptions;
use wallflux::sim::names;
use wallflux::sim::states::{ConstructionStatesModel, SurfaceExtrapolation};

const T0: f64 = 293.15;

fn opts() -> DiscretizationOptions {
    DiscretizationOptions {
        stretch: 0.0,
        min_dx: 2e-3,
        max_elements_per_layer: 30,
    }
}

fn zone_wall(id: u32, zone_id: u32) -> ConstructionInstance {
    let material = Material::new(1.0, 1000.0, 1000.0);
    let mut con = ConstructionInstance::new(
        id,
        "wall",
        10.0,
        vec![MaterialLayer::new(material, 0.2)],
    );
    con.interface_b = Interface::to_zone(zone_id, 8.0);
    con
}

fn states_and_balance(
    arena: &mut QuantityArena,
    con: ConstructionInstance,
    zone_areas: &[ZoneCouplingArea],
) -> (ConstructionStatesModel, ConstructionBalanceModel) {
    let states = ConstructionStatesModel::setup(
        arena,
        con.clone(),
        &opts(),
        SurfaceExtrapolation::Linear,
        T0,
        &[],
        &[],
    )
    .unwrap();
    let mesh = states.mesh().clone();
    let balance =
        ConstructionBalanceModel::setup(arena, con, mesh, zone_areas, &[], &[]).unwrap();
    (states, balance)
}

#[test]
fn test_duplicate_radiant_load_provider_fails_setup() {
    let mut arena = QuantityArena::new();
    let zone = ZoneModel::new(&mut arena, 1, T0);
    // two internal-loads models publish the same radiant sums for zone 1
    let loads_1 = InternalLoadsModel::new(&mut arena, 1, 100.0, 0.0, 0.0);
    let loads_2 = InternalLoadsModel::new(&mut arena, 1, 50.0, 0.0, 0.0);

    let (states, balance) = states_and_balance(
        &mut arena,
        zone_wall(1, 1),
        &[ZoneCouplingArea {
            zone_id: 1,
            opaque_area: 20.0,
        }],
    );
    let mut models: Vec<Box<dyn StateDependency>> = vec![
        Box::new(zone),
        Box::new(loads_1),
        Box::new(loads_2),
        Box::new(states),
        Box::new(balance),
    ];

    let err = connect(&mut models).unwrap_err();
    match err {
        SetupError::DuplicateProvider {
            name, providers, ..
        } => {
            assert_eq!(name, names::RADIANT_EQUIPMENT_HEAT_LOAD);
            assert_eq!(providers.len(), 2);
        }
        other => panic!("Expected duplicate-provider error, got {other}"),
    }
}

#[test]
fn test_missing_zone_temperature_fails_setup() {
    let mut arena = QuantityArena::new();
    // the wall faces zone 99 but no zone model exists
    let (states, balance) = states_and_balance(&mut arena, zone_wall(2, 99), &[]);
    let mut models: Vec<Box<dyn StateDependency>> =
        vec![Box::new(states), Box::new(balance)];

    let err = connect(&mut models).unwrap_err();
    match err {
        SetupError::MissingInput { name, id, .. } => {
            assert_eq!(name, names::AIR_TEMPERATURE);
            assert_eq!(id, 99);
        }
        other => panic!("Expected missing-input error, got {other}"),
    }
}

#[test]
fn test_unmet_optional_references_resolve_to_none() {
    let mut arena = QuantityArena::new();
    let zone = ZoneModel::new(&mut arena, 1, T0);
    // no window radiation and no internal loads model anywhere
    let (states, balance) = states_and_balance(&mut arena, zone_wall(3, 1), &[]);
    let sw_flux = balance
        .result_value_ref(names::FLUX_SHORT_WAVE_RADIATION_B, None)
        .unwrap();
    let y_ref = states.y_ref();
    let n = states.n_states();

    let mut models: Vec<Box<dyn StateDependency>> =
        vec![Box::new(zone), Box::new(states), Box::new(balance)];
    connect(&mut models).unwrap();

    let graph = ModelGraph::new(&models);
    for i in 0..n {
        arena.set(y_ref.offset(i), 1.0e6 * T0);
    }
    graph.update_all(&mut models, &mut arena).unwrap();

    // the optional couplings contribute nothing
    assert_eq!(arena.get(sw_flux), 0.0);
}

#[test]
fn test_window_solar_resolves_and_splits() {
    let mut arena = QuantityArena::new();
    let zone = ZoneModel::new(&mut arena, 1, T0);
    let window = WindowRadiationModel::new(&mut arena, 1, 200.0);
    let (states, balance) = states_and_balance(
        &mut arena,
        zone_wall(4, 1),
        &[ZoneCouplingArea {
            zone_id: 1,
            opaque_area: 40.0,
        }],
    );
    let sw_flux = balance
        .result_value_ref(names::FLUX_SHORT_WAVE_RADIATION_B, None)
        .unwrap();
    let y_ref = states.y_ref();
    let n = states.n_states();

    let mut models: Vec<Box<dyn StateDependency>> = vec![
        Box::new(zone),
        Box::new(window),
        Box::new(states),
        Box::new(balance),
    ];
    connect(&mut models).unwrap();

    let graph = ModelGraph::new(&models);
    for i in 0..n {
        arena.set(y_ref.offset(i), 1.0e6 * T0);
    }
    graph.update_all(&mut models, &mut arena).unwrap();

    // area fraction 10/40 of the 200 W window gain
    assert!((arena.get(sw_flux) - 50.0).abs() < 1e-9);
}

#[test]
fn test_indexed_vector_lookup_outside_key_set_is_missing() {
    let mut arena = QuantityArena::new();
    // climate publishes radiation planes for construction 7 only
    let location = LocationModel::new(&mut arena, 273.15, &[7]);
    let zone = ZoneModel::new(&mut arena, 1, T0);

    let material = Material::new(1.0, 1000.0, 1000.0);
    let mut con = ConstructionInstance::new(
        5,
        "wall",
        10.0,
        vec![MaterialLayer::new(material, 0.2)],
    );
    con.interface_a = Interface::exterior(25.0).with_solar_absorption(0.5);
    con.interface_b = Interface::to_zone(1, 8.0);
    let (states, balance) = states_and_balance(&mut arena, con, &[]);

    let mut models: Vec<Box<dyn StateDependency>> = vec![
        Box::new(location),
        Box::new(zone),
        Box::new(states),
        Box::new(balance),
    ];

    // the required SWRadOnPlane[5] lookup finds no entry for key 5
    let err = connect(&mut models).unwrap_err();
    match err {
        SetupError::MissingInput { name, .. } => {
            assert_eq!(name, names::SW_RAD_ON_PLANE);
        }
        other => panic!("Expected missing-input error, got {other}"),
    }
}

#[test]
fn test_two_active_layer_sources_fail_setup() {
    let mut arena = QuantityArena::new();
    let heating_1 = SurfaceHeatingModel::new(&mut arena, 30, 6, 500.0);
    let heating_2 = SurfaceHeatingModel::new(&mut arena, 31, 6, 250.0);

    let mut con = zone_wall(6, 1);
    con.active_layer = Some(0);
    let zone = ZoneModel::new(&mut arena, 1, T0);
    let (states, balance) = states_and_balance(&mut arena, con, &[]);

    let mut models: Vec<Box<dyn StateDependency>> = vec![
        Box::new(zone),
        Box::new(heating_1),
        Box::new(heating_2),
        Box::new(states),
        Box::new(balance),
    ];
    let err = connect(&mut models).unwrap_err();
    assert!(matches!(
        err,
        SetupError::DoubleActiveLayerClaim {
            construction_id: 6,
            ..
        }
    ));
}

#[test]
fn test_evaluation_order_and_dependency_pairs() {
    let mut arena = QuantityArena::new();
    let zone = ZoneModel::new(&mut arena, 1, T0);
    let (states, balance) = states_and_balance(&mut arena, zone_wall(8, 1), &[]);

    let mut models: Vec<Box<dyn StateDependency>> =
        vec![Box::new(balance), Box::new(zone), Box::new(states)];
    connect(&mut models).unwrap();
    let graph = ModelGraph::new(&models);

    // head (states, index 2) before default (zone, 1) before tail
    // (balance, 0), regardless of registration order
    assert_eq!(graph.order(), &[2, 1, 0]);
    assert!(models[2].priority() == PRIORITY_HEAD);
    assert!(models[0].priority() > PRIORITY_OFFSET_TAIL);

    // the collected pair list covers the construction's coupling structure
    let pairs = graph.dependency_pairs(&models);
    assert!(!pairs.is_empty());
}
