//! Power facts.
//!
//! Every building with power attached owns an `FGPowerInfoComponent`. The
//! component records what the building produces or draws. Its circuit is
//! found through the building's `FGPowerConnectionComponent`s, which power
//! circuits list as members.

use sb_core::world::NO_CIRCUIT;
use sb_core::{GameObject, World};
use tracing::{debug, trace};

use crate::registry::{PowerLabels, PowerSeries, Registry};

/// Type-path suffix of power info components.
pub const POWER_INFO_SUFFIX: &str = "FGPowerInfoComponent";
/// Type path of power connection components.
pub const POWER_CONNECTION_TYPE: &str = "/Script/FactoryGame.FGPowerConnectionComponent";
/// Float property holding a generator's current output.
pub const DYNAMIC_PRODUCTION_PROPERTY: &str = "mDynamicProductionCapacity";
/// Float property holding a consumer's current draw.
pub const TARGET_CONSUMPTION_PROPERTY: &str = "mTargetConsumption";
/// Value of the `potential` label on every fact.
pub const POTENTIAL: &str = "hi";

const BIOMASS_GENERATOR: &str = "Biomass Generator";
const FUEL_GENERATOR: &str = "Fuel Generator";

/// One labeled power reading, in megawatts.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerFact {
    /// The series the reading belongs to.
    pub series: PowerSeries,
    /// Identifies the building.
    pub labels: PowerLabels,
    /// The reading.
    pub value_mw: f64,
}

/// Human-readable name for a building's simple type. Unknown types pass
/// through unchanged.
pub fn human_building_type(simple_type: &str) -> &str {
    match simple_type {
        "Build_GeneratorIntegratedBiomass_C" => BIOMASS_GENERATOR,
        "Build_GeneratorFuel_C" => FUEL_GENERATOR,
        other => other,
    }
}

/// Whether a human building type names a generator.
pub fn is_generator(building_type: &str) -> bool {
    matches!(building_type, BIOMASS_GENERATOR | FUEL_GENERATOR)
}

/// The circuit a building is wired into.
///
/// Walks the building's components in order and returns the id of the first
/// power connection that belongs to a circuit with an id, or [`NO_CIRCUIT`].
pub fn owning_circuit(world: &World, building: &GameObject) -> i32 {
    building
        .components()
        .iter()
        .filter_map(|component| world.get(&component.path_name))
        .filter(|component| component.type_path() == POWER_CONNECTION_TYPE)
        .map(|connection| world.circuit_id(connection.instance_name()))
        .find(|&id| id != NO_CIRCUIT)
        .unwrap_or(NO_CIRCUIT)
}

/// Derive every power fact in the world, in document order.
///
/// Power info components whose owning building cannot be resolved are
/// skipped.
pub fn derive_power_facts(world: &World) -> Vec<PowerFact> {
    world
        .objects()
        .filter(|entity| entity.type_path().ends_with(POWER_INFO_SUFFIX))
        .filter_map(|info| power_fact(world, info))
        .collect()
}

fn power_fact(world: &World, info: &GameObject) -> Option<PowerFact> {
    let Some(building) = world.get(info.parent_entity_name()) else {
        trace!(
            component = info.instance_name(),
            parent = info.parent_entity_name(),
            "power info component has no resolvable owner"
        );
        return None;
    };

    let building_type = human_building_type(building.simple_type());
    let labels = PowerLabels {
        circuit: owning_circuit(world, building).to_string(),
        building_id: building.instance().to_owned(),
        building_type: building_type.to_owned(),
        building_name: building_type.to_owned(),
        potential: POTENTIAL.to_owned(),
    };

    let properties = info.properties();
    if is_generator(building_type) {
        let value_mw = properties
            .float(DYNAMIC_PRODUCTION_PROPERTY)
            .map_or(0.0, |p| p.value);
        return Some(PowerFact {
            series: PowerSeries::Generation,
            labels,
            value_mw,
        });
    }

    properties
        .float(TARGET_CONSUMPTION_PROPERTY)
        .map(|p| PowerFact {
            series: PowerSeries::Consumption,
            labels,
            value_mw: p.value,
        })
}

/// Derive the world's power facts and publish them, replacing whatever the
/// registry held before. Returns the number of facts derived.
pub fn update_power_metrics(world: &World, registry: &Registry) -> usize {
    let facts = derive_power_facts(world);
    let count = facts.len();
    registry.replace(facts);
    debug!(facts = count, "updated power metrics");
    count
}
