//! Collaborator stubs shared by the integration tests.
//!
//! Each stub publishes the quantities a real sibling model would (zone air
//! node, outdoor climate, window radiation summation, internal loads,
//! surface heating) through the same model contract the engine uses, so the
//! tests exercise the full declare/resolve/update path.

#![allow(dead_code)]

use std::collections::BTreeSet;

use wallflux::error::{SetupError, UpdateError};
use wallflux::model::{ActiveLayerSource, EntityKind, Model, ObjectId, StateDependency};
use wallflux::quantity::{QuantityArena, QuantityDescription, ValueRef, VectorQuantity};
use wallflux::sim::names;

/// Room air node publishing a settable `AirTemperature`.
pub struct ZoneModel {
    id: ObjectId,
    air_temperature: ValueRef,
}

impl ZoneModel {
    pub fn new(arena: &mut QuantityArena, id: ObjectId, temperature: f64) -> Self {
        Self {
            id,
            air_temperature: arena.alloc_scalar(temperature),
        }
    }

    pub fn set_temperature(&self, arena: &mut QuantityArena, temperature: f64) {
        arena.set(self.air_temperature, temperature);
    }
}

impl Model for ZoneModel {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Zone
    }
    fn display_name(&self) -> &str {
        "zone"
    }
    fn result_descriptions(&self) -> Vec<QuantityDescription> {
        vec![QuantityDescription::scalar(
            names::AIR_TEMPERATURE,
            "K",
            "Zone air temperature",
        )]
    }
    fn result_value_ref(&self, name: &str, _index: Option<u32>) -> Option<ValueRef> {
        (name == names::AIR_TEMPERATURE).then_some(self.air_temperature)
    }
}

impl StateDependency for ZoneModel {
    fn set_input_value_refs(&mut self, _refs: &[Option<ValueRef>]) -> Result<(), SetupError> {
        Ok(())
    }
    fn update(&mut self, _arena: &mut QuantityArena) -> Result<(), UpdateError> {
        Ok(())
    }
}

/// Outdoor climate provider: ambient temperature plus per-construction
/// short-wave and long-wave radiation intensities on the outside planes.
pub struct LocationModel {
    temperature: ValueRef,
    sw_on_plane: VectorQuantity,
    lw_on_plane: VectorQuantity,
}

impl LocationModel {
    pub fn new(arena: &mut QuantityArena, temperature: f64, construction_ids: &[ObjectId]) -> Self {
        let keys: BTreeSet<u32> = construction_ids.iter().copied().collect();
        let sw = arena.alloc_vector(keys.len(), 0.0);
        let lw = arena.alloc_vector(keys.len(), 0.0);
        Self {
            temperature: arena.alloc_scalar(temperature),
            sw_on_plane: VectorQuantity::with_keys(sw, &keys),
            lw_on_plane: VectorQuantity::with_keys(lw, &keys),
        }
    }

    pub fn set_temperature(&self, arena: &mut QuantityArena, temperature: f64) {
        arena.set(self.temperature, temperature);
    }

    pub fn set_sw_on_plane(&self, arena: &mut QuantityArena, construction_id: ObjectId, value: f64) {
        let r = self.sw_on_plane.value_ref(construction_id).unwrap();
        arena.set(r, value);
    }

    pub fn set_lw_on_plane(&self, arena: &mut QuantityArena, construction_id: ObjectId, value: f64) {
        let r = self.lw_on_plane.value_ref(construction_id).unwrap();
        arena.set(r, value);
    }
}

impl Model for LocationModel {
    fn id(&self) -> ObjectId {
        0
    }
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Location
    }
    fn display_name(&self) -> &str {
        "location"
    }
    fn result_descriptions(&self) -> Vec<QuantityDescription> {
        vec![
            QuantityDescription::scalar(names::TEMPERATURE, "K", "Ambient air temperature"),
            QuantityDescription::vector(
                names::SW_RAD_ON_PLANE,
                "W/m2",
                "Short-wave intensity on the outside surface planes",
                self.sw_on_plane.keys(),
            ),
            QuantityDescription::vector(
                names::LW_RAD_ON_PLANE,
                "W/m2",
                "Long-wave counter-radiation on the outside surface planes",
                self.lw_on_plane.keys(),
            ),
        ]
    }
    fn result_value_ref(&self, name: &str, index: Option<u32>) -> Option<ValueRef> {
        match name {
            names::TEMPERATURE => Some(self.temperature),
            names::SW_RAD_ON_PLANE => match index {
                None => Some(self.sw_on_plane.base()),
                Some(k) => self.sw_on_plane.value_ref(k),
            },
            names::LW_RAD_ON_PLANE => match index {
                None => Some(self.lw_on_plane.base()),
                Some(k) => self.lw_on_plane.value_ref(k),
            },
            _ => None,
        }
    }
}

impl StateDependency for LocationModel {
    fn set_input_value_refs(&mut self, _refs: &[Option<ValueRef>]) -> Result<(), SetupError> {
        Ok(())
    }
    fn update(&mut self, _arena: &mut QuantityArena) -> Result<(), UpdateError> {
        Ok(())
    }
}

/// Per-zone radiation summation collaborator.
pub struct WindowRadiationModel {
    zone_id: ObjectId,
    flux_sum: ValueRef,
}

impl WindowRadiationModel {
    pub fn new(arena: &mut QuantityArena, zone_id: ObjectId, watts: f64) -> Self {
        Self {
            zone_id,
            flux_sum: arena.alloc_scalar(watts),
        }
    }
}

impl Model for WindowRadiationModel {
    fn id(&self) -> ObjectId {
        self.zone_id
    }
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Zone
    }
    fn display_name(&self) -> &str {
        "window radiation"
    }
    fn result_descriptions(&self) -> Vec<QuantityDescription> {
        vec![QuantityDescription::scalar(
            names::WINDOW_SOLAR_RADIATION_FLUX_SUM,
            "W",
            "Solar radiation entering the zone through windows",
        )]
    }
    fn result_value_ref(&self, name: &str, _index: Option<u32>) -> Option<ValueRef> {
        (name == names::WINDOW_SOLAR_RADIATION_FLUX_SUM).then_some(self.flux_sum)
    }
}

impl StateDependency for WindowRadiationModel {
    fn set_input_value_refs(&mut self, _refs: &[Option<ValueRef>]) -> Result<(), SetupError> {
        Ok(())
    }
    fn update(&mut self, _arena: &mut QuantityArena) -> Result<(), UpdateError> {
        Ok(())
    }
}

/// Internal-loads collaborator publishing the three radiant heat load sums
/// of one zone.
pub struct InternalLoadsModel {
    zone_id: ObjectId,
    equipment: ValueRef,
    person: ValueRef,
    lighting: ValueRef,
}

impl InternalLoadsModel {
    pub fn new(
        arena: &mut QuantityArena,
        zone_id: ObjectId,
        equipment: f64,
        person: f64,
        lighting: f64,
    ) -> Self {
        Self {
            zone_id,
            equipment: arena.alloc_scalar(equipment),
            person: arena.alloc_scalar(person),
            lighting: arena.alloc_scalar(lighting),
        }
    }
}

impl Model for InternalLoadsModel {
    fn id(&self) -> ObjectId {
        self.zone_id
    }
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Zone
    }
    fn display_name(&self) -> &str {
        "internal loads"
    }
    fn result_descriptions(&self) -> Vec<QuantityDescription> {
        vec![
            QuantityDescription::scalar(names::RADIANT_EQUIPMENT_HEAT_LOAD, "W", "Equipment"),
            QuantityDescription::scalar(names::RADIANT_PERSON_HEAT_LOAD, "W", "Persons"),
            QuantityDescription::scalar(names::RADIANT_LIGHTING_HEAT_LOAD, "W", "Lighting"),
        ]
    }
    fn result_value_ref(&self, name: &str, _index: Option<u32>) -> Option<ValueRef> {
        match name {
            names::RADIANT_EQUIPMENT_HEAT_LOAD => Some(self.equipment),
            names::RADIANT_PERSON_HEAT_LOAD => Some(self.person),
            names::RADIANT_LIGHTING_HEAT_LOAD => Some(self.lighting),
            _ => None,
        }
    }
}

impl StateDependency for InternalLoadsModel {
    fn set_input_value_refs(&mut self, _refs: &[Option<ValueRef>]) -> Result<(), SetupError> {
        Ok(())
    }
    fn update(&mut self, _arena: &mut QuantityArena) -> Result<(), UpdateError> {
        Ok(())
    }
}

/// Ideal surface heating system feeding one construction's active layer.
pub struct SurfaceHeatingModel {
    id: ObjectId,
    construction_id: ObjectId,
    load: ValueRef,
}

impl SurfaceHeatingModel {
    pub fn new(
        arena: &mut QuantityArena,
        id: ObjectId,
        construction_id: ObjectId,
        watts: f64,
    ) -> Self {
        Self {
            id,
            construction_id,
            load: arena.alloc_scalar(watts),
        }
    }

    pub fn set_load(&self, arena: &mut QuantityArena, watts: f64) {
        arena.set(self.load, watts);
    }
}

impl ActiveLayerSource for SurfaceHeatingModel {
    fn serves_construction(&self, construction_id: ObjectId) -> bool {
        construction_id == self.construction_id
    }
}

impl Model for SurfaceHeatingModel {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Model
    }
    fn display_name(&self) -> &str {
        "surface heating"
    }
    fn result_descriptions(&self) -> Vec<QuantityDescription> {
        vec![QuantityDescription::scalar(
            names::ACTIVE_LAYER_THERMAL_LOAD,
            "W",
            "Heat load delivered to the active layer",
        )]
    }
    fn result_value_ref(&self, name: &str, _index: Option<u32>) -> Option<ValueRef> {
        (name == names::ACTIVE_LAYER_THERMAL_LOAD).then_some(self.load)
    }
    fn as_active_layer_source(&self) -> Option<&dyn ActiveLayerSource> {
        Some(self)
    }
}

impl StateDependency for SurfaceHeatingModel {
    fn set_input_value_refs(&mut self, _refs: &[Option<ValueRef>]) -> Result<(), SetupError> {
        Ok(())
    }
    fn update(&mut self, _arena: &mut QuantityArena) -> Result<(), UpdateError> {
        Ok(())
    }
}
