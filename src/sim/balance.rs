//! Construction balance model: boundary fluxes and divergence assembly.
//!
//! Runs last in the evaluation order (tail priority). Consumes the states
//! model's surface temperatures and internal conduction fluxes together with
//! ambient/zone temperatures, radiation sums, internal-load radiant
//! fractions and an optional active-layer heat source, and assembles the
//! per-element time derivatives the outer integrator consumes.
//!
//! Sign convention for every published boundary flux: positive means
//! flowing into the construction from that side.

use crate::error::{SetupError, UpdateError};
use crate::model::{
    EntityKind, InputReference, Model, ObjectId, StateDependency, PRIORITY_OFFSET_TAIL,
};
use crate::quantity::{
    DependencyPair, QuantityArena, QuantityDescription, ValueRef, VectorQuantity,
};
use crate::sim::construction::{ConstructionInstance, Interface};
use crate::sim::mesh::Mesh;
use crate::sim::names;

/// Total opaque absorption area of one zone, in m².
///
/// Static configuration supplied at setup; used to split zone-level radiant
/// gains between the zone's opaque surfaces by area fraction.
#[derive(Clone, Copy, Debug)]
pub struct ZoneCouplingArea {
    pub zone_id: ObjectId,
    pub opaque_area: f64,
}

/// Which of the two construction sides an input slot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    A,
    B,
}

/// Destination of one declared input reference inside the balance model.
///
/// Built alongside the declared reference list so the resolved handles can
/// be routed back without re-matching names.
#[derive(Clone, Copy, Debug)]
enum Slot {
    SurfaceTemperature(Side),
    ConductionFluxes,
    EnvironmentTemperature(Side),
    ShortWaveOnPlane(Side),
    LongWaveBalance(Side),
    OwnEmittedFlux(Side),
    NeighborEmitted(Side),
    WindowSolar(Side),
    RadiantLoad(Side),
    ActiveLayerLoad,
}

/// Resolved handles, populated once by `set_input_value_refs`.
#[derive(Default)]
struct ResolvedInputs {
    ts_a: Option<ValueRef>,
    ts_b: Option<ValueRef>,
    /// Base of the states model's conduction flux vector, size n + 1.
    fluxes: Option<ValueRef>,
    env_temperature_a: Option<ValueRef>,
    env_temperature_b: Option<ValueRef>,
    sw_on_plane_a: Option<ValueRef>,
    sw_on_plane_b: Option<ValueRef>,
    lw_balance_a: Option<ValueRef>,
    lw_balance_b: Option<ValueRef>,
    own_emitted_flux_a: Option<ValueRef>,
    own_emitted_flux_b: Option<ValueRef>,
    neighbor_emitted_a: Vec<ValueRef>,
    neighbor_emitted_b: Vec<ValueRef>,
    window_solar_a: Option<ValueRef>,
    window_solar_b: Option<ValueRef>,
    radiant_loads_a: Vec<ValueRef>,
    radiant_loads_b: Vec<ValueRef>,
    active_layer_load: Option<ValueRef>,
}

/// Balance model of one construction instance.
pub struct ConstructionBalanceModel {
    con: ConstructionInstance,
    mesh: Mesh,

    /// Reciprocal zone opaque absorption area per zone-facing side, for
    /// area-fraction splits of zone-level radiant gains.
    inv_zone_area_a: Option<f64>,
    inv_zone_area_b: Option<f64>,

    /// Visible neighbor surfaces per side, for interior long-wave exchange.
    neighbors_a: Vec<ObjectId>,
    neighbors_b: Vec<ObjectId>,

    declared: Vec<InputReference>,
    slots: Vec<Slot>,
    inputs: ResolvedInputs,
    active_layer_source: Option<ObjectId>,

    /// Divergence scratch in W/m², reused every update.
    raw: Vec<f64>,

    ydot: VectorQuantity,
    flux_heat_conduction_a: ValueRef,
    flux_heat_conduction_b: ValueRef,
    flux_short_wave_a: ValueRef,
    flux_short_wave_b: ValueRef,
    flux_long_wave_a: ValueRef,
    flux_long_wave_b: ValueRef,
    /// Heat load per material layer in W; only the active layer's entry is
    /// ever non-zero.
    thermal_load: VectorQuantity,
}

impl ConstructionBalanceModel {
    /// Publishes the result quantities and fixes the static coupling
    /// configuration. `mesh` must be the same discretization the states
    /// model of this construction runs on.
    pub fn setup(
        arena: &mut QuantityArena,
        con: ConstructionInstance,
        mesh: Mesh,
        zone_areas: &[ZoneCouplingArea],
        neighbors_a: &[ObjectId],
        neighbors_b: &[ObjectId],
    ) -> Result<Self, SetupError> {
        if let Some(layer) = con.active_layer {
            if layer >= con.layers.len() {
                return Err(SetupError::InvalidActiveLayer {
                    construction_id: con.id,
                    layer,
                    layer_count: con.layers.len(),
                });
            }
        }

        let zone_area = |zone_id: ObjectId| {
            zone_areas
                .iter()
                .find(|z| z.zone_id == zone_id)
                .map(|z| z.opaque_area)
        };
        let inv_area = |iface: &Interface| {
            if iface.is_exterior() {
                return None;
            }
            zone_area(iface.zone_id).and_then(|a| (a > 0.0).then(|| 1.0 / a))
        };
        let inv_zone_area_a = inv_area(&con.interface_a);
        let inv_zone_area_b = inv_area(&con.interface_b);

        let n = mesh.len();
        let ydot = VectorQuantity::dense(arena.alloc_vector(n, 0.0), n);
        let thermal_load =
            VectorQuantity::dense(arena.alloc_vector(con.layers.len(), 0.0), con.layers.len());

        Ok(Self {
            flux_heat_conduction_a: arena.alloc_scalar(0.0),
            flux_heat_conduction_b: arena.alloc_scalar(0.0),
            flux_short_wave_a: arena.alloc_scalar(0.0),
            flux_short_wave_b: arena.alloc_scalar(0.0),
            flux_long_wave_a: arena.alloc_scalar(0.0),
            flux_long_wave_b: arena.alloc_scalar(0.0),
            ydot,
            thermal_load,
            raw: vec![0.0; n],
            declared: Vec::new(),
            slots: Vec::new(),
            inputs: ResolvedInputs::default(),
            active_layer_source: None,
            inv_zone_area_a,
            inv_zone_area_b,
            neighbors_a: neighbors_a.to_vec(),
            neighbors_b: neighbors_b.to_vec(),
            mesh,
            con,
        })
    }

    /// Copies the assembled time derivatives into the integrator's vector.
    pub fn ydot(&self, arena: &QuantityArena, ydot: &mut [f64]) {
        assert_eq!(ydot.len(), self.mesh.len(), "Derivative vector size mismatch");
        ydot.copy_from_slice(arena.slice(self.ydot.base(), self.mesh.len()));
    }

    /// Base handle of the published derivative vector.
    pub fn ydot_ref(&self) -> ValueRef {
        self.ydot.base()
    }

    fn declare(&mut self, slot: Slot, reference: InputReference) {
        self.slots.push(slot);
        self.declared.push(reference);
    }

    fn declare_side(&mut self, side: Side) {
        let (iface, own_emitted, own_ts, balance) = match side {
            Side::A => (
                self.con.interface_a.clone(),
                names::EMITTED_LONG_WAVE_RADIATION_FLUX_A,
                names::SURFACE_TEMPERATURE_A,
                names::LONG_WAVE_RADIATION_BALANCE_FLUX_A,
            ),
            Side::B => (
                self.con.interface_b.clone(),
                names::EMITTED_LONG_WAVE_RADIATION_FLUX_B,
                names::SURFACE_TEMPERATURE_B,
                names::LONG_WAVE_RADIATION_BALANCE_FLUX_B,
            ),
        };
        let own = self.con.id;

        if iface.heat_conduction.is_some() {
            self.declare(
                Slot::SurfaceTemperature(side),
                InputReference::required(EntityKind::ConstructionInstance, own, own_ts),
            );
            let env = if iface.is_exterior() {
                InputReference::required(EntityKind::Location, 0, names::TEMPERATURE)
            } else {
                InputReference::required(EntityKind::Zone, iface.zone_id, names::AIR_TEMPERATURE)
            };
            self.declare(Slot::EnvironmentTemperature(side), env);
        }

        if iface.solar_absorption.is_some() && iface.is_exterior() {
            self.declare(
                Slot::ShortWaveOnPlane(side),
                InputReference::required(EntityKind::Location, 0, names::SW_RAD_ON_PLANE)
                    .with_index(own),
            );
        }

        if iface.long_wave_emission.is_some() {
            if iface.is_exterior() {
                self.declare(
                    Slot::LongWaveBalance(side),
                    InputReference::required(EntityKind::ConstructionInstance, own, balance),
                );
            } else {
                self.declare(
                    Slot::OwnEmittedFlux(side),
                    InputReference::required(EntityKind::ConstructionInstance, own, own_emitted),
                );
                // each visible neighbor publishes its emission towards this
                // construction on one of its own sides; both names are
                // probed, at most one resolves
                let neighbors = match side {
                    Side::A => self.neighbors_a.clone(),
                    Side::B => self.neighbors_b.clone(),
                };
                for nb in neighbors {
                    for name in [
                        names::EMITTED_LONG_WAVE_RADIATION_A,
                        names::EMITTED_LONG_WAVE_RADIATION_B,
                    ] {
                        self.declare(
                            Slot::NeighborEmitted(side),
                            InputReference::optional(
                                EntityKind::ConstructionInstance,
                                nb,
                                name,
                            )
                            .with_index(own),
                        );
                    }
                }
            }
        }

        // zone-level radiant gains, split by area fraction
        if !iface.is_exterior() && iface.heat_conduction.is_some() {
            self.declare(
                Slot::WindowSolar(side),
                InputReference::optional(
                    EntityKind::Zone,
                    iface.zone_id,
                    names::WINDOW_SOLAR_RADIATION_FLUX_SUM,
                ),
            );
            for name in [
                names::RADIANT_EQUIPMENT_HEAT_LOAD,
                names::RADIANT_PERSON_HEAT_LOAD,
                names::RADIANT_LIGHTING_HEAT_LOAD,
            ] {
                self.declare(
                    Slot::RadiantLoad(side),
                    InputReference::optional(EntityKind::Zone, iface.zone_id, name),
                );
            }
        }
    }

    /// Side-local zone id for error reporting.
    fn zone_of(&self, side: Side) -> ObjectId {
        match side {
            Side::A => self.con.interface_a.zone_id,
            Side::B => self.con.interface_b.zone_id,
        }
    }

    fn inv_zone_area(&self, side: Side) -> Option<f64> {
        match side {
            Side::A => self.inv_zone_area_a,
            Side::B => self.inv_zone_area_b,
        }
    }
}

fn read(arena: &QuantityArena, r: Option<ValueRef>) -> f64 {
    r.map(|r| arena.get(r)).unwrap_or(0.0)
}

impl Model for ConstructionBalanceModel {
    fn id(&self) -> ObjectId {
        self.con.id
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::ConstructionInstance
    }

    fn display_name(&self) -> &str {
        &self.con.name
    }

    fn result_descriptions(&self) -> Vec<QuantityDescription> {
        vec![
            QuantityDescription::vector(
                names::YDOT,
                "J/m3s",
                "Time derivatives of the conserved energy densities",
                self.ydot.keys(),
            ),
            QuantityDescription::scalar(
                names::FLUX_HEAT_CONDUCTION_A,
                "W",
                "Convective heat flow into the construction across side A",
            ),
            QuantityDescription::scalar(
                names::FLUX_HEAT_CONDUCTION_B,
                "W",
                "Convective heat flow into the construction across side B",
            ),
            QuantityDescription::scalar(
                names::FLUX_SHORT_WAVE_RADIATION_A,
                "W",
                "Absorbed short-wave heat flow at side A",
            ),
            QuantityDescription::scalar(
                names::FLUX_SHORT_WAVE_RADIATION_B,
                "W",
                "Absorbed short-wave heat flow at side B",
            ),
            QuantityDescription::scalar(
                names::FLUX_LONG_WAVE_RADIATION_A,
                "W",
                "Net long-wave heat flow at side A",
            ),
            QuantityDescription::scalar(
                names::FLUX_LONG_WAVE_RADIATION_B,
                "W",
                "Net long-wave heat flow at side B",
            ),
            QuantityDescription::vector(
                names::THERMAL_LOAD,
                "W",
                "Heat load per material layer",
                self.thermal_load.keys(),
            ),
        ]
    }

    fn result_value_ref(&self, name: &str, index: Option<u32>) -> Option<ValueRef> {
        let scalar = match name {
            names::FLUX_HEAT_CONDUCTION_A => Some(self.flux_heat_conduction_a),
            names::FLUX_HEAT_CONDUCTION_B => Some(self.flux_heat_conduction_b),
            names::FLUX_SHORT_WAVE_RADIATION_A => Some(self.flux_short_wave_a),
            names::FLUX_SHORT_WAVE_RADIATION_B => Some(self.flux_short_wave_b),
            names::FLUX_LONG_WAVE_RADIATION_A => Some(self.flux_long_wave_a),
            names::FLUX_LONG_WAVE_RADIATION_B => Some(self.flux_long_wave_b),
            _ => None,
        };
        if scalar.is_some() {
            return scalar;
        }
        let vector = match name {
            names::YDOT => &self.ydot,
            names::THERMAL_LOAD => &self.thermal_load,
            _ => return None,
        };
        match index {
            None => Some(vector.base()),
            Some(k) => vector.value_ref(k),
        }
    }
}

impl StateDependency for ConstructionBalanceModel {
    fn priority(&self) -> i32 {
        // aggregates fluxes from nearly every other model category
        PRIORITY_OFFSET_TAIL + 4
    }

    fn init_input_references(&mut self, all_models: &[&dyn Model]) -> Result<(), SetupError> {
        self.declared.clear();
        self.slots.clear();

        self.declare(
            Slot::ConductionFluxes,
            InputReference::required(
                EntityKind::ConstructionInstance,
                self.con.id,
                names::HEAT_CONDUCTION_FLUXES,
            ),
        );
        self.declare_side(Side::A);
        self.declare_side(Side::B);

        if self.con.active_layer.is_some() {
            // capability scan for the single heat source serving this
            // construction's active layer
            let claimants: Vec<&dyn Model> = all_models
                .iter()
                .copied()
                .filter(|m| {
                    m.as_active_layer_source()
                        .is_some_and(|s| s.serves_construction(self.con.id))
                })
                .collect();
            if claimants.len() > 1 {
                return Err(SetupError::DoubleActiveLayerClaim {
                    construction_id: self.con.id,
                    claimants: claimants.iter().map(|m| m.id()).collect(),
                });
            }
            if let Some(source) = claimants.first() {
                self.active_layer_source = Some(source.id());
                self.declare(
                    Slot::ActiveLayerLoad,
                    InputReference::required(
                        source.entity_kind(),
                        source.id(),
                        names::ACTIVE_LAYER_THERMAL_LOAD,
                    ),
                );
            }
        }
        Ok(())
    }

    fn input_references(&self) -> Vec<InputReference> {
        self.declared.clone()
    }

    fn set_input_value_refs(&mut self, refs: &[Option<ValueRef>]) -> Result<(), SetupError> {
        if refs.len() != self.slots.len() {
            return Err(SetupError::InputCountMismatch {
                model_id: self.con.id,
                declared: self.slots.len(),
                resolved: refs.len(),
            });
        }

        let slots = self.slots.clone();
        let mut inputs = ResolvedInputs::default();
        for (slot, resolved) in slots.iter().zip(refs.iter().copied()) {
            match (slot, resolved) {
                (Slot::SurfaceTemperature(Side::A), r) => inputs.ts_a = r,
                (Slot::SurfaceTemperature(Side::B), r) => inputs.ts_b = r,
                (Slot::ConductionFluxes, r) => inputs.fluxes = r,
                (Slot::EnvironmentTemperature(Side::A), r) => inputs.env_temperature_a = r,
                (Slot::EnvironmentTemperature(Side::B), r) => inputs.env_temperature_b = r,
                (Slot::ShortWaveOnPlane(Side::A), r) => inputs.sw_on_plane_a = r,
                (Slot::ShortWaveOnPlane(Side::B), r) => inputs.sw_on_plane_b = r,
                (Slot::LongWaveBalance(Side::A), r) => inputs.lw_balance_a = r,
                (Slot::LongWaveBalance(Side::B), r) => inputs.lw_balance_b = r,
                (Slot::OwnEmittedFlux(Side::A), r) => inputs.own_emitted_flux_a = r,
                (Slot::OwnEmittedFlux(Side::B), r) => inputs.own_emitted_flux_b = r,
                (Slot::NeighborEmitted(side), Some(r)) => match side {
                    Side::A => inputs.neighbor_emitted_a.push(r),
                    Side::B => inputs.neighbor_emitted_b.push(r),
                },
                (Slot::NeighborEmitted(_), None) => {}
                (Slot::WindowSolar(side), r) => {
                    if r.is_some() && self.inv_zone_area(*side).is_none() {
                        return Err(SetupError::ZeroAbsorptionArea {
                            zone_id: self.zone_of(*side),
                            construction_id: self.con.id,
                        });
                    }
                    match side {
                        Side::A => inputs.window_solar_a = r,
                        Side::B => inputs.window_solar_b = r,
                    }
                }
                (Slot::RadiantLoad(side), Some(r)) => {
                    if self.inv_zone_area(*side).is_none() {
                        return Err(SetupError::ZeroAbsorptionArea {
                            zone_id: self.zone_of(*side),
                            construction_id: self.con.id,
                        });
                    }
                    match side {
                        Side::A => inputs.radiant_loads_a.push(r),
                        Side::B => inputs.radiant_loads_b.push(r),
                    }
                }
                (Slot::RadiantLoad(_), None) => {}
                (Slot::ActiveLayerLoad, r) => inputs.active_layer_load = r,
            }
        }
        self.inputs = inputs;
        Ok(())
    }

    fn state_dependencies(&self, pairs: &mut Vec<DependencyPair>) {
        let n = self.mesh.len();
        let ydot = self.ydot.base();

        if let Some(fluxes) = self.inputs.fluxes {
            for i in 1..n {
                pairs.push((ydot.offset(i - 1), fluxes.offset(i)));
                pairs.push((ydot.offset(i), fluxes.offset(i)));
            }
        }
        for (input, element) in [
            (self.inputs.ts_a, 0),
            (self.inputs.env_temperature_a, 0),
            (self.inputs.ts_b, n - 1),
            (self.inputs.env_temperature_b, n - 1),
        ] {
            if let Some(r) = input {
                pairs.push((ydot.offset(element), r));
            }
        }
        if let (Some(load), Some(layer)) = (self.inputs.active_layer_load, self.con.active_layer) {
            for i in self.mesh.layer_range(layer) {
                pairs.push((ydot.offset(i), load));
            }
        }
    }

    fn update(&mut self, arena: &mut QuantityArena) -> Result<(), UpdateError> {
        let n = self.mesh.len();
        let area = self.con.area;

        // 1. boundary conduction, positive into the construction
        let mut conduction_a = 0.0;
        let mut conduction_b = 0.0;
        if let Some(hc) = self.con.interface_a.heat_conduction {
            let ts = read(arena, self.inputs.ts_a);
            let env = read(arena, self.inputs.env_temperature_a);
            conduction_a = hc.heat_transfer_coeff * (env - ts);
        }
        if let Some(hc) = self.con.interface_b.heat_conduction {
            let ts = read(arena, self.inputs.ts_b);
            let env = read(arena, self.inputs.env_temperature_b);
            conduction_b = hc.heat_transfer_coeff * (env - ts);
        }

        // 2. short-wave and long-wave flux densities per side
        let mut sw_a = 0.0;
        let mut sw_b = 0.0;
        if let Some(sa) = self.con.interface_a.solar_absorption {
            sw_a += sa.absorption_coeff * read(arena, self.inputs.sw_on_plane_a);
        }
        if let Some(sa) = self.con.interface_b.solar_absorption {
            sw_b += sa.absorption_coeff * read(arena, self.inputs.sw_on_plane_b);
        }
        // interior gains in absolute watts, split by area fraction; the
        // density is sum / zone area since fraction = A / zoneArea
        if let Some(inv) = self.inv_zone_area_a {
            let mut gains = read(arena, self.inputs.window_solar_a);
            for &r in &self.inputs.radiant_loads_a {
                gains += arena.get(r);
            }
            sw_a += gains * inv;
        }
        if let Some(inv) = self.inv_zone_area_b {
            let mut gains = read(arena, self.inputs.window_solar_b);
            for &r in &self.inputs.radiant_loads_b {
                gains += arena.get(r);
            }
            sw_b += gains * inv;
        }

        let mut lw_a = read(arena, self.inputs.lw_balance_a);
        let mut lw_b = read(arena, self.inputs.lw_balance_b);
        if self.inputs.own_emitted_flux_a.is_some() {
            // neighbor contributions arrive in absolute watts
            let mut received = 0.0;
            for &r in &self.inputs.neighbor_emitted_a {
                received += arena.get(r);
            }
            lw_a += received / area - read(arena, self.inputs.own_emitted_flux_a);
        }
        if self.inputs.own_emitted_flux_b.is_some() {
            let mut received = 0.0;
            for &r in &self.inputs.neighbor_emitted_b {
                received += arena.get(r);
            }
            lw_b += received / area - read(arena, self.inputs.own_emitted_flux_b);
        }

        // 3. divergence assembly
        let raw = &mut self.raw;
        raw[0] = conduction_a + sw_a + lw_a;
        for r in raw[1..].iter_mut() {
            *r = 0.0;
        }
        if let Some(fluxes) = self.inputs.fluxes {
            // flux continuity: what leaves one cell enters its neighbor
            for i in 1..n {
                let q = arena.get(fluxes.offset(i));
                raw[i - 1] -= q;
                raw[i] += q;
            }
        }
        raw[n - 1] += conduction_b + sw_b + lw_b;
        for (r, e) in raw.iter_mut().zip(&self.mesh.elements) {
            *r /= e.dx;
        }

        // active-layer source as a uniform volumetric density
        let mut active_load = 0.0;
        if let (Some(load), Some(layer)) = (self.inputs.active_layer_load, self.con.active_layer) {
            active_load = arena.get(load);
            let layer_volume = area * self.mesh.layer_thickness(layer);
            debug_assert!(layer_volume > 0.0, "Active layer has zero volume");
            let density = active_load / layer_volume;
            for i in self.mesh.layer_range(layer) {
                raw[i] += density;
            }
        }

        // 4. publish
        arena.write(self.ydot.base(), raw);
        arena.set(self.flux_heat_conduction_a, conduction_a * area);
        arena.set(self.flux_heat_conduction_b, conduction_b * area);
        arena.set(self.flux_short_wave_a, sw_a * area);
        arena.set(self.flux_short_wave_b, sw_b * area);
        arena.set(self.flux_long_wave_a, lw_a * area);
        arena.set(self.flux_long_wave_b, lw_b * area);
        for layer in 0..self.con.layers.len() {
            let value = if Some(layer) == self.con.active_layer {
                active_load
            } else {
                0.0
            };
            arena.set(self.thermal_load.base().offset(layer), value);
        }
        Ok(())
    }
}
