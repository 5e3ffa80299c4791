//! Construction states model: conserved energy to intensive quantities.
//!
//! Owns the per-element conserved energy densities of one construction and,
//! on every right-hand-side evaluation, decomposes them into element
//! temperatures, inter-element conduction fluxes, surface temperatures and
//! outward long-wave radiation terms. Runs first in the evaluation order
//! (head priority) so every downstream model reads already-updated values.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{SetupError, UpdateError};
use crate::model::{
    EntityKind, InputReference, Model, ObjectId, StateDependency, PRIORITY_HEAD,
};
use crate::quantity::{
    DependencyPair, QuantityArena, QuantityDescription, ValueRef, VectorQuantity,
};
use crate::sim::construction::ConstructionInstance;
use crate::sim::mesh::{self, DiscretizationOptions, Mesh};
use crate::sim::names;

/// Stefan-Boltzmann constant in W/m²K⁴.
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Global policy for deriving surface temperatures from the two outermost
/// element temperatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceExtrapolation {
    /// Surface temperature equals the boundary element's temperature.
    Constant,
    /// Linear extrapolation over the boundary element and its inner
    /// neighbor, using the precomputed mesh weight factors.
    Linear,
}

/// One construction surface visible from a side of this construction,
/// participating in interior long-wave exchange.
#[derive(Clone, Copy, Debug)]
pub struct LongWaveNeighbor {
    /// Construction instance id of the neighbor surface.
    pub construction_id: ObjectId,
    /// View factor from this surface to the neighbor (0..1).
    pub view_factor: f64,
    /// Emissivity of the neighbor surface (0..1).
    pub emissivity: f64,
}

/// Precomputed long-wave emission state of one side.
///
/// The per-neighbor coefficient `A * F * eps_self * eps_neighbor * sigma`
/// is fixed at setup; only the `Ts^4` factor changes per evaluation.
/// Degenerate (zero) view factors and emissivities stay in the map, zero is
/// a valid contribution.
#[derive(Debug)]
struct LongWaveSide {
    emissivity: f64,
    /// Published per-neighbor emitted radiation in W, keyed by neighbor
    /// construction id.
    emitted: VectorQuantity,
    /// Coefficients aligned with `emitted.keys()`.
    coefficients: Vec<f64>,
    /// Published own-emission flux density in W/m².
    emitted_flux: ValueRef,
    /// Published exterior long-wave balance flux density, side facing
    /// ambient only.
    balance_flux: Option<ValueRef>,
}

/// Finite-volume states model of one construction instance.
///
/// Two-phase lifecycle: [`ConstructionStatesModel::setup`] generates the
/// mesh, precomputes capacitances and conductances and publishes every
/// result quantity; afterwards only [`StateDependency::update`] runs, once
/// per right-hand-side evaluation.
#[derive(Debug)]
pub struct ConstructionStatesModel {
    con: ConstructionInstance,
    mesh: Mesh,
    extrapolation: SurfaceExtrapolation,
    initial_temperature: f64,

    /// Volumetric heat capacity `rho * ce` per element, J/m³K.
    rhoce: Vec<f64>,
    /// Inverse inter-element resistance per internal interface, W/m²K.
    /// Size `n + 1`; entries 0 and n are unused.
    rt_inv: Vec<f64>,

    /// Scratch buffers reused every update, sized once at setup.
    t_scratch: Vec<f64>,
    q_scratch: Vec<f64>,

    y: VectorQuantity,
    temperature: VectorQuantity,
    surface_temperature_a: ValueRef,
    surface_temperature_b: ValueRef,
    layer_temperature: VectorQuantity,
    active_layer_temperature: Option<ValueRef>,
    fluxes: VectorQuantity,

    long_wave_a: Option<LongWaveSide>,
    long_wave_b: Option<LongWaveSide>,

    /// Resolved incoming long-wave counter-radiation per exterior side.
    lw_rad_on_plane_a: Option<ValueRef>,
    lw_rad_on_plane_b: Option<ValueRef>,
}

impl ConstructionStatesModel {
    /// Generates the mesh, precomputes all run constants and publishes the
    /// result quantities into the arena.
    ///
    /// `neighbors_a`/`neighbors_b` list the construction surfaces visible
    /// from the respective side for interior long-wave exchange; they are
    /// only honored on sides with a long-wave emission parameter block.
    pub fn setup(
        arena: &mut QuantityArena,
        con: ConstructionInstance,
        opts: &DiscretizationOptions,
        extrapolation: SurfaceExtrapolation,
        initial_temperature: f64,
        neighbors_a: &[LongWaveNeighbor],
        neighbors_b: &[LongWaveNeighbor],
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

        let mesh = mesh::generate(con.id, &con.layers, opts)?;
        let n = mesh.len();

        let rhoce: Vec<f64> = mesh
            .elements
            .iter()
            .map(|e| con.layers[e.layer].material.volumetric_heat_capacity())
            .collect();

        // inverse series resistance between adjacent element centers,
        // harmonic combination of the two half-widths
        let mut rt_inv = vec![0.0; n + 1];
        for i in 1..n {
            let left = &mesh.elements[i - 1];
            let right = &mesh.elements[i];
            let r = 0.5 * left.dx / con.layers[left.layer].material.conductivity
                + 0.5 * right.dx / con.layers[right.layer].material.conductivity;
            rt_inv[i] = 1.0 / r;
        }

        let t0 = initial_temperature;
        let y_base = arena.alloc_vector(n, 0.0);
        for i in 0..n {
            arena.set(y_base.offset(i), rhoce[i] * t0);
        }
        let temperature = VectorQuantity::dense(arena.alloc_vector(n, t0), n);
        let surface_temperature_a = arena.alloc_scalar(t0);
        let surface_temperature_b = arena.alloc_scalar(t0);
        let layer_temperature =
            VectorQuantity::dense(arena.alloc_vector(con.layers.len(), t0), con.layers.len());
        let active_layer_temperature = con.active_layer.map(|_| arena.alloc_scalar(t0));
        let fluxes = VectorQuantity::dense(arena.alloc_vector(n + 1, 0.0), n + 1);

        let long_wave_a = Self::setup_long_wave_side(
            arena,
            &con,
            con.interface_a.long_wave_emission.map(|e| e.emissivity),
            con.interface_a.is_exterior(),
            neighbors_a,
        );
        let long_wave_b = Self::setup_long_wave_side(
            arena,
            &con,
            con.interface_b.long_wave_emission.map(|e| e.emissivity),
            con.interface_b.is_exterior(),
            neighbors_b,
        );

        Ok(Self {
            y: VectorQuantity::dense(y_base, n),
            temperature,
            surface_temperature_a,
            surface_temperature_b,
            layer_temperature,
            active_layer_temperature,
            fluxes,
            long_wave_a,
            long_wave_b,
            lw_rad_on_plane_a: None,
            lw_rad_on_plane_b: None,
            t_scratch: vec![t0; n],
            q_scratch: vec![0.0; n + 1],
            rhoce,
            rt_inv,
            extrapolation,
            initial_temperature,
            mesh,
            con,
        })
    }

    fn setup_long_wave_side(
        arena: &mut QuantityArena,
        con: &ConstructionInstance,
        emissivity: Option<f64>,
        is_exterior: bool,
        neighbors: &[LongWaveNeighbor],
    ) -> Option<LongWaveSide> {
        let emissivity = emissivity?;

        // neighbor map keyed (and stored) by construction id; duplicate
        // neighbor entries accumulate
        let mut by_neighbor: BTreeMap<u32, f64> = BTreeMap::new();
        if !is_exterior {
            for nb in neighbors {
                *by_neighbor.entry(nb.construction_id).or_insert(0.0) +=
                    con.area * nb.view_factor * emissivity * nb.emissivity * STEFAN_BOLTZMANN;
            }
        }
        let keys: BTreeSet<u32> = by_neighbor.keys().copied().collect();
        let coefficients: Vec<f64> = by_neighbor.values().copied().collect();
        let emitted = VectorQuantity::with_keys(
            arena.alloc_vector(coefficients.len(), 0.0),
            &keys,
        );

        Some(LongWaveSide {
            emissivity,
            emitted,
            coefficients,
            emitted_flux: arena.alloc_scalar(0.0),
            balance_flux: is_exterior.then(|| arena.alloc_scalar(0.0)),
        })
    }

    /// Fills the integrator's initial state vector from the uniform initial
    /// temperature.
    pub fn y_initial(&self, y: &mut [f64]) {
        assert_eq!(y.len(), self.mesh.len(), "State vector size mismatch");
        for (yi, rc) in y.iter_mut().zip(&self.rhoce) {
            *yi = rc * self.initial_temperature;
        }
    }

    /// Number of conserved states (elements).
    pub fn n_states(&self) -> usize {
        self.mesh.len()
    }

    /// The generated mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// The construction this model simulates.
    pub fn construction(&self) -> &ConstructionInstance {
        &self.con
    }

    /// Base handle of the published conserved-state vector. The outer
    /// driver writes the integrator's `y` here before each update.
    pub fn y_ref(&self) -> ValueRef {
        self.y.base()
    }

    fn surface_temperatures(&self) -> (f64, f64) {
        let n = self.mesh.len();
        let t = &self.t_scratch;
        if n == 1 {
            return (t[0], t[0]);
        }
        if n == 2 {
            return (t[0], t[1]);
        }
        match self.extrapolation {
            SurfaceExtrapolation::Constant => (t[0], t[n - 1]),
            SurfaceExtrapolation::Linear => {
                let e = &self.mesh.elements;
                let tsa = t[0] + e[0].w_r * (t[0] - t[1]);
                let tsb = t[n - 1] + e[n - 1].w_l * (t[n - 1] - t[n - 2]);
                (tsa, tsb)
            }
        }
    }

    fn layer_mean_temperature(&self, layer: usize) -> f64 {
        let range = self.mesh.layer_range(layer);
        let mut weighted = 0.0;
        let mut width = 0.0;
        for i in range {
            weighted += self.t_scratch[i] * self.mesh.elements[i].dx;
            width += self.mesh.elements[i].dx;
        }
        weighted / width
    }

    fn update_long_wave_side(
        arena: &mut QuantityArena,
        side: &LongWaveSide,
        ts: f64,
        incoming: Option<ValueRef>,
    ) {
        let ts4 = ts * ts * ts * ts;
        arena.set(side.emitted_flux, side.emissivity * STEFAN_BOLTZMANN * ts4);
        for (pos, coeff) in side.coefficients.iter().enumerate() {
            arena.set(side.emitted.base().offset(pos), coeff * ts4);
        }
        if let Some(balance) = side.balance_flux {
            let lw_in = incoming.map(|r| arena.get(r)).unwrap_or(0.0);
            arena.set(balance, side.emissivity * (lw_in - STEFAN_BOLTZMANN * ts4));
        }
    }

    fn vector_result(&self, name: &str) -> Option<&VectorQuantity> {
        match name {
            names::Y => Some(&self.y),
            names::TEMPERATURE => Some(&self.temperature),
            names::LAYER_TEMPERATURE => Some(&self.layer_temperature),
            names::HEAT_CONDUCTION_FLUXES => Some(&self.fluxes),
            names::EMITTED_LONG_WAVE_RADIATION_A => {
                self.long_wave_a.as_ref().map(|s| &s.emitted)
            }
            names::EMITTED_LONG_WAVE_RADIATION_B => {
                self.long_wave_b.as_ref().map(|s| &s.emitted)
            }
            _ => None,
        }
    }

    fn scalar_result(&self, name: &str) -> Option<ValueRef> {
        match name {
            names::SURFACE_TEMPERATURE_A => Some(self.surface_temperature_a),
            names::SURFACE_TEMPERATURE_B => Some(self.surface_temperature_b),
            names::ACTIVE_LAYER_TEMPERATURE => self.active_layer_temperature,
            names::EMITTED_LONG_WAVE_RADIATION_FLUX_A => {
                self.long_wave_a.as_ref().map(|s| s.emitted_flux)
            }
            names::EMITTED_LONG_WAVE_RADIATION_FLUX_B => {
                self.long_wave_b.as_ref().map(|s| s.emitted_flux)
            }
            names::LONG_WAVE_RADIATION_BALANCE_FLUX_A => {
                self.long_wave_a.as_ref().and_then(|s| s.balance_flux)
            }
            names::LONG_WAVE_RADIATION_BALANCE_FLUX_B => {
                self.long_wave_b.as_ref().and_then(|s| s.balance_flux)
            }
            _ => None,
        }
    }
}

impl Model for ConstructionStatesModel {
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
        let mut descs = vec![
            QuantityDescription::vector(
                names::Y,
                "J/m3",
                "Conserved energy density per element",
                self.y.keys(),
            ),
            QuantityDescription::vector(
                names::TEMPERATURE,
                "K",
                "Element temperatures",
                self.temperature.keys(),
            ),
            QuantityDescription::scalar(
                names::SURFACE_TEMPERATURE_A,
                "K",
                "Surface temperature at side A",
            ),
            QuantityDescription::scalar(
                names::SURFACE_TEMPERATURE_B,
                "K",
                "Surface temperature at side B",
            ),
            QuantityDescription::vector(
                names::LAYER_TEMPERATURE,
                "K",
                "Mean temperature per material layer",
                self.layer_temperature.keys(),
            ),
            QuantityDescription::vector(
                names::HEAT_CONDUCTION_FLUXES,
                "W/m2",
                "Conduction flux densities at the inner element interfaces",
                self.fluxes.keys(),
            ),
        ];
        if self.active_layer_temperature.is_some() {
            descs.push(QuantityDescription::scalar(
                names::ACTIVE_LAYER_TEMPERATURE,
                "K",
                "Mean temperature of the active layer",
            ));
        }
        if let Some(side) = &self.long_wave_a {
            descs.push(QuantityDescription::vector(
                names::EMITTED_LONG_WAVE_RADIATION_A,
                "W",
                "Long-wave radiation emitted towards each visible neighbor surface, side A",
                side.emitted.keys(),
            ));
            descs.push(QuantityDescription::scalar(
                names::EMITTED_LONG_WAVE_RADIATION_FLUX_A,
                "W/m2",
                "Emitted long-wave flux at side A",
            ));
            if side.balance_flux.is_some() {
                descs.push(QuantityDescription::scalar(
                    names::LONG_WAVE_RADIATION_BALANCE_FLUX_A,
                    "W/m2",
                    "Exterior long-wave balance at side A",
                ));
            }
        }
        if let Some(side) = &self.long_wave_b {
            descs.push(QuantityDescription::vector(
                names::EMITTED_LONG_WAVE_RADIATION_B,
                "W",
                "Long-wave radiation emitted towards each visible neighbor surface, side B",
                side.emitted.keys(),
            ));
            descs.push(QuantityDescription::scalar(
                names::EMITTED_LONG_WAVE_RADIATION_FLUX_B,
                "W/m2",
                "Emitted long-wave flux at side B",
            ));
            if side.balance_flux.is_some() {
                descs.push(QuantityDescription::scalar(
                    names::LONG_WAVE_RADIATION_BALANCE_FLUX_B,
                    "W/m2",
                    "Exterior long-wave balance at side B",
                ));
            }
        }
        descs
    }

    fn result_value_ref(&self, name: &str, index: Option<u32>) -> Option<ValueRef> {
        if let Some(r) = self.scalar_result(name) {
            // scalar lookup ignores the index
            return Some(r);
        }
        let vector = self.vector_result(name)?;
        match index {
            None => Some(vector.base()),
            Some(k) => vector.value_ref(k),
        }
    }
}

impl StateDependency for ConstructionStatesModel {
    fn priority(&self) -> i32 {
        PRIORITY_HEAD
    }

    fn input_references(&self) -> Vec<InputReference> {
        let mut refs = Vec::new();
        // incoming counter-radiation, exterior sides with emission only
        if self
            .long_wave_a
            .as_ref()
            .is_some_and(|s| s.balance_flux.is_some())
        {
            refs.push(
                InputReference::required(EntityKind::Location, 0, names::LW_RAD_ON_PLANE)
                    .with_index(self.con.id),
            );
        }
        if self
            .long_wave_b
            .as_ref()
            .is_some_and(|s| s.balance_flux.is_some())
        {
            refs.push(
                InputReference::required(EntityKind::Location, 0, names::LW_RAD_ON_PLANE)
                    .with_index(self.con.id),
            );
        }
        refs
    }

    fn set_input_value_refs(&mut self, refs: &[Option<ValueRef>]) -> Result<(), SetupError> {
        let declared = self.input_references().len();
        if refs.len() != declared {
            return Err(SetupError::InputCountMismatch {
                model_id: self.con.id,
                declared,
                resolved: refs.len(),
            });
        }
        let mut it = refs.iter();
        if self
            .long_wave_a
            .as_ref()
            .is_some_and(|s| s.balance_flux.is_some())
        {
            self.lw_rad_on_plane_a = it.next().copied().flatten();
        }
        if self
            .long_wave_b
            .as_ref()
            .is_some_and(|s| s.balance_flux.is_some())
        {
            self.lw_rad_on_plane_b = it.next().copied().flatten();
        }
        Ok(())
    }

    fn state_dependencies(&self, pairs: &mut Vec<DependencyPair>) {
        let n = self.mesh.len();
        let y = self.y.base();

        // element temperature <- own conserved state
        for i in 0..n {
            pairs.push((self.temperature.base().offset(i), y.offset(i)));
        }
        // internal interface fluxes <- both adjacent states
        for i in 1..n {
            pairs.push((self.fluxes.base().offset(i), y.offset(i - 1)));
            pairs.push((self.fluxes.base().offset(i), y.offset(i)));
        }
        // surface temperatures <- the two outermost states of their side
        pairs.push((self.surface_temperature_a, y.offset(0)));
        pairs.push((self.surface_temperature_b, y.offset(n - 1)));
        if n > 1 {
            pairs.push((self.surface_temperature_a, y.offset(1)));
            pairs.push((self.surface_temperature_b, y.offset(n - 2)));
        }
        // layer means <- every state of the layer
        for layer in 0..self.con.layers.len() {
            for i in self.mesh.layer_range(layer) {
                pairs.push((self.layer_temperature.base().offset(layer), y.offset(i)));
            }
        }
        if let (Some(alt), Some(layer)) = (self.active_layer_temperature, self.con.active_layer) {
            for i in self.mesh.layer_range(layer) {
                pairs.push((alt, y.offset(i)));
            }
        }
        // long-wave terms <- the states driving their surface temperature
        if let Some(side) = &self.long_wave_a {
            long_wave_side_pairs(side, y.offset(0), pairs);
            if n > 1 {
                long_wave_side_pairs(side, y.offset(1), pairs);
            }
        }
        if let Some(side) = &self.long_wave_b {
            long_wave_side_pairs(side, y.offset(n - 1), pairs);
            if n > 1 {
                long_wave_side_pairs(side, y.offset(n - 2), pairs);
            }
        }
    }

    fn update(&mut self, arena: &mut QuantityArena) -> Result<(), UpdateError> {
        let n = self.mesh.len();
        let y = self.y.base();

        // fused decompose + flux kernel, the hot inner loop
        self.t_scratch[0] = arena.get(y) / self.rhoce[0];
        for i in 1..n {
            self.t_scratch[i] = arena.get(y.offset(i)) / self.rhoce[i];
            self.q_scratch[i] = self.rt_inv[i] * (self.t_scratch[i - 1] - self.t_scratch[i]);
        }

        arena.write(self.temperature.base(), &self.t_scratch);
        arena.write(self.fluxes.base(), &self.q_scratch);

        let (tsa, tsb) = self.surface_temperatures();
        arena.set(self.surface_temperature_a, tsa);
        arena.set(self.surface_temperature_b, tsb);

        for layer in 0..self.con.layers.len() {
            arena.set(
                self.layer_temperature.base().offset(layer),
                self.layer_mean_temperature(layer),
            );
        }
        if let (Some(alt), Some(layer)) = (self.active_layer_temperature, self.con.active_layer) {
            arena.set(alt, self.layer_mean_temperature(layer));
        }

        if let Some(side) = &self.long_wave_a {
            Self::update_long_wave_side(arena, side, tsa, self.lw_rad_on_plane_a);
        }
        if let Some(side) = &self.long_wave_b {
            Self::update_long_wave_side(arena, side, tsb, self.lw_rad_on_plane_b);
        }
        Ok(())
    }
}

fn long_wave_side_pairs(side: &LongWaveSide, state: ValueRef, pairs: &mut Vec<DependencyPair>) {
    pairs.push((side.emitted_flux, state));
    for pos in 0..side.emitted.len() {
        pairs.push((side.emitted.base().offset(pos), state));
    }
    if let Some(balance) = side.balance_flux {
        pairs.push((balance, state));
    }
}
