//! Thermal simulation models for opaque building constructions.
//!
//! The data model ([`construction`]) describes multilayer walls, floors and
//! ceilings. [`mesh`] turns a layer stack into a 1D finite-volume grid.
//! [`states`] decomposes the conserved energy densities into temperatures
//! and conduction fluxes, and [`balance`] assembles the energy divergence
//! and boundary heat flows back into time derivatives.

pub mod balance;
pub mod construction;
pub mod mesh;
pub mod states;

/// Published and requested quantity names.
///
/// Shared by providers and consumers so that lookups never go through
/// ad-hoc string literals.
pub mod names {
    /// Conserved states of a construction, energy density per element.
    pub const Y: &str = "y";
    /// Time derivatives of the conserved states.
    pub const YDOT: &str = "ydot";
    /// Element temperatures of a construction, indexed by element.
    pub const TEMPERATURE: &str = "Temperature";
    /// Surface temperature at side A.
    pub const SURFACE_TEMPERATURE_A: &str = "SurfaceTemperatureA";
    /// Surface temperature at side B.
    pub const SURFACE_TEMPERATURE_B: &str = "SurfaceTemperatureB";
    /// Mean temperature per material layer.
    pub const LAYER_TEMPERATURE: &str = "LayerTemperature";
    /// Mean temperature of the active layer, if one is configured.
    pub const ACTIVE_LAYER_TEMPERATURE: &str = "ActiveLayerTemperature";
    /// Conduction flux densities at the inner element interfaces.
    pub const HEAT_CONDUCTION_FLUXES: &str = "HeatConductionFluxes";

    /// Long-wave radiation emitted towards each visible neighbor surface,
    /// side A, keyed by neighbor construction id.
    pub const EMITTED_LONG_WAVE_RADIATION_A: &str = "EmittedLongWaveRadiationA";
    /// Long-wave radiation emitted towards each visible neighbor surface,
    /// side B.
    pub const EMITTED_LONG_WAVE_RADIATION_B: &str = "EmittedLongWaveRadiationB";
    /// Total emitted long-wave flux at side A.
    pub const EMITTED_LONG_WAVE_RADIATION_FLUX_A: &str = "EmittedLongWaveRadiationFluxA";
    /// Total emitted long-wave flux at side B.
    pub const EMITTED_LONG_WAVE_RADIATION_FLUX_B: &str = "EmittedLongWaveRadiationFluxB";
    /// Net long-wave balance at an exterior side A surface.
    pub const LONG_WAVE_RADIATION_BALANCE_FLUX_A: &str = "LongWaveRadiationBalanceFluxA";
    /// Net long-wave balance at an exterior side B surface.
    pub const LONG_WAVE_RADIATION_BALANCE_FLUX_B: &str = "LongWaveRadiationBalanceFluxB";

    /// Convective conduction heat flow across side A, in W.
    pub const FLUX_HEAT_CONDUCTION_A: &str = "FluxHeatConductionA";
    /// Convective conduction heat flow across side B, in W.
    pub const FLUX_HEAT_CONDUCTION_B: &str = "FluxHeatConductionB";
    /// Absorbed short-wave heat flow at side A, in W.
    pub const FLUX_SHORT_WAVE_RADIATION_A: &str = "FluxShortWaveRadiationA";
    /// Absorbed short-wave heat flow at side B, in W.
    pub const FLUX_SHORT_WAVE_RADIATION_B: &str = "FluxShortWaveRadiationB";
    /// Net long-wave heat flow at side A, in W.
    pub const FLUX_LONG_WAVE_RADIATION_A: &str = "FluxLongWaveRadiationA";
    /// Net long-wave heat flow at side B, in W.
    pub const FLUX_LONG_WAVE_RADIATION_B: &str = "FluxLongWaveRadiationB";
    /// Heat load imposed on the active layer, in W.
    pub const THERMAL_LOAD: &str = "ThermalLoad";

    /// Zone air temperature.
    pub const AIR_TEMPERATURE: &str = "AirTemperature";
    /// Short-wave radiation intensity on each outside surface plane, keyed
    /// by construction id.
    pub const SW_RAD_ON_PLANE: &str = "SWRadOnPlane";
    /// Long-wave radiation intensity on each outside surface plane, keyed
    /// by construction id.
    pub const LW_RAD_ON_PLANE: &str = "LWRadOnPlane";
    /// Solar radiation entering a zone through its windows, in W.
    pub const WINDOW_SOLAR_RADIATION_FLUX_SUM: &str = "WindowSolarRadiationFluxSum";
    /// Radiant fraction of zone equipment loads, in W.
    pub const RADIANT_EQUIPMENT_HEAT_LOAD: &str = "RadiantEquipmentHeatLoad";
    /// Radiant fraction of zone person loads, in W.
    pub const RADIANT_PERSON_HEAT_LOAD: &str = "RadiantPersonHeatLoad";
    /// Radiant fraction of zone lighting loads, in W.
    pub const RADIANT_LIGHTING_HEAT_LOAD: &str = "RadiantLightingHeatLoad";
    /// Heat load delivered by a surface heating/cooling system to its
    /// active layer, in W.
    pub const ACTIVE_LAYER_THERMAL_LOAD: &str = "ActiveLayerThermalLoad";
}
