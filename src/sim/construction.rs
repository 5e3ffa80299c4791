//! Multi-layer construction descriptions for opaque building envelopes.
//!
//! This module provides the pure data types the finite-volume engine is
//! configured with: materials, material layers, the two boundary interfaces
//! of a construction, and the construction instance itself. It also carries
//! steady-state R-value/U-value helpers used for sanity checks and test
//! references.

use serde::{Deserialize, Serialize};

use crate::model::ObjectId;

/// Interior film coefficient per ASHRAE specification.
///
/// Convective heat transfer coefficient at the interior surface of a
/// building assembly, 8.29 W/m²K per ASHRAE 140.
pub const INTERIOR_FILM_COEFF: f64 = 8.29; // W/m²K

/// Default exterior film coefficient (typical for average wind conditions).
///
/// For wind speeds of 3-4 m/s the exterior film coefficient typically ranges
/// from 21-29.3 W/m²K; 25.0 W/m²K is a mid-range default.
pub const EXTERIOR_FILM_COEFF_DEFAULT: f64 = 25.0; // W/m²K

/// Returns the exterior film coefficient for a given wind speed.
///
/// Simplified ASHRAE correlation `h_ext = 10.0 + 4.0 * v^0.5`, giving
/// ~21 W/m²K at 3 m/s and ~29 W/m²K at 9 m/s.
pub fn exterior_film_coeff(wind_speed: f64) -> f64 {
    10.0 + 4.0 * wind_speed.sqrt()
}

/// A homogeneous material with uniform thermal properties.
///
/// Read-only input data: the engine looks materials up once during setup to
/// precompute per-element capacitance and inter-element conductance, and
/// never mutates them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Material {
    /// Thermal conductivity in W/m·K.
    pub conductivity: f64,
    /// Density in kg/m³.
    pub density: f64,
    /// Specific heat capacity in J/kg·K.
    pub specific_heat: f64,
}

impl Material {
    /// Creates a new material.
    ///
    /// # Panics
    /// Panics if any property is non-positive.
    pub fn new(conductivity: f64, density: f64, specific_heat: f64) -> Self {
        assert!(conductivity > 0.0, "Conductivity must be positive");
        assert!(density > 0.0, "Density must be positive");
        assert!(specific_heat > 0.0, "Specific heat must be positive");
        Self {
            conductivity,
            density,
            specific_heat,
        }
    }

    /// Volumetric heat capacity `rho * ce` in J/m³K.
    ///
    /// This is the factor between conserved energy density and temperature:
    /// `T = u / (rho * ce)`.
    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.density * self.specific_heat
    }
}

/// One layer of a multi-layer construction assembly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MaterialLayer {
    /// Material occupying this layer.
    pub material: Material,
    /// Layer thickness in meters.
    pub thickness: f64,
}

impl MaterialLayer {
    /// Creates a new layer.
    ///
    /// # Panics
    /// Panics if thickness is non-positive.
    pub fn new(material: Material, thickness: f64) -> Self {
        assert!(thickness > 0.0, "Thickness must be positive");
        Self { material, thickness }
    }

    /// Thermal resistance `R = δ / k` of this layer in m²K/W.
    pub fn r_value(&self) -> f64 {
        self.thickness / self.material.conductivity
    }

    /// Thermal capacitance per unit area `ρ × δ × Cp` in J/m²K.
    pub fn thermal_capacitance_per_area(&self) -> f64 {
        self.material.density * self.thickness * self.material.specific_heat
    }
}

/// Heat conduction boundary-condition parameter block.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct HeatConduction {
    /// Convective heat transfer coefficient α in W/m²K.
    pub heat_transfer_coeff: f64,
}

/// Solar absorption boundary-condition parameter block.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SolarAbsorption {
    /// Fraction of incident shortwave radiation absorbed (0..1).
    pub absorption_coeff: f64,
}

/// Longwave emission/absorption boundary-condition parameter block.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LongWaveEmission {
    /// Surface emissivity (0..1).
    pub emissivity: f64,
}

/// One of the two physical sides of a construction.
///
/// An interface either faces ambient climate (`zone_id == 0`), faces a room
/// zone (`zone_id != 0`), or carries no boundary-condition parameters at all
/// and is adiabatic.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Interface {
    /// Id of the zone this side faces; 0 means outdoor climate.
    pub zone_id: ObjectId,
    /// Convective heat exchange with the adjacent air, if modeled.
    pub heat_conduction: Option<HeatConduction>,
    /// Shortwave absorption, if modeled.
    pub solar_absorption: Option<SolarAbsorption>,
    /// Longwave exchange, if modeled.
    pub long_wave_emission: Option<LongWaveEmission>,
}

impl Interface {
    /// An adiabatic interface: no boundary-condition parameters.
    pub fn adiabatic() -> Self {
        Self {
            zone_id: 0,
            heat_conduction: None,
            solar_absorption: None,
            long_wave_emission: None,
        }
    }

    /// An interface facing ambient climate with convective exchange.
    pub fn exterior(heat_transfer_coeff: f64) -> Self {
        Self {
            zone_id: 0,
            heat_conduction: Some(HeatConduction { heat_transfer_coeff }),
            solar_absorption: None,
            long_wave_emission: None,
        }
    }

    /// An interface facing a room zone with convective exchange.
    pub fn to_zone(zone_id: ObjectId, heat_transfer_coeff: f64) -> Self {
        assert!(zone_id != 0, "Zone interfaces require a non-zero zone id");
        Self {
            zone_id,
            heat_conduction: Some(HeatConduction { heat_transfer_coeff }),
            solar_absorption: None,
            long_wave_emission: None,
        }
    }

    /// Adds a solar absorption block.
    pub fn with_solar_absorption(mut self, absorption_coeff: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&absorption_coeff),
            "Absorption coefficient must be in [0, 1]"
        );
        self.solar_absorption = Some(SolarAbsorption { absorption_coeff });
        self
    }

    /// Adds a longwave emission block.
    pub fn with_long_wave_emission(mut self, emissivity: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&emissivity),
            "Emissivity must be in [0, 1]"
        );
        self.long_wave_emission = Some(LongWaveEmission { emissivity });
        self
    }

    /// True if any boundary-condition parameter block is present.
    pub fn has_bc_parameters(&self) -> bool {
        self.heat_conduction.is_some()
            || self.solar_absorption.is_some()
            || self.long_wave_emission.is_some()
    }

    /// True if this side faces outdoor climate.
    pub fn is_exterior(&self) -> bool {
        self.zone_id == 0
    }
}

/// One physical wall/floor/roof assembly to be discretized into
/// finite-volume elements.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstructionInstance {
    /// Unique id of this construction instance.
    pub id: ObjectId,
    /// Display name for diagnostics.
    pub name: String,
    /// Net cross-section area in m².
    pub area: f64,
    /// Ordered material layers, side A first.
    pub layers: Vec<MaterialLayer>,
    /// Boundary interface at side A (first layer).
    pub interface_a: Interface,
    /// Boundary interface at side B (last layer).
    pub interface_b: Interface,
    /// Index of the material layer carrying an embedded heat source/sink,
    /// if any.
    pub active_layer: Option<usize>,
}

impl ConstructionInstance {
    /// Creates a new construction instance without boundary parameters.
    ///
    /// # Panics
    /// Panics if the area is non-positive.
    pub fn new(id: ObjectId, name: impl Into<String>, area: f64, layers: Vec<MaterialLayer>) -> Self {
        assert!(area > 0.0, "Construction area must be positive");
        Self {
            id,
            name: name.into(),
            area,
            layers,
            interface_a: Interface::adiabatic(),
            interface_b: Interface::adiabatic(),
            active_layer: None,
        }
    }

    /// Total thickness of the layer stack in meters.
    pub fn total_thickness(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }

    /// Number of material layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total thermal resistance including film coefficients, in m²K/W.
    ///
    /// `R_total = 1/h_int + Σ(δ/k) + 1/h_ext`, with the exterior film
    /// coefficient derived from `exterior_wind_speed` if given.
    pub fn r_value_total(&self, exterior_wind_speed: Option<f64>) -> f64 {
        let h_ext = exterior_wind_speed
            .map(exterior_film_coeff)
            .unwrap_or(EXTERIOR_FILM_COEFF_DEFAULT);
        let r_materials: f64 = self.layers.iter().map(|l| l.r_value()).sum();
        1.0 / INTERIOR_FILM_COEFF + r_materials + 1.0 / h_ext
    }

    /// Thermal transmittance `U = 1 / R_total` in W/m²K.
    pub fn u_value(&self, exterior_wind_speed: Option<f64>) -> f64 {
        let r_total = self.r_value_total(exterior_wind_speed);
        assert!(r_total > 0.0, "Total R-value must be positive");
        1.0 / r_total
    }

    /// Total thermal capacitance per unit area in J/m²K.
    pub fn thermal_capacitance_per_area(&self) -> f64 {
        self.layers
            .iter()
            .map(|l| l.thermal_capacitance_per_area())
            .sum()
    }
}

/// Pre-defined materials for common building constructions.
///
/// Property values follow ASHRAE 140 and common building energy modeling
/// references.
pub struct Materials;

impl Materials {
    /// Plasterboard (gypsum board): k=0.16, ρ=950, Cp=840.
    pub fn plasterboard() -> Material {
        Material::new(0.16, 950.0, 840.0)
    }

    /// Fiberglass insulation: k=0.04, ρ=12, Cp=840.
    pub fn fiberglass() -> Material {
        Material::new(0.04, 12.0, 840.0)
    }

    /// Wood siding: k=0.14, ρ=500, Cp=1300.
    pub fn wood_siding() -> Material {
        Material::new(0.14, 500.0, 1300.0)
    }

    /// Normal-weight concrete: k=0.51, ρ=1400, Cp=1000.
    pub fn concrete() -> Material {
        Material::new(0.51, 1400.0, 1000.0)
    }

    /// Rigid foam insulation: k=0.04, ρ=10, Cp=1400.
    pub fn foam() -> Material {
        Material::new(0.04, 10.0, 1400.0)
    }

    /// Screed / floor concrete with embedded pipe registers: k=1.4, ρ=2000,
    /// Cp=1000. Typical active-layer material.
    pub fn screed() -> Material {
        Material::new(1.4, 2000.0, 1000.0)
    }
}

/// Pre-defined layer stacks used in tests and benchmarks.
pub struct Assemblies;

impl Assemblies {
    /// Low-mass wall (interior to exterior): plasterboard 12 mm, fiberglass
    /// 66 mm, wood siding 9 mm.
    pub fn low_mass_wall() -> Vec<MaterialLayer> {
        vec![
            MaterialLayer::new(Materials::plasterboard(), 0.012),
            MaterialLayer::new(Materials::fiberglass(), 0.066),
            MaterialLayer::new(Materials::wood_siding(), 0.009),
        ]
    }

    /// High-mass wall: concrete 100 mm, foam 61.5 mm, wood siding 9 mm.
    pub fn high_mass_wall() -> Vec<MaterialLayer> {
        vec![
            MaterialLayer::new(Materials::concrete(), 0.100),
            MaterialLayer::new(Materials::foam(), 0.0615),
            MaterialLayer::new(Materials::wood_siding(), 0.009),
        ]
    }

    /// Radiant floor: screed 60 mm (active layer 0), foam 40 mm, concrete
    /// 150 mm.
    pub fn radiant_floor() -> Vec<MaterialLayer> {
        vec![
            MaterialLayer::new(Materials::screed(), 0.060),
            MaterialLayer::new(Materials::foam(), 0.040),
            MaterialLayer::new(Materials::concrete(), 0.150),
        ]
    }
}
