//! Finite-volume thermal engine for opaque building constructions.
//!
//! `wallflux` couples two concerns:
//!
//! 1. A generic model-composition framework: independently authored models
//!    publish named quantities into a shared [`quantity::QuantityArena`],
//!    declare symbolic input references, get them resolved once at setup
//!    ([`resolver`], [`graph::connect`]) and are evaluated in a fixed
//!    priority order every right-hand-side evaluation.
//! 2. 1D multilayer finite-volume thermal models: mesh generation over
//!    material layer stacks ([`sim::mesh`]), decomposition of conserved
//!    energy densities into temperatures and conduction fluxes
//!    ([`sim::states`]) and assembly of boundary fluxes and per-element
//!    time derivatives ([`sim::balance`]).
//!
//! The crate is a library consumed by an outer ODE/DAE driver; it performs
//! no I/O and runs strictly single-threaded. All temperatures are Kelvin.
//!
//! # Example
//!
//! ```
//! use wallflux::quantity::QuantityArena;
//! use wallflux::sim::construction::{ConstructionInstance, MaterialLayer, Materials};
//! use wallflux::sim::mesh::DiscretizationOptions;
//! use wallflux::sim::states::{ConstructionStatesModel, SurfaceExtrapolation};
//!
//! let con = ConstructionInstance::new(
//!     1,
//!     "test wall",
//!     10.0,
//!     vec![MaterialLayer::new(Materials::concrete(), 0.2)],
//! );
//! let mut arena = QuantityArena::new();
//! let model = ConstructionStatesModel::setup(
//!     &mut arena,
//!     con,
//!     &DiscretizationOptions::default(),
//!     SurfaceExtrapolation::Linear,
//!     293.15,
//!     &[],
//!     &[],
//! )
//! .unwrap();
//! let mut y = vec![0.0; model.n_states()];
//! model.y_initial(&mut y);
//! ```

pub mod error;
pub mod graph;
pub mod model;
pub mod quantity;
pub mod resolver;
pub mod sim;
