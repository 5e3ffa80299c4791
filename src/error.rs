//! Error types for setup and runtime failures.
//!
//! The taxonomy follows the engine's error-handling contract: configuration
//! errors abort setup with a descriptive message naming the offending entity,
//! mesh generation degrades gracefully and only fails on structurally empty
//! input, and programming-invariant violations are asserted rather than
//! propagated.

use thiserror::Error;

use crate::model::{EntityKind, ObjectId};

/// Errors raised by the mesh generator.
///
/// Mesh generation is deliberately forgiving: thin layers and element-cap
/// hits are logged warnings, not errors. Only structurally invalid input
/// fails.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The construction has no material layers at all.
    #[error("construction #{construction_id} has an empty material layer list")]
    EmptyLayerList { construction_id: ObjectId },
}

/// Configuration errors detected during setup.
///
/// None of these are retried: a construction either fully resolves and
/// integrates, or the whole setup fails.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A required input reference found no provider.
    #[error(
        "missing required input '{name}' from {kind:?} #{id}, requested by model #{requested_by}"
    )]
    MissingInput {
        name: &'static str,
        kind: EntityKind,
        id: ObjectId,
        requested_by: ObjectId,
    },

    /// More than one model supplies the same quantity slot.
    #[error(
        "duplicate providers for input '{name}' from {kind:?} #{id}: models {providers:?} all publish it"
    )]
    DuplicateProvider {
        name: &'static str,
        kind: EntityKind,
        id: ObjectId,
        providers: Vec<ObjectId>,
    },

    /// More than one heat-source model claims the same active layer.
    #[error("construction #{construction_id}: more than one model supplies a heat source for the active layer (models {claimants:?})")]
    DoubleActiveLayerClaim {
        construction_id: ObjectId,
        claimants: Vec<ObjectId>,
    },

    /// Radiant loads couple to a zone whose opaque absorption area is zero.
    #[error("zone #{zone_id}: opaque absorption area is zero, but construction #{construction_id} receives area-weighted radiant loads from it")]
    ZeroAbsorptionArea {
        zone_id: ObjectId,
        construction_id: ObjectId,
    },

    /// The configured active layer index does not address a material layer.
    #[error("construction #{construction_id}: active layer index {layer} out of range ({layer_count} layers)")]
    InvalidActiveLayer {
        construction_id: ObjectId,
        layer: usize,
        layer_count: usize,
    },

    /// A model received a resolved-pointer list of the wrong length.
    #[error("model #{model_id}: declared {declared} input references but received {resolved} resolved values")]
    InputCountMismatch {
        model_id: ObjectId,
        declared: usize,
        resolved: usize,
    },

    /// Mesh generation failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Runtime failure of a model's `update()`.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// A model could not complete its evaluation.
    #[error("model #{model_id} failed to update: {message}")]
    ModelFailure { model_id: ObjectId, message: String },
}
