//! Model and state-dependency contracts.
//!
//! Every participant in the simulation (construction models, zones, climate
//! loads, heat sources) implements [`Model`] to publish named quantities,
//! and [`StateDependency`] to declare symbolic inputs, receive resolved
//! handles, and perform its per-evaluation computation.
//!
//! Evaluation order is decided by a declared integer priority, not by the
//! dependency graph: the dependency pairs collected via
//! [`StateDependency::state_dependencies`] are advisory input for the outer
//! solver's Jacobian sparsity and are never used to reorder calls.

use crate::error::{SetupError, UpdateError};
use crate::quantity::{DependencyPair, QuantityArena, QuantityDescription, ValueRef};

/// Unique id of a simulation entity (zone, construction instance, model, ...).
pub type ObjectId = u32;

/// The kind of entity a model represents, and the namespace an
/// [`InputReference`] is resolved against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Outdoor climate / location-level quantities. By convention id 0.
    Location,
    /// A thermal zone (room air node).
    Zone,
    /// One discretized wall/floor/roof assembly.
    ConstructionInstance,
    /// A generic model object (controllers, load models, heat sources).
    Model,
    /// A hydraulic network.
    Network,
}

/// A symbolic, not-yet-resolved request for a named quantity from a named
/// entity.
///
/// Created during setup, resolved exactly once to a [`ValueRef`] (or `None`
/// for unmet optional references), then discarded except for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputReference {
    /// Id of the providing entity.
    pub id: ObjectId,
    /// Kind of the providing entity.
    pub kind: EntityKind,
    /// Quantity name, by convention a plain string such as `"AirTemperature"`.
    pub name: &'static str,
    /// Index into a vector-valued quantity; `None` addresses a scalar or the
    /// base of a whole vector.
    pub index: Option<u32>,
    /// If true, setup fails when no provider resolves this reference.
    pub required: bool,
}

impl InputReference {
    /// A required reference.
    pub fn required(kind: EntityKind, id: ObjectId, name: &'static str) -> Self {
        Self {
            id,
            kind,
            name,
            index: None,
            required: true,
        }
    }

    /// An optional reference; unresolved is a legitimate outcome.
    pub fn optional(kind: EntityKind, id: ObjectId, name: &'static str) -> Self {
        Self {
            id,
            kind,
            name,
            index: None,
            required: false,
        }
    }

    /// Addresses one entry of a vector-valued quantity.
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }
}

/// Evaluation priority of head models: construction/zone state models that
/// decompose the solver's `y` vector run before everything else.
pub const PRIORITY_HEAD: i32 = 0;

/// Default priority for ordinary boundary-condition and control models.
pub const PRIORITY_DEFAULT: i32 = 1_000;

/// Base priority of tail models. Balance models aggregate fluxes from nearly
/// every other model category and run last, at offsets above this.
pub const PRIORITY_OFFSET_TAIL: i32 = 100_000;

/// Capability interface of models that feed heat into a construction's
/// active layer (ideal surface heating, pipe registers, network elements).
///
/// Replaces the reference implementation's dynamic casts over the
/// heterogeneous model list: a model opts in by overriding
/// [`Model::as_active_layer_source`].
pub trait ActiveLayerSource {
    /// True if this source supplies heat to the given construction's active
    /// layer.
    fn serves_construction(&self, construction_id: ObjectId) -> bool;
}

/// Result-publication contract implemented by every model.
pub trait Model {
    /// Unique id of the entity this model represents.
    fn id(&self) -> ObjectId;

    /// Namespace this model's results are resolved under.
    fn entity_kind(&self) -> EntityKind;

    /// Display name used in diagnostics.
    fn display_name(&self) -> &str {
        ""
    }

    /// Enumerates every published quantity with name, unit and, for
    /// vector-valued quantities, the index-key set.
    fn result_descriptions(&self) -> Vec<QuantityDescription>;

    /// Looks up the handle of a published quantity.
    ///
    /// Scalar quantities ignore `index`. Vector-valued quantities return the
    /// base handle of the whole (contiguous) vector for `index == None`, the
    /// addressed entry for a published key, and `None` for a key outside the
    /// published key set.
    fn result_value_ref(&self, name: &str, index: Option<u32>) -> Option<ValueRef>;

    /// Capability query for active-layer heat sources.
    fn as_active_layer_source(&self) -> Option<&dyn ActiveLayerSource> {
        None
    }
}

/// Evaluation contract of models participating in the per-timestep update.
pub trait StateDependency: Model {
    /// Evaluation priority; lower runs earlier. Ties keep their relative
    /// registration order.
    fn priority(&self) -> i32 {
        PRIORITY_DEFAULT
    }

    /// Composes this model's input references. Called once during setup with
    /// every *other* model in the simulation, so capability queries (e.g.
    /// finding active-layer heat sources) can run here.
    fn init_input_references(&mut self, _all_models: &[&dyn Model]) -> Result<(), SetupError> {
        Ok(())
    }

    /// Returns the declared input references, in resolution order.
    fn input_references(&self) -> Vec<InputReference> {
        Vec::new()
    }

    /// Receives the resolved handles, in the same order as declared by
    /// [`Self::input_references`]. `None` entries correspond to unmet
    /// optional references.
    fn set_input_value_refs(&mut self, refs: &[Option<ValueRef>]) -> Result<(), SetupError>;

    /// Appends this model's (result, input) dependency pairs. Pairs are not
    /// filtered for duplicates; cycles are expected and legitimate.
    fn state_dependencies(&self, _pairs: &mut Vec<DependencyPair>) {}

    /// Performs the per-evaluation computation, reading resolved inputs from
    /// and writing published results into the arena.
    fn update(&mut self, arena: &mut QuantityArena) -> Result<(), UpdateError>;
}
