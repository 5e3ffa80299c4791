//! Quantity storage and handle types for cross-model value coupling.
//!
//! Every model in the simulation publishes its computed results (temperatures,
//! fluxes, control signals) as named quantities. Other models consume them
//! through handles resolved once during setup. The storage lives in a single
//! [`QuantityArena`]: a flat `f64` store that only ever grows during the
//! publication phase, so a [`ValueRef`] handed out at setup stays valid for
//! the entire simulation run.
//!
//! # Design
//!
//! The reference implementation couples models through raw `double*` pointers
//! into each model's own result vectors. Here a [`ValueRef`] is an index into
//! the shared arena instead: same O(1) read cost, same resolve-once
//! discipline, no aliasing hazards. Vector-valued quantities occupy a
//! contiguous slot range, so "the whole vector" is just the base handle plus
//! a length.

use std::collections::BTreeSet;

/// Stable handle to a single scalar value in a [`QuantityArena`].
///
/// Handles are cheap to copy and remain valid for the lifetime of the arena.
/// A resolved input reference is exactly one of these (see
/// [`crate::resolver`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueRef(usize);

impl ValueRef {
    /// Returns the handle `n` slots after this one.
    ///
    /// Only meaningful within a contiguous vector-valued quantity: the caller
    /// is responsible for staying inside the published range.
    pub fn offset(self, n: usize) -> ValueRef {
        ValueRef(self.0 + n)
    }

    /// Raw slot index (for diagnostics only).
    pub fn index(self) -> usize {
        self.0
    }
}

/// A (result, input) handle pair describing a known data dependency.
///
/// Collected from every model once at setup and handed to the outer solver's
/// sparse-Jacobian machinery. Pairs are never deduplicated and cycles are
/// legitimate.
pub type DependencyPair = (ValueRef, ValueRef);

/// Flat, append-only value store shared by all models of one simulation.
///
/// Models allocate their result slots exactly once at setup and write into
/// them on every `update()`. The arena never frees or reorders slots, which
/// is what makes [`ValueRef`] handles stable.
///
/// # Example
///
/// ```
/// use wallflux::quantity::QuantityArena;
///
/// let mut arena = QuantityArena::new();
/// let t = arena.alloc_scalar(293.15);
/// arena.set(t, 295.0);
/// assert_eq!(arena.get(t), 295.0);
/// ```
#[derive(Debug, Default)]
pub struct QuantityArena {
    values: Vec<f64>,
}

impl QuantityArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Allocates one scalar slot with the given initial value.
    pub fn alloc_scalar(&mut self, init: f64) -> ValueRef {
        let r = ValueRef(self.values.len());
        self.values.push(init);
        r
    }

    /// Allocates `len` contiguous slots and returns the base handle.
    pub fn alloc_vector(&mut self, len: usize, init: f64) -> ValueRef {
        let r = ValueRef(self.values.len());
        self.values.resize(self.values.len() + len, init);
        r
    }

    /// Reads the value behind a handle.
    #[inline]
    pub fn get(&self, r: ValueRef) -> f64 {
        self.values[r.0]
    }

    /// Writes the value behind a handle.
    #[inline]
    pub fn set(&mut self, r: ValueRef, v: f64) {
        self.values[r.0] = v;
    }

    /// Borrows a contiguous vector-valued quantity.
    #[inline]
    pub fn slice(&self, base: ValueRef, len: usize) -> &[f64] {
        &self.values[base.0..base.0 + len]
    }

    /// Mutably borrows a contiguous vector-valued quantity.
    #[inline]
    pub fn slice_mut(&mut self, base: ValueRef, len: usize) -> &mut [f64] {
        &mut self.values[base.0..base.0 + len]
    }

    /// Copies `vals` into the slots starting at `base`.
    pub fn write(&mut self, base: ValueRef, vals: &[f64]) {
        self.values[base.0..base.0 + vals.len()].copy_from_slice(vals);
    }

    /// Total number of allocated slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A vector-valued quantity: a contiguous slot range plus the set of index
/// keys callers may address it with.
///
/// Keys need not be contiguous. A construction's `LayerTemperature` is keyed
/// by material-layer index, while `EmittedLongWaveRadiationA` is keyed by
/// neighbor construction id.
#[derive(Clone, Debug)]
pub struct VectorQuantity {
    base: ValueRef,
    keys: Vec<u32>,
}

impl VectorQuantity {
    /// Dense vector keyed `0..len`.
    pub fn dense(base: ValueRef, len: usize) -> Self {
        Self {
            base,
            keys: (0..len as u32).collect(),
        }
    }

    /// Vector with an explicit (sparse) key set. Keys are stored sorted.
    pub fn with_keys(base: ValueRef, keys: &BTreeSet<u32>) -> Self {
        Self {
            base,
            keys: keys.iter().copied().collect(),
        }
    }

    /// Base handle of the contiguous storage.
    pub fn base(&self) -> ValueRef {
        self.base
    }

    /// Number of published entries.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if the quantity publishes no entries.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The sorted index-key set.
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    /// Storage position of a key, or `None` if the key is not published.
    pub fn position(&self, key: u32) -> Option<usize> {
        self.keys.binary_search(&key).ok()
    }

    /// Handle to the entry addressed by `key`, or `None` if the key is
    /// outside the published key set.
    pub fn value_ref(&self, key: u32) -> Option<ValueRef> {
        self.position(key).map(|p| self.base.offset(p))
    }
}

/// Description of one published quantity, used for output configuration and
/// setup-time diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantityDescription {
    /// Quantity name as referenced by input references.
    pub name: &'static str,
    /// Physical unit of the published value(s).
    pub unit: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// True if the value never changes after setup.
    pub constant: bool,
    /// Index keys for vector-valued quantities; empty for scalars.
    pub index_keys: Vec<u32>,
}

impl QuantityDescription {
    /// Describes a scalar quantity.
    pub fn scalar(name: &'static str, unit: &'static str, description: &'static str) -> Self {
        Self {
            name,
            unit,
            description,
            constant: false,
            index_keys: Vec::new(),
        }
    }

    /// Describes a vector-valued quantity with the given key set.
    pub fn vector(
        name: &'static str,
        unit: &'static str,
        description: &'static str,
        keys: &[u32],
    ) -> Self {
        Self {
            name,
            unit,
            description,
            constant: false,
            index_keys: keys.to_vec(),
        }
    }
}
