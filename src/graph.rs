//! Model graph: setup orchestration, evaluation ordering, and dependency
//! collection.
//!
//! [`connect`] runs the one-time setup sequence: every model composes its
//! input references, the resolver turns them into stable handles, and each
//! model caches them. [`ModelGraph`] then fixes the per-timestep call order
//! from the declared priorities and collects the global (result, input)
//! dependency list for the outer solver's Jacobian sparsity.
//!
//! The scheduler never reorders based on discovered data dependencies; the
//! priority is authoritative for call order, the dependency pairs are
//! advisory for the Jacobian only.

use crate::error::{SetupError, UpdateError};
use crate::model::{Model, StateDependency};
use crate::quantity::{DependencyPair, QuantityArena};

/// Runs input-reference composition and resolution across all models.
///
/// Must be called exactly once, after every model has published its results
/// into the arena and before the first `update()`.
pub fn connect(models: &mut [Box<dyn StateDependency>]) -> Result<(), SetupError> {
    // pass 1: let each model compose its references, with a view of every
    // other model for capability queries
    for i in 0..models.len() {
        let (left, rest) = models.split_at_mut(i);
        let (current, right) = rest.split_first_mut().expect("index in range");
        let views: Vec<&dyn Model> = left
            .iter()
            .map(|m| m.as_ref() as &dyn Model)
            .chain(right.iter().map(|m| m.as_ref() as &dyn Model))
            .collect();
        current.init_input_references(&views)?;
    }

    // pass 2: collect the declared references
    let declared: Vec<_> = models.iter().map(|m| m.input_references()).collect();

    // pass 3: resolve against the full model list
    let mut resolved = Vec::with_capacity(models.len());
    {
        let views: Vec<&dyn Model> = models.iter().map(|m| m.as_ref() as &dyn Model).collect();
        for (m, refs) in models.iter().zip(&declared) {
            resolved.push(crate::resolver::resolve_input_references(
                &views,
                refs,
                m.id(),
            )?);
        }
    }

    // pass 4: hand the cached handles back
    for (m, refs) in models.iter_mut().zip(resolved) {
        m.set_input_value_refs(&refs)?;
    }
    Ok(())
}

/// Fixed evaluation order over a model list.
#[derive(Debug)]
pub struct ModelGraph {
    order: Vec<usize>,
}

impl ModelGraph {
    /// Builds the call order: ascending priority, ties keep registration
    /// order (stable sort).
    pub fn new(models: &[Box<dyn StateDependency>]) -> Self {
        let mut order: Vec<usize> = (0..models.len()).collect();
        order.sort_by_key(|&i| models[i].priority());
        Self { order }
    }

    /// The evaluation order as model indices.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Calls `update()` on every model in priority order.
    pub fn update_all(
        &self,
        models: &mut [Box<dyn StateDependency>],
        arena: &mut QuantityArena,
    ) -> Result<(), UpdateError> {
        for &i in &self.order {
            models[i].update(arena)?;
        }
        Ok(())
    }

    /// Collects every model's dependency pairs, unfiltered.
    pub fn dependency_pairs(&self, models: &[Box<dyn StateDependency>]) -> Vec<DependencyPair> {
        let mut pairs = Vec::new();
        for m in models {
            m.state_dependencies(&mut pairs);
        }
        pairs
    }
}
