//! Input-reference resolution.
//!
//! After all models have published their results, every declared
//! [`InputReference`] is resolved exactly once to a [`ValueRef`] handle (or
//! `None` for unmet optional references). Resolution never happens again
//! during the run; the resolved handles are cached by the requesting model.
//!
//! Two configuration errors are detected here and abort setup immediately:
//! a required reference with no provider, and any reference for which more
//! than one model publishes the same quantity slot. The resolver never
//! silently picks one of several providers.

use crate::error::SetupError;
use crate::model::{InputReference, Model, ObjectId};
use crate::quantity::ValueRef;

/// Resolves `requests` (declared by model `requested_by`) against all
/// `models` in the simulation.
///
/// Returns one entry per request, in declaration order. `None` entries are
/// unmet optional references; callers must check them before every use.
pub fn resolve_input_references(
    models: &[&dyn Model],
    requests: &[InputReference],
    requested_by: ObjectId,
) -> Result<Vec<Option<ValueRef>>, SetupError> {
    let mut resolved = Vec::with_capacity(requests.len());
    for req in requests {
        resolved.push(resolve_one(models, req, requested_by)?);
    }
    Ok(resolved)
}

fn resolve_one(
    models: &[&dyn Model],
    req: &InputReference,
    requested_by: ObjectId,
) -> Result<Option<ValueRef>, SetupError> {
    let mut providers: Vec<(ObjectId, ValueRef)> = Vec::new();
    for m in models {
        if m.entity_kind() != req.kind || m.id() != req.id {
            continue;
        }
        if let Some(r) = m.result_value_ref(req.name, req.index) {
            providers.push((m.id(), r));
        }
    }
    match providers.len() {
        0 => {
            if req.required {
                Err(SetupError::MissingInput {
                    name: req.name,
                    kind: req.kind,
                    id: req.id,
                    requested_by,
                })
            } else {
                Ok(None)
            }
        }
        1 => Ok(Some(providers[0].1)),
        _ => Err(SetupError::DuplicateProvider {
            name: req.name,
            kind: req.kind,
            id: req.id,
            providers: providers.iter().map(|p| p.0).collect(),
        }),
    }
}
