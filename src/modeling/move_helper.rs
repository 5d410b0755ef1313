//! Recursive delta propagation over subtrees.
//!
//! Pure structural translation: every listed shape and all of its
//! descendants are translated by the same delta. Parent/child structure and
//! host attachments are never touched, so moving a container through here
//! does not re-run attach/detach logic on its content.

use log::trace;
use std::collections::HashSet;

use crate::error::ModelingError;
use crate::model::{Delta, Diagram, ShapeId};

/// Translate `shapes` and, for each, its descendants by `delta`.
///
/// A visited set guards against translating a shape twice, even if it is
/// reachable through multiple paths. The scene graph invariant forbids
/// cycles, so the guard is purely defensive.
pub fn move_recursive(
    diagram: &mut Diagram,
    shapes: &[ShapeId],
    delta: Delta,
) -> Result<(), ModelingError> {
    let mut visited = HashSet::new();
    for &shape in shapes {
        move_subtree(diagram, shape, delta, &mut visited)?;
    }
    Ok(())
}

fn move_subtree(
    diagram: &mut Diagram,
    shape: ShapeId,
    delta: Delta,
    visited: &mut HashSet<ShapeId>,
) -> Result<(), ModelingError> {
    if !visited.insert(shape) {
        return Ok(());
    }

    let entry = diagram.require_shape_mut(shape)?;
    entry.translate(delta);
    trace!("translated {} by ({}, {})", shape, delta.x, delta.y);

    let children = entry.children.clone();
    for child in children {
        move_subtree(diagram, child, delta, visited)?;
    }
    Ok(())
}
