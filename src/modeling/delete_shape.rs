//! Reversible shape deletion.
//!
//! Deleting a shape removes it from its parent's child list, detaches it
//! from its host and removes its incident connections; everything is
//! recorded so `revert` restores the shape, the attachment and the
//! connections. Only leaves may be deleted: a shape that still has children
//! or attachers must have them deleted (or moved away) first.

use log::debug;

use super::layout::Layouter;
use crate::collections;
use crate::error::ModelingError;
use crate::model::{Connection, Diagram, Shape, ShapeId};

/// Context of one in-flight deletion.
#[derive(Debug, Clone)]
pub struct DeleteContext {
    pub shape: ShapeId,
    deleted: Option<Deleted>,
}

/// State recorded by `execute`, consumed exactly once by `revert`.
#[derive(Debug, Clone)]
struct Deleted {
    shape: Shape,
    parent_index: usize,
    connections: Vec<Connection>,
}

impl DeleteContext {
    pub fn new(shape: ShapeId) -> Self {
        Self {
            shape,
            deleted: None,
        }
    }
}

/// A handler that implements reversible deletion of leaf shapes.
pub struct DeleteShapeHandler;

impl DeleteShapeHandler {
    /// Remove the shape, its host attachment and its incident connections
    /// from the diagram, recording everything for revert.
    pub fn execute(
        diagram: &mut Diagram,
        ctx: &mut DeleteContext,
    ) -> Result<ShapeId, ModelingError> {
        let shape_id = ctx.shape;
        let shape = diagram.require_shape(shape_id)?;

        if !shape.children.is_empty() || !shape.attachers.is_empty() {
            return Err(ModelingError::NotALeaf(shape_id));
        }
        let parent = shape
            .parent
            .ok_or(ModelingError::ShapeNotRooted(shape_id))?;
        let host = shape.host;

        // incident connections first, so the snapshot shape carries empty
        // endpoint lists and revert can rebuild them symmetrically
        let incident: Vec<_> = shape
            .incoming
            .iter()
            .chain(shape.outgoing.iter())
            .copied()
            .collect();
        let mut connections = Vec::with_capacity(incident.len());
        for connection in incident {
            connections.push(diagram.remove_connection(connection)?);
        }

        if let Some(host) = host {
            collections::remove(&mut diagram.require_shape_mut(host)?.attachers, &shape_id)
                .ok_or(ModelingError::CorruptAttachment(shape_id, host))?;
        }

        let parent_index =
            collections::remove(&mut diagram.require_shape_mut(parent)?.children, &shape_id)
                .ok_or(ModelingError::CorruptChildList(shape_id, parent))?;

        let shape = diagram.take_shape(shape_id)?;
        ctx.deleted = Some(Deleted {
            shape,
            parent_index,
            connections,
        });

        debug!("deleted {} from {}", shape_id, parent);

        Ok(shape_id)
    }

    /// Deletion has no cascading side effects.
    pub fn post_execute(
        _diagram: &mut Diagram,
        _layouter: &mut dyn Layouter,
        _ctx: &mut DeleteContext,
    ) -> Result<(), ModelingError> {
        Ok(())
    }

    /// Reinsert the shape at its recorded child-list position and restore
    /// its host attachment and incident connections.
    pub fn revert(
        diagram: &mut Diagram,
        ctx: &mut DeleteContext,
    ) -> Result<ShapeId, ModelingError> {
        let deleted = ctx
            .deleted
            .take()
            .ok_or(ModelingError::NotExecuted(ctx.shape))?;

        let shape_id = deleted.shape.id;
        let parent = deleted
            .shape
            .parent
            .ok_or(ModelingError::ShapeNotRooted(shape_id))?;
        let host = deleted.shape.host;

        diagram.insert_shape(deleted.shape);
        collections::add(
            &mut diagram.require_shape_mut(parent)?.children,
            shape_id,
            Some(deleted.parent_index),
        );
        if let Some(host) = host {
            diagram.require_shape_mut(host)?.attachers.push(shape_id);
        }
        for connection in deleted.connections {
            diagram.restore_connection(connection)?;
        }

        Ok(shape_id)
    }
}
