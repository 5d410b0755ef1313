//! Reversible shape relocation.
//!
//! [`MoveShapeHandler`] implements one reversible move of a shape: optional
//! re-parenting, optional detaching from a host, exact position translation,
//! and the cascaded post-execute updates that keep anchors, connections and
//! children in sync.
//!
//! Cascading is deferred to `post_execute` so that a batched move can run
//! `execute` for many shapes before any layout pass happens.

use log::debug;

use super::layout::{LayoutHints, Layouter};
use super::move_helper;
use super::rules::RuleOutcome;
use crate::collections;
use crate::error::ModelingError;
use crate::model::{Delta, Diagram, ShapeId};

/// Reason token signalling that a move also detaches the shape from its
/// host. Produced by rule evaluation, consumed by [`MoveShapeHandler`].
pub const DETACH: &str = "detach";

// ────────────────────────────────────────────────────────────────────────────
// Context
// ────────────────────────────────────────────────────────────────────────────

/// Cascade-control flags for a move. All cascades default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hints {
    /// Re-anchor whatever is pinned to the moved shape.
    pub update_anchors: bool,
    /// Re-route connections whose endpoint moved.
    pub layout: bool,
    /// Translate the moved shape's descendants along.
    pub recurse: bool,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            update_anchors: true,
            layout: true,
            recurse: true,
        }
    }
}

/// Context of one in-flight move.
///
/// Created per operation and mutated in place across
/// execute/post_execute/revert. State written by `execute` and consumed by
/// `revert` lives in the private [`Moved`] record, so revert can recover the
/// pre-mutation state without a separate undo log.
#[derive(Debug, Clone)]
pub struct MoveContext {
    pub shape: ShapeId,
    pub delta: Delta,
    /// Target parent; the current parent when absent.
    pub new_parent: Option<ShapeId>,
    /// Rule outcome attached by the caller; the [`DETACH`] reason token
    /// makes the move also detach the shape from its host.
    pub can_execute: Option<RuleOutcome>,
    pub hints: Hints,
    moved: Option<Moved>,
    /// Whether post-execute recursion translated the children, so revert
    /// knows to translate them back.
    recursed: bool,
}

/// Pre-mutation state recorded by `execute`, consumed exactly once by
/// `revert`.
#[derive(Debug, Clone)]
struct Moved {
    old_parent: ShapeId,
    old_parent_index: usize,
    /// The host the shape was detached from, when the move detached.
    host: Option<ShapeId>,
}

impl MoveContext {
    pub fn new(shape: ShapeId, delta: Delta) -> Self {
        Self {
            shape,
            delta,
            new_parent: None,
            can_execute: None,
            hints: Hints::default(),
            moved: None,
            recursed: false,
        }
    }

    pub fn with_new_parent(mut self, new_parent: ShapeId) -> Self {
        self.new_parent = Some(new_parent);
        self
    }

    pub fn with_hints(mut self, hints: Hints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_can_execute(mut self, outcome: RuleOutcome) -> Self {
        self.can_execute = Some(outcome);
        self
    }

    fn detach_requested(&self) -> bool {
        self.can_execute
            .as_ref()
            .and_then(RuleOutcome::reason)
            .is_some_and(|reason| reason == DETACH)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handler
// ────────────────────────────────────────────────────────────────────────────

/// A handler that implements reversible moving of shapes.
pub struct MoveShapeHandler;

impl MoveShapeHandler {
    /// Apply the move: record the pre-mutation state in the context, detach
    /// from the host when requested, re-parent and translate the shape.
    ///
    /// The shape must already be part of the graph (it has a parent).
    /// No cascading side effects run at this stage.
    pub fn execute(diagram: &mut Diagram, ctx: &mut MoveContext) -> Result<ShapeId, ModelingError> {
        let shape_id = ctx.shape;
        let new_parent = Self::new_parent(diagram, ctx)?;

        let shape = diagram.require_shape(shape_id)?;
        let old_parent = shape
            .parent
            .ok_or(ModelingError::ShapeNotRooted(shape_id))?;

        // save the old location in the context
        let old_parent_index =
            collections::index_of(&diagram.require_shape(old_parent)?.children, &shape_id)
                .ok_or(ModelingError::CorruptChildList(shape_id, old_parent))?;

        let host = Self::remove_attachment(diagram, ctx)?;

        ctx.moved = Some(Moved {
            old_parent,
            old_parent_index,
            host,
        });

        // update shape parent + position; a same-parent move leaves the
        // child list untouched so sibling order is preserved
        if new_parent != old_parent {
            diagram
                .require_shape_mut(old_parent)?
                .children
                .remove(old_parent_index);
            diagram.require_shape_mut(new_parent)?.children.push(shape_id);
        }

        let shape = diagram.require_shape_mut(shape_id)?;
        shape.parent = Some(new_parent);
        shape.translate(ctx.delta);

        debug!(
            "moved {} by ({}, {}) into {}",
            shape_id, ctx.delta.x, ctx.delta.y, new_parent
        );

        Ok(shape_id)
    }

    /// Run the cascaded updates for an already-executed move, honouring the
    /// context hints.
    pub fn post_execute(
        diagram: &mut Diagram,
        layouter: &mut dyn Layouter,
        ctx: &mut MoveContext,
    ) -> Result<(), ModelingError> {
        let shape_id = ctx.shape;
        let shape = diagram.require_shape(shape_id)?;
        let incoming = shape.incoming.clone();
        let outgoing = shape.outgoing.clone();

        if ctx.hints.update_anchors {
            layouter.update_anchors(diagram, shape_id, ctx.delta);
        }

        if ctx.hints.layout {
            for connection in incoming {
                layouter.layout_connection(diagram, connection, LayoutHints::end_changed());
            }
            for connection in outgoing {
                layouter.layout_connection(diagram, connection, LayoutHints::start_changed());
            }
        }

        if ctx.hints.recurse {
            Self::move_children(diagram, ctx)?;
            ctx.recursed = true;
        }

        Ok(())
    }

    /// Exact inverse of [`execute`](Self::execute): reinsert the shape into
    /// the old parent's child list at its recorded index, restore the host
    /// attachment, reset the parent and subtract the delta.
    ///
    /// Reverting a context that was never executed, or reverting twice,
    /// fails fast instead of corrupting the position.
    pub fn revert(diagram: &mut Diagram, ctx: &mut MoveContext) -> Result<ShapeId, ModelingError> {
        let shape_id = ctx.shape;
        let moved = ctx
            .moved
            .take()
            .ok_or(ModelingError::NotExecuted(shape_id))?;

        let current_parent = diagram
            .require_shape(shape_id)?
            .parent
            .ok_or(ModelingError::ShapeNotRooted(shape_id))?;

        // translate the children back if post-execute recursed into them
        if ctx.recursed {
            let children = diagram.require_shape(shape_id)?.children.clone();
            move_helper::move_recursive(diagram, &children, ctx.delta.inverted())?;
            ctx.recursed = false;
        }

        // restore the previous location in the old parent
        if current_parent != moved.old_parent {
            collections::remove(
                &mut diagram.require_shape_mut(current_parent)?.children,
                &shape_id,
            )
            .ok_or(ModelingError::CorruptChildList(shape_id, current_parent))?;
            collections::add(
                &mut diagram.require_shape_mut(moved.old_parent)?.children,
                shape_id,
                Some(moved.old_parent_index),
            );
        }

        Self::set_attachment(diagram, shape_id, moved.host)?;

        // revert to the old position and parent
        let shape = diagram.require_shape_mut(shape_id)?;
        shape.parent = Some(moved.old_parent);
        shape.translate(ctx.delta.inverted());

        debug!("reverted move of {}", shape_id);

        Ok(shape_id)
    }

    /// Translate all children of the moved shape by the context delta,
    /// without re-running parent or attachment logic on them.
    pub fn move_children(diagram: &mut Diagram, ctx: &MoveContext) -> Result<(), ModelingError> {
        let children = diagram.require_shape(ctx.shape)?.children.clone();
        move_helper::move_recursive(diagram, &children, ctx.delta)
    }

    /// The parent the shape moves into: `ctx.new_parent` when present, the
    /// shape's existing parent otherwise.
    pub fn new_parent(diagram: &Diagram, ctx: &MoveContext) -> Result<ShapeId, ModelingError> {
        match ctx.new_parent {
            Some(parent) => {
                diagram.require_shape(parent)?;
                Ok(parent)
            }
            None => diagram
                .require_shape(ctx.shape)?
                .parent
                .ok_or(ModelingError::ShapeNotRooted(ctx.shape)),
        }
    }

    /// Detach the shape from its host when the context carries the
    /// [`DETACH`] outcome; no-op otherwise. Returns the host for revert.
    ///
    /// A shape that claims a host but is missing from the host's attacher
    /// list is an inconsistent graph and an error.
    fn remove_attachment(
        diagram: &mut Diagram,
        ctx: &MoveContext,
    ) -> Result<Option<ShapeId>, ModelingError> {
        if !ctx.detach_requested() {
            return Ok(None);
        }

        let shape_id = ctx.shape;
        let host = diagram
            .require_shape(shape_id)?
            .host
            .ok_or(ModelingError::NotAttached(shape_id))?;

        collections::remove(&mut diagram.require_shape_mut(host)?.attachers, &shape_id)
            .ok_or(ModelingError::CorruptAttachment(shape_id, host))?;
        diagram.require_shape_mut(shape_id)?.host = None;

        Ok(Some(host))
    }

    /// Restore a previously removed attachment; no-op when the move did not
    /// detach.
    fn set_attachment(
        diagram: &mut Diagram,
        shape_id: ShapeId,
        host: Option<ShapeId>,
    ) -> Result<(), ModelingError> {
        let Some(host) = host else {
            return Ok(());
        };

        diagram.require_shape_mut(host)?.attachers.push(shape_id);
        diagram.require_shape_mut(shape_id)?.host = Some(host);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_diagram() -> (Diagram, ShapeId, ShapeId) {
        let mut diagram = Diagram::new();
        let root = diagram.add_root("root");
        let shape = diagram.add_shape("shape", 100, 100, 30, 30, root).unwrap();
        (diagram, root, shape)
    }

    #[test]
    fn test_moving_a_root_is_an_error() {
        let (mut diagram, root, _shape) = make_test_diagram();
        let mut ctx = MoveContext::new(root, Delta::new(10, 10));

        assert_eq!(
            MoveShapeHandler::execute(&mut diagram, &mut ctx),
            Err(ModelingError::ShapeNotRooted(root))
        );
    }

    #[test]
    fn test_revert_before_execute_is_an_error() {
        let (mut diagram, _root, shape) = make_test_diagram();
        let mut ctx = MoveContext::new(shape, Delta::new(10, 10));

        assert_eq!(
            MoveShapeHandler::revert(&mut diagram, &mut ctx),
            Err(ModelingError::NotExecuted(shape))
        );
    }

    #[test]
    fn test_double_revert_is_an_error() {
        let (mut diagram, _root, shape) = make_test_diagram();
        let mut ctx = MoveContext::new(shape, Delta::new(10, 10));

        MoveShapeHandler::execute(&mut diagram, &mut ctx).unwrap();
        MoveShapeHandler::revert(&mut diagram, &mut ctx).unwrap();
        assert_eq!(
            MoveShapeHandler::revert(&mut diagram, &mut ctx),
            Err(ModelingError::NotExecuted(shape))
        );
        // position was not over-subtracted
        assert_eq!(diagram.shape(shape).unwrap().position().x, 100);
    }

    #[test]
    fn test_detach_without_host_is_an_error() {
        let (mut diagram, _root, shape) = make_test_diagram();
        let mut ctx = MoveContext::new(shape, Delta::new(10, 10))
            .with_can_execute(RuleOutcome::allowed_with(DETACH));

        assert_eq!(
            MoveShapeHandler::execute(&mut diagram, &mut ctx),
            Err(ModelingError::NotAttached(shape))
        );
    }

    #[test]
    fn test_same_parent_move_keeps_sibling_order() {
        let (mut diagram, root, shape) = make_test_diagram();
        let sibling = diagram.add_shape("sibling", 200, 100, 30, 30, root).unwrap();

        let mut ctx = MoveContext::new(shape, Delta::new(5, 5));
        MoveShapeHandler::execute(&mut diagram, &mut ctx).unwrap();

        assert_eq!(diagram.shape(root).unwrap().children, vec![shape, sibling]);
    }
}
