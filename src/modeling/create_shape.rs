//! Reversible shape creation.
//!
//! Creation is gated by `"shape.create"` rules on the caller side: a denied
//! outcome means the command is never dispatched, so the scene graph stays
//! untouched. Once dispatched, `execute` inserts the shape and `revert`
//! removes it again, restoring the parent's child list exactly.

use log::debug;

use super::layout::Layouter;
use super::rules::RuleOutcome;
use crate::collections;
use crate::error::ModelingError;
use crate::model::{Diagram, Shape, ShapeId};

/// Blueprint for a shape about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSpec {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ShapeSpec {
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
        }
    }
}

/// Context of one in-flight creation.
#[derive(Debug, Clone)]
pub struct CreateContext {
    pub shape: ShapeSpec,
    /// Parent the new shape is dropped into.
    pub parent: ShapeId,
    /// Rule outcome attached by the caller.
    pub can_execute: Option<RuleOutcome>,
    /// Id allocated on first execute; reused on redo so undo/redo cycles
    /// are id-stable.
    created: Option<ShapeId>,
    executed: bool,
}

impl CreateContext {
    pub fn new(shape: ShapeSpec, parent: ShapeId) -> Self {
        Self {
            shape,
            parent,
            can_execute: None,
            created: None,
            executed: false,
        }
    }

    pub fn with_can_execute(mut self, outcome: RuleOutcome) -> Self {
        self.can_execute = Some(outcome);
        self
    }

    /// The id of the created shape, once executed.
    pub fn created(&self) -> Option<ShapeId> {
        self.created
    }
}

/// A handler that implements reversible creation of shapes.
pub struct CreateShapeHandler;

impl CreateShapeHandler {
    /// Insert the shape into the diagram, appended to the parent's child
    /// list.
    pub fn execute(
        diagram: &mut Diagram,
        ctx: &mut CreateContext,
    ) -> Result<ShapeId, ModelingError> {
        diagram.require_shape(ctx.parent)?;

        let id = match ctx.created {
            Some(id) => id,
            None => diagram.alloc_shape_id(),
        };
        ctx.created = Some(id);

        diagram.insert_shape(Shape {
            id,
            name: ctx.shape.name.clone(),
            x: ctx.shape.x,
            y: ctx.shape.y,
            width: ctx.shape.width,
            height: ctx.shape.height,
            parent: Some(ctx.parent),
            children: Vec::new(),
            host: None,
            attachers: Vec::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        });
        diagram.require_shape_mut(ctx.parent)?.children.push(id);
        ctx.executed = true;

        debug!("created {} ({}) in {}", id, ctx.shape.name, ctx.parent);

        Ok(id)
    }

    /// Creation has no cascading side effects.
    pub fn post_execute(
        _diagram: &mut Diagram,
        _layouter: &mut dyn Layouter,
        _ctx: &mut CreateContext,
    ) -> Result<(), ModelingError> {
        Ok(())
    }

    /// Remove the created shape again, restoring the parent's child list.
    pub fn revert(
        diagram: &mut Diagram,
        ctx: &mut CreateContext,
    ) -> Result<ShapeId, ModelingError> {
        let id = match (ctx.executed, ctx.created) {
            (true, Some(id)) => id,
            _ => return Err(ModelingError::NotExecuted(ctx.parent)),
        };

        collections::remove(&mut diagram.require_shape_mut(ctx.parent)?.children, &id)
            .ok_or(ModelingError::CorruptChildList(id, ctx.parent))?;
        diagram.take_shape(id)?;
        ctx.executed = false;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_revert_round_trips() {
        let mut diagram = Diagram::new();
        let root = diagram.add_root("root");
        let before = diagram.clone();

        let mut ctx = CreateContext::new(ShapeSpec::new("created", 10, 20, 50, 50), root);
        let id = CreateShapeHandler::execute(&mut diagram, &mut ctx).unwrap();

        assert_eq!(diagram.shape(id).unwrap().parent, Some(root));
        assert_eq!(diagram.shape(root).unwrap().children, vec![id]);

        CreateShapeHandler::revert(&mut diagram, &mut ctx).unwrap();
        assert_eq!(diagram, before);
    }

    #[test]
    fn test_redo_reuses_the_allocated_id() {
        let mut diagram = Diagram::new();
        let root = diagram.add_root("root");

        let mut ctx = CreateContext::new(ShapeSpec::new("created", 0, 0, 10, 10), root);
        let first = CreateShapeHandler::execute(&mut diagram, &mut ctx).unwrap();
        CreateShapeHandler::revert(&mut diagram, &mut ctx).unwrap();
        let second = CreateShapeHandler::execute(&mut diagram, &mut ctx).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_revert_before_execute_is_an_error() {
        let mut diagram = Diagram::new();
        let root = diagram.add_root("root");

        let mut ctx = CreateContext::new(ShapeSpec::new("created", 0, 0, 10, 10), root);
        assert!(CreateShapeHandler::revert(&mut diagram, &mut ctx).is_err());
    }
}
