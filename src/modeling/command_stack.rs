//! Command sequencing and undo/redo history.
//!
//! [`CommandStack`] is the single entry point through which reversible
//! mutations reach the diagram. It sequences `execute` → `post_execute`,
//! keeps the executed contexts on a bounded undo stack, and replays them
//! through `revert` on undo and `execute`/`post_execute` again on redo.
//!
//! Execution is single-threaded, cooperative and synchronous: every command
//! runs to completion, and at most one command is in flight at a time.
//! Batches run as two explicit passes, all executes before any
//! post-processing, so a multi-shape move sees no interleaved layout.

use log::debug;

use super::create_shape::{CreateContext, CreateShapeHandler};
use super::delete_shape::{DeleteContext, DeleteShapeHandler};
use super::layout::Layouter;
use super::move_shape::{MoveContext, MoveShapeHandler};
use crate::error::ModelingError;
use crate::model::{Diagram, ShapeId};

const DEFAULT_MAX_DEPTH: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Command
// ────────────────────────────────────────────────────────────────────────────

/// A dispatchable reversible command, one variant per handler.
///
/// The wrapped context is mutated in place across the
/// execute/post_execute/revert lifecycle and carries the state revert needs.
#[derive(Debug, Clone)]
pub enum Command {
    MoveShape(MoveContext),
    CreateShape(CreateContext),
    DeleteShape(DeleteContext),
}

impl Command {
    /// Operation name used for rule lookup.
    pub fn operation(&self) -> &'static str {
        match self {
            Command::MoveShape(_) => "shape.move",
            Command::CreateShape(_) => "shape.create",
            Command::DeleteShape(_) => "shape.delete",
        }
    }

    fn execute(&mut self, diagram: &mut Diagram) -> Result<ShapeId, ModelingError> {
        match self {
            Command::MoveShape(ctx) => MoveShapeHandler::execute(diagram, ctx),
            Command::CreateShape(ctx) => CreateShapeHandler::execute(diagram, ctx),
            Command::DeleteShape(ctx) => DeleteShapeHandler::execute(diagram, ctx),
        }
    }

    fn post_execute(
        &mut self,
        diagram: &mut Diagram,
        layouter: &mut dyn Layouter,
    ) -> Result<(), ModelingError> {
        match self {
            Command::MoveShape(ctx) => MoveShapeHandler::post_execute(diagram, layouter, ctx),
            Command::CreateShape(ctx) => CreateShapeHandler::post_execute(diagram, layouter, ctx),
            Command::DeleteShape(ctx) => DeleteShapeHandler::post_execute(diagram, layouter, ctx),
        }
    }

    fn revert(&mut self, diagram: &mut Diagram) -> Result<ShapeId, ModelingError> {
        match self {
            Command::MoveShape(ctx) => MoveShapeHandler::revert(diagram, ctx),
            Command::CreateShape(ctx) => CreateShapeHandler::revert(diagram, ctx),
            Command::DeleteShape(ctx) => DeleteShapeHandler::revert(diagram, ctx),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Command stack
// ────────────────────────────────────────────────────────────────────────────

/// An executed entry on the undo/redo stacks.
#[derive(Debug, Clone)]
enum StackEntry {
    Single(Command),
    Batch(Vec<Command>),
}

impl StackEntry {
    fn execute(
        &mut self,
        diagram: &mut Diagram,
        layouter: &mut dyn Layouter,
    ) -> Result<(), ModelingError> {
        match self {
            StackEntry::Single(command) => {
                command.execute(diagram)?;
                command.post_execute(diagram, layouter)
            }
            StackEntry::Batch(commands) => execute_two_phase(diagram, layouter, commands),
        }
    }

    fn revert(&mut self, diagram: &mut Diagram) -> Result<(), ModelingError> {
        match self {
            StackEntry::Single(command) => command.revert(diagram).map(|_| ()),
            StackEntry::Batch(commands) => {
                for command in commands.iter_mut().rev() {
                    command.revert(diagram)?;
                }
                Ok(())
            }
        }
    }
}

/// Two-pass batch execution: every command's `execute` runs before any
/// `post_execute`. A failure in either phase reverts the already-applied
/// prefix in reverse order, so no partial mutation is committed.
fn execute_two_phase(
    diagram: &mut Diagram,
    layouter: &mut dyn Layouter,
    commands: &mut [Command],
) -> Result<(), ModelingError> {
    for index in 0..commands.len() {
        if let Err(error) = commands[index].execute(diagram) {
            for command in commands[..index].iter_mut().rev() {
                let _ = command.revert(diagram);
            }
            return Err(error);
        }
    }
    for index in 0..commands.len() {
        if let Err(error) = commands[index].post_execute(diagram, layouter) {
            for command in commands.iter_mut().rev() {
                let _ = command.revert(diagram);
            }
            return Err(error);
        }
    }
    Ok(())
}

/// Undo/redo history over reversible commands.
///
/// # Example
///
/// ```rust,ignore
/// let mut stack = CommandStack::new(100);
/// let ctx = MoveContext::new(shape, Delta::new(10, 0));
/// stack.execute(&mut diagram, &mut layouter, Command::MoveShape(ctx))?;
/// stack.undo(&mut diagram)?; // reverts the move
/// stack.redo(&mut diagram, &mut layouter)?; // re-applies it
/// ```
#[derive(Debug)]
pub struct CommandStack {
    undo_stack: Vec<StackEntry>,
    redo_stack: Vec<StackEntry>,
    max_depth: usize,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl CommandStack {
    /// Create a new stack with the given maximum undo depth.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Execute a single command: `execute`, then `post_execute`, then push
    /// it onto the undo stack and clear the redo stack.
    ///
    /// If post-processing fails, the already-applied execute is reverted so
    /// the diagram is not left mid-mutation, and nothing is recorded.
    pub fn execute(
        &mut self,
        diagram: &mut Diagram,
        layouter: &mut dyn Layouter,
        mut command: Command,
    ) -> Result<ShapeId, ModelingError> {
        debug!("execute {}", command.operation());
        let shape = command.execute(diagram)?;
        if let Err(error) = command.post_execute(diagram, layouter) {
            let _ = command.revert(diagram);
            return Err(error);
        }
        self.push(StackEntry::Single(command));
        Ok(shape)
    }

    /// Execute several commands as one undo step, in two explicit passes:
    /// all executes first, then all post-executes. If any command fails,
    /// the executed prefix is reverted in reverse order and nothing is
    /// recorded.
    pub fn execute_batch(
        &mut self,
        diagram: &mut Diagram,
        layouter: &mut dyn Layouter,
        mut commands: Vec<Command>,
    ) -> Result<(), ModelingError> {
        debug!("execute batch of {}", commands.len());
        execute_two_phase(diagram, layouter, &mut commands)?;
        self.push(StackEntry::Batch(commands));
        Ok(())
    }

    /// Undo the most recent entry, returning `false` when the history is
    /// empty. Batches are reverted in reverse command order.
    pub fn undo(&mut self, diagram: &mut Diagram) -> Result<bool, ModelingError> {
        match self.undo_stack.pop() {
            None => Ok(false),
            Some(mut entry) => {
                debug!("undo");
                entry.revert(diagram)?;
                self.redo_stack.push(entry);
                Ok(true)
            }
        }
    }

    /// Redo the most recently undone entry, returning `false` when there is
    /// nothing to redo.
    pub fn redo(
        &mut self,
        diagram: &mut Diagram,
        layouter: &mut dyn Layouter,
    ) -> Result<bool, ModelingError> {
        match self.redo_stack.pop() {
            None => Ok(false),
            Some(mut entry) => {
                debug!("redo");
                entry.execute(diagram, layouter)?;
                self.undo_stack.push(entry);
                Ok(true)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push(&mut self, entry: StackEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Delta;
    use crate::modeling::layout::NullLayouter;

    fn make_test_diagram() -> (Diagram, ShapeId) {
        let mut diagram = Diagram::new();
        let root = diagram.add_root("root");
        let shape = diagram.add_shape("shape", 100, 100, 30, 30, root).unwrap();
        (diagram, shape)
    }

    #[test]
    fn test_undo_redo_move() {
        let (mut diagram, shape) = make_test_diagram();
        let mut layouter = NullLayouter;
        let mut stack = CommandStack::default();

        let ctx = MoveContext::new(shape, Delta::new(200, 200));
        stack
            .execute(&mut diagram, &mut layouter, Command::MoveShape(ctx))
            .unwrap();
        assert_eq!(diagram.shape(shape).unwrap().position().x, 300);

        assert!(stack.undo(&mut diagram).unwrap());
        assert_eq!(diagram.shape(shape).unwrap().position().x, 100);

        assert!(stack.redo(&mut diagram, &mut layouter).unwrap());
        assert_eq!(diagram.shape(shape).unwrap().position().x, 300);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let (mut diagram, _shape) = make_test_diagram();
        let mut stack = CommandStack::default();

        assert!(!stack.undo(&mut diagram).unwrap());
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_execute_clears_redo() {
        let (mut diagram, shape) = make_test_diagram();
        let mut layouter = NullLayouter;
        let mut stack = CommandStack::default();

        for _ in 0..2 {
            let ctx = MoveContext::new(shape, Delta::new(10, 0));
            stack
                .execute(&mut diagram, &mut layouter, Command::MoveShape(ctx))
                .unwrap();
        }
        stack.undo(&mut diagram).unwrap();
        assert!(stack.can_redo());

        let ctx = MoveContext::new(shape, Delta::new(0, 10));
        stack
            .execute(&mut diagram, &mut layouter, Command::MoveShape(ctx))
            .unwrap();
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_history_max_depth() {
        let (mut diagram, shape) = make_test_diagram();
        let mut layouter = NullLayouter;
        let mut stack = CommandStack::new(3);

        for _ in 0..5 {
            let ctx = MoveContext::new(shape, Delta::new(10, 0));
            stack
                .execute(&mut diagram, &mut layouter, Command::MoveShape(ctx))
                .unwrap();
        }

        let mut undo_count = 0;
        while stack.undo(&mut diagram).unwrap() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);

        assert!(stack.can_redo());
        stack.clear();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_failed_command_leaves_no_history() {
        let (mut diagram, _shape) = make_test_diagram();
        let root = diagram.find_shape_by_name("root").unwrap().id;
        let mut layouter = NullLayouter;
        let mut stack = CommandStack::default();

        // moving a root shape is a contract violation
        let ctx = MoveContext::new(root, Delta::new(10, 0));
        assert!(stack
            .execute(&mut diagram, &mut layouter, Command::MoveShape(ctx))
            .is_err());
        assert!(!stack.can_undo());
    }
}
