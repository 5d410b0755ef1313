//! Reversible model mutation.
//!
//! Every mutation of the scene graph goes through a command handler that can
//! execute, post-process and perfectly revert it:
//!
//! - **Move**: relocate a shape, optionally re-parenting and detaching it
//!   from a host, cascading anchor updates, connection re-layout and
//!   subtree translation
//! - **Create**: insert a shape under a target parent
//! - **Delete**: remove a leaf shape together with its incident connections
//! - **Rules**: pluggable predicates callers consult before dispatching
//! - **Command stack**: sequencing, batching and bounded undo/redo history
//! - **Layout seam**: the trait boundary behind which anchor updates and
//!   connection routing live

pub mod command_stack;
pub mod create_shape;
pub mod delete_shape;
pub mod layout;
pub mod move_helper;
pub mod move_shape;
pub mod rules;

pub use command_stack::{Command, CommandStack};
pub use create_shape::{CreateContext, CreateShapeHandler, ShapeSpec};
pub use delete_shape::{DeleteContext, DeleteShapeHandler};
pub use layout::{LayoutHints, Layouter, NullLayouter, RecordingLayouter};
pub use move_shape::{DETACH, Hints, MoveContext, MoveShapeHandler};
pub use rules::{RuleOutcome, RuleRegistry};
