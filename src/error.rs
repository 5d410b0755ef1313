use thiserror::Error;

use crate::model::{ConnectionId, ShapeId};

/// Contract violations raised by the model and the command handlers.
///
/// Mutations are deterministic and local; these are programming errors, not
/// transient conditions, so there is no retry concept. Handlers fail fast
/// rather than silently no-op, since a silent partial mutation would corrupt
/// the undo history.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelingError {
    #[error("shape {0} is not part of the diagram")]
    UnknownShape(ShapeId),

    #[error("connection {0} is not part of the diagram")]
    UnknownConnection(ConnectionId),

    #[error("shape {0} has no parent and cannot be moved")]
    ShapeNotRooted(ShapeId),

    #[error("shape {0} is missing from the child list of its parent {1}")]
    CorruptChildList(ShapeId, ShapeId),

    #[error("shape {0} claims host {1} but is missing from its attacher list")]
    CorruptAttachment(ShapeId, ShapeId),

    #[error("detach requested for shape {0}, which is not attached to a host")]
    NotAttached(ShapeId),

    #[error("shape {0} is already attached to host {1}")]
    AlreadyAttached(ShapeId, ShapeId),

    #[error("command for shape {0} has not been executed or was already reverted")]
    NotExecuted(ShapeId),

    #[error("shape {0} still has children or attachers and cannot be deleted")]
    NotALeaf(ShapeId),
}
