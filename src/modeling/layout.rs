//! Layout collaborator seam.
//!
//! Anchor updates and connection re-routing are external concerns: the
//! command handlers only decide *when* they run and with which endpoint
//! changed, never *how* waypoints are computed. Implementations of
//! [`Layouter`] plug the actual layout engine in; [`NullLayouter`] leaves
//! routing untouched and [`RecordingLayouter`] counts invocations for tests.

use crate::model::{ConnectionId, Delta, Diagram, ShapeId};

/// Which endpoint of a connection moved, passed to re-layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutHints {
    pub start_changed: bool,
    pub end_changed: bool,
}

impl LayoutHints {
    pub fn start_changed() -> Self {
        Self {
            start_changed: true,
            end_changed: false,
        }
    }

    pub fn end_changed() -> Self {
        Self {
            start_changed: false,
            end_changed: true,
        }
    }
}

/// Layout capability consumed by post-execute cascades.
pub trait Layouter {
    /// Re-anchor whatever is visually pinned to `shape` after it moved by
    /// `delta` (labels, attachment points).
    fn update_anchors(&mut self, diagram: &mut Diagram, shape: ShapeId, delta: Delta);

    /// Re-route `connection` after one of its endpoints changed.
    fn layout_connection(
        &mut self,
        diagram: &mut Diagram,
        connection: ConnectionId,
        hints: LayoutHints,
    );
}

/// Layouter that performs no routing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLayouter;

impl Layouter for NullLayouter {
    fn update_anchors(&mut self, _diagram: &mut Diagram, _shape: ShapeId, _delta: Delta) {}

    fn layout_connection(
        &mut self,
        _diagram: &mut Diagram,
        _connection: ConnectionId,
        _hints: LayoutHints,
    ) {
    }
}

/// Test double that records every invocation in call order.
#[derive(Debug, Clone, Default)]
pub struct RecordingLayouter {
    pub anchor_updates: Vec<(ShapeId, Delta)>,
    pub connection_layouts: Vec<(ConnectionId, LayoutHints)>,
}

impl RecordingLayouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layouter for RecordingLayouter {
    fn update_anchors(&mut self, _diagram: &mut Diagram, shape: ShapeId, delta: Delta) {
        self.anchor_updates.push((shape, delta));
    }

    fn layout_connection(
        &mut self,
        _diagram: &mut Diagram,
        connection: ConnectionId,
        hints: LayoutHints,
    ) {
        self.connection_layouts.push((connection, hints));
    }
}
