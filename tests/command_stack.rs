//! Batch execution and undo/redo through the command stack.

use diagramkit::model::{ConnectionId, Delta, Diagram, ShapeId};
use diagramkit::modeling::{
    Command, CommandStack, DeleteContext, LayoutHints, Layouter, MoveContext, NullLayouter,
};

fn scaffold() -> (Diagram, ShapeId, ShapeId) {
    let mut diagram = Diagram::new();
    let root = diagram.add_root("root");
    let first = diagram.add_shape("first", 100, 100, 30, 30, root).unwrap();
    let second = diagram.add_shape("second", 200, 100, 30, 30, root).unwrap();
    (diagram, first, second)
}

/// Layouter that snapshots the observed positions of both scaffold shapes
/// whenever it is invoked, to verify batch phase ordering.
struct PositionProbe {
    watched: Vec<ShapeId>,
    snapshots: Vec<Vec<(i32, i32)>>,
}

impl PositionProbe {
    fn new(watched: Vec<ShapeId>) -> Self {
        Self {
            watched,
            snapshots: Vec::new(),
        }
    }

    fn snapshot(&mut self, diagram: &Diagram) {
        let positions = self
            .watched
            .iter()
            .map(|&id| {
                let shape = diagram.shape(id).unwrap();
                (shape.x, shape.y)
            })
            .collect();
        self.snapshots.push(positions);
    }
}

impl Layouter for PositionProbe {
    fn update_anchors(&mut self, diagram: &mut Diagram, _shape: ShapeId, _delta: Delta) {
        self.snapshot(diagram);
    }

    fn layout_connection(
        &mut self,
        diagram: &mut Diagram,
        _connection: ConnectionId,
        _hints: LayoutHints,
    ) {
        self.snapshot(diagram);
    }
}

#[test]
fn batch_runs_all_executes_before_any_post_execute() {
    let (mut diagram, first, second) = scaffold();
    let mut probe = PositionProbe::new(vec![first, second]);
    let mut stack = CommandStack::default();

    let commands = vec![
        Command::MoveShape(MoveContext::new(first, Delta::new(10, 0))),
        Command::MoveShape(MoveContext::new(second, Delta::new(0, 10))),
    ];
    stack
        .execute_batch(&mut diagram, &mut probe, commands)
        .unwrap();

    // by the time any layout pass runs, both shapes have moved
    assert!(!probe.snapshots.is_empty());
    for snapshot in &probe.snapshots {
        assert_eq!(snapshot[0], (110, 100));
        assert_eq!(snapshot[1], (200, 110));
    }
}

#[test]
fn batch_undo_reverts_all_commands() {
    let (mut diagram, first, second) = scaffold();
    let before = diagram.clone();
    let mut stack = CommandStack::default();

    let commands = vec![
        Command::MoveShape(MoveContext::new(first, Delta::new(10, 0))),
        Command::MoveShape(MoveContext::new(second, Delta::new(0, 10))),
    ];
    stack
        .execute_batch(&mut diagram, &mut NullLayouter, commands)
        .unwrap();

    assert!(stack.undo(&mut diagram).unwrap());
    assert_eq!(diagram, before);

    assert!(stack.redo(&mut diagram, &mut NullLayouter).unwrap());
    assert_eq!(diagram.shape(first).unwrap().position().x, 110);
    assert_eq!(diagram.shape(second).unwrap().position().y, 110);
}

#[test]
fn aborted_batch_commits_nothing() {
    let (mut diagram, first, _second) = scaffold();
    let root = diagram.find_shape_by_name("root").unwrap().id;
    let before = diagram.clone();
    let mut stack = CommandStack::default();

    // the second command is a contract violation: roots cannot be moved
    let commands = vec![
        Command::MoveShape(MoveContext::new(first, Delta::new(10, 0))),
        Command::MoveShape(MoveContext::new(root, Delta::new(10, 0))),
    ];
    let result = stack.execute_batch(&mut diagram, &mut NullLayouter, commands);

    assert!(result.is_err());
    assert_eq!(diagram, before);
    assert!(!stack.can_undo());
}

#[test]
fn container_move_undo_restores_children() {
    let mut diagram = Diagram::new();
    let root = diagram.add_root("root");
    let container = diagram.add_shape("container", 100, 100, 300, 300, root).unwrap();
    let inner = diagram.add_shape("inner", 120, 130, 100, 100, container).unwrap();
    let leaf = diagram.add_shape("leaf", 140, 150, 20, 20, inner).unwrap();
    let before = diagram.clone();
    let mut stack = CommandStack::default();

    let command = Command::MoveShape(MoveContext::new(container, Delta::new(40, 10)));
    stack
        .execute(&mut diagram, &mut NullLayouter, command)
        .unwrap();
    assert_eq!(diagram.shape(leaf).unwrap().position().x, 180);

    stack.undo(&mut diagram).unwrap();
    assert_eq!(diagram, before);

    stack.redo(&mut diagram, &mut NullLayouter).unwrap();
    assert_eq!(diagram.shape(inner).unwrap().position().y, 140);
    assert_eq!(diagram.shape(leaf).unwrap().position().x, 180);
}

#[test]
fn mixed_batch_of_move_and_delete_round_trips() {
    let (mut diagram, first, second) = scaffold();
    diagram.add_connection(first, second).unwrap();
    let before = diagram.clone();
    let mut stack = CommandStack::default();

    let commands = vec![
        Command::MoveShape(MoveContext::new(first, Delta::new(25, 25))),
        Command::DeleteShape(DeleteContext::new(second)),
    ];
    stack
        .execute_batch(&mut diagram, &mut NullLayouter, commands)
        .unwrap();

    assert!(!diagram.contains_shape(second));
    assert_eq!(diagram.connection_count(), 0);

    stack.undo(&mut diagram).unwrap();
    assert_eq!(diagram, before);
}
