use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collections;
use crate::error::ModelingError;

// ────────────────────────────────────────────────────────────────────────────
// Ids
// ────────────────────────────────────────────────────────────────────────────

/// Identifier of a [`Shape`] within its [`Diagram`].
///
/// Ids are allocated by the diagram and never reused; every cross-reference
/// in the model (parent, children, host, attachers) is an id, so the graph
/// can be serialized and cloned freely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ShapeId(u32);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identifier of a [`Connection`] within its [`Diagram`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ConnectionId(u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

/// A 2D translation vector applied to shape positions.
///
/// Deltas are integers so that applying a delta and later applying its
/// inverse restores the original coordinates exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub x: i32,
    pub y: i32,
}

impl Delta {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The point-symmetric inverse of this delta.
    pub fn inverted(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Shape
// ────────────────────────────────────────────────────────────────────────────

/// A node in the scene graph.
///
/// A shape belongs to exactly one parent's ordered child list at a time
/// (roots have no parent). Independently of nesting, a shape may be
/// *attached* to a host shape: `host` and the host's `attachers` list are
/// always updated together. `incoming` and `outgoing` reference connections
/// owned by the [`Diagram`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    /// Human-readable identifier, used by rule predicates.
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub parent: Option<ShapeId>,
    #[serde(default)]
    pub children: Vec<ShapeId>,
    #[serde(default)]
    pub host: Option<ShapeId>,
    #[serde(default)]
    pub attachers: Vec<ShapeId>,
    #[serde(default)]
    pub incoming: Vec<ConnectionId>,
    #[serde(default)]
    pub outgoing: Vec<ConnectionId>,
}

impl Shape {
    /// Translate the shape's position by `delta`.
    pub fn translate(&mut self, delta: Delta) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn position(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Connection
// ────────────────────────────────────────────────────────────────────────────

/// A graph edge referencing a source and a target shape.
///
/// Connections are owned by the diagram, not by the shapes they connect;
/// the endpoint shapes only hold non-owning id references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: ShapeId,
    pub target: ShapeId,
    /// Routing points maintained by the layout collaborator.
    #[serde(default)]
    pub waypoints: Vec<Point>,
}

// ────────────────────────────────────────────────────────────────────────────
// Diagram
// ────────────────────────────────────────────────────────────────────────────

/// The scene graph: owns all shapes and connections.
///
/// Shapes and connections live in insertion-ordered arenas keyed by id.
/// Structural invariants (exclusive parent membership, paired host/attacher
/// updates, endpoint lists matching connection ownership) are maintained by
/// the accessors here and by the command handlers in [`crate::modeling`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagram {
    shapes: IndexMap<ShapeId, Shape>,
    connections: IndexMap<ConnectionId, Connection>,
    next_shape_id: u32,
    next_connection_id: u32,
}

/// Equality compares graph content only, not id-allocation state.
impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.shapes == other.shapes && self.connections == other.connections
    }
}

impl Eq for Diagram {}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root shape (no parent, zero bounds).
    pub fn add_root(&mut self, name: &str) -> ShapeId {
        let id = self.alloc_shape_id();
        self.shapes.insert(
            id,
            Shape {
                id,
                name: name.to_string(),
                x: 0,
                y: 0,
                width: 0,
                height: 0,
                parent: None,
                children: Vec::new(),
                host: None,
                attachers: Vec::new(),
                incoming: Vec::new(),
                outgoing: Vec::new(),
            },
        );
        id
    }

    /// Add a shape under `parent`, appended to the parent's child list.
    pub fn add_shape(
        &mut self,
        name: &str,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        parent: ShapeId,
    ) -> Result<ShapeId, ModelingError> {
        self.require_shape(parent)?;
        let id = self.alloc_shape_id();
        self.shapes.insert(
            id,
            Shape {
                id,
                name: name.to_string(),
                x,
                y,
                width,
                height,
                parent: Some(parent),
                children: Vec::new(),
                host: None,
                attachers: Vec::new(),
                incoming: Vec::new(),
                outgoing: Vec::new(),
            },
        );
        self.shapes[&parent].children.push(id);
        Ok(id)
    }

    /// Attach `shape` to `host`, updating the host back-reference and the
    /// host's attacher list together.
    pub fn attach(&mut self, shape: ShapeId, host: ShapeId) -> Result<(), ModelingError> {
        self.require_shape(host)?;
        let s = self.require_shape(shape)?;
        if let Some(existing) = s.host {
            return Err(ModelingError::AlreadyAttached(shape, existing));
        }
        self.shapes[&shape].host = Some(host);
        self.shapes[&host].attachers.push(shape);
        Ok(())
    }

    /// Add a connection from `source` to `target`, registering it in the
    /// endpoints' outgoing/incoming lists.
    pub fn add_connection(
        &mut self,
        source: ShapeId,
        target: ShapeId,
    ) -> Result<ConnectionId, ModelingError> {
        self.require_shape(source)?;
        self.require_shape(target)?;
        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        self.connections.insert(
            id,
            Connection {
                id,
                source,
                target,
                waypoints: Vec::new(),
            },
        );
        self.shapes[&source].outgoing.push(id);
        self.shapes[&target].incoming.push(id);
        Ok(id)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn contains_shape(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Find the first shape with the given name.
    pub fn find_shape_by_name(&self, name: &str) -> Option<&Shape> {
        self.shapes.values().find(|s| s.name == name)
    }

    pub(crate) fn require_shape(&self, id: ShapeId) -> Result<&Shape, ModelingError> {
        self.shapes.get(&id).ok_or(ModelingError::UnknownShape(id))
    }

    pub(crate) fn require_shape_mut(
        &mut self,
        id: ShapeId,
    ) -> Result<&mut Shape, ModelingError> {
        self.shapes
            .get_mut(&id)
            .ok_or(ModelingError::UnknownShape(id))
    }

    pub(crate) fn alloc_shape_id(&mut self) -> ShapeId {
        let id = ShapeId(self.next_shape_id);
        self.next_shape_id += 1;
        id
    }

    /// Insert a fully-formed shape into the arena. The caller is responsible
    /// for wiring the parent's child list.
    pub(crate) fn insert_shape(&mut self, shape: Shape) {
        self.shapes.insert(shape.id, shape);
    }

    /// Remove a shape from the arena. The caller is responsible for having
    /// detached it from parent, host and connections beforehand.
    pub(crate) fn take_shape(&mut self, id: ShapeId) -> Result<Shape, ModelingError> {
        self.shapes
            .shift_remove(&id)
            .ok_or(ModelingError::UnknownShape(id))
    }

    /// Remove a connection, detaching it from both endpoints' lists.
    pub(crate) fn remove_connection(
        &mut self,
        id: ConnectionId,
    ) -> Result<Connection, ModelingError> {
        let connection = self
            .connections
            .shift_remove(&id)
            .ok_or(ModelingError::UnknownConnection(id))?;
        if let Some(source) = self.shapes.get_mut(&connection.source) {
            let _ = collections::remove(&mut source.outgoing, &id);
        }
        if let Some(target) = self.shapes.get_mut(&connection.target) {
            let _ = collections::remove(&mut target.incoming, &id);
        }
        Ok(connection)
    }

    /// Re-insert a previously removed connection, re-registering it with
    /// both endpoints.
    pub(crate) fn restore_connection(
        &mut self,
        connection: Connection,
    ) -> Result<(), ModelingError> {
        self.require_shape(connection.source)?;
        self.require_shape(connection.target)?;
        self.shapes[&connection.source].outgoing.push(connection.id);
        self.shapes[&connection.target].incoming.push(connection.id);
        self.connections.insert(connection.id, connection);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DiagramDoc – binary serialization wrapper
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramDoc {
    pub diagram: Diagram,
}

impl DiagramDoc {
    /// Save the DiagramDoc to a binary file with magic bytes and versioning.
    pub fn save_to_binary<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        std::io::Write::write_all(&mut writer, b"DIAGRAMKIT")?;
        std::io::Write::write_all(&mut writer, &1u32.to_le_bytes())?;
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
        Ok(())
    }

    /// Load a DiagramDoc from a binary file, checking magic bytes and version.
    pub fn load_from_binary<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        let mut magic = [0u8; 10];
        std::io::Read::read_exact(&mut reader, &mut magic)?;
        if &magic != b"DIAGRAMKIT" {
            anyhow::bail!("Invalid magic bytes: expected 'DIAGRAMKIT'");
        }
        let mut version_bytes = [0u8; 4];
        std::io::Read::read_exact(&mut reader, &mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != 1 {
            anyhow::bail!("Unsupported version: {}", version);
        }
        let doc: DiagramDoc =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
        Ok(doc)
    }
}
