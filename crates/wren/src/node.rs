//! # Node — A Point in the Spatial Hierarchy
//!
//! A [`Node`] carries a local [`Transform`], an ordered list of children, an
//! ordered list of attached components, and a cached world matrix guarded by
//! a dirty flag. Nodes live in a [`Scene`](crate::scene::Scene) arena and are
//! referred to by [`NodeId`] handles.
//!
//! ## Design: Generational Indices
//!
//! A `NodeId` pairs an arena slot index with a generation counter. When a
//! node is destroyed and its slot recycled, the generation increments, so any
//! stale handle is detected as dead instead of silently pointing at the new
//! occupant. This is the same scheme ECS libraries use for entity IDs, with
//! no bit packing: two `u32` fields, easy to read in a debugger.
//!
//! The parent link is a plain `NodeId` — a lookup key, never an owner. The
//! arena owns every node exactly once, so the child list being the only
//! "strong" reference removes any cycle-through-ownership risk.

use std::fmt;

use crate::component::ComponentSlot;
use crate::math::{Mat4, Transform};

/// Selects which coordinate space a relative transform operation works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Relative to the node's own parent.
    Local,
    /// Relative to the global origin.
    World,
}

/// A lightweight handle to a node in a [`Scene`](crate::scene::Scene).
///
/// Only valid for the scene that created it, and only while its generation
/// matches. Stale handles fail lookups safely.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index. Useful for diagnostics, not for lookup.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation counter.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A spatial entity: local transform, children, and attached components.
///
/// `Node` data is owned by the scene arena. Mutation goes through
/// [`Scene`](crate::scene::Scene) methods so the dirty flag stays honest;
/// this type only exposes read access (and is returned by value from
/// [`Scene::remove_child`](crate::scene::Scene::remove_child) once the node
/// has left the tree).
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) components: Vec<ComponentSlot>,
    pub(crate) local: Transform,
    /// Valid only while `dirty` is false.
    pub(crate) world_matrix: Mat4,
    pub(crate) dirty: bool,
}

impl Node {
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            local: Transform::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            dirty: false,
        }
    }

    /// The parent handle, or `None` for a root or detached node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The ordered child handles.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The node's local transform.
    pub fn local_transform(&self) -> Transform {
        self.local
    }

    /// Whether the cached world matrix is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of attached components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}
