//! # Scene — The Node Arena
//!
//! The [`Scene`] owns every node exactly once. Handles ([`NodeId`]) are
//! generational indices; the parent/child links between nodes are plain
//! handles, never owners.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Scene                                                │
//! │                                                      │
//! │  slots:       [Some(root), Some(a), None, Some(b)]   │
//! │  generations: [0,          2,       1,    0       ]  │
//! │  free_list:   [2]                                    │
//! │  root:        NodeId(0v0)                            │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Structural operations that would violate an invariant (reparenting to
//! self, to the current parent, into the node's own subtree, or through a
//! dead handle) are silent no-ops that return a negative result — all
//! preconditions are checkable up front, so there is no error type.
//!
//! Component callbacks receive `&mut Scene`. To make that borrow legal, the
//! component being called is taken out of its slot for the duration of the
//! callback and reinserted afterwards (extract/reinsert). Lookups skip a
//! slot whose component is currently extracted.
//!
//! The spatial API (local/world transforms, dirty resolution) lives in the
//! [`transform`](crate::transform) module as further `impl Scene` blocks.

use std::any::Any;
use std::collections::VecDeque;

use crate::component::{Component, ComponentSlot};
use crate::node::{Node, NodeId};

/// The container for a tree of spatial nodes and their components.
///
/// Created with a root node already in place; the root cannot be removed.
pub struct Scene {
    slots: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    root: NodeId,
}

impl Scene {
    /// Create a scene containing only a root node.
    pub fn new() -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        scene.root = scene.allocate();
        scene
    }

    /// The root node handle.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if the handle refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Read access to a node's data. `None` for stale or foreign handles.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        if self.generations.get(id.index as usize).copied() != Some(id.generation) {
            return None;
        }
        self.slots.get(id.index as usize)?.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.generations.get(id.index as usize).copied() != Some(id.generation) {
            return None;
        }
        self.slots.get_mut(id.index as usize)?.as_mut()
    }

    /// Create a standalone node, not linked anywhere in the tree.
    ///
    /// Attach it with [`set_parent`](Scene::set_parent) or
    /// [`add_child_node`](Scene::add_child_node).
    pub fn create_node(&mut self) -> NodeId {
        self.allocate()
    }

    fn allocate(&mut self) -> NodeId {
        if let Some(index) = self.free_list.pop() {
            self.slots[index as usize] = Some(Node::new());
            NodeId {
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(Node::new()));
            self.generations.push(0);
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove a node's data from the arena and invalidate its handle.
    fn free(&mut self, id: NodeId) -> Option<Node> {
        if self.generations.get(id.index as usize).copied() != Some(id.generation) {
            return None;
        }
        let node = self.slots.get_mut(id.index as usize)?.take()?;
        self.generations[id.index as usize] = self.generations[id.index as usize].wrapping_add(1);
        self.free_list.push(id.index);
        Some(node)
    }

    // ── Hierarchy ────────────────────────────────────────────────────

    /// Reparent `node` under `new_parent`.
    ///
    /// Returns `false` with no state change when either handle is dead, when
    /// `new_parent` is the node itself or its current parent, or when
    /// `new_parent` lies inside `node`'s own subtree (a node may never become
    /// its own ancestor). On success the node keeps its local transform —
    /// its world placement changes — and the whole subtree is marked dirty.
    pub fn set_parent(&mut self, node: NodeId, new_parent: NodeId) -> bool {
        if !self.contains(node) || !self.contains(new_parent) || new_parent == node {
            return false;
        }
        let current = self.node(node).and_then(Node::parent);
        if current == Some(new_parent) {
            return false;
        }
        if self.is_descendant(new_parent, node) {
            log::trace!("set_parent rejected: {new_parent} is a descendant of {node}");
            return false;
        }
        if let Some(old) = current
            && let Some(old_parent) = self.node_mut(old)
        {
            old_parent.children.retain(|&child| child != node);
        }
        if let Some(parent) = self.node_mut(new_parent) {
            parent.children.push(node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = Some(new_parent);
        }
        self.mark_subtree_dirty(node);
        true
    }

    /// Returns `true` if `node` is inside the subtree rooted at `ancestor`
    /// (a node counts as its own descendant).
    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(Node::parent);
        }
        false
    }

    /// Create a new node parented under `parent` and return it.
    pub fn add_child(&mut self, parent: NodeId) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let child = self.allocate();
        if self.set_parent(child, parent) {
            Some(child)
        } else {
            self.free(child);
            None
        }
    }

    /// Reparent an existing node under `parent`. `None` when
    /// [`set_parent`](Scene::set_parent) would fail.
    pub fn add_child_node(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        if self.set_parent(child, parent) {
            Some(child)
        } else {
            None
        }
    }

    /// Returns `true` if `child` is a direct child of `parent`.
    pub fn has_child(&self, parent: NodeId, child: NodeId) -> bool {
        self.node(parent)
            .is_some_and(|p| p.children.contains(&child))
    }

    /// Detach `child` from `parent` and destroy its whole subtree.
    ///
    /// Every component on every node in the subtree gets its destroy
    /// callback, the descendants leave the arena, and the detached node's
    /// own data is returned. `None` if `child` is not a direct child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Option<Node> {
        if !self.has_child(parent, child) {
            return None;
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        let order = self.collect_bfs(child);
        self.destroy_subtree_components(child);
        for &id in order.iter().skip(1) {
            self.free(id);
        }
        let mut node = self.free(child)?;
        node.parent = None;
        node.children.clear();
        Some(node)
    }

    // ── Components ──────────────────────────────────────────────────

    /// Attach a component to `node`, firing its init callback.
    ///
    /// Returns `false` (and drops the component) if the handle is dead.
    pub fn add_component<C: Component>(&mut self, node: NodeId, component: C) -> bool {
        if !self.contains(node) {
            return false;
        }
        let mut boxed: Box<dyn Component> = Box::new(component);
        boxed.on_init(self, node);
        match self.node_mut(node) {
            Some(n) => {
                n.components.push(ComponentSlot::new(boxed));
                true
            }
            // The init hook removed its own node; nothing left to attach to.
            None => false,
        }
    }

    /// First attached component of type `T`, if any.
    pub fn get_component<T: Component>(&self, node: NodeId) -> Option<&T> {
        self.node(node)?
            .components
            .iter()
            .find_map(ComponentSlot::downcast_ref::<T>)
    }

    /// Mutable access to the first attached component of type `T`.
    pub fn get_component_mut<T: Component>(&mut self, node: NodeId) -> Option<&mut T> {
        self.node_mut(node)?
            .components
            .iter_mut()
            .find_map(ComponentSlot::downcast_mut::<T>)
    }

    /// Returns `true` if `node` carries a component of type `T`.
    pub fn has_component<T: Component>(&self, node: NodeId) -> bool {
        self.get_component::<T>(node).is_some()
    }

    /// Detach the first component of type `T`, firing its destroy callback,
    /// and hand it back to the caller.
    pub fn remove_component<T: Component>(&mut self, node: NodeId) -> Option<Box<T>> {
        let index = self
            .node(node)?
            .components
            .iter()
            .position(ComponentSlot::is::<T>)?;
        let mut slot = self.node_mut(node)?.components.remove(index);
        let mut component = slot.component.take()?;
        component.on_destroy();
        let any: Box<dyn Any> = component;
        any.downcast::<T>().ok()
    }

    /// Set the enabled state of the first component of type `T`.
    ///
    /// Idempotent: the enable/disable callback fires only on an actual
    /// transition. Returns `true` if the state changed.
    pub fn set_component_enabled<T: Component>(&mut self, node: NodeId, enabled: bool) -> bool {
        let Some(n) = self.node_mut(node) else {
            return false;
        };
        let Some(slot) = n.components.iter_mut().find(|slot| slot.is::<T>()) else {
            return false;
        };
        if slot.enabled == enabled {
            return false;
        }
        slot.enabled = enabled;
        if let Some(component) = slot.component.as_mut() {
            if enabled {
                component.on_enable();
            } else {
                component.on_disable();
            }
        }
        true
    }

    /// Enabled state of the first component of type `T`, if present.
    pub fn component_enabled<T: Component>(&self, node: NodeId) -> Option<bool> {
        self.node(node)?
            .components
            .iter()
            .find(|slot| slot.is::<T>())
            .map(|slot| slot.enabled)
    }

    // ── Traversal ───────────────────────────────────────────────────

    /// Visit `start` and every node below it, breadth-first, exactly once.
    pub fn traverse(&self, start: NodeId, mut callback: impl FnMut(NodeId)) {
        if !self.contains(start) {
            return;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            callback(current);
            if let Some(node) = self.node(current) {
                queue.extend(node.children.iter().copied());
            }
        }
    }

    /// Breadth-first visit of every node below `start` that carries a `T`,
    /// passing the component along with its node.
    pub fn traverse_components<T: Component>(
        &self,
        start: NodeId,
        mut callback: impl FnMut(NodeId, &T),
    ) {
        self.traverse(start, |id| {
            if let Some(component) = self.get_component::<T>(id) {
                callback(id, component);
            }
        });
    }

    /// Breadth-first order of the subtree rooted at `start`, as a snapshot.
    pub(crate) fn collect_bfs(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.traverse(start, |id| order.push(id));
        order
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Run the update callback of every enabled component on `node`.
    ///
    /// Each component is extracted from its slot for the duration of its
    /// callback so it can receive `&mut Scene`. Components attached during
    /// the pass are picked up in the same pass; a component whose node
    /// disappears mid-callback still gets its destroy callback.
    pub(crate) fn update_node_components(&mut self, node: NodeId, dt: f32) {
        let mut i = 0;
        loop {
            let Some(n) = self.node(node) else {
                return;
            };
            let Some(slot) = n.components.get(i) else {
                break;
            };
            if !slot.enabled {
                i += 1;
                continue;
            }
            let extracted = self
                .node_mut(node)
                .and_then(|n| n.components.get_mut(i))
                .and_then(|slot| slot.component.take());
            let Some(mut component) = extracted else {
                i += 1;
                continue;
            };
            component.on_update(self, node, dt);
            match self.node_mut(node) {
                Some(n) => {
                    // Reinsert into the vacant slot; its index may have
                    // shifted if the callback removed a sibling.
                    if let Some(slot) = n.components.iter_mut().find(|s| s.component.is_none()) {
                        slot.component = Some(component);
                    }
                }
                None => component.on_destroy(),
            }
            i += 1;
        }
    }

    /// Fire the destroy callback of every component on every node in the
    /// subtree, regardless of enabled state. The nodes themselves stay put.
    pub(crate) fn destroy_subtree_components(&mut self, start: NodeId) {
        for id in self.collect_bfs(start) {
            if let Some(node) = self.node_mut(id) {
                for slot in &mut node.components {
                    if let Some(component) = slot.component.as_mut() {
                        component.on_destroy();
                    }
                }
            }
        }
    }

    // ── Dirty propagation ───────────────────────────────────────────

    /// Mark `node` and every descendant as needing world-matrix
    /// recomputation. Recomputation itself is deferred to the next read or
    /// to the frame's resolution sweep.
    pub(crate) fn mark_subtree_dirty(&mut self, node: NodeId) {
        for id in self.collect_bfs(node) {
            if let Some(n) = self.node_mut(id) {
                n.dirty = true;
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::math::Vec3;

    #[derive(Default)]
    struct Probe {
        inits: Rc<Cell<u32>>,
        updates: Rc<Cell<u32>>,
        enables: Rc<Cell<u32>>,
        disables: Rc<Cell<u32>>,
        destroys: Rc<Cell<u32>>,
    }

    impl Component for Probe {
        fn on_init(&mut self, _scene: &mut Scene, _node: NodeId) {
            self.inits.set(self.inits.get() + 1);
        }
        fn on_enable(&mut self) {
            self.enables.set(self.enables.get() + 1);
        }
        fn on_disable(&mut self) {
            self.disables.set(self.disables.get() + 1);
        }
        fn on_update(&mut self, _scene: &mut Scene, _node: NodeId, _dt: f32) {
            self.updates.set(self.updates.get() + 1);
        }
        fn on_destroy(&mut self) {
            self.destroys.set(self.destroys.get() + 1);
        }
    }

    struct Tag(&'static str);
    impl Component for Tag {}

    #[test]
    fn new_scene_has_a_root() {
        let scene = Scene::new();
        assert_eq!(scene.node_count(), 1);
        assert!(scene.contains(scene.root()));
        assert!(scene.node(scene.root()).unwrap().parent().is_none());
    }

    #[test]
    fn add_child_links_both_directions() {
        let mut scene = Scene::new();
        let root = scene.root();
        let child = scene.add_child(root).unwrap();
        assert!(scene.has_child(root, child));
        assert_eq!(scene.node(child).unwrap().parent(), Some(root));
    }

    #[test]
    fn set_parent_rejects_self_current_and_dead() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        assert!(!scene.set_parent(a, a), "self");
        assert!(!scene.set_parent(a, root), "already the parent");
        let b = scene.add_child(root).unwrap();
        scene.remove_child(root, b);
        assert!(!scene.set_parent(a, b), "dead target");
        // No state change from the failures.
        assert_eq!(scene.node(a).unwrap().parent(), Some(root));
    }

    #[test]
    fn set_parent_rejects_own_descendant() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        let c = scene.add_child(b).unwrap();
        assert!(!scene.set_parent(a, c));
        assert_eq!(scene.node(a).unwrap().parent(), Some(root));
        assert!(scene.has_child(b, c));
    }

    #[test]
    fn reparent_moves_between_child_lists() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(root).unwrap();
        let x = scene.add_child(a).unwrap();
        assert!(scene.set_parent(x, b));
        assert!(!scene.has_child(a, x));
        assert!(scene.has_child(b, x));
        assert_eq!(scene.node(x).unwrap().parent(), Some(b));
    }

    #[test]
    fn remove_child_destroys_the_subtree() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        let destroys = Rc::new(Cell::new(0));
        scene.add_component(
            a,
            Probe {
                destroys: destroys.clone(),
                ..Probe::default()
            },
        );
        scene.add_component(
            b,
            Probe {
                destroys: destroys.clone(),
                ..Probe::default()
            },
        );

        let removed = scene.remove_child(root, a).unwrap();
        assert_eq!(destroys.get(), 2);
        assert!(removed.parent().is_none());
        assert!(!scene.contains(a));
        assert!(!scene.contains(b));
        assert_eq!(scene.node_count(), 1);

        // Absent child: empty result, no callbacks.
        assert!(scene.remove_child(root, a).is_none());
        assert_eq!(destroys.get(), 2);
    }

    #[test]
    fn stale_handles_fail_after_slot_reuse() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        scene.remove_child(root, a);
        let b = scene.add_child(root).unwrap();
        // Slot is recycled but the generation moved on.
        assert_eq!(a.index(), b.index());
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
    }

    #[test]
    fn add_component_fires_init_once() {
        let mut scene = Scene::new();
        let root = scene.root();
        let inits = Rc::new(Cell::new(0));
        assert!(scene.add_component(
            root,
            Probe {
                inits: inits.clone(),
                ..Probe::default()
            },
        ));
        assert_eq!(inits.get(), 1);
        assert!(scene.has_component::<Probe>(root));
    }

    #[test]
    fn get_component_finds_first_of_kind() {
        let mut scene = Scene::new();
        let root = scene.root();
        scene.add_component(root, Tag("first"));
        scene.add_component(root, Tag("second"));
        assert_eq!(scene.get_component::<Tag>(root).unwrap().0, "first");
        scene.get_component_mut::<Tag>(root).unwrap().0 = "patched";
        assert_eq!(scene.get_component::<Tag>(root).unwrap().0, "patched");
    }

    #[test]
    fn remove_component_returns_it_after_destroy() {
        let mut scene = Scene::new();
        let root = scene.root();
        let destroys = Rc::new(Cell::new(0));
        scene.add_component(
            root,
            Probe {
                destroys: destroys.clone(),
                ..Probe::default()
            },
        );
        let removed = scene.remove_component::<Probe>(root);
        assert!(removed.is_some());
        assert_eq!(destroys.get(), 1);
        assert!(!scene.has_component::<Probe>(root));
        assert!(scene.remove_component::<Probe>(root).is_none());
    }

    #[test]
    fn enable_disable_is_idempotent() {
        let mut scene = Scene::new();
        let root = scene.root();
        let enables = Rc::new(Cell::new(0));
        let disables = Rc::new(Cell::new(0));
        scene.add_component(
            root,
            Probe {
                enables: enables.clone(),
                disables: disables.clone(),
                ..Probe::default()
            },
        );
        assert_eq!(scene.component_enabled::<Probe>(root), Some(true));

        // Components start enabled: enabling again is a no-op.
        assert!(!scene.set_component_enabled::<Probe>(root, true));
        assert_eq!(enables.get(), 0);

        assert!(scene.set_component_enabled::<Probe>(root, false));
        assert!(!scene.set_component_enabled::<Probe>(root, false));
        assert_eq!(disables.get(), 1);

        assert!(scene.set_component_enabled::<Probe>(root, true));
        assert!(!scene.set_component_enabled::<Probe>(root, true));
        assert_eq!(enables.get(), 1);
    }

    #[test]
    fn disabled_components_are_skipped_by_update() {
        let mut scene = Scene::new();
        let root = scene.root();
        let updates = Rc::new(Cell::new(0));
        scene.add_component(
            root,
            Probe {
                updates: updates.clone(),
                ..Probe::default()
            },
        );
        scene.update_node_components(root, 0.016);
        assert_eq!(updates.get(), 1);
        scene.set_component_enabled::<Probe>(root, false);
        scene.update_node_components(root, 0.016);
        assert_eq!(updates.get(), 1);
    }

    #[test]
    fn components_can_mutate_the_scene_during_update() {
        struct Mover;
        impl Component for Mover {
            fn on_update(&mut self, scene: &mut Scene, node: NodeId, dt: f32) {
                scene.translate(node, Vec3::X * dt, crate::node::Space::Local);
            }
        }
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        scene.add_component(a, Mover);
        scene.update_node_components(a, 2.0);
        let p = scene.local_position(a).unwrap();
        assert!((p.x - 2.0).abs() < 1e-6);
        // The component survived the extract/reinsert round trip.
        assert!(scene.has_component::<Mover>(a));
    }

    #[test]
    fn traverse_is_breadth_first() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(root).unwrap();
        let a1 = scene.add_child(a).unwrap();
        let b1 = scene.add_child(b).unwrap();
        let mut order = Vec::new();
        scene.traverse(root, |id| order.push(id));
        assert_eq!(order, vec![root, a, b, a1, b1]);
    }

    #[test]
    fn typed_traversal_filters_by_component() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(root).unwrap();
        let c = scene.add_child(a).unwrap();
        scene.add_component(a, Tag("a"));
        scene.add_component(c, Tag("c"));
        let _ = b;
        let mut seen = Vec::new();
        scene.traverse_components::<Tag>(root, |id, tag| seen.push((id, tag.0)));
        assert_eq!(seen, vec![(a, "a"), (c, "c")]);
    }
}
