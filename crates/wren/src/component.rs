//! # Component — Per-Node Behavior Objects
//!
//! A [`Component`] is attached to exactly one node at a time and receives
//! lifecycle callbacks from the scene: one-time init on attach, per-frame
//! update while enabled, enable/disable edges, and destroy on detach or
//! teardown.
//!
//! The enabled flag lives in the component's slot, not in the component
//! itself, so every implementor gets idempotent enable/disable for free —
//! the callbacks fire only on actual state transitions.
//!
//! Single ownership is enforced by move semantics: attaching a component
//! consumes it, so a component can never be attached to two nodes. Moving
//! one between nodes goes through
//! [`remove_component`](crate::scene::Scene::remove_component) (destroy
//! callback) followed by [`add_component`](crate::scene::Scene::add_component)
//! (init callback), the same observable sequence as a reattach.
//!
//! # Example
//!
//! ```ignore
//! use wren::prelude::*;
//!
//! struct Spin {
//!     speed: f32,
//! }
//!
//! impl Component for Spin {
//!     fn on_update(&mut self, scene: &mut Scene, node: NodeId, dt: f32) {
//!         let step = Quat::from_rotation_y(self.speed * dt);
//!         scene.rotate(node, step, Space::Local);
//!     }
//! }
//! ```

use std::any::Any;

use crate::node::NodeId;
use crate::scene::Scene;

/// Lifecycle hooks for a behavior object attached to a node.
///
/// All hooks have empty defaults; implement only what you need. Hooks that
/// mutate the scene receive `&mut Scene` — the component itself is taken out
/// of the scene for the duration of the call, so the borrow is safe.
///
/// The `Any` supertrait powers typed lookup
/// ([`get_component::<T>`](Scene::get_component)) without runtime type
/// strings.
pub trait Component: Any {
    /// Called once when the component is attached to a node.
    fn on_init(&mut self, scene: &mut Scene, node: NodeId) {
        let _ = (scene, node);
    }

    /// Called when the component transitions from disabled to enabled.
    fn on_enable(&mut self) {}

    /// Called when the component transitions from enabled to disabled.
    fn on_disable(&mut self) {}

    /// Called once per frame while the component is enabled.
    fn on_update(&mut self, scene: &mut Scene, node: NodeId, dt: f32) {
        let _ = (scene, node, dt);
    }

    /// Called when the component is detached, its node is removed from the
    /// tree, or the owning application terminates.
    fn on_destroy(&mut self) {}
}

/// Arena slot for an attached component: the enabled flag plus the boxed
/// component itself.
///
/// `component` is `None` only while the component is temporarily extracted
/// for a callback (the extract/reinsert pattern); lookups skip `None` slots.
pub(crate) struct ComponentSlot {
    pub(crate) enabled: bool,
    pub(crate) component: Option<Box<dyn Component>>,
}

impl ComponentSlot {
    pub(crate) fn new(component: Box<dyn Component>) -> Self {
        Self {
            enabled: true,
            component: Some(component),
        }
    }

    /// Shared reference to the component as `T`, if it is one and is in place.
    pub(crate) fn downcast_ref<T: Component>(&self) -> Option<&T> {
        let component = self.component.as_deref()?;
        (component as &dyn Any).downcast_ref::<T>()
    }

    /// Mutable reference to the component as `T`, if it is one and is in place.
    pub(crate) fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        let component = self.component.as_deref_mut()?;
        (component as &mut dyn Any).downcast_mut::<T>()
    }

    /// Whether the slot currently holds a `T`.
    pub(crate) fn is<T: Component>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}
