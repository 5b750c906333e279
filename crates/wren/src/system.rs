//! # System — Application-Wide Behavior Objects
//!
//! A [`System`] is the application-scoped counterpart of a
//! [`Component`](crate::component::Component): same init/update/exit
//! lifecycle, but attached to the [`App`](crate::app::App) rather than a
//! node, updated once per frame after all components and after the
//! transform sweep, in strict registration order.
//!
//! A system's update callback returns a `bool`: returning `false` asks the
//! loop to stop after the current frame. That is the cooperative shutdown
//! path — a windowing backend returns `false` when the user closes the
//! window, a headless test system returns `false` after enough frames.

use std::any::Any;

use crate::app::Context;

/// Lifecycle hooks for a behavior object attached to the application.
///
/// All hooks receive the application [`Context`] (scene, input, timing,
/// active camera). Ownership is by move: a system belongs to at most one
/// application at a time.
pub trait System: Any {
    /// Called once, either during the application's init pass or, if the
    /// loop is already running, immediately on attach.
    fn on_init(&mut self, ctx: &mut Context) {
        let _ = ctx;
    }

    /// Called once per frame, after component updates and the transform
    /// sweep. Return `false` to stop the loop after this frame.
    fn on_update(&mut self, ctx: &mut Context, dt: f32) -> bool {
        let _ = (ctx, dt);
        true
    }

    /// Called once at shutdown, in registration order, or when the system
    /// is removed from the application.
    fn on_exit(&mut self, ctx: &mut Context) {
        let _ = ctx;
    }
}
