//! # App — The Frame Loop
//!
//! [`App`] owns the application [`Context`] (scene, input, timing, active
//! camera) and the ordered list of [`System`]s, and sequences one frame:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ frame                                                   │
//! │  1. component updates    breadth-first, enabled only    │
//! │  2. transform sweep      resolve every dirty matrix     │
//! │  3. system updates       registration order; false=stop │
//! │  4. game update hook     runs even on the stopping frame│
//! │  5. measure wall clock   becomes next frame's delta     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is single-threaded and synchronous: every callback runs to
//! completion before the loop proceeds, so no callback ever observes a
//! half-updated frame. Shutdown is cooperative only — a system returns
//! `false` and the loop finishes the current frame, then tears down:
//! destroy callbacks for every component (enabled or not), system exit
//! hooks in registration order, game exit hook.
//!
//! The state machine is linear and runs once:
//! `Constructed → Initializing → Running → Stopping → Terminated`.

use std::any::Any;
use std::time::{Duration, Instant};

use crate::input::InputState;
use crate::node::NodeId;
use crate::scene::Scene;
use crate::system::System;
use crate::time::Time;

/// Where the application is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Built, not yet run.
    Constructed,
    /// Init hooks are firing.
    Initializing,
    /// Inside the frame loop.
    Running,
    /// A stop was requested; finishing the current frame / tearing down.
    Stopping,
    /// Torn down. The app will not run again.
    Terminated,
}

/// Everything systems and the game share: the scene, input state fed by the
/// windowing collaborator, frame timing, and the active camera handle.
pub struct Context {
    /// The node tree and all attached components.
    pub scene: Scene,
    /// Keyboard and mouse state (systems only; the tree never reads input).
    pub input: InputState,
    /// Frame timing (delta, elapsed, frame count).
    pub time: Time,
    /// Node carrying the camera the render collaborator should use.
    /// A plain handle — the scene still owns the node.
    pub active_camera: Option<NodeId>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            input: InputState::new(),
            time: Time::new(),
            active_camera: None,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// The application's own lifecycle hooks. Implement this on your game state
/// and hand it to [`App::run`].
///
/// Hooks receive the whole [`App`] (not just the context) so the game can
/// attach and remove systems at any point.
pub trait Game {
    /// Before any system initializes.
    fn on_init(&mut self, app: &mut App) {
        let _ = app;
    }

    /// After every system initialized, right before the first frame.
    fn on_start(&mut self, app: &mut App) {
        let _ = app;
    }

    /// Last step of every frame, after all systems — including the frame
    /// a system requested to stop on.
    fn on_update(&mut self, app: &mut App, dt: f32) {
        let _ = (app, dt);
    }

    /// After teardown: components destroyed, system exit hooks done.
    fn on_exit(&mut self, app: &mut App) {
        let _ = app;
    }
}

/// Owns the scene (through [`Context`]) and the system list; drives the
/// frame loop.
pub struct App {
    pub ctx: Context,
    systems: Vec<Box<dyn System>>,
    state: AppState,
}

impl App {
    pub fn new() -> Self {
        Self {
            ctx: Context::new(),
            systems: Vec::new(),
            state: AppState::Constructed,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Number of attached systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    // ── System registry ─────────────────────────────────────────────

    /// Attach a system at the end of the registration order.
    ///
    /// If the loop is already running its init hook fires immediately;
    /// otherwise it is deferred to the application's init pass.
    pub fn add_system<S: System>(&mut self, system: S) {
        let mut boxed: Box<dyn System> = Box::new(system);
        if matches!(self.state, AppState::Running | AppState::Stopping) {
            boxed.on_init(&mut self.ctx);
        }
        self.systems.push(boxed);
    }

    /// Returns `true` if a system of type `T` is attached.
    pub fn has_system<T: System>(&self) -> bool {
        self.get_system::<T>().is_some()
    }

    /// First attached system of type `T`, if any.
    pub fn get_system<T: System>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| (s.as_ref() as &dyn Any).downcast_ref::<T>())
    }

    /// Mutable access to the first attached system of type `T`.
    pub fn get_system_mut<T: System>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| (s.as_mut() as &mut dyn Any).downcast_mut::<T>())
    }

    /// Detach the first system of type `T`, firing its exit hook, and hand
    /// it back to the caller. `None` if no such system is attached.
    pub fn remove_system<T: System>(&mut self) -> Option<Box<T>> {
        let index = self
            .systems
            .iter()
            .position(|s| (s.as_ref() as &dyn Any).is::<T>())?;
        let mut system = self.systems.remove(index);
        system.on_exit(&mut self.ctx);
        let any: Box<dyn Any> = system;
        any.downcast::<T>().ok()
    }

    /// Run `hook` on each attached system in registration order. Each system
    /// is extracted for its call so it can receive the context mutably;
    /// systems attached during the pass are picked up by it.
    fn for_each_system(&mut self, mut hook: impl FnMut(&mut dyn System, &mut Context)) {
        let mut i = 0;
        while i < self.systems.len() {
            let mut system = self.systems.remove(i);
            hook(system.as_mut(), &mut self.ctx);
            self.systems.insert(i, system);
            i += 1;
        }
    }

    // ── The loop ────────────────────────────────────────────────────

    /// Run the application to completion. Returns when a system requests a
    /// stop and teardown has finished.
    ///
    /// Calling `run` on anything but a freshly constructed app is a no-op.
    pub fn run(&mut self, game: &mut dyn Game) {
        if self.state != AppState::Constructed {
            log::warn!("App::run called in state {:?}; ignoring", self.state);
            return;
        }

        self.state = AppState::Initializing;
        game.on_init(self);
        log::info!("initializing {} systems", self.systems.len());
        self.for_each_system(|system, ctx| system.on_init(ctx));
        game.on_start(self);

        self.state = AppState::Running;
        log::info!("entering frame loop");
        let mut delta = Duration::ZERO;
        while self.state == AppState::Running {
            let frame_start = Instant::now();
            self.ctx.time.tick(delta);
            let dt = delta.as_secs_f32();

            // (1) Per-frame component updates, breadth-first over a snapshot
            // of the tree; nodes spawned this frame update next frame.
            let root = self.ctx.scene.root();
            for node in self.ctx.scene.collect_bfs(root) {
                self.ctx.scene.update_node_components(node, dt);
            }

            // (2) Resolve every stale world matrix.
            self.ctx.scene.resolve_transforms();

            // (3) Systems, in registration order. A stop request still lets
            // the remaining systems (and the game hook below) finish the
            // frame.
            let mut stop = false;
            self.for_each_system(|system, ctx| {
                if !system.on_update(ctx, dt) {
                    stop = true;
                }
            });
            if stop {
                log::info!(
                    "stop requested on frame {}",
                    self.ctx.time.frame_count()
                );
                self.state = AppState::Stopping;
            }

            // (4) The game's own per-frame hook.
            game.on_update(self, dt);

            // (5) This frame's wall-clock time is next frame's delta.
            delta = frame_start.elapsed();
        }

        // Teardown: every component of every node, regardless of enabled
        // state, then systems in registration order, then the game.
        let root = self.ctx.scene.root();
        self.ctx.scene.destroy_subtree_components(root);
        self.for_each_system(|system, ctx| system.on_exit(ctx));
        game.on_exit(self);
        self.state = AppState::Terminated;
        log::info!("terminated after {} frames", self.ctx.time.frame_count());
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
