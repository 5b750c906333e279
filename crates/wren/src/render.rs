//! # Render Boundary — What the Backend Receives
//!
//! Rendering itself is an external collaborator; this module is the seam.
//! Once per frame, [`RenderSystem`] assembles a [`RenderFrame`] — the active
//! camera's view matrix and projection parameters plus one [`DrawCall`] per
//! enabled mesh-bearing node — and hands it to a [`RenderBackend`]. The
//! backend owns the window too (in the spirit of immediate-mode libraries
//! where window and renderer are one handle), so it also reports the
//! user's close request, which the system translates into a loop stop.
//!
//! Mesh and material are plain handles here; resolving them to GPU objects
//! is the backend's business.

use crate::app::Context;
use crate::camera::Camera;
use crate::math::Mat4;
use crate::component::Component;
use crate::system::System;

/// Handle to a mesh asset owned by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Handle to a material asset owned by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u32);

/// Component that marks a node as drawable.
#[derive(Debug, Clone, Copy)]
pub struct MeshRenderer {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

impl MeshRenderer {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self { mesh, material }
    }
}

impl Component for MeshRenderer {}

/// One drawable: a resolved world matrix plus asset handles.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall {
    pub model: Mat4,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

/// Everything the backend needs for one frame.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    /// Inverse of the active camera node's world matrix.
    pub view: Mat4,
    /// The active camera's projection parameters.
    pub camera: Camera,
    /// One entry per enabled mesh renderer, in breadth-first scene order.
    pub draws: Vec<DrawCall>,
}

/// The rendering/windowing collaborator.
///
/// Implementations pair a window with a draw surface (raylib-style). The
/// core never calls into a graphics API directly.
pub trait RenderBackend {
    /// Open the window / acquire the device.
    fn on_init(&mut self) {}

    /// Draw one frame. Return `false` if the user asked to close the
    /// window; the owning [`RenderSystem`] forwards that as a loop stop.
    fn draw(&mut self, frame: &RenderFrame) -> bool;

    /// Release the window / device.
    fn on_exit(&mut self) {}
}

/// System that feeds the scene to a [`RenderBackend`] every frame.
///
/// Without an active camera there is nothing to draw; the frame is skipped
/// (the backend is not called) and the loop keeps running.
pub struct RenderSystem<B: RenderBackend> {
    backend: B,
}

impl<B: RenderBackend> RenderSystem<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Access the backend, e.g. to register meshes from game code.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: RenderBackend + 'static> System for RenderSystem<B> {
    fn on_init(&mut self, _ctx: &mut Context) {
        self.backend.on_init();
    }

    fn on_update(&mut self, ctx: &mut Context, _dt: f32) -> bool {
        let Some(camera_node) = ctx.active_camera else {
            log::debug!("render system: no active camera, skipping frame");
            return true;
        };
        let Some(camera) = ctx.scene.get_component::<Camera>(camera_node).copied() else {
            log::debug!("render system: active camera node has no Camera component");
            return true;
        };
        let Some(camera_world) = ctx.scene.world_matrix(camera_node) else {
            return true;
        };

        // The transform sweep already ran this frame, so these reads are
        // cache hits.
        let root = ctx.scene.root();
        let mut drawables = Vec::new();
        ctx.scene
            .traverse_components::<MeshRenderer>(root, |node, renderer| {
                drawables.push((node, *renderer));
            });

        let mut draws = Vec::with_capacity(drawables.len());
        for (node, renderer) in drawables {
            if ctx.scene.component_enabled::<MeshRenderer>(node) != Some(true) {
                continue;
            }
            if let Some(model) = ctx.scene.world_matrix(node) {
                draws.push(DrawCall {
                    model,
                    mesh: renderer.mesh,
                    material: renderer.material,
                });
            }
        }

        let frame = RenderFrame {
            view: camera_world.inverse(),
            camera,
            draws,
        };
        self.backend.draw(&frame)
    }

    fn on_exit(&mut self, _ctx: &mut Context) {
        self.backend.on_exit();
    }
}
