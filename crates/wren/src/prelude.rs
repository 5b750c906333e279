//! Convenience re-exports — `use wren::prelude::*` for the common items.

pub use crate::app::{App, AppState, Context, Game};
pub use crate::camera::{Camera, Projection};
pub use crate::component::Component;
pub use crate::input::{Input, InputState, KeyCode, MouseButton};
pub use crate::math::{EulerRot, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::node::{Node, NodeId, Space};
pub use crate::render::{
    DrawCall, MaterialHandle, MeshHandle, MeshRenderer, RenderBackend, RenderFrame, RenderSystem,
};
pub use crate::scene::Scene;
pub use crate::system::System;
pub use crate::time::Time;
