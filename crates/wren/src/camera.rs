//! Camera component.
//!
//! A [`Camera`] on a node gives the render collaborator a viewpoint: the
//! view matrix is the inverse of the node's resolved world matrix, the
//! projection comes from the parameters here. Which camera is "active" is
//! recorded on the application context
//! ([`Context::active_camera`](crate::app::Context)), a non-owning node
//! handle.

use crate::component::Component;
use crate::math::Mat4;

/// Projection kind for a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// A viewpoint component.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Vertical field of view in degrees (perspective only). Default: 45.
    pub fov_y: f32,
    /// Projection kind. Default: perspective.
    pub projection: Projection,
    /// Near clipping plane distance.
    pub near: f32,
    /// Far clipping plane distance.
    pub far: f32,
}

impl Camera {
    /// A perspective camera with the given vertical field of view (degrees).
    pub fn perspective(fov_y: f32) -> Self {
        Self {
            fov_y,
            ..Self::default()
        }
    }

    /// An orthographic camera. `fov_y` is reused as the vertical half-height
    /// of the view volume.
    pub fn orthographic(half_height: f32) -> Self {
        Self {
            fov_y: half_height,
            projection: Projection::Orthographic,
            ..Self::default()
        }
    }

    /// The projection matrix for the given viewport aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
            }
            Projection::Orthographic => {
                let half_h = self.fov_y;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            projection: Projection::Perspective,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Component for Camera {}
