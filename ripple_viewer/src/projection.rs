//! Orthographic camera for the background plate. The frustum is one unit tall
//! and `aspect` units wide; the unit quad is stretched to the same width so it
//! always fills the window, leaving the cover-fit to the fragment shader.

use glam::{Mat4, Vec3};

pub const FRUSTUM_SIZE: f32 = 1.0;
pub const NEAR: f32 = -1000.0;
pub const FAR: f32 = 1000.0;
const CAMERA_Z: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    view_proj: Mat4,
}

impl Projection {
    pub fn new(aspect: f32) -> Self {
        let half_w = FRUSTUM_SIZE * aspect / 2.0;
        let half_h = FRUSTUM_SIZE / 2.0;
        let proj = Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, NEAR, FAR);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, CAMERA_Z), Vec3::ZERO, Vec3::Y);
        let model = Mat4::from_scale(Vec3::new(aspect * FRUSTUM_SIZE, FRUSTUM_SIZE, 1.0));
        Self {
            view_proj: proj * view * model,
        }
    }

    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.view_proj.to_cols_array_2d()
    }
}
