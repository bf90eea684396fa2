//! Camera and Model Animation
//!
//! Fixed perspective camera plus the per-frame model motion: a steady spin
//! about Y while the object drifts toward and away from the eye.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

/// Near clip distance
pub const CAM_NEAR: f32 = 75.0;
/// Far clip distance
pub const CAM_FAR: f32 = 3000.0;
/// Vertical field of view
pub const CAM_FOV_Y: f32 = PI / 6.0;
/// Eye position in world space
pub const CAM_EYE: Vec3 = Vec3::new(0.0, 0.0, 150.0);

/// Rotation added to the model every frame
pub const ANGLE_STEP: f32 = PI / 210.0;
/// Depth phase added to the model every frame
pub const DEPTH_PHASE_STEP: f32 = 2.0 * PI * 0.0008;

/// Fixed projection and view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
}

impl Camera {
    /// Standard camera for the given viewport aspect ratio
    pub fn new(aspect_ratio: f32) -> Self {
        Self::perspective(CAM_FOV_Y, aspect_ratio, CAM_NEAR, CAM_FAR, CAM_EYE, Vec3::ZERO)
    }

    /// Right-handed perspective camera with OpenGL depth range, +Y up
    pub fn perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32, eye: Vec3, target: Vec3) -> Self {
        Self {
            projection: Mat4::perspective_rh_gl(fov_y, aspect_ratio, near, far),
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
        }
    }

    /// Projection matrix
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// View matrix
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Model-view-projection for a model matrix
    pub fn mvp(&self, model: Mat4) -> Mat4 {
        self.projection * self.view * model
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(4.0 / 3.0)
    }
}

/// Time-varying model transform, advanced once per frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelAnimation {
    /// Rotation about Y in radians
    pub angle_y: f32,
    /// Phase of the depth oscillation in radians
    pub depth_phase: f32,
}

impl ModelAnimation {
    /// Animation at rest
    pub fn new() -> Self {
        Self::default()
    }

    /// Model translation along Z for the current phase
    pub fn depth_offset(&self) -> f32 {
        1400.0 * self.depth_phase.cos() - 1350.0
    }

    /// Translation applied after the spin
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, self.depth_offset())) * Mat4::from_rotation_y(self.angle_y)
    }

    /// Step to the next frame
    pub fn advance(&mut self) {
        self.angle_y += ANGLE_STEP;
        self.depth_phase += DEPTH_PHASE_STEP;
    }
}

/// Matrices derived for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub model: Mat4,
    pub model_view: Mat4,
    pub mvp: Mat4,
}

impl FrameTransforms {
    /// Combine the camera with a model matrix
    pub fn new(camera: &Camera, model: Mat4) -> Self {
        let model_view = camera.view() * model;
        Self {
            model,
            model_view,
            mvp: camera.projection() * model_view,
        }
    }
}
