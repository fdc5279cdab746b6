//! The per-frame uniform contract between the shell and the user's shader.

use glam::{Mat4, Vec2, Vec3};

use crate::camera::FlyCamera;
use crate::program::{ShaderProgram, UniformKind};
use quadshade_common::Resolution;

/// Uniform names the shell writes every frame.
pub mod names {
    pub const RESOLUTION: &str = "u_resolution";
    pub const TIME: &str = "u_time";
    pub const DELTA_TIME: &str = "u_deltatime";
    pub const CAMERA_ORIGIN: &str = "u_camorigin";
    pub const CAMERA_DIRECTION: &str = "u_camdir";
    pub const CAMERA_UP: &str = "u_camup";
    pub const PROJECTION: &str = "u_projection";
    pub const VIEW: &str = "u_view";
}

/// Every contract uniform with its expected type, in upload order.
pub const CONTRACT: [(&str, UniformKind); 8] = [
    (names::RESOLUTION, UniformKind::Vec2),
    (names::TIME, UniformKind::Float),
    (names::DELTA_TIME, UniformKind::Float),
    (names::CAMERA_ORIGIN, UniformKind::Vec3),
    (names::CAMERA_DIRECTION, UniformKind::Vec3),
    (names::CAMERA_UP, UniformKind::Vec3),
    (names::PROJECTION, UniformKind::Mat4),
    (names::VIEW, UniformKind::Mat4),
];

/// Snapshot of everything uploaded for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// Surface size in pixels.
    pub resolution: Vec2,
    /// Seconds since the shell started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    pub camera_origin: Vec3,
    pub camera_direction: Vec3,
    pub camera_up: Vec3,
    pub projection: Mat4,
    pub view: Mat4,
}

impl FrameUniforms {
    pub fn new(resolution: Resolution, time: f32, delta_time: f32, camera: &FlyCamera) -> Self {
        Self {
            resolution: resolution.as_vec2(),
            time,
            delta_time,
            camera_origin: camera.position(),
            camera_direction: camera.front(),
            camera_up: camera.up(),
            projection: camera.projection_matrix(),
            view: camera.view_matrix(),
        }
    }

    /// Upload the full set. Names the program does not declare are skipped
    /// by the program itself.
    pub fn apply(&self, program: &mut impl ShaderProgram) {
        program.set_vec2(names::RESOLUTION, self.resolution.x, self.resolution.y);
        program.set_float(names::TIME, self.time);
        program.set_float(names::DELTA_TIME, self.delta_time);
        program.set_vec3(names::CAMERA_ORIGIN, self.camera_origin);
        program.set_vec3(names::CAMERA_DIRECTION, self.camera_direction);
        program.set_vec3(names::CAMERA_UP, self.camera_up);
        program.set_mat4(names::PROJECTION, &self.projection);
        program.set_mat4(names::VIEW, &self.view);
    }
}

/// Contract uniforms `program` does not declare with the expected type.
pub fn missing_from(program: &impl ShaderProgram) -> Vec<&'static str> {
    CONTRACT
        .iter()
        .filter(|(name, kind)| program.uniform_kind(name) != Some(*kind))
        .map(|(name, _)| *name)
        .collect()
}
