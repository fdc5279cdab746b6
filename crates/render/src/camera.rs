use glam::{DVec2, Mat4, Vec3};
use quadshade_common::{CameraConfig, Resolution};
use quadshade_input::Movement;

/// Fly camera with position, yaw, pitch, and projection parameters.
///
/// Angles are radians. Movement is scaled by the frame delta, so distance
/// travelled depends on elapsed time only, never on frame count.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub speed: f32,
    /// Radians per pixel of cursor travel.
    pub sensitivity: f32,
    pub boost_multiplier: f32,
    last_cursor: Option<DVec2>,
}

/// Pitch limit, just short of straight up/down so `look_at` never degenerates.
const PITCH_LIMIT_DEGREES: f32 = 89.0;

impl Default for FlyCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), Resolution::default())
    }
}

impl FlyCamera {
    pub fn from_config(config: &CameraConfig, viewport: Resolution) -> Self {
        let limit = PITCH_LIMIT_DEGREES.to_radians();
        Self {
            position: config.position,
            yaw: config.yaw_degrees.to_radians(),
            pitch: config.pitch_degrees.to_radians().clamp(-limit, limit),
            fov: config.fov_degrees.to_radians(),
            aspect: viewport.aspect().unwrap_or(4.0 / 3.0),
            near: config.near,
            far: config.far,
            speed: config.speed,
            sensitivity: config.sensitivity.to_radians(),
            boost_multiplier: config.boost_multiplier,
            last_cursor: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit view direction.
    pub fn front(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    /// Camera-relative up, orthogonal to `front` and `right`.
    pub fn up(&self) -> Vec3 {
        self.right().cross(self.front()).normalize()
    }

    /// Advance the position by one frame of movement intent.
    ///
    /// Forward/back follow the view direction, strafing follows `right`,
    /// and up/down follow the world Y axis.
    pub fn update(&mut self, movement: Movement, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 || movement.is_idle() {
            return;
        }
        let speed = if movement.boost {
            self.speed * self.boost_multiplier
        } else {
            self.speed
        };
        let step = speed * dt;
        let delta = self.front() * movement.forward
            + self.right() * movement.right
            + Vec3::Y * movement.up;
        self.position += delta * step;
    }

    /// Feed an absolute cursor position.
    ///
    /// The first position after construction (or [`reset_mouse`]) only
    /// seeds the tracker. Later calls rotate by the delta from the previous
    /// position.
    ///
    /// [`reset_mouse`]: FlyCamera::reset_mouse
    pub fn mouse_moved(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let cursor = DVec2::new(x, y);
        let Some(last) = self.last_cursor.replace(cursor) else {
            return;
        };
        let delta = cursor - last;
        self.rotate(delta.x as f32, delta.y as f32);
    }

    /// Forget the last cursor position so the next one seeds again.
    pub fn reset_mouse(&mut self) {
        self.last_cursor = None;
    }

    /// Rotate by a cursor delta in pixels. Screen y grows downward.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        let limit = PITCH_LIMIT_DEGREES.to_radians();
        self.pitch = self.pitch.clamp(-limit, limit);
    }

    /// Track the surface aspect ratio. Empty surfaces are ignored.
    pub fn set_viewport(&mut self, size: Resolution) {
        if let Some(aspect) = size.aspect() {
            self.aspect = aspect;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), self.up())
    }

    /// Right-handed perspective with a [-1, 1] clip depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
