use glam::{Mat4, Vec3};
use thiserror::Error;
use umbra_common::MoveDirection;

/// Rejected camera bases.
#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    #[error("world up axis has zero length")]
    ZeroUp,
    #[error("camera target coincides with its position {0}")]
    CoincidentTarget(Vec3),
    #[error("view direction {0} is parallel to world up")]
    FrontParallelToUp(Vec3),
}

/// Free-flying camera described by a position and an orthonormal front/right
/// pair.
///
/// The target point is only used to aim the light; once the camera rotates it
/// no longer looks at it.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    right: Vec3,
    target: Vec3,
    world_up: Vec3,
}

impl Camera {
    /// Camera at `position` looking at `target`. Fails when the two coincide,
    /// when `world_up` is zero, or when the view direction is parallel to it.
    pub fn new(position: Vec3, target: Vec3, world_up: Vec3) -> Result<Self, CameraError> {
        let world_up = world_up.try_normalize().ok_or(CameraError::ZeroUp)?;
        let front = (target - position)
            .try_normalize()
            .ok_or(CameraError::CoincidentTarget(position))?;
        let right = front
            .cross(world_up)
            .try_normalize()
            .ok_or(CameraError::FrontParallelToUp(front))?;
        Ok(Self {
            position,
            front,
            right,
            target,
            world_up,
        })
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit view direction.
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Unit right axis, perpendicular to front and world up.
    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    /// Fixed aim point for the light's view matrix.
    pub fn target_point(&self) -> Vec3 {
        self.target
    }

    /// The (eye, center, up) triple handed to the look-at construction.
    pub fn look_at(&self) -> (Vec3, Vec3, Vec3) {
        (self.position, self.position + self.front, self.world_up)
    }

    /// Right-handed look-at matrix for the current basis.
    pub fn view_matrix(&self) -> Mat4 {
        let (eye, center, up) = self.look_at();
        Mat4::look_at_rh(eye, center, up)
    }

    /// Translate along the front or right axis. Unbounded.
    pub fn move_by(&mut self, direction: MoveDirection, speed: f32) {
        match direction {
            MoveDirection::Forward => self.position += self.front * speed,
            MoveDirection::Backward => self.position -= self.front * speed,
            MoveDirection::Right => self.position += self.right * speed,
            MoveDirection::Left => self.position -= self.right * speed,
        }
    }

    /// Point the camera using spherical angles in degrees.
    ///
    /// Pitch must stay inside (-89, 89); callers clamp it.
    pub fn rotate(&mut self, pitch: f32, yaw: f32) {
        let (pitch, yaw) = (pitch.to_radians(), yaw.to_radians());
        let front = Vec3::new(pitch.cos() * yaw.cos(), pitch.sin(), pitch.cos() * yaw.sin());
        self.right = front.cross(self.world_up).normalize();
        self.front = front.normalize();
        debug_assert!(
            self.right.is_finite(),
            "camera pitch {} degrees collapses the right axis",
            pitch.to_degrees()
        );
    }
}

/// Perspective projection parameters. The aspect ratio follows the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    /// Recompute the aspect ratio after a framebuffer resize. Zero-sized
    /// framebuffers (minimized windows) keep the previous ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }
}
