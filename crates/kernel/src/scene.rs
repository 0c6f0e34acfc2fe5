use crate::animation::{AnimationState, TravelRange};
use crate::camera::{Camera, CameraError, Projection};
use crate::config::SceneConfig;
use crate::light::{Light, PointLight};
use umbra_common::{MoveDirection, RasterMode};
use umbra_input::Action;

/// Everything the passes read to draw a frame.
///
/// Camera, light and toggles persist across frames and only change through
/// the named handlers; `advance` moves the time-driven phases.
#[derive(Debug, Clone)]
pub struct Scene {
    camera: Camera,
    projection: Projection,
    light: Light,
    point_light: PointLight,
    animation: AnimationState,
    raster_mode: RasterMode,
    bird_step: f32,
    wind_amplitude: f32,
    tank_x: TravelRange,
    tank_z: TravelRange,
}

impl Scene {
    /// Build the initial scene. Only the camera can reject its settings.
    pub fn from_config(config: &SceneConfig) -> Result<Self, CameraError> {
        let camera = Camera::new(
            config.camera.position,
            config.camera.target,
            config.camera.world_up,
        )?;
        let projection = Projection {
            fov_degrees: config.camera.fov_degrees,
            near: config.camera.near,
            far: config.camera.far,
            ..Projection::default()
        };
        let light = Light::new(
            config.light.direction * config.light.scale,
            config.light.color,
        );
        tracing::debug!(
            position = ?camera.position(),
            light = ?light.position(),
            "scene initialized"
        );
        Ok(Self {
            camera,
            projection,
            light,
            point_light: PointLight {
                position: config.light.point_light_position,
                enabled: false,
            },
            animation: AnimationState::default(),
            raster_mode: RasterMode::default(),
            bird_step: config.animation.bird_step,
            wind_amplitude: config.animation.wind_amplitude,
            tank_x: config.animation.tank_x,
            tank_z: config.animation.tank_z,
        })
    }

    /// The viewer camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// The orbiting directional light that casts shadows.
    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn point_light(&self) -> &PointLight {
        &self.point_light
    }

    /// Scene angle, bird, wind, fog and tank state.
    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    /// Polygon mode for the lit object draws.
    pub fn raster_mode(&self) -> RasterMode {
        self.raster_mode
    }

    /// Dispatch an action to its named handler.
    pub fn apply(&mut self, action: &Action) {
        tracing::trace!(action = action.label(), "apply");
        match *action {
            Action::Move { direction, speed } => self.move_camera(direction, speed),
            Action::Look { pitch, yaw } => self.look(pitch, yaw),
            Action::RotateScene(degrees) => self.rotate_scene(degrees),
            Action::OrbitLight(degrees) => self.orbit_light(degrees),
            Action::AdjustFog(delta) => self.adjust_fog(delta),
            Action::MoveTank { dx, dz } => self.move_tank(dx, dz),
            Action::SetPointLight(enabled) => self.set_point_light(enabled),
            Action::SetRasterMode(mode) => self.set_raster_mode(mode),
        }
    }

    /// Translate the camera along its front or right axis.
    pub fn move_camera(&mut self, direction: MoveDirection, speed: f32) {
        self.camera.move_by(direction, speed);
    }

    /// Point the camera using pitch and yaw in degrees.
    pub fn look(&mut self, pitch: f32, yaw: f32) {
        self.camera.rotate(pitch, yaw);
    }

    pub fn rotate_scene(&mut self, degrees: f32) {
        self.animation.rotate_scene(degrees);
    }

    pub fn orbit_light(&mut self, degrees: f32) {
        self.light.orbit(degrees);
    }

    pub fn adjust_fog(&mut self, delta: f32) {
        self.animation.adjust_fog(delta);
    }

    /// Offset the tank within its configured travel ranges.
    pub fn move_tank(&mut self, dx: f32, dz: f32) {
        self.animation.move_tank(dx, dz, self.tank_x, self.tank_z);
    }

    pub fn set_point_light(&mut self, enabled: bool) {
        if self.point_light.enabled != enabled {
            tracing::debug!(enabled, "point light toggled");
        }
        self.point_light.enabled = enabled;
    }

    pub fn set_raster_mode(&mut self, mode: RasterMode) {
        if self.raster_mode != mode {
            tracing::debug!(?mode, "raster mode changed");
        }
        self.raster_mode = mode;
    }

    /// Framebuffer resize notification.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        tracing::debug!(width, height, aspect = self.projection.aspect, "projection resized");
    }

    /// Move time-driven phases forward once. `elapsed` is seconds since start.
    pub fn advance(&mut self, elapsed: f32) {
        self.animation
            .advance(elapsed, self.bird_step, self.wind_amplitude);
    }
}
