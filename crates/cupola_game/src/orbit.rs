//! Orbit camera for the cupola scene: right-drag orbits, middle-drag pans,
//! the wheel zooms. The scene is Z-up; yaw 0 looks along +Y from -Y.

use glam::{Vec2, Vec3};

pub const MIN_RADIUS: f32 = 1.5;
pub const MAX_RADIUS: f32 = 100.0;
pub const MIN_PITCH: f32 = -89.0;
pub const MAX_PITCH: f32 = 89.0;

const ROT_SPEED: f32 = 0.25;
const PAN_SPEED: f32 = 0.008;
const ZOOM_STEP: f32 = 0.9;

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    radius: f32,
    /// Degrees.
    yaw: f32,
    /// Degrees, clamped to [MIN_PITCH, MAX_PITCH].
    pitch: f32,
    rotate_active: bool,
    pan_active: bool,
    last_pointer: Option<Vec2>,
    eye: Vec3,
}

impl OrbitCamera {
    pub fn new(target: Vec3) -> Self {
        let mut cam = Self {
            target,
            radius: 8.0,
            yaw: 30.0,
            pitch: 20.0,
            rotate_active: false,
            pan_active: false,
            last_pointer: None,
            eye: Vec3::ZERO,
        };
        cam.recompute_eye();
        cam
    }

    /// Camera framing a model of horizontal scale `scale_x`.
    pub fn framing(target: Vec3, scale_x: f32) -> Self {
        let mut cam = Self::new(target);
        cam.set_radius(f32::max(3.0, 4.0 * scale_x));
        cam
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.clamp(MIN_RADIUS, MAX_RADIUS);
        self.recompute_eye();
    }

    pub fn is_dragging(&self) -> bool {
        self.rotate_active || self.pan_active
    }

    pub fn begin_rotate(&mut self) {
        self.rotate_active = true;
        self.last_pointer = None;
    }

    pub fn end_rotate(&mut self) {
        self.rotate_active = false;
        self.last_pointer = None;
    }

    pub fn begin_pan(&mut self) {
        self.pan_active = true;
        self.last_pointer = None;
    }

    pub fn end_pan(&mut self) {
        self.pan_active = false;
        self.last_pointer = None;
    }

    pub fn zoom_in(&mut self) {
        self.radius = (self.radius * ZOOM_STEP).max(MIN_RADIUS);
    }

    pub fn zoom_out(&mut self) {
        self.radius = (self.radius / ZOOM_STEP).min(MAX_RADIUS);
    }

    /// Apply drags from the pointer (normalized device coordinates) and place
    /// the eye. With no pointer the last sample is dropped so the next drag
    /// does not jump, but the eye is still refreshed.
    pub fn update(&mut self, pointer: Option<Vec2>) {
        match pointer {
            None => self.last_pointer = None,
            Some(p) => {
                if self.is_dragging() {
                    if let Some(last) = self.last_pointer {
                        self.apply_drag(p - last);
                    }
                    self.last_pointer = Some(p);
                }
            }
        }
        self.recompute_eye();
    }

    fn apply_drag(&mut self, delta: Vec2) {
        if self.rotate_active {
            self.yaw -= delta.x * ROT_SPEED * 180.0;
            self.pitch = (self.pitch + delta.y * ROT_SPEED * 180.0).clamp(MIN_PITCH, MAX_PITCH);
        }
        if self.pan_active {
            let (right, up) = self.basis();
            self.target += right * (-delta.x * PAN_SPEED * self.radius)
                + up * (-delta.y * PAN_SPEED * self.radius);
        }
    }

    fn offset(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            self.radius * pitch.cos() * yaw.sin(),
            -self.radius * pitch.cos() * yaw.cos(),
            self.radius * pitch.sin(),
        )
    }

    fn recompute_eye(&mut self) {
        self.eye = self.target + self.offset();
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    /// Camera right and up vectors in world space.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = self.forward();
        let right = forward.cross(Vec3::Z).normalize_or(Vec3::X);
        let up = right.cross(forward).normalize_or(Vec3::Z);
        (right, up)
    }
}
