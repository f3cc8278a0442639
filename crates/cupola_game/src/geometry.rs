//! Axis-aligned boxes in map space.
//!
//! Map space is the 2D overlay plane: x grows right, z grows up, and both stay
//! close to [-1, 1]. Every collider, trigger and the player share this type.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_z: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn new(center_x: f32, center_z: f32, half_w: f32, half_h: f32) -> Self {
        Self {
            center_x,
            center_z,
            half_w,
            half_h,
        }
    }

    /// Build from a center and full width/height.
    pub fn from_size(center_x: f32, center_z: f32, width: f32, height: f32) -> Self {
        Self::new(center_x, center_z, width * 0.5, height * 0.5)
    }

    pub fn width(&self) -> f32 {
        self.half_w * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_h * 2.0
    }

    pub fn with_center(self, center_x: f32, center_z: f32) -> Self {
        Self {
            center_x,
            center_z,
            ..self
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        overlaps(self, other)
    }
}

/// Strict overlap test: boxes that only share an edge do not overlap.
pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    (a.center_x - b.center_x).abs() < a.half_w + b.half_w
        && (a.center_z - b.center_z).abs() < a.half_h + b.half_h
}
