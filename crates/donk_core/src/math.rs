//! Vector types used by the tube and its collaborators.
//!
//! Axis convention: `y` is the travel axis, `z` is "up" away from the tube
//! wall, `x` runs around the circumference when a ring is unrolled flat.

use serde::{Deserialize, Serialize};

/// 3D Vector - collision normals and vertices
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 2D Vector - cross-section offsets (branch centers)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Point on the unit circle for an angle in radians, measured from "up"
    /// (`+y`) towards `-x`.
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self::new(-angle.sin(), angle.cos())
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}
