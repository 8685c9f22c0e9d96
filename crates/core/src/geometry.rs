//! Transforms and bounds shared by every placement component.
//!
//! Conventions: centimetres, Z up, the ground plane is X/Y. Rotations are
//! Euler angles in degrees; yaw 0 faces +X and yaw 90 faces +Y.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::{cos_det, sin_det};

/// Euler rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub const fn from_yaw(yaw: f32) -> Self {
        Self::new(0.0, yaw, 0.0)
    }

    /// Unit forward vector for this rotation.
    pub fn forward(&self) -> Vec3 {
        let pitch = self.pitch.to_radians();
        let yaw = self.yaw.to_radians();
        let (sin_pitch, cos_pitch) = (sin_det(pitch), cos_det(pitch));
        let (sin_yaw, cos_yaw) = (sin_det(yaw), cos_det(yaw));

        Vec3::new(cos_pitch * cos_yaw, cos_pitch * sin_yaw, sin_pitch).normalize_or_zero()
    }

    /// `[roll, pitch, yaw]`, the order pose annotations are emitted in.
    pub fn to_roll_pitch_yaw(&self) -> [f32; 3] {
        [self.roll, self.pitch, self.yaw]
    }
}

/// Position, rotation and scale of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_position(Vec3::ZERO)
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Rotator, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Rotator::ZERO, Vec3::ONE)
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.rotation.yaw = yaw;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Position projected onto the ground plane.
    pub fn ground_position(&self) -> Vec2 {
        self.position.truncate()
    }
}

/// World-space axis-aligned bounds, stored as origin plus half extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub origin: Vec3,
    pub half_extent: Vec3,
}

impl Bounds {
    pub fn new(origin: Vec3, half_extent: Vec3) -> Self {
        Self {
            origin,
            half_extent: half_extent.abs(),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let lo = min.min(max);
        let hi = min.max(max);
        Self::new((lo + hi) * 0.5, (hi - lo) * 0.5)
    }

    pub fn min(&self) -> Vec3 {
        self.origin - self.half_extent
    }

    pub fn max(&self) -> Vec3 {
        self.origin + self.half_extent
    }

    /// The eight corners, in a fixed order.
    pub fn corners(&self) -> [Vec3; 8] {
        let o = self.origin;
        let e = self.half_extent;
        [
            o + Vec3::new(e.x, e.y, e.z),
            o + Vec3::new(e.x, e.y, -e.z),
            o + Vec3::new(e.x, -e.y, e.z),
            o + Vec3::new(e.x, -e.y, -e.z),
            o + Vec3::new(-e.x, e.y, e.z),
            o + Vec3::new(-e.x, e.y, -e.z),
            o + Vec3::new(-e.x, -e.y, e.z),
            o + Vec3::new(-e.x, -e.y, -e.z),
        ]
    }

    /// Whether the bounds enclose a positive volume.
    pub fn is_degenerate(&self) -> bool {
        self.half_extent.x <= 0.0 || self.half_extent.y <= 0.0 || self.half_extent.z <= 0.0
    }

    /// Whether a ground-plane point lies inside the X/Y footprint.
    pub fn contains_ground_point(&self, point: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}
