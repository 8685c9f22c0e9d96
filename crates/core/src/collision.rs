//! Ground-plane overlap gate.
//!
//! Entities are approximated by circles on the X/Y plane. A candidate is
//! rejected when it comes closer to any placed entity than the sum of both
//! radii or the global minimum spacing, whichever is larger.

use glam::{Vec2, Vec3};

use crate::config::CollisionConfig;
use crate::geometry::Transform;
use crate::math::length_det;
use crate::registry::PlacedEntity;

/// A circle on the ground plane another entity must stay clear of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Vec2,
    pub radius: f32,
}

impl From<&PlacedEntity> for Obstacle {
    fn from(entity: &PlacedEntity) -> Self {
        Self {
            position: entity.position.truncate(),
            radius: entity.collision_radius,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionValidator<'a> {
    config: &'a CollisionConfig,
}

impl<'a> CollisionValidator<'a> {
    pub fn new(config: &'a CollisionConfig) -> Self {
        Self { config }
    }

    /// Radius for an entity with the given half extent and uniform scale.
    pub fn collision_radius(&self, half_extent: Vec3, scale: f32) -> f32 {
        half_extent.x.abs().max(half_extent.y.abs()) * scale.abs() + self.config.safety_margin
    }

    /// Minimum centre distance two circles must keep.
    pub fn required_distance(&self, radius_a: f32, radius_b: f32) -> f32 {
        (radius_a + radius_b).max(self.config.min_spacing)
    }

    /// Whether `candidate` keeps clear of every placed entity.
    pub fn accept(&self, candidate: &Transform, placed: &[PlacedEntity], half_extent: Vec3) -> bool {
        let radius = self.collision_radius(half_extent, candidate.scale.x);
        self.accept_radius(candidate.ground_position(), radius, placed.iter().map(Obstacle::from))
    }

    /// Whether a circle at `position` keeps clear of every obstacle.
    pub fn accept_radius<I>(&self, position: Vec2, radius: f32, obstacles: I) -> bool
    where
        I: IntoIterator<Item = Obstacle>,
    {
        obstacles.into_iter().all(|other| {
            let delta = position - other.position;
            length_det(delta.x, delta.y) >= self.required_distance(radius, other.radius)
        })
    }
}
