//! Static ground geometry and ray queries against it.
//!
//! Everything props can rest on (road slabs, kerbs, sidewalk blocks) is
//! stored as parry3d shapes. Rays are only ever cast straight down by the
//! placement engine, but the general query is kept for tools.

use glam::Vec3;
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::query::{Ray, RayCast};
use parry3d::shape::SharedShape;

/// A piece of ground geometry.
#[derive(Debug, Clone)]
pub struct GroundBrush {
    pub id: u32,
    pub shape: SharedShape,
    /// Position and orientation in world space.
    pub transform: Isometry<Real>,
}

/// Result of a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub brush: u32,
    pub distance: f32,
    pub point: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct GroundGeometry {
    brushes: Vec<GroundBrush>,
    next_id: u32,
}

impl GroundGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis-aligned box.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        let half = half_extents.abs();
        self.brushes.push(GroundBrush {
            id,
            shape: SharedShape::cuboid(half.x, half.y, half.z),
            transform: Isometry::translation(center.x, center.y, center.z),
        });

        id
    }

    /// Add a flat slab whose top surface sits at `top_z`.
    pub fn add_slab(&mut self, min: Vec3, max: Vec3, top_z: f32, thickness: f32) -> u32 {
        let center = Vec3::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5, top_z - thickness * 0.5);
        let half = Vec3::new((max.x - min.x).abs() * 0.5, (max.y - min.y).abs() * 0.5, thickness * 0.5);
        self.add_box(center, half)
    }

    pub fn clear(&mut self) {
        self.brushes.clear();
    }

    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    /// Closest hit along `direction` within `max_distance`.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir.length_squared() < 0.5 {
            return None;
        }

        let ray = Ray::new(
            Point::new(origin.x, origin.y, origin.z),
            Vector::new(dir.x, dir.y, dir.z),
        );

        let mut closest: Option<RayHit> = None;
        for brush in &self.brushes {
            let Some(toi) = brush.shape.cast_ray(&brush.transform, &ray, max_distance, true) else {
                continue;
            };
            if toi > max_distance {
                continue;
            }
            if closest.map_or(true, |hit| toi < hit.distance) {
                closest = Some(RayHit {
                    brush: brush.id,
                    distance: toi,
                    point: origin + dir * toi,
                });
            }
        }
        closest
    }

    /// Height of the first surface straight below `origin`.
    pub fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        self.raycast(origin, Vec3::NEG_Z, max_distance).map(|hit| hit.point.z)
    }
}
