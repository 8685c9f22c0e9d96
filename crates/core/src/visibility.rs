//! Frustum visibility scoring.
//!
//! Scores an entity by how many of its eight bounding-box corners fall inside
//! a cone narrower than the camera's nominal field of view, so entities
//! clipped by the frame edge score low.

use glam::Vec3;

use crate::config::VisibilityConfig;
use crate::geometry::{Bounds, Rotator};
use crate::math::cos_det;
use crate::world::CameraView;

/// Fraction of the nominal half-FOV used when no config is given.
pub const DEFAULT_EFFECTIVE_FOV_FRACTION: f32 = 0.8;

/// Percentage `[0, 100]` of bounds corners inside the effective view cone.
pub fn visibility_percent(bounds: &Bounds, camera_position: Vec3, camera_rotation: Rotator, fov_degrees: f32) -> f32 {
    visibility_percent_with_fraction(
        bounds,
        camera_position,
        camera_rotation,
        fov_degrees,
        DEFAULT_EFFECTIVE_FOV_FRACTION,
    )
}

pub fn visibility_percent_with_fraction(
    bounds: &Bounds,
    camera_position: Vec3,
    camera_rotation: Rotator,
    fov_degrees: f32,
    effective_fraction: f32,
) -> f32 {
    let forward = camera_rotation.forward();
    let half_angle = (fov_degrees * 0.5 * effective_fraction.clamp(0.0, 1.0)).to_radians();
    let min_cos = cos_det(half_angle);

    let corners = bounds.corners();
    let passing = corners
        .iter()
        .filter(|corner| {
            let Some(direction) = (**corner - camera_position).try_normalize() else {
                return false;
            };
            let alignment = forward.dot(direction);
            // Behind the camera.
            if alignment < 0.0 {
                return false;
            }
            alignment >= min_cos
        })
        .count();

    100.0 * passing as f32 / corners.len() as f32
}

/// Visibility scoring with a configured cone and threshold.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityEvaluator<'a> {
    config: &'a VisibilityConfig,
}

impl<'a> VisibilityEvaluator<'a> {
    pub fn new(config: &'a VisibilityConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, bounds: &Bounds, camera: &CameraView) -> f32 {
        visibility_percent_with_fraction(
            bounds,
            camera.position,
            camera.rotation,
            camera.fov_degrees,
            self.config.effective_fov_fraction,
        )
    }

    /// Whether the entity scores at or above the annotation threshold.
    pub fn is_visible(&self, bounds: &Bounds, camera: &CameraView) -> bool {
        self.evaluate(bounds, camera) >= self.config.min_visibility_percent
    }
}
