//! Pinhole projection for a [`CameraView`].
//!
//! World implementations that have no renderer of their own can use this to
//! answer `World::project_to_screen`.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::{cos_det, sin_det};
use crate::world::CameraView;

/// Pinhole camera with a pixel viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinholeCamera {
    pub view: CameraView,

    /// Viewport size in pixels.
    pub viewport: Vec2,

    /// Points closer than this along the view axis are not projected.
    pub near: f32,
}

impl Default for PinholeCamera {
    fn default() -> Self {
        Self {
            view: CameraView::default(),
            viewport: Vec2::new(1920.0, 1080.0),
            near: 1.0,
        }
    }
}

impl PinholeCamera {
    pub fn new(view: CameraView, viewport: Vec2) -> Self {
        Self {
            view,
            viewport,
            ..Default::default()
        }
    }

    /// Get the view matrix (right-handed, Z up).
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.view.rotation.forward();
        // Looking straight up or down: Z can't serve as the up vector.
        let up = if forward.z.abs() > 0.999 { Vec3::X } else { Vec3::Z };
        Mat4::look_at_rh(self.view.position, self.view.position + forward, up)
    }

    /// Focal length in pixels for the horizontal field of view.
    pub fn focal_length(&self) -> f32 {
        let half_fov = (self.view.fov_degrees * 0.5).to_radians();
        let tan_half = sin_det(half_fov) / cos_det(half_fov);
        self.viewport.x * 0.5 / tan_half
    }

    /// Project a world point to pixel coordinates (origin top-left, y down).
    ///
    /// `None` for points behind the near plane, or for every point when the
    /// field of view is degenerate.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        if !self.view.has_valid_fov() {
            return None;
        }
        let view_point = self.view_matrix().transform_point3(point);
        // Right-handed view space looks down -Z.
        let depth = -view_point.z;
        if depth < self.near {
            return None;
        }

        let focal = self.focal_length();
        Some(Vec2::new(
            self.viewport.x * 0.5 + focal * view_point.x / depth,
            self.viewport.y * 0.5 - focal * view_point.y / depth,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotator;

    fn camera_at_origin() -> PinholeCamera {
        PinholeCamera::new(
            CameraView {
                position: Vec3::ZERO,
                rotation: Rotator::ZERO,
                fov_degrees: 90.0,
            },
            Vec2::new(1920.0, 1080.0),
        )
    }

    #[test]
    fn test_center_projects_to_viewport_center() {
        let camera = camera_at_origin();
        let screen = camera.project(Vec3::new(1000.0, 0.0, 0.0)).unwrap();
        assert!((screen.x - 960.0).abs() < 0.5);
        assert!((screen.y - 540.0).abs() < 0.5);
    }

    #[test]
    fn test_left_and_up_map_to_screen_left_and_top() {
        let camera = camera_at_origin();
        // +Y is to the left when facing +X with Z up.
        let left = camera.project(Vec3::new(1000.0, 200.0, 0.0)).unwrap();
        assert!(left.x < 960.0);
        let up = camera.project(Vec3::new(1000.0, 0.0, 200.0)).unwrap();
        assert!(up.y < 540.0);
    }

    #[test]
    fn test_edge_of_fov_hits_viewport_edge() {
        let camera = camera_at_origin();
        // 45 degrees to the right at 90 degree FOV lands on the right edge.
        let edge = camera.project(Vec3::new(1000.0, -1000.0, 0.0)).unwrap();
        assert!((edge.x - 1920.0).abs() < 5.0, "got {}", edge.x);
    }

    #[test]
    fn test_degenerate_fov_projects_nothing() {
        for fov in [0.0, 180.0, -30.0, f32::NAN] {
            let mut camera = camera_at_origin();
            camera.view.fov_degrees = fov;
            assert!(!camera.view.has_valid_fov());
            assert!(camera.project(Vec3::new(1000.0, 0.0, 0.0)).is_none(), "fov {fov}");
        }
        assert!(camera_at_origin().view.has_valid_fov());
    }

    #[test]
    fn test_behind_camera_is_not_projected() {
        let camera = camera_at_origin();
        assert!(camera.project(Vec3::new(-100.0, 0.0, 0.0)).is_none());
    }
}
