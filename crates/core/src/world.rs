//! The world collaborator contract.
//!
//! The placement engine never stores entities itself; it reads and mutates
//! them through this trait. A game engine bridge implements it for a live
//! scene, `vantage-world` implements it in memory.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::geometry::{Bounds, Rotator, Transform};

/// Opaque handle to a world entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub u32);

/// Pose and field of view of the active camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraView {
    pub position: Vec3,
    pub rotation: Rotator,
    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 150.0),
            rotation: Rotator::ZERO,
            fov_degrees: 90.0,
        }
    }
}

impl CameraView {
    /// A pinhole projection needs a field of view strictly inside (0, 180).
    pub fn has_valid_fov(&self) -> bool {
        self.fov_degrees.is_finite() && self.fov_degrees > 0.0 && self.fov_degrees < 180.0
    }
}

/// Operations the core consumes from the host world.
pub trait World {
    /// Fails when there is no active scene to operate on.
    fn ensure_available(&self) -> Result<(), WorldError>;

    /// Exact-name lookup.
    fn find_by_name(&self, name: &str) -> Option<EntityHandle>;

    fn name_of(&self, handle: EntityHandle) -> Result<String, WorldError>;

    fn transform(&self, handle: EntityHandle) -> Result<Transform, WorldError>;

    fn set_transform(&mut self, handle: EntityHandle, transform: Transform) -> Result<(), WorldError>;

    /// World-space axis-aligned bounds.
    fn bounds(&self, handle: EntityHandle) -> Result<Bounds, WorldError>;

    /// Casts a ray straight down from `origin` and returns the impact height.
    fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<f32>;

    /// Creates an entity from an asset reference. `name` must be unique.
    fn spawn(
        &mut self,
        asset_ref: &str,
        name: &str,
        transform: Transform,
        tags: &[String],
    ) -> Result<EntityHandle, WorldError>;

    fn destroy(&mut self, handle: EntityHandle) -> Result<(), WorldError>;

    /// Every live entity carrying `tag`, in a stable order.
    fn entities_with_tag(&self, tag: &str) -> Vec<EntityHandle>;

    fn set_hidden(&mut self, handle: EntityHandle, hidden: bool) -> Result<(), WorldError>;

    fn is_hidden(&self, handle: EntityHandle) -> Result<bool, WorldError>;

    fn set_collision_enabled(&mut self, handle: EntityHandle, enabled: bool) -> Result<(), WorldError>;

    /// Stable class identifier used in annotations.
    fn class_name(&self, handle: EntityHandle) -> Result<String, WorldError>;

    /// Projects a world point to screen pixels using the active camera.
    /// `None` when the point cannot be projected (behind the camera).
    fn project_to_screen(&self, point: Vec3) -> Option<Vec2>;

    fn active_camera(&self) -> Result<CameraView, WorldError>;
}
