//! In-crate world double for unit tests.

use glam::{Vec2, Vec3};

use crate::camera::PinholeCamera;
use crate::error::WorldError;
use crate::geometry::{Bounds, Transform};
use crate::world::{CameraView, EntityHandle, World};

#[derive(Debug, Clone)]
pub struct MockEntity {
    pub name: String,
    pub class: String,
    pub transform: Transform,
    pub half_extent: Vec3,
    pub tags: Vec<String>,
    pub hidden: bool,
    pub collision: bool,
    pub alive: bool,
}

#[derive(Debug, Clone)]
pub struct MockWorld {
    pub entities: Vec<MockEntity>,
    pub available: bool,
    /// Flat ground height; `None` means rays never hit.
    pub ground_z: Option<f32>,
    pub camera: PinholeCamera,
    pub failing_assets: Vec<String>,
    /// Handles whose destruction the world refuses.
    pub failing_destroys: Vec<EntityHandle>,
    /// Accept `set_hidden` calls without applying them.
    pub ignore_hide: bool,
    pub spawned_half_extent: Vec3,
}

impl Default for MockWorld {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            available: true,
            ground_z: Some(0.0),
            camera: PinholeCamera::default(),
            failing_assets: Vec::new(),
            failing_destroys: Vec::new(),
            ignore_hide: false,
            spawned_half_extent: Vec3::new(200.0, 90.0, 75.0),
        }
    }
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named marker entity (used as an anchor).
    pub fn add_anchor(&mut self, name: &str, position: Vec3, yaw: f32) -> EntityHandle {
        self.add_entity(name, "Anchor", Transform::from_position(position).with_yaw(yaw), Vec3::splat(10.0), &[])
    }

    pub fn add_entity(
        &mut self,
        name: &str,
        class: &str,
        transform: Transform,
        half_extent: Vec3,
        tags: &[&str],
    ) -> EntityHandle {
        self.entities.push(MockEntity {
            name: name.to_string(),
            class: class.to_string(),
            transform,
            half_extent,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            hidden: false,
            collision: true,
            alive: true,
        });
        EntityHandle(self.entities.len() as u32 - 1)
    }

    pub fn live_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alive).count()
    }

    pub fn entity(&self, handle: EntityHandle) -> Result<&MockEntity, WorldError> {
        self.entities
            .get(handle.0 as usize)
            .filter(|e| e.alive)
            .ok_or(WorldError::MissingEntity(handle))
    }

    fn entity_mut(&mut self, handle: EntityHandle) -> Result<&mut MockEntity, WorldError> {
        self.entities
            .get_mut(handle.0 as usize)
            .filter(|e| e.alive)
            .ok_or(WorldError::MissingEntity(handle))
    }
}

impl World for MockWorld {
    fn ensure_available(&self) -> Result<(), WorldError> {
        if self.available {
            Ok(())
        } else {
            Err(WorldError::Unavailable)
        }
    }

    fn find_by_name(&self, name: &str) -> Option<EntityHandle> {
        self.entities
            .iter()
            .position(|e| e.alive && e.name == name)
            .map(|i| EntityHandle(i as u32))
    }

    fn name_of(&self, handle: EntityHandle) -> Result<String, WorldError> {
        Ok(self.entity(handle)?.name.clone())
    }

    fn transform(&self, handle: EntityHandle) -> Result<Transform, WorldError> {
        Ok(self.entity(handle)?.transform)
    }

    fn set_transform(&mut self, handle: EntityHandle, transform: Transform) -> Result<(), WorldError> {
        self.entity_mut(handle)?.transform = transform;
        Ok(())
    }

    fn bounds(&self, handle: EntityHandle) -> Result<Bounds, WorldError> {
        let entity = self.entity(handle)?;
        Ok(Bounds::new(
            entity.transform.position,
            entity.half_extent * entity.transform.scale,
        ))
    }

    fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        self.ground_z
            .filter(|z| *z <= origin.z && origin.z - *z <= max_distance)
    }

    fn spawn(
        &mut self,
        asset_ref: &str,
        name: &str,
        transform: Transform,
        tags: &[String],
    ) -> Result<EntityHandle, WorldError> {
        if self.failing_assets.iter().any(|a| a == asset_ref) {
            return Err(WorldError::AssetLoad {
                asset: asset_ref.to_string(),
                reason: "not found".to_string(),
            });
        }
        if self.find_by_name(name).is_some() {
            return Err(WorldError::NameInUse(name.to_string()));
        }
        let class = asset_ref.rsplit('/').next().unwrap_or(asset_ref).to_string();
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        let half_extent = self.spawned_half_extent;
        Ok(self.add_entity(name, &class, transform, half_extent, &tags))
    }

    fn destroy(&mut self, handle: EntityHandle) -> Result<(), WorldError> {
        if self.failing_destroys.contains(&handle) {
            return Err(WorldError::AssetLoad {
                asset: self.entity(handle)?.class.clone(),
                reason: "destroy refused".to_string(),
            });
        }
        self.entity_mut(handle)?.alive = false;
        Ok(())
    }

    fn entities_with_tag(&self, tag: &str) -> Vec<EntityHandle> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive && e.tags.iter().any(|t| t == tag))
            .map(|(i, _)| EntityHandle(i as u32))
            .collect()
    }

    fn set_hidden(&mut self, handle: EntityHandle, hidden: bool) -> Result<(), WorldError> {
        let ignore = self.ignore_hide;
        let entity = self.entity_mut(handle)?;
        if !ignore {
            entity.hidden = hidden;
        }
        Ok(())
    }

    fn is_hidden(&self, handle: EntityHandle) -> Result<bool, WorldError> {
        Ok(self.entity(handle)?.hidden)
    }

    fn set_collision_enabled(&mut self, handle: EntityHandle, enabled: bool) -> Result<(), WorldError> {
        self.entity_mut(handle)?.collision = enabled;
        Ok(())
    }

    fn class_name(&self, handle: EntityHandle) -> Result<String, WorldError> {
        Ok(self.entity(handle)?.class.clone())
    }

    fn project_to_screen(&self, point: Vec3) -> Option<Vec2> {
        self.camera.project(point)
    }

    fn active_camera(&self) -> Result<CameraView, WorldError> {
        self.ensure_available()?;
        Ok(self.camera.view)
    }
}
