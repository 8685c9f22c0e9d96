//! In-memory scene implementing [`World`].
//!
//! Entities live in a slot vector indexed by handle. Name and tag lookups go
//! through indexes built as entities are added, so anchor resolution and tag
//! scans never walk the whole scene.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::{Vec2, Vec3};
use vantage_core::math::{cos_det, sin_det};
use vantage_core::{Bounds, CameraView, EntityHandle, PinholeCamera, Transform, World, WorldError};

use crate::catalog::AssetCatalog;
use crate::ground::GroundGeometry;

#[derive(Debug, Clone)]
struct SceneEntity {
    name: String,
    class_name: String,
    transform: Transform,
    /// Local half extent at unit scale.
    half_extent: Vec3,
    tags: Vec<String>,
    hidden: bool,
    collision_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct SceneWorld {
    entities: Vec<Option<SceneEntity>>,
    names: HashMap<String, EntityHandle>,
    tags: BTreeMap<String, BTreeSet<EntityHandle>>,
    ground: GroundGeometry,
    catalog: AssetCatalog,
    camera: PinholeCamera,
    available: bool,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            names: HashMap::new(),
            tags: BTreeMap::new(),
            ground: GroundGeometry::new(),
            catalog: AssetCatalog::new(),
            camera: PinholeCamera::default(),
            available: true,
        }
    }
}

impl SceneWorld {
    pub fn new(catalog: AssetCatalog, ground: GroundGeometry, camera: PinholeCamera) -> Self {
        Self {
            catalog,
            ground,
            camera,
            ..Default::default()
        }
    }

    /// Adds a pre-placed entity (anchor marker, parked car, building).
    pub fn add_entity(
        &mut self,
        name: &str,
        class_name: &str,
        transform: Transform,
        half_extent: Vec3,
        tags: &[String],
    ) -> Result<EntityHandle, WorldError> {
        if self.names.contains_key(name) {
            return Err(WorldError::NameInUse(name.to_string()));
        }

        let handle = EntityHandle(self.entities.len() as u32);
        let mut unique_tags: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique_tags.contains(tag) {
                unique_tags.push(tag.clone());
            }
        }
        for tag in &unique_tags {
            self.tags.entry(tag.clone()).or_default().insert(handle);
        }
        self.names.insert(name.to_string(), handle);
        self.entities.push(Some(SceneEntity {
            name: name.to_string(),
            class_name: class_name.to_string(),
            transform,
            half_extent: half_extent.abs(),
            tags: unique_tags,
            hidden: false,
            collision_enabled: true,
        }));
        Ok(handle)
    }

    /// Adds an untagged marker entity to serve as an anchor.
    pub fn add_marker(&mut self, name: &str, transform: Transform) -> Result<EntityHandle, WorldError> {
        self.add_entity(name, "Marker", transform, Vec3::splat(10.0), &[])
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn camera(&self) -> &PinholeCamera {
        &self.camera
    }

    pub fn set_camera_view(&mut self, view: CameraView) {
        self.camera.view = view;
    }

    pub fn ground_mut(&mut self) -> &mut GroundGeometry {
        &mut self.ground
    }

    pub fn catalog_mut(&mut self) -> &mut AssetCatalog {
        &mut self.catalog
    }

    pub fn entity_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_collision_enabled(&self, handle: EntityHandle) -> Result<bool, WorldError> {
        Ok(self.entity(handle)?.collision_enabled)
    }

    fn entity(&self, handle: EntityHandle) -> Result<&SceneEntity, WorldError> {
        self.entities
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(WorldError::MissingEntity(handle))
    }

    fn entity_mut(&mut self, handle: EntityHandle) -> Result<&mut SceneEntity, WorldError> {
        self.entities
            .get_mut(handle.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(WorldError::MissingEntity(handle))
    }
}

impl World for SceneWorld {
    fn ensure_available(&self) -> Result<(), WorldError> {
        if self.available {
            Ok(())
        } else {
            Err(WorldError::Unavailable)
        }
    }

    fn find_by_name(&self, name: &str) -> Option<EntityHandle> {
        self.names.get(name).copied()
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

    /// Axis-aligned bounds of the yawed, scaled box. Pitch and roll are
    /// ignored: everything placed here sits flat on the ground.
    fn bounds(&self, handle: EntityHandle) -> Result<Bounds, WorldError> {
        let entity = self.entity(handle)?;
        let transform = entity.transform;
        let half = entity.half_extent * transform.scale.abs();

        let yaw = transform.rotation.yaw.to_radians();
        let (sin, cos) = (sin_det(yaw).abs(), cos_det(yaw).abs());
        let extent = Vec3::new(cos * half.x + sin * half.y, sin * half.x + cos * half.y, half.z);

        Ok(Bounds::new(transform.position, extent))
    }

    fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        self.ground.raycast_down(origin, max_distance)
    }

    fn spawn(
        &mut self,
        asset_ref: &str,
        name: &str,
        transform: Transform,
        tags: &[String],
    ) -> Result<EntityHandle, WorldError> {
        self.ensure_available()?;
        let info = self.catalog.get(asset_ref).cloned().ok_or_else(|| WorldError::AssetLoad {
            asset: asset_ref.to_string(),
            reason: "not in catalog".to_string(),
        })?;
        self.add_entity(name, &info.class_name, transform, info.half_extent, tags)
    }

    fn destroy(&mut self, handle: EntityHandle) -> Result<(), WorldError> {
        let entity = self
            .entities
            .get_mut(handle.0 as usize)
            .and_then(Option::take)
            .ok_or(WorldError::MissingEntity(handle))?;

        self.names.remove(&entity.name);
        for tag in &entity.tags {
            if let Some(handles) = self.tags.get_mut(tag) {
                handles.remove(&handle);
            }
        }
        Ok(())
    }

    fn entities_with_tag(&self, tag: &str) -> Vec<EntityHandle> {
        self.tags
            .get(tag)
            .map(|handles| handles.iter().copied().collect())
            .unwrap_or_default()
    }

    fn set_hidden(&mut self, handle: EntityHandle, hidden: bool) -> Result<(), WorldError> {
        self.entity_mut(handle)?.hidden = hidden;
        Ok(())
    }

    fn is_hidden(&self, handle: EntityHandle) -> Result<bool, WorldError> {
        Ok(self.entity(handle)?.hidden)
    }

    fn set_collision_enabled(&mut self, handle: EntityHandle, enabled: bool) -> Result<(), WorldError> {
        self.entity_mut(handle)?.collision_enabled = enabled;
        Ok(())
    }

    fn class_name(&self, handle: EntityHandle) -> Result<String, WorldError> {
        Ok(self.entity(handle)?.class_name.clone())
    }

    fn project_to_screen(&self, point: Vec3) -> Option<Vec2> {
        self.camera.project(point)
    }

    fn active_camera(&self) -> Result<CameraView, WorldError> {
        self.ensure_available()?;
        Ok(self.camera.view)
    }
}
