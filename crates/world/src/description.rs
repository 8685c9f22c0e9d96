//! JSON scene descriptions.
//!
//! A description lists the asset catalog, the ground geometry, the camera and
//! every pre-placed entity (anchor markers included). Loading one yields a
//! ready [`SceneWorld`].

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vantage_core::{PinholeCamera, Rotator, Transform, WorldError};

use crate::catalog::AssetCatalog;
use crate::ground::GroundGeometry;
use crate::scene::SceneWorld;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scene: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid scene: {0}")]
    World(#[from] WorldError),

    #[error("camera fov {0} outside (0, 180) degrees")]
    CameraFov(f32),
}

/// A box of ground geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundBox {
    pub center: Vec3,
    pub half_extent: Vec3,
}

/// A pre-placed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    pub name: String,
    #[serde(default = "default_class")]
    pub class_name: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Rotator,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_half_extent")]
    pub half_extent: Vec3,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_class() -> String {
    "Marker".to_string()
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_half_extent() -> Vec3 {
    Vec3::splat(10.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub camera: PinholeCamera,
    pub assets: AssetCatalog,
    pub ground: Vec<GroundBox>,
    pub entities: Vec<EntityDescription>,
}

impl SceneDescription {
    pub fn from_json_str(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builds the world. Fails on duplicate entity names or a degenerate
    /// camera field of view.
    pub fn build(&self) -> Result<SceneWorld, SceneError> {
        if !self.camera.view.has_valid_fov() {
            return Err(SceneError::CameraFov(self.camera.view.fov_degrees));
        }

        let mut ground = GroundGeometry::new();
        for block in &self.ground {
            ground.add_box(block.center, block.half_extent);
        }

        let mut world = SceneWorld::new(self.assets.clone(), ground, self.camera);
        for entity in &self.entities {
            let transform = Transform::new(entity.position, entity.rotation, entity.scale);
            world.add_entity(&entity.name, &entity.class_name, transform, entity.half_extent, &entity.tags)?;
        }

        tracing::info!(
            entities = self.entities.len(),
            ground = self.ground.len(),
            assets = self.assets.len(),
            "Scene built"
        );
        Ok(world)
    }
}

impl SceneWorld {
    /// Loads and builds a scene description from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        SceneDescription::from_json_file(path)?.build()
    }
}
