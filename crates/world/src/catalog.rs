//! Asset references the reference world knows how to spawn.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// What spawning an asset produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Stable class label used in annotations.
    pub class_name: String,
    /// Local half extent at unit scale.
    pub half_extent: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetCatalog {
    assets: BTreeMap<String, AssetInfo>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset_ref: impl Into<String>, info: AssetInfo) {
        self.assets.insert(asset_ref.into(), info);
    }

    pub fn with_asset(mut self, asset_ref: impl Into<String>, class_name: impl Into<String>, half_extent: Vec3) -> Self {
        self.insert(
            asset_ref,
            AssetInfo {
                class_name: class_name.into(),
                half_extent,
            },
        );
        self
    }

    pub fn get(&self, asset_ref: &str) -> Option<&AssetInfo> {
        self.assets.get(asset_ref)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
