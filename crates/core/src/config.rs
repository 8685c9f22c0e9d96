//! Spawn, collision, visibility and annotation configuration.
//!
//! All values use centimetres and degrees unless otherwise noted. Every
//! record deserializes with defaults, so a config file only needs the fields
//! it changes.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A directed lane between two named anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneDefinition {
    pub id: String,
    pub start_anchor: String,
    pub end_anchor: String,
    #[serde(default = "default_lane_width")]
    pub width: f32,
}

fn default_lane_width() -> f32 {
    350.0
}

/// Two corner anchors spanning the sidewalk area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidewalkDefinition {
    pub corner_a: String,
    pub corner_b: String,
}

impl SidewalkDefinition {
    pub fn is_configured(&self) -> bool {
        !self.corner_a.is_empty() || !self.corner_b.is_empty()
    }
}

/// Configuration for anchor-based spawning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    // ========================================================================
    // Parking
    // ========================================================================
    /// Parking slot anchor names.
    pub parking_anchors: Vec<String>,

    /// Maximum X/Y jitter around a parking anchor.
    pub parking_position_jitter: f32,

    /// Maximum yaw jitter after the forward/reverse choice (degrees).
    pub parking_yaw_jitter: f32,

    /// Probability of reverse parking (0.0 to 1.0).
    pub reverse_parking_probability: f32,

    // ========================================================================
    // Lanes
    // ========================================================================
    pub lanes: Vec<LaneDefinition>,

    /// Maximum lateral offset from the lane centre line.
    pub lane_lateral_jitter: f32,

    /// Maximum yaw jitter for lane vehicles (degrees).
    pub lane_yaw_jitter: f32,

    // ========================================================================
    // Sidewalk
    // ========================================================================
    pub sidewalk: SidewalkDefinition,

    // ========================================================================
    // Scene
    // ========================================================================
    /// Background entities that placement and cleanup must never touch.
    pub locked_entities: Vec<String>,

    /// Anchors marking keep-out zones no candidate may intrude on.
    pub exclusion_anchors: Vec<String>,

    /// Tag carried by every entity the authoritative sweep is responsible for.
    pub marker_tag: String,

    /// Tag given to spawned sidewalk props.
    pub prop_tag: String,

    pub collision: CollisionConfig,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            parking_anchors: Vec::new(),
            parking_position_jitter: 10.0,
            parking_yaw_jitter: 5.0,
            reverse_parking_probability: 0.3,

            lanes: Vec::new(),
            lane_lateral_jitter: 30.0,
            lane_yaw_jitter: 2.0,

            sidewalk: SidewalkDefinition::default(),

            locked_entities: Vec::new(),
            exclusion_anchors: Vec::new(),
            marker_tag: "Vehicle".to_string(),
            prop_tag: "Prop".to_string(),

            collision: CollisionConfig::default(),
        }
    }
}

impl SpawnConfig {
    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no placement could honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("reverse_parking_probability", self.reverse_parking_probability, 0.0, 1.0)?;

        // Jitters are drawn from [-j, j]; the span must stay finite.
        let jitters = [
            ("parking_position_jitter", self.parking_position_jitter),
            ("parking_yaw_jitter", self.parking_yaw_jitter),
            ("lane_lateral_jitter", self.lane_lateral_jitter),
            ("lane_yaw_jitter", self.lane_yaw_jitter),
        ];
        for (name, value) in jitters {
            check_range(name, value, 0.0, f32::MAX / 2.0)?;
        }

        for lane in &self.lanes {
            if !(lane.width.is_finite() && lane.width > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "lane '{}' width must be positive and finite, got {}",
                    lane.id, lane.width
                )));
            }
        }

        let collision = &self.collision;
        for (name, extent) in [
            ("vehicle_half_extent", collision.vehicle_half_extent),
            ("prop_half_extent", collision.prop_half_extent),
        ] {
            if !extent.is_finite() || extent.min_element() < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-negative and finite, got {extent}")));
            }
        }
        check_range("safety_margin", collision.safety_margin, 0.0, f32::MAX)?;
        check_range("min_spacing", collision.min_spacing, 0.0, f32::MAX)?;
        check_range("exclusion_radius", collision.exclusion_radius, 0.0, f32::MAX)?;
        if collision.max_placement_attempts == 0 {
            return Err(ConfigError::Invalid("max_placement_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} {value} outside [{min}, {max}]")))
    }
}

/// Overlap avoidance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Approximate vehicle half extent used for candidate radii.
    pub vehicle_half_extent: Vec3,

    /// Approximate prop half extent used for candidate radii.
    pub prop_half_extent: Vec3,

    /// Added to every half extent when deriving a collision radius.
    pub safety_margin: f32,

    /// Global lower bound on centre-to-centre ground distance.
    pub min_spacing: f32,

    /// Keep-out radius around each exclusion anchor.
    pub exclusion_radius: f32,

    /// Candidates tried per request before failing with `overlap`.
    pub max_placement_attempts: u32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            vehicle_half_extent: Vec3::new(250.0, 100.0, 75.0),
            prop_half_extent: Vec3::new(40.0, 40.0, 60.0),
            safety_margin: 10.0,
            min_spacing: 0.0,
            exclusion_radius: 200.0,
            max_placement_attempts: 50,
        }
    }
}

/// Frustum visibility settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Fraction of the nominal half-FOV a corner must fall inside.
    pub effective_fov_fraction: f32,

    /// Entities scoring below this percentage are not annotated.
    pub min_visibility_percent: f32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            effective_fov_fraction: 0.8,
            min_visibility_percent: 25.0,
        }
    }
}

/// Filters applied to extracted 2D boxes (pixels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub min_bbox_dimension: f32,
    pub min_bbox_area: f32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            min_bbox_dimension: 10.0,
            min_bbox_area: 100.0,
        }
    }
}

/// Everything a scene session is configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub spawn: SpawnConfig,
    pub visibility: VisibilityConfig,
    pub annotation: AnnotationConfig,
}

impl SessionConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spawn.validate()?;

        let fraction = self.visibility.effective_fov_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!("effective_fov_fraction {fraction} outside (0, 1]")));
        }
        check_range("min_visibility_percent", self.visibility.min_visibility_percent, 0.0, 100.0)?;
        check_range("min_bbox_dimension", self.annotation.min_bbox_dimension, 0.0, f32::MAX)?;
        check_range("min_bbox_area", self.annotation.min_bbox_area, 0.0, f32::MAX)?;
        Ok(())
    }
}
