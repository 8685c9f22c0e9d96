//! Ground-truth extraction: 2D boxes and 6-DOF poses.
//!
//! Both extractors walk the same entity set: every live, unhidden entity
//! carrying one of the requested tags, optionally filtered by visibility.
//! The class label comes from [`World::class_name`] in both cases.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{AnnotationConfig, VisibilityConfig};
use crate::error::WorldError;
use crate::geometry::Bounds;
use crate::visibility::VisibilityEvaluator;
use crate::world::{EntityHandle, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxAnnotation {
    pub class: String,
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBoxAnnotation {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseAnnotation {
    pub class: String,
    pub translation: [f32; 3],
    /// `[roll, pitch, yaw]` in degrees.
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

/// `{"annotations": [...]}` as written next to each captured frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxSet {
    pub annotations: Vec<BoundingBoxAnnotation>,
}

/// `{"poses": [...]}` as written next to each captured frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSet {
    pub poses: Vec<PoseAnnotation>,
}

impl BoundingBoxSet {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl PoseSet {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Projects the eight corners of `bounds` and takes their screen-space
/// min/max. Corners that fail to project are skipped; `None` when none do.
pub fn project_bounds(world: &dyn World, bounds: &Bounds, class: &str) -> Option<BoundingBoxAnnotation> {
    let mut projected = bounds
        .corners()
        .into_iter()
        .filter_map(|corner| world.project_to_screen(corner))
        .peekable();
    let first = *projected.peek()?;

    let (min, max) = projected.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
    Some(BoundingBoxAnnotation {
        class: class.to_string(),
        x_min: min.x,
        y_min: min.y,
        x_max: max.x,
        y_max: max.y,
        width: max.x - min.x,
        height: max.y - min.y,
    })
}

/// Entities to annotate, in tag order then world order, without duplicates.
pub fn annotated_entities(
    world: &dyn World,
    tags: &[String],
    visibility: Option<&VisibilityConfig>,
) -> Result<Vec<EntityHandle>, WorldError> {
    world.ensure_available()?;

    let camera = match visibility {
        Some(_) => Some(world.active_camera()?),
        None => None,
    };
    let evaluator = visibility.map(VisibilityEvaluator::new);

    let mut seen = HashSet::new();
    let mut entities = Vec::new();
    for tag in tags {
        for handle in world.entities_with_tag(tag) {
            if !seen.insert(handle) || world.is_hidden(handle)? {
                continue;
            }
            if let (Some(evaluator), Some(camera)) = (&evaluator, &camera) {
                let bounds = world.bounds(handle)?;
                if !evaluator.is_visible(&bounds, camera) {
                    tracing::debug!(entity = ?handle, "Below visibility threshold, not annotated");
                    continue;
                }
            }
            entities.push(handle);
        }
    }
    Ok(entities)
}

/// 2D boxes for every annotated entity that survives the size filters.
pub fn extract_bounding_boxes(
    world: &dyn World,
    tags: &[String],
    config: &AnnotationConfig,
    visibility: Option<&VisibilityConfig>,
) -> Result<Vec<BoundingBoxAnnotation>, WorldError> {
    let entities = annotated_entities(world, tags, visibility)?;

    let mut boxes = Vec::with_capacity(entities.len());
    for handle in entities {
        let class = world.class_name(handle)?;
        let bounds = world.bounds(handle)?;
        let Some(bbox) = project_bounds(world, &bounds, &class) else {
            tracing::debug!(entity = ?handle, "No corner projects, skipped");
            continue;
        };
        if bbox.width < config.min_bbox_dimension
            || bbox.height < config.min_bbox_dimension
            || bbox.area() < config.min_bbox_area
        {
            tracing::debug!(entity = ?handle, width = bbox.width, height = bbox.height, "Box too small, skipped");
            continue;
        }
        boxes.push(bbox);
    }

    tracing::info!(count = boxes.len(), "Bounding boxes extracted");
    Ok(boxes)
}

/// World pose of every annotated entity.
pub fn extract_poses(
    world: &dyn World,
    tags: &[String],
    visibility: Option<&VisibilityConfig>,
) -> Result<Vec<PoseAnnotation>, WorldError> {
    let entities = annotated_entities(world, tags, visibility)?;

    let mut poses = Vec::with_capacity(entities.len());
    for handle in entities {
        let transform = world.transform(handle)?;
        poses.push(PoseAnnotation {
            class: world.class_name(handle)?,
            translation: transform.position.to_array(),
            rotation: transform.rotation.to_roll_pitch_yaw(),
            scale: transform.scale.to_array(),
        });
    }

    tracing::info!(count = poses.len(), "Poses extracted");
    Ok(poses)
}
