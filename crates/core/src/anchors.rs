//! Anchor resolution.
//!
//! Converts the named scene references in a [`SpawnConfig`] into cached
//! transforms. Resolution is partial-failure tolerant: a missing anchor is
//! logged and marked invalid, and everything else keeps resolving. Lanes and
//! the sidewalk area are derived afterwards from their endpoint anchors.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{LaneDefinition, SpawnConfig};
use crate::error::WorldError;
use crate::geometry::Transform;
use crate::math::length_det;
use crate::world::World;

/// Lanes shorter than this on the ground plane have no usable direction.
const MIN_LANE_LENGTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorKind {
    Parking,
    LaneStart,
    LaneEnd,
    SidewalkCorner,
    Exclusion,
    Background,
}

/// A named, resolved reference transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub name: String,
    pub kind: AnchorKind,
    pub transform: Transform,
    pub group_id: Option<String>,
    pub valid: bool,
}

impl Anchor {
    fn invalid(name: &str, kind: AnchorKind, group_id: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            transform: Transform::default(),
            group_id,
            valid: false,
        }
    }
}

/// A directed lane with derived direction and length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub start_anchor: String,
    pub end_anchor: String,
    pub width: f32,
    pub start: Vec3,
    pub end: Vec3,
    /// Unit vector from start to end. Zero when the lane is invalid.
    pub direction: Vec3,
    pub length: f32,
    pub valid: bool,
}

impl Lane {
    /// Point at parameter `t` along the centre line.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start.lerp(self.end, t)
    }

    /// Ground-plane unit vector to the right of the direction of travel.
    pub fn right(&self) -> Vec3 {
        self.direction.cross(Vec3::Z).normalize_or_zero()
    }
}

/// Axis-aligned area spanned by two corner anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidewalkBounds {
    pub corner_a: String,
    pub corner_b: String,
    pub min: Vec3,
    pub max: Vec3,
    pub valid: bool,
}

impl SidewalkBounds {
    pub fn mid_height(&self) -> f32 {
        (self.min.z + self.max.z) * 0.5
    }
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveSummary {
    pub requested: usize,
    pub resolved: usize,
    /// Names that could not be found in the world.
    pub missing: Vec<String>,
    /// Placement anchors that are also listed as locked.
    pub locked_conflicts: Vec<String>,
    pub valid_lanes: usize,
    pub invalid_lanes: Vec<String>,
    pub sidewalk_valid: bool,
}

/// Read-only anchor cache for one scene.
#[derive(Debug, Clone, Default)]
pub struct AnchorResolver {
    anchors: Vec<Anchor>,
    index: HashMap<String, usize>,
    lanes: Vec<Lane>,
    sidewalk: Option<SidewalkBounds>,
}

impl AnchorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every anchor the config names.
    ///
    /// Replaces the previous cache. When the world is unavailable the call
    /// fails and the previous cache is kept.
    pub fn resolve(&mut self, world: &dyn World, config: &SpawnConfig) -> Result<ResolveSummary, WorldError> {
        world.ensure_available()?;

        let mut next = AnchorResolver::new();
        let mut summary = ResolveSummary::default();

        // Locked names first so a placement anchor with the same name is
        // recorded as background and never placed against.
        for name in &config.locked_entities {
            next.resolve_one(world, name, AnchorKind::Background, None, &mut summary);
        }
        for name in &config.parking_anchors {
            next.resolve_one(world, name, AnchorKind::Parking, None, &mut summary);
        }
        for lane in &config.lanes {
            let group = Some(lane.id.clone());
            next.resolve_one(world, &lane.start_anchor, AnchorKind::LaneStart, group.clone(), &mut summary);
            next.resolve_one(world, &lane.end_anchor, AnchorKind::LaneEnd, group, &mut summary);
        }
        if config.sidewalk.is_configured() {
            let group = Some("sidewalk".to_string());
            next.resolve_one(world, &config.sidewalk.corner_a, AnchorKind::SidewalkCorner, group.clone(), &mut summary);
            next.resolve_one(world, &config.sidewalk.corner_b, AnchorKind::SidewalkCorner, group, &mut summary);
        }
        for name in &config.exclusion_anchors {
            next.resolve_one(world, name, AnchorKind::Exclusion, None, &mut summary);
        }

        for definition in &config.lanes {
            let lane = next.derive_lane(definition);
            if lane.valid {
                summary.valid_lanes += 1;
            } else {
                tracing::warn!(lane = %lane.id, "Lane invalid, will be skipped");
                summary.invalid_lanes.push(lane.id.clone());
            }
            next.lanes.push(lane);
        }

        if config.sidewalk.is_configured() {
            let sidewalk = next.derive_sidewalk(&config.sidewalk.corner_a, &config.sidewalk.corner_b);
            if !sidewalk.valid {
                tracing::warn!(
                    corner_a = %sidewalk.corner_a,
                    corner_b = %sidewalk.corner_b,
                    "Sidewalk bounds invalid"
                );
            }
            summary.sidewalk_valid = sidewalk.valid;
            next.sidewalk = Some(sidewalk);
        }

        tracing::info!(
            requested = summary.requested,
            resolved = summary.resolved,
            missing = summary.missing.len(),
            valid_lanes = summary.valid_lanes,
            sidewalk_valid = summary.sidewalk_valid,
            "Anchor resolution complete"
        );

        *self = next;
        Ok(summary)
    }

    fn resolve_one(
        &mut self,
        world: &dyn World,
        name: &str,
        kind: AnchorKind,
        group_id: Option<String>,
        summary: &mut ResolveSummary,
    ) {
        if let Some(&existing) = self.index.get(name) {
            if self.anchors[existing].kind == AnchorKind::Background && kind != AnchorKind::Background {
                tracing::warn!(anchor = %name, "Anchor is a locked background entity");
                summary.locked_conflicts.push(name.to_string());
            }
            return;
        }

        summary.requested += 1;
        let anchor = match world.find_by_name(name).map(|handle| world.transform(handle)) {
            Some(Ok(transform)) => {
                summary.resolved += 1;
                tracing::debug!(anchor = %name, kind = ?kind, position = ?transform.position, "Anchor resolved");
                Anchor {
                    name: name.to_string(),
                    kind,
                    transform,
                    group_id,
                    valid: true,
                }
            }
            Some(Err(err)) => {
                tracing::warn!(anchor = %name, error = %err, "Anchor transform unreadable");
                summary.missing.push(name.to_string());
                Anchor::invalid(name, kind, group_id)
            }
            None => {
                tracing::warn!(anchor = %name, "Anchor not found in world");
                summary.missing.push(name.to_string());
                Anchor::invalid(name, kind, group_id)
            }
        };

        self.index.insert(name.to_string(), self.anchors.len());
        self.anchors.push(anchor);
    }

    fn derive_lane(&self, definition: &LaneDefinition) -> Lane {
        let start = self.anchor(&definition.start_anchor).filter(|a| a.valid && a.kind != AnchorKind::Background);
        let end = self.anchor(&definition.end_anchor).filter(|a| a.valid && a.kind != AnchorKind::Background);

        let mut lane = Lane {
            id: definition.id.clone(),
            start_anchor: definition.start_anchor.clone(),
            end_anchor: definition.end_anchor.clone(),
            width: definition.width,
            start: Vec3::ZERO,
            end: Vec3::ZERO,
            direction: Vec3::ZERO,
            length: 0.0,
            valid: false,
        };

        if !(lane.width.is_finite() && lane.width > 0.0) {
            tracing::warn!(lane = %lane.id, width = lane.width, "Lane width must be positive");
            return lane;
        }

        if let (Some(start), Some(end)) = (start, end) {
            lane.start = start.transform.position;
            lane.end = end.transform.position;
            let delta = lane.end - lane.start;
            let ground_length = length_det(delta.x, delta.y);
            if ground_length >= MIN_LANE_LENGTH {
                lane.length = delta.length();
                lane.direction = delta / lane.length;
                lane.valid = true;
            } else {
                tracing::warn!(lane = %lane.id, "Lane endpoints coincide on the ground plane");
            }
        }
        lane
    }

    fn derive_sidewalk(&self, corner_a: &str, corner_b: &str) -> SidewalkBounds {
        let a = self.anchor(corner_a).filter(|a| a.valid);
        let b = self.anchor(corner_b).filter(|a| a.valid);

        let mut bounds = SidewalkBounds {
            corner_a: corner_a.to_string(),
            corner_b: corner_b.to_string(),
            min: Vec3::ZERO,
            max: Vec3::ZERO,
            valid: false,
        };
        if let (Some(a), Some(b)) = (a, b) {
            bounds.min = a.transform.position.min(b.transform.position);
            bounds.max = a.transform.position.max(b.transform.position);
            bounds.valid = true;
        }
        bounds
    }

    pub fn anchor(&self, name: &str) -> Option<&Anchor> {
        self.index.get(name).map(|&i| &self.anchors[i])
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn lane(&self, id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.id == id)
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn sidewalk(&self) -> Option<&SidewalkBounds> {
        self.sidewalk.as_ref()
    }

    /// Valid exclusion anchors.
    pub fn exclusions(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors
            .iter()
            .filter(|a| a.valid && a.kind == AnchorKind::Exclusion)
    }

    /// Number of valid anchors in the cache.
    pub fn resolved_count(&self) -> usize {
        self.anchors.iter().filter(|a| a.valid).count()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SidewalkDefinition;
    use crate::testing::MockWorld;

    fn config() -> SpawnConfig {
        SpawnConfig {
            parking_anchors: vec!["Slot_0".into(), "Slot_1".into(), "Slot_Missing".into()],
            lanes: vec![
                LaneDefinition {
                    id: "east".into(),
                    start_anchor: "Lane_E0".into(),
                    end_anchor: "Lane_E1".into(),
                    width: 350.0,
                },
                LaneDefinition {
                    id: "broken".into(),
                    start_anchor: "Lane_E0".into(),
                    end_anchor: "Lane_Gone".into(),
                    width: 350.0,
                },
            ],
            sidewalk: SidewalkDefinition {
                corner_a: "Walk_A".into(),
                corner_b: "Walk_B".into(),
            },
            ..Default::default()
        }
    }

    fn world() -> MockWorld {
        let mut world = MockWorld::new();
        world.add_anchor("Slot_0", Vec3::new(0.0, 0.0, 0.0), 90.0);
        world.add_anchor("Slot_1", Vec3::new(1000.0, 0.0, 0.0), 90.0);
        world.add_anchor("Lane_E0", Vec3::new(0.0, 2000.0, 0.0), 0.0);
        world.add_anchor("Lane_E1", Vec3::new(4000.0, 2000.0, 0.0), 0.0);
        world.add_anchor("Walk_A", Vec3::new(500.0, -500.0, 20.0), 0.0);
        world.add_anchor("Walk_B", Vec3::new(-500.0, -900.0, 10.0), 0.0);
        world
    }

    #[test]
    fn partial_failure_keeps_resolving() {
        let mut resolver = AnchorResolver::new();
        let summary = resolver.resolve(&world(), &config()).unwrap();

        assert_eq!(summary.missing, vec!["Slot_Missing".to_string(), "Lane_Gone".to_string()]);
        assert_eq!(summary.resolved, 6);
        assert!(resolver.anchor("Slot_0").unwrap().valid);
        assert!(!resolver.anchor("Slot_Missing").unwrap().valid);
        assert_eq!(resolver.resolved_count(), 6);
    }

    #[test]
    fn lanes_derive_direction_and_validity() {
        let mut resolver = AnchorResolver::new();
        let summary = resolver.resolve(&world(), &config()).unwrap();

        assert_eq!(summary.valid_lanes, 1);
        assert_eq!(summary.invalid_lanes, vec!["broken".to_string()]);

        let lane = resolver.lane("east").unwrap();
        assert!(lane.valid);
        assert!((lane.direction - Vec3::X).length() < 1e-5);
        assert!((lane.length - 4000.0).abs() < 1e-3);
        assert!((lane.right() - Vec3::NEG_Y).length() < 1e-5);
        assert_eq!(lane.point_at(0.5), Vec3::new(2000.0, 2000.0, 0.0));
        assert!(!resolver.lane("broken").unwrap().valid);
    }

    #[test]
    fn sidewalk_bounds_are_axis_aligned() {
        let mut resolver = AnchorResolver::new();
        resolver.resolve(&world(), &config()).unwrap();

        let sidewalk = resolver.sidewalk().unwrap();
        assert!(sidewalk.valid);
        assert_eq!(sidewalk.min, Vec3::new(-500.0, -900.0, 10.0));
        assert_eq!(sidewalk.max, Vec3::new(500.0, -500.0, 20.0));
        assert_eq!(sidewalk.mid_height(), 15.0);
    }

    #[test]
    fn locked_names_become_background() {
        let mut config = config();
        config.locked_entities = vec!["Slot_1".into()];

        let mut resolver = AnchorResolver::new();
        let summary = resolver.resolve(&world(), &config).unwrap();

        assert_eq!(resolver.anchor("Slot_1").unwrap().kind, AnchorKind::Background);
        assert_eq!(summary.locked_conflicts, vec!["Slot_1".to_string()]);
    }

    #[test]
    fn unavailable_world_keeps_previous_cache() {
        let mut resolver = AnchorResolver::new();
        resolver.resolve(&world(), &config()).unwrap();

        let mut offline = world();
        offline.available = false;
        assert_eq!(resolver.resolve(&offline, &config()), Err(WorldError::Unavailable));
        assert!(resolver.anchor("Slot_0").is_some());
    }

    #[test]
    fn coincident_lane_endpoints_are_invalid() {
        let mut world = world();
        world.add_anchor("Stacked", Vec3::new(0.0, 2000.0, 300.0), 0.0);
        let config = SpawnConfig {
            lanes: vec![LaneDefinition {
                id: "vertical".into(),
                start_anchor: "Lane_E0".into(),
                end_anchor: "Stacked".into(),
                width: 350.0,
            }],
            ..Default::default()
        };

        let mut resolver = AnchorResolver::new();
        let summary = resolver.resolve(&world, &config).unwrap();
        assert_eq!(summary.valid_lanes, 0);
    }
}
