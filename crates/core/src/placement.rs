//! Candidate transforms for slot, lane and area placement.
//!
//! Every strategy runs the same bounded loop: draw a candidate from the
//! seeded stream, gate it through the [`CollisionValidator`], and either spawn
//! it or draw again. Each attempt consumes a fixed number of draws, so the
//! stream's call count after a batch depends only on the seed and the scene.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::anchors::{AnchorKind, AnchorResolver};
use crate::collision::{CollisionValidator, Obstacle};
use crate::config::SpawnConfig;
use crate::error::{FailureReason, PlacementError};
use crate::geometry::Transform;
use crate::math::{normalize_yaw_degrees, yaw_of_direction};
use crate::random::DeterministicRandom;
use crate::registry::{PlacedEntity, SpawnRegistry};
use crate::world::World;

/// Lane parameters are perturbed by up to this much per candidate.
pub const LANE_PARAMETER_JITTER: f32 = 0.1;
/// No lane vehicle spawns closer to an endpoint than this.
pub const LANE_PARAMETER_MIN: f32 = 0.05;
pub const LANE_PARAMETER_MAX: f32 = 0.95;

/// Ground rays start this far above the sidewalk mid-height.
const GROUND_TRACE_UP: f32 = 500.0;
/// ...and reach this far below it.
const GROUND_TRACE_DOWN: f32 = 1000.0;

/// One entity the caller wants placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub asset_ref: String,
    #[serde(default)]
    pub class_tag: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl SpawnRequest {
    pub fn new(asset_ref: impl Into<String>, class_tag: impl Into<String>) -> Self {
        Self {
            asset_ref: asset_ref.into(),
            class_tag: class_tag.into(),
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParkingMode {
    /// Nose toward the anchor's facing.
    PullIn,
    /// Rotated 180 degrees from the anchor's facing.
    ReverseIn,
}

/// Outcome of one spawn request. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnResult {
    pub success: bool,
    pub instance_id: String,
    /// Anchor name, lane id or `sidewalk`.
    pub anchor_ref: String,
    pub final_transform: Transform,
    pub failure_reason: Option<FailureReason>,
    /// Candidates drawn before the request settled.
    pub attempts: u32,
    /// Lane parameter of the final candidate, for lane placements.
    pub lane_parameter: Option<f32>,
}

impl SpawnResult {
    fn failed(anchor_ref: &str, reason: FailureReason, attempts: u32, lane_parameter: Option<f32>) -> Self {
        Self {
            success: false,
            instance_id: String::new(),
            anchor_ref: anchor_ref.to_string(),
            final_transform: Transform::default(),
            failure_reason: Some(reason),
            attempts,
            lane_parameter,
        }
    }

    pub fn reason_code(&self) -> Option<&'static str> {
        self.failure_reason.as_ref().map(FailureReason::code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionVerdict {
    Accepted,
    Rejected,
}

/// Lifecycle of a single spawn request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlacementState {
    #[default]
    Idle,
    AnchorOrLaneResolved,
    CandidateComputed,
    CollisionChecked(CollisionVerdict),
    Spawned,
    Failed,
}

impl PlacementState {
    pub fn can_advance(self, next: PlacementState) -> bool {
        use CollisionVerdict::*;
        use PlacementState::*;

        matches!(
            (self, next),
            (Idle, AnchorOrLaneResolved)
                | (Idle, Failed)
                | (AnchorOrLaneResolved, CandidateComputed)
                | (CandidateComputed, CollisionChecked(_))
                | (CollisionChecked(Rejected), CandidateComputed)
                | (CollisionChecked(Rejected), Failed)
                | (CollisionChecked(Accepted), Spawned)
                | (CollisionChecked(Accepted), Failed)
        )
    }

    /// Moves to `next` if the transition is legal. Returns whether it moved.
    pub fn advance(&mut self, next: PlacementState) -> bool {
        if self.can_advance(next) {
            *self = next;
            true
        } else {
            false
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PlacementState::Spawned | PlacementState::Failed)
    }
}

fn transition(state: &mut PlacementState, next: PlacementState) {
    let from = *state;
    let moved = state.advance(next);
    debug_assert!(moved, "illegal placement transition {from:?} -> {next:?}");
}

struct Candidate {
    transform: Transform,
    lane_parameter: Option<f32>,
}

/// Fixed facts about one request while its candidates are drawn.
struct Placement<'r> {
    prefix: &'static str,
    anchor_ref: &'r str,
    request: &'r SpawnRequest,
    half_extent: Vec3,
    tag: &'r str,
}

/// Borrowed view over a session's placement state.
pub struct PlacementEngine<'a> {
    config: &'a SpawnConfig,
    anchors: &'a AnchorResolver,
    rng: &'a mut DeterministicRandom,
    registry: &'a mut SpawnRegistry,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(
        config: &'a SpawnConfig,
        anchors: &'a AnchorResolver,
        rng: &'a mut DeterministicRandom,
        registry: &'a mut SpawnRegistry,
    ) -> Self {
        Self {
            config,
            anchors,
            rng,
            registry,
        }
    }

    // ========================================================================
    // Slot placement
    // ========================================================================

    /// Place one entity at a parking anchor.
    pub fn spawn_at_slot(
        &mut self,
        world: &mut dyn World,
        anchor_name: &str,
        request: &SpawnRequest,
        mode: ParkingMode,
    ) -> Result<SpawnResult, PlacementError> {
        world.ensure_available()?;
        Ok(self.place_at_slot(world, anchor_name, request, mode))
    }

    /// Distribute vehicles over the configured parking anchors in a seeded
    /// order.
    ///
    /// Without `max_vehicles` one vehicle is placed per request. With it,
    /// up to that many are placed and the requests are cycled. Either way the
    /// count is capped by the number of slots.
    pub fn spawn_parking(
        &mut self,
        world: &mut dyn World,
        requests: &[SpawnRequest],
        max_vehicles: Option<usize>,
    ) -> Result<Vec<SpawnResult>, PlacementError> {
        world.ensure_available()?;
        if requests.is_empty() {
            return Err(PlacementError::EmptyRequests);
        }

        let config = self.config;
        let slots = &config.parking_anchors;
        let to_spawn = max_vehicles.unwrap_or(requests.len()).min(slots.len());

        tracing::info!(
            slots = slots.len(),
            to_spawn,
            seed = self.rng.seed(),
            "Spawning parking vehicles"
        );

        let order = self.rng.permutation(slots.len());
        let mut results = Vec::with_capacity(to_spawn);
        for (i, &slot) in order.iter().take(to_spawn).enumerate() {
            let request = &requests[i % requests.len()];
            let mode = if self.rng.weighted_bool(config.reverse_parking_probability) {
                ParkingMode::ReverseIn
            } else {
                ParkingMode::PullIn
            };
            results.push(self.place_at_slot(world, &slots[slot], request, mode));
        }

        log_batch("parking", &results);
        Ok(results)
    }

    fn place_at_slot(
        &mut self,
        world: &mut dyn World,
        anchor_name: &str,
        request: &SpawnRequest,
        mode: ParkingMode,
    ) -> SpawnResult {
        let mut state = PlacementState::Idle;

        let base = match self.slot_anchor(anchor_name) {
            Ok(transform) => transform,
            Err(reason) => return self.reject(&mut state, anchor_name, reason),
        };
        transition(&mut state, PlacementState::AnchorOrLaneResolved);

        let config = self.config;
        let jitter = config.parking_position_jitter;
        let yaw_jitter = config.parking_yaw_jitter;
        let flip = match mode {
            ParkingMode::PullIn => 0.0,
            ParkingMode::ReverseIn => 180.0,
        };
        let scale = request.scale;

        let placement = Placement {
            prefix: "parking",
            anchor_ref: anchor_name,
            request,
            half_extent: config.collision.vehicle_half_extent,
            tag: &config.marker_tag,
        };

        self.place(world, state, placement, move |rng, _| {
            let mut transform = base;
            transform.position.x += rng.range_float(-jitter, jitter);
            transform.position.y += rng.range_float(-jitter, jitter);
            let yaw = base.rotation.yaw + flip + rng.range_float(-yaw_jitter, yaw_jitter);
            transform.rotation.yaw = normalize_yaw_degrees(yaw);
            transform.scale = Vec3::splat(scale);
            Candidate {
                transform,
                lane_parameter: None,
            }
        })
    }

    fn slot_anchor(&self, name: &str) -> Result<Transform, FailureReason> {
        match self.anchors.anchor(name) {
            Some(anchor) if anchor.kind == AnchorKind::Background => Err(FailureReason::Locked(name.to_string())),
            Some(anchor) if anchor.valid => Ok(anchor.transform),
            _ => Err(FailureReason::AnchorNotFound(name.to_string())),
        }
    }

    // ========================================================================
    // Lane placement
    // ========================================================================

    /// Place one entity along a lane around the nominal parameter `t`.
    ///
    /// Each candidate perturbs `t` by up to [`LANE_PARAMETER_JITTER`] and
    /// clamps it into `[LANE_PARAMETER_MIN, LANE_PARAMETER_MAX]`.
    pub fn spawn_along_lane(
        &mut self,
        world: &mut dyn World,
        lane_id: &str,
        t: f32,
        request: &SpawnRequest,
    ) -> Result<SpawnResult, PlacementError> {
        world.ensure_available()?;
        Ok(self.place_along_lane(world, lane_id, t, request))
    }

    /// Place `vehicles_per_lane` vehicles, evenly spaced, on every lane.
    ///
    /// Requests cycle across all lanes. Invalid lanes consume no draws and
    /// report `lane_invalid` for each of their vehicles.
    pub fn spawn_lane_vehicles(
        &mut self,
        world: &mut dyn World,
        requests: &[SpawnRequest],
        vehicles_per_lane: usize,
    ) -> Result<Vec<SpawnResult>, PlacementError> {
        world.ensure_available()?;
        if requests.is_empty() {
            return Err(PlacementError::EmptyRequests);
        }

        let anchors = self.anchors;
        tracing::info!(
            lanes = anchors.lanes().len(),
            vehicles_per_lane,
            seed = self.rng.seed(),
            "Spawning lane vehicles"
        );

        let mut results = Vec::new();
        let mut vehicle_index = 0;
        for lane in anchors.lanes() {
            if !lane.valid {
                tracing::warn!(lane = %lane.id, "Skipping invalid lane");
                results.extend((0..vehicles_per_lane).map(|_| {
                    SpawnResult::failed(&lane.id, FailureReason::LaneInvalid(lane.id.clone()), 0, None)
                }));
                continue;
            }

            for i in 0..vehicles_per_lane {
                let t = (i as f32 + 1.0) / (vehicles_per_lane as f32 + 1.0);
                let request = &requests[vehicle_index % requests.len()];
                results.push(self.place_along_lane(world, &lane.id, t, request));
                vehicle_index += 1;
            }
        }

        log_batch("lane", &results);
        Ok(results)
    }

    fn place_along_lane(
        &mut self,
        world: &mut dyn World,
        lane_id: &str,
        t: f32,
        request: &SpawnRequest,
    ) -> SpawnResult {
        let mut state = PlacementState::Idle;

        let lane = match self.anchors.lane(lane_id) {
            Some(lane) if lane.valid => lane.clone(),
            _ => return self.reject(&mut state, lane_id, FailureReason::LaneInvalid(lane_id.to_string())),
        };
        transition(&mut state, PlacementState::AnchorOrLaneResolved);

        let config = self.config;
        let lateral_jitter = config.lane_lateral_jitter;
        let yaw_jitter = config.lane_yaw_jitter;
        let half_width = lane.width.abs() * 0.5;
        let heading = yaw_of_direction(lane.direction.x, lane.direction.y);
        let right = lane.right();
        let scale = request.scale;

        let placement = Placement {
            prefix: "lane",
            anchor_ref: lane_id,
            request,
            half_extent: config.collision.vehicle_half_extent,
            tag: &config.marker_tag,
        };

        self.place(world, state, placement, move |rng, _| {
            let t = (t + rng.range_float(-LANE_PARAMETER_JITTER, LANE_PARAMETER_JITTER))
                .clamp(LANE_PARAMETER_MIN, LANE_PARAMETER_MAX);
            let lateral = rng
                .range_float(-lateral_jitter, lateral_jitter)
                .clamp(-half_width, half_width);
            let yaw = normalize_yaw_degrees(heading + rng.range_float(-yaw_jitter, yaw_jitter));

            let transform = Transform::from_position(lane.point_at(t) + right * lateral)
                .with_yaw(yaw)
                .with_uniform_scale(scale);
            Candidate {
                transform,
                lane_parameter: Some(t),
            }
        })
    }

    // ========================================================================
    // Area placement
    // ========================================================================

    /// Scatter `count` props over the sidewalk area, resting each on the
    /// ground under it. Each prop draws its request uniformly.
    pub fn spawn_in_area(
        &mut self,
        world: &mut dyn World,
        requests: &[SpawnRequest],
        count: usize,
    ) -> Result<Vec<SpawnResult>, PlacementError> {
        world.ensure_available()?;
        if requests.is_empty() {
            return Err(PlacementError::EmptyRequests);
        }
        let area = match self.anchors.sidewalk() {
            Some(area) if area.valid => area.clone(),
            _ => return Err(PlacementError::SidewalkUnresolved),
        };

        tracing::info!(count, asset_types = requests.len(), seed = self.rng.seed(), "Spawning sidewalk props");

        let config = self.config;
        let mid_height = area.mid_height();
        let mut results = Vec::with_capacity(count);
        for _ in 0..count {
            let pick = self.rng.range_int(0, requests.len() as i32 - 1) as usize;
            let request = &requests[pick];
            let scale = request.scale;

            let mut state = PlacementState::Idle;
            transition(&mut state, PlacementState::AnchorOrLaneResolved);

            let placement = Placement {
                prefix: "prop",
                anchor_ref: "sidewalk",
                request,
                half_extent: config.collision.prop_half_extent,
                tag: &config.prop_tag,
            };

            let (min, max) = (area.min, area.max);
            let result = self.place(world, state, placement, move |rng, world| {
                let x = rng.range_float(min.x, max.x);
                let y = rng.range_float(min.y, max.y);
                let yaw = normalize_yaw_degrees(rng.range_float(-180.0, 180.0));

                let origin = Vec3::new(x, y, mid_height + GROUND_TRACE_UP);
                let z = world
                    .raycast_down(origin, GROUND_TRACE_UP + GROUND_TRACE_DOWN)
                    .unwrap_or(mid_height);

                Candidate {
                    transform: Transform::from_position(Vec3::new(x, y, z))
                        .with_yaw(yaw)
                        .with_uniform_scale(scale),
                    lane_parameter: None,
                }
            });
            results.push(result);
        }

        log_batch("prop", &results);
        Ok(results)
    }

    // ========================================================================
    // Shared retry loop
    // ========================================================================

    fn place<F>(
        &mut self,
        world: &mut dyn World,
        mut state: PlacementState,
        placement: Placement<'_>,
        mut propose: F,
    ) -> SpawnResult
    where
        F: FnMut(&mut DeterministicRandom, &dyn World) -> Candidate,
    {
        let config = self.config;
        let validator = CollisionValidator::new(&config.collision);
        let radius = validator.collision_radius(placement.half_extent, placement.request.scale);
        let exclusions: Vec<Obstacle> = self
            .anchors
            .exclusions()
            .map(|anchor| Obstacle {
                position: anchor.transform.ground_position(),
                radius: config.collision.exclusion_radius,
            })
            .collect();

        let max_attempts = config.collision.max_placement_attempts.max(1);
        let mut attempts = 0;
        let mut last_parameter = None;
        let mut accepted = None;

        while attempts < max_attempts {
            attempts += 1;
            let candidate = propose(&mut *self.rng, &*world);
            last_parameter = candidate.lane_parameter;
            transition(&mut state, PlacementState::CandidateComputed);

            let obstacles = self
                .registry
                .placed()
                .iter()
                .map(Obstacle::from)
                .chain(exclusions.iter().copied());
            if validator.accept_radius(candidate.transform.ground_position(), radius, obstacles) {
                transition(&mut state, PlacementState::CollisionChecked(CollisionVerdict::Accepted));
                accepted = Some(candidate);
                break;
            }

            transition(&mut state, PlacementState::CollisionChecked(CollisionVerdict::Rejected));
            tracing::debug!(
                anchor = %placement.anchor_ref,
                attempt = attempts,
                position = ?candidate.transform.position,
                "Candidate rejected"
            );
        }

        let Some(candidate) = accepted else {
            transition(&mut state, PlacementState::Failed);
            tracing::warn!(anchor = %placement.anchor_ref, attempts, "No collision-free candidate");
            return SpawnResult::failed(placement.anchor_ref, FailureReason::Overlap, attempts, last_parameter);
        };

        let instance_id = self.registry.next_instance_id(placement.prefix);
        let mut tags = vec![placement.tag.to_string()];
        let class_tag = &placement.request.class_tag;
        if !class_tag.is_empty() && class_tag != placement.tag {
            tags.push(class_tag.clone());
        }

        match world.spawn(&placement.request.asset_ref, &instance_id, candidate.transform, &tags) {
            Ok(handle) => {
                transition(&mut state, PlacementState::Spawned);
                self.registry.record(PlacedEntity {
                    instance_id: instance_id.clone(),
                    handle,
                    class_tag: placement.request.class_tag.clone(),
                    position: candidate.transform.position,
                    collision_radius: radius,
                });
                tracing::info!(
                    instance_id = %instance_id,
                    anchor = %placement.anchor_ref,
                    attempts,
                    yaw = candidate.transform.rotation.yaw,
                    "Entity spawned"
                );
                SpawnResult {
                    success: true,
                    instance_id,
                    anchor_ref: placement.anchor_ref.to_string(),
                    final_transform: candidate.transform,
                    failure_reason: None,
                    attempts,
                    lane_parameter: candidate.lane_parameter,
                }
            }
            Err(err) => {
                transition(&mut state, PlacementState::Failed);
                tracing::error!(
                    asset = %placement.request.asset_ref,
                    anchor = %placement.anchor_ref,
                    error = %err,
                    "Actor spawn failed"
                );
                let mut result = SpawnResult::failed(
                    placement.anchor_ref,
                    FailureReason::SpawnFailed(err.to_string()),
                    attempts,
                    candidate.lane_parameter,
                );
                result.final_transform = candidate.transform;
                result
            }
        }
    }

    fn reject(&self, state: &mut PlacementState, anchor_ref: &str, reason: FailureReason) -> SpawnResult {
        transition(state, PlacementState::Failed);
        tracing::warn!(anchor = %anchor_ref, reason = reason.code(), "Spawn request rejected");
        SpawnResult::failed(anchor_ref, reason, 0, None)
    }
}

fn log_batch(kind: &str, results: &[SpawnResult]) {
    let spawned = results.iter().filter(|r| r.success).count();
    tracing::info!(
        kind,
        attempted = results.len(),
        spawned,
        failed = results.len() - spawned,
        "Spawn batch complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LaneDefinition, SidewalkDefinition};
    use crate::error::WorldError;
    use crate::testing::MockWorld;

    struct Fixture {
        config: SpawnConfig,
        anchors: AnchorResolver,
        rng: DeterministicRandom,
        registry: SpawnRegistry,
        world: MockWorld,
    }

    impl Fixture {
        fn new(config: SpawnConfig, world: MockWorld, seed: u32) -> Self {
            let mut anchors = AnchorResolver::new();
            anchors.resolve(&world, &config).unwrap();
            let registry = SpawnRegistry::new(config.locked_entities.clone());
            Self {
                config,
                anchors,
                rng: DeterministicRandom::new(seed),
                registry,
                world,
            }
        }

        fn run<R>(&mut self, f: impl FnOnce(&mut PlacementEngine<'_>, &mut MockWorld) -> R) -> R {
            let mut engine = PlacementEngine::new(&self.config, &self.anchors, &mut self.rng, &mut self.registry);
            f(&mut engine, &mut self.world)
        }
    }

    fn parking_scene(count: usize, spacing: f32) -> (SpawnConfig, MockWorld) {
        let mut world = MockWorld::new();
        let mut names = Vec::new();
        for i in 0..count {
            let name = format!("Slot_{i}");
            world.add_anchor(&name, Vec3::new(i as f32 * spacing, 0.0, 0.0), 90.0);
            names.push(name);
        }
        let config = SpawnConfig {
            parking_anchors: names,
            ..Default::default()
        };
        (config, world)
    }

    fn lane_scene() -> (SpawnConfig, MockWorld) {
        let mut world = MockWorld::new();
        world.add_anchor("Lane_N0", Vec3::new(0.0, 0.0, 0.0), 0.0);
        world.add_anchor("Lane_N1", Vec3::new(0.0, 6000.0, 0.0), 0.0);
        let config = SpawnConfig {
            lanes: vec![
                LaneDefinition {
                    id: "north".into(),
                    start_anchor: "Lane_N0".into(),
                    end_anchor: "Lane_N1".into(),
                    width: 350.0,
                },
                LaneDefinition {
                    id: "ghost".into(),
                    start_anchor: "Lane_N0".into(),
                    end_anchor: "Nowhere".into(),
                    width: 350.0,
                },
            ],
            ..Default::default()
        };
        (config, world)
    }

    fn sedans(n: usize) -> Vec<SpawnRequest> {
        (0..n)
            .map(|i| SpawnRequest::new(format!("/Game/Vehicles/Sedan_{i}"), "Sedan"))
            .collect()
    }

    #[test]
    fn state_machine_transitions() {
        let mut state = PlacementState::Idle;
        assert!(!state.advance(PlacementState::Spawned));
        assert!(state.advance(PlacementState::AnchorOrLaneResolved));
        assert!(state.advance(PlacementState::CandidateComputed));
        assert!(state.advance(PlacementState::CollisionChecked(CollisionVerdict::Rejected)));
        assert!(!state.advance(PlacementState::Spawned));
        assert!(state.advance(PlacementState::CandidateComputed));
        assert!(state.advance(PlacementState::CollisionChecked(CollisionVerdict::Accepted)));
        assert!(state.advance(PlacementState::Spawned));
        assert!(state.is_terminal());
        assert!(!state.advance(PlacementState::Idle));
    }

    #[test]
    fn scenario_a_forward_parking_within_jitter() {
        let (mut config, world) = parking_scene(5, 1000.0);
        config.reverse_parking_probability = 0.0;
        let mut fx = Fixture::new(config, world, 42);

        let results = fx.run(|engine, world| engine.spawn_parking(world, &sedans(3), None).unwrap());

        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(result.success, "{result:?}");
            assert_eq!(result.failure_reason, None);
            let yaw = result.final_transform.rotation.yaw;
            assert!((yaw - 90.0).abs() <= 5.0 + 1e-4, "yaw {yaw} outside anchor +/- jitter");
        }
        assert_eq!(fx.registry.len(), 3);
    }

    #[test]
    fn scenario_b_adjacent_anchor_overlaps() {
        let mut world = MockWorld::new();
        world.add_anchor("Slot_A", Vec3::ZERO, 0.0);
        world.add_anchor("Slot_B", Vec3::new(100.0, 0.0, 0.0), 0.0);
        let mut config = SpawnConfig {
            parking_anchors: vec!["Slot_A".into(), "Slot_B".into()],
            ..Default::default()
        };
        config.collision.vehicle_half_extent = Vec3::new(140.0, 60.0, 75.0);
        config.collision.safety_margin = 10.0;
        let mut fx = Fixture::new(config, world, 7);
        let request = SpawnRequest::new("/Game/Vehicles/Sedan", "Sedan");

        let (first, second, draws) = fx.run(|engine, world| {
            let first = engine.spawn_at_slot(world, "Slot_A", &request, ParkingMode::PullIn).unwrap();
            let before = engine.rng.call_count();
            let second = engine.spawn_at_slot(world, "Slot_B", &request, ParkingMode::PullIn).unwrap();
            (first, second, engine.rng.call_count() - before)
        });

        assert!(first.success);
        assert_eq!(fx.registry.placed()[0].collision_radius, 150.0);
        assert!(!second.success);
        assert_eq!(second.reason_code(), Some("overlap"));
        assert_eq!(second.attempts, 50);
        // Three draws per candidate.
        assert_eq!(draws, 150);
    }

    #[test]
    fn reverse_parking_flips_yaw() {
        let (config, world) = parking_scene(1, 1000.0);
        let mut fx = Fixture::new(config, world, 3);
        let request = SpawnRequest::new("/Game/Vehicles/Sedan", "Sedan");

        let result = fx.run(|engine, world| {
            engine
                .spawn_at_slot(world, "Slot_0", &request, ParkingMode::ReverseIn)
                .unwrap()
        });

        // 90 + 180 wraps to -90.
        assert!(result.success);
        assert!((result.final_transform.rotation.yaw + 90.0).abs() <= 5.0 + 1e-4);
    }

    #[test]
    fn parking_position_stays_within_jitter() {
        let (config, world) = parking_scene(4, 2000.0);
        let mut fx = Fixture::new(config, world, 11);

        let results = fx.run(|engine, world| engine.spawn_parking(world, &sedans(2), Some(4)).unwrap());

        assert_eq!(results.len(), 4);
        for result in &results {
            let anchor = fx.anchors.anchor(&result.anchor_ref).unwrap();
            let offset = result.final_transform.position - anchor.transform.position;
            assert!(offset.x.abs() <= 10.0 && offset.y.abs() <= 10.0);
            assert_eq!(offset.z, 0.0);
        }
        // Requests cycle.
        let assets: Vec<_> = fx
            .world
            .entities
            .iter()
            .filter(|e| e.tags.iter().any(|t| t == "Vehicle"))
            .map(|e| e.class.clone())
            .collect();
        assert_eq!(assets, vec!["Sedan_0", "Sedan_1", "Sedan_0", "Sedan_1"]);
    }

    #[test]
    fn parking_slots_are_a_permutation() {
        let (config, world) = parking_scene(6, 1000.0);
        let mut fx = Fixture::new(config, world, 99);

        let results = fx.run(|engine, world| engine.spawn_parking(world, &sedans(1), Some(6)).unwrap());

        let mut used: Vec<_> = results.iter().map(|r| r.anchor_ref.clone()).collect();
        used.sort();
        let mut expected = fx.config.parking_anchors.clone();
        expected.sort();
        assert_eq!(used, expected);
    }

    #[test]
    fn missing_and_locked_anchors_fail_without_draws() {
        let (mut config, world) = parking_scene(2, 1000.0);
        config.locked_entities = vec!["Slot_1".into()];
        let mut fx = Fixture::new(config, world, 5);
        let request = SpawnRequest::new("/Game/Vehicles/Sedan", "Sedan");

        let (missing, locked) = fx.run(|engine, world| {
            (
                engine.spawn_at_slot(world, "Slot_9", &request, ParkingMode::PullIn).unwrap(),
                engine.spawn_at_slot(world, "Slot_1", &request, ParkingMode::PullIn).unwrap(),
            )
        });

        assert_eq!(missing.reason_code(), Some("anchor_not_found"));
        assert_eq!(locked.reason_code(), Some("locked"));
        assert_eq!(fx.rng.call_count(), 0);
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn asset_failure_reports_spawn_failed() {
        let (config, mut world) = parking_scene(1, 1000.0);
        world.failing_assets.push("/Game/Vehicles/Broken".into());
        let mut fx = Fixture::new(config, world, 5);
        let request = SpawnRequest::new("/Game/Vehicles/Broken", "Sedan");

        let result = fx.run(|engine, world| {
            engine
                .spawn_at_slot(world, "Slot_0", &request, ParkingMode::PullIn)
                .unwrap()
        });

        assert_eq!(result.reason_code(), Some("spawn_failed"));
        assert_eq!(result.attempts, 1);
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn unavailable_world_fails_before_mutation() {
        let (config, world) = parking_scene(3, 1000.0);
        let mut fx = Fixture::new(config, world, 5);
        fx.world.available = false;

        let err = fx
            .run(|engine, world| engine.spawn_parking(world, &sedans(3), None))
            .unwrap_err();

        assert!(matches!(err, PlacementError::World(WorldError::Unavailable)));
        assert_eq!(fx.rng.call_count(), 0);
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn empty_requests_rejected() {
        let (config, world) = parking_scene(3, 1000.0);
        let mut fx = Fixture::new(config, world, 5);
        let err = fx.run(|engine, world| engine.spawn_parking(world, &[], None)).unwrap_err();
        assert_eq!(err, PlacementError::EmptyRequests);
    }

    #[test]
    fn lane_parameters_are_clamped() {
        let (config, world) = lane_scene();
        let mut fx = Fixture::new(config, world, 17);

        let results = fx.run(|engine, world| {
            let mut results = Vec::new();
            for t in [-1.0, 0.0, 0.02, 0.98, 1.0, 2.0] {
                let request = SpawnRequest::new("/Game/Vehicles/Sedan", "Sedan");
                results.push(engine.spawn_along_lane(world, "north", t, &request).unwrap());
            }
            results
        });

        for result in &results {
            let t = result.lane_parameter.unwrap();
            assert!((LANE_PARAMETER_MIN..=LANE_PARAMETER_MAX).contains(&t), "t = {t}");
        }
    }

    #[test]
    fn lane_vehicles_follow_lane_heading() {
        let (config, world) = lane_scene();
        let mut fx = Fixture::new(config, world, 23);

        let results = fx.run(|engine, world| engine.spawn_lane_vehicles(world, &sedans(2), 3).unwrap());

        // Three on the valid lane, three reported for the invalid one.
        assert_eq!(results.len(), 6);
        let (north, ghost): (Vec<_>, Vec<_>) = results.iter().partition(|r| r.anchor_ref == "north");
        assert!(ghost.iter().all(|r| r.reason_code() == Some("lane_invalid")));

        for result in north.iter().filter(|r| r.success) {
            let position = result.final_transform.position;
            // Lane runs along +Y, lateral offset is along X.
            assert!(position.x.abs() <= 30.0 + 1e-3);
            assert!((result.final_transform.rotation.yaw - 90.0).abs() <= 2.0 + 0.1);
            assert!(result.instance_id.starts_with("lane_"));
        }
    }

    #[test]
    fn lateral_offset_bounded_by_half_width() {
        let (mut config, world) = lane_scene();
        config.lanes[0].width = 20.0;
        config.lane_lateral_jitter = 500.0;
        let mut fx = Fixture::new(config, world, 31);

        let results = fx.run(|engine, world| engine.spawn_lane_vehicles(world, &sedans(1), 4).unwrap());

        for result in results.iter().filter(|r| r.success) {
            assert!(result.final_transform.position.x.abs() <= 10.0 + 1e-3);
        }
    }

    #[test]
    fn degenerate_lane_widths_report_lane_invalid() {
        for width in [-100.0, 0.0, f32::NAN, f32::INFINITY] {
            let (mut config, world) = lane_scene();
            config.lanes[0].width = width;
            let mut fx = Fixture::new(config, world, 31);

            let results = fx.run(|engine, world| engine.spawn_lane_vehicles(world, &sedans(1), 2).unwrap());
            assert_eq!(results.len(), 4);
            assert!(results.iter().all(|r| r.reason_code() == Some("lane_invalid")), "width {width}");

            let single = fx.run(|engine, world| engine.spawn_along_lane(world, "north", 0.5, &sedans(1)[0]).unwrap());
            assert_eq!(single.reason_code(), Some("lane_invalid"));
            assert_eq!(fx.rng.call_count(), 0);
            assert!(fx.registry.is_empty());
        }
    }

    #[test]
    fn non_overlap_holds_for_spawned_entities() {
        let (mut config, world) = lane_scene();
        config.collision.min_spacing = 700.0;
        let mut fx = Fixture::new(config, world, 1234);

        fx.run(|engine, world| engine.spawn_lane_vehicles(world, &sedans(3), 12).unwrap());

        let validator_config = fx.config.collision.clone();
        let validator = CollisionValidator::new(&validator_config);
        let placed = fx.registry.placed();
        assert!(!placed.is_empty());
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                let distance = a.position.truncate().distance(b.position.truncate());
                let required = validator.required_distance(a.collision_radius, b.collision_radius);
                assert!(distance >= required - 1e-2, "{distance} < {required}");
            }
        }
    }

    #[test]
    fn area_props_rest_on_ground() {
        let mut world = MockWorld::new();
        world.ground_z = Some(15.0);
        world.add_anchor("Walk_A", Vec3::new(0.0, 0.0, 0.0), 0.0);
        world.add_anchor("Walk_B", Vec3::new(3000.0, 1000.0, 40.0), 0.0);
        let config = SpawnConfig {
            sidewalk: SidewalkDefinition {
                corner_a: "Walk_A".into(),
                corner_b: "Walk_B".into(),
            },
            ..Default::default()
        };
        let mut fx = Fixture::new(config, world, 8);
        let props = vec![
            SpawnRequest::new("/Game/Props/Bench", "Bench"),
            SpawnRequest::new("/Game/Props/Bin", "Bin"),
        ];

        let results = fx.run(|engine, world| engine.spawn_in_area(world, &props, 5).unwrap());

        assert_eq!(results.len(), 5);
        for result in results.iter().filter(|r| r.success) {
            let p = result.final_transform.position;
            assert!((0.0..=3000.0).contains(&p.x) && (0.0..=1000.0).contains(&p.y));
            assert_eq!(p.z, 15.0);
            assert!(result.instance_id.starts_with("prop_"));
            let yaw = result.final_transform.rotation.yaw;
            assert!((-180.0..180.0).contains(&yaw));
        }
    }

    #[test]
    fn area_falls_back_to_mid_height_without_ground() {
        let mut world = MockWorld::new();
        world.ground_z = None;
        world.add_anchor("Walk_A", Vec3::new(0.0, 0.0, 0.0), 0.0);
        world.add_anchor("Walk_B", Vec3::new(1000.0, 1000.0, 40.0), 0.0);
        let config = SpawnConfig {
            sidewalk: SidewalkDefinition {
                corner_a: "Walk_A".into(),
                corner_b: "Walk_B".into(),
            },
            ..Default::default()
        };
        let mut fx = Fixture::new(config, world, 8);
        let props = vec![SpawnRequest::new("/Game/Props/Bench", "Bench")];

        let results = fx.run(|engine, world| engine.spawn_in_area(world, &props, 1).unwrap());
        assert_eq!(results[0].final_transform.position.z, 20.0);
    }

    #[test]
    fn area_without_sidewalk_is_an_error() {
        let (config, world) = parking_scene(1, 1000.0);
        let mut fx = Fixture::new(config, world, 8);
        let props = vec![SpawnRequest::new("/Game/Props/Bench", "Bench")];

        let err = fx.run(|engine, world| engine.spawn_in_area(world, &props, 3)).unwrap_err();
        assert_eq!(err, PlacementError::SidewalkUnresolved);
    }

    #[test]
    fn exclusion_anchor_blocks_slot() {
        let (mut config, mut world) = parking_scene(1, 1000.0);
        world.add_anchor("Hydrant", Vec3::new(50.0, 0.0, 0.0), 0.0);
        config.exclusion_anchors = vec!["Hydrant".into()];
        config.collision.max_placement_attempts = 5;
        let mut fx = Fixture::new(config, world, 8);
        let request = SpawnRequest::new("/Game/Vehicles/Sedan", "Sedan");

        let result = fx.run(|engine, world| {
            engine
                .spawn_at_slot(world, "Slot_0", &request, ParkingMode::PullIn)
                .unwrap()
        });

        assert_eq!(result.reason_code(), Some("overlap"));
        assert_eq!(result.attempts, 5);
    }
}
