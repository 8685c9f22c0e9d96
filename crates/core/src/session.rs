//! Scene session: the single owner of placement state.
//!
//! Holds the config, the random stream, the anchor cache and the spawn
//! registry for one scene. Every operation takes `&mut self`, so callers are
//! serialized by construction.

use crate::anchors::{AnchorResolver, ResolveSummary};
use crate::annotation::{self, BoundingBoxAnnotation, PoseAnnotation};
use crate::config::SessionConfig;
use crate::error::{ConfigError, PlacementError, RegistryError, WorldError};
use crate::placement::{ParkingMode, PlacementEngine, SpawnRequest, SpawnResult};
use crate::random::{DeterministicRandom, RandomState};
use crate::registry::{SpawnRegistry, SweepReport};
use crate::visibility::VisibilityEvaluator;
use crate::world::World;

/// Owns all mutable placement state for one scene.
pub struct SceneSession {
    config: SessionConfig,
    rng: DeterministicRandom,
    anchors: AnchorResolver,
    registry: SpawnRegistry,
}

impl SceneSession {
    /// Fails if `config` does not validate.
    pub fn new(config: SessionConfig, seed: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = SpawnRegistry::new(config.spawn.locked_entities.iter().cloned());
        Ok(Self {
            config,
            rng: DeterministicRandom::new(seed),
            anchors: AnchorResolver::new(),
            registry,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn anchors(&self) -> &AnchorResolver {
        &self.anchors
    }

    pub fn registry(&self) -> &SpawnRegistry {
        &self.registry
    }

    pub fn random_state(&self) -> RandomState {
        self.rng.state()
    }

    fn engine(&mut self) -> PlacementEngine<'_> {
        PlacementEngine::new(&self.config.spawn, &self.anchors, &mut self.rng, &mut self.registry)
    }

    // ========================================================================
    // Setup
    // ========================================================================

    pub fn resolve_anchors(&mut self, world: &dyn World) -> Result<ResolveSummary, WorldError> {
        self.anchors.resolve(world, &self.config.spawn)
    }

    /// Full reset barrier: destroys owned entities and restarts the stream.
    ///
    /// If the clear fails the stream is left untouched and the error is
    /// returned.
    pub fn reseed(&mut self, world: &mut dyn World, seed: u32) -> Result<(), RegistryError> {
        self.registry.clear_all(world)?;
        self.rng.initialize(seed);
        tracing::info!(seed, "Session reseeded");
        Ok(())
    }

    // ========================================================================
    // Placement
    // ========================================================================

    pub fn spawn_at_slot(
        &mut self,
        world: &mut dyn World,
        anchor_name: &str,
        request: &SpawnRequest,
        mode: ParkingMode,
    ) -> Result<SpawnResult, PlacementError> {
        self.engine().spawn_at_slot(world, anchor_name, request, mode)
    }

    pub fn spawn_parking(
        &mut self,
        world: &mut dyn World,
        requests: &[SpawnRequest],
        max_vehicles: Option<usize>,
    ) -> Result<Vec<SpawnResult>, PlacementError> {
        self.engine().spawn_parking(world, requests, max_vehicles)
    }

    pub fn spawn_along_lane(
        &mut self,
        world: &mut dyn World,
        lane_id: &str,
        t: f32,
        request: &SpawnRequest,
    ) -> Result<SpawnResult, PlacementError> {
        self.engine().spawn_along_lane(world, lane_id, t, request)
    }

    pub fn spawn_lane_vehicles(
        &mut self,
        world: &mut dyn World,
        requests: &[SpawnRequest],
        vehicles_per_lane: usize,
    ) -> Result<Vec<SpawnResult>, PlacementError> {
        self.engine().spawn_lane_vehicles(world, requests, vehicles_per_lane)
    }

    pub fn spawn_in_area(
        &mut self,
        world: &mut dyn World,
        requests: &[SpawnRequest],
        count: usize,
    ) -> Result<Vec<SpawnResult>, PlacementError> {
        self.engine().spawn_in_area(world, requests, count)
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    pub fn clear_all(&mut self, world: &mut dyn World) -> Result<usize, RegistryError> {
        self.registry.clear_all(world)
    }

    /// Sweeps `marker_tag`, or the configured marker tag when `None`.
    pub fn sweep_and_hide(&mut self, world: &mut dyn World, marker_tag: Option<&str>) -> Result<SweepReport, RegistryError> {
        let tag = marker_tag.unwrap_or(&self.config.spawn.marker_tag).to_string();
        self.registry.sweep_and_hide(world, &tag)
    }

    pub fn visible_count_by_sweep(&self, world: &dyn World, marker_tag: Option<&str>) -> Result<usize, RegistryError> {
        let tag = marker_tag.unwrap_or(&self.config.spawn.marker_tag);
        self.registry.visible_count_by_sweep(world, tag)
    }

    pub fn capture_originals(&mut self, world: &dyn World, tag: Option<&str>) -> Result<usize, RegistryError> {
        let tag = tag.unwrap_or(&self.config.spawn.marker_tag).to_string();
        self.registry.capture_originals(world, &tag)
    }

    pub fn reset_to_original(&mut self, world: &mut dyn World) -> Result<usize, RegistryError> {
        self.registry.reset_to_original(world)
    }

    /// Hides owned entities scoring below the visibility threshold.
    /// Returns how many were hidden.
    pub fn hide_low_visibility(&mut self, world: &mut dyn World) -> Result<usize, WorldError> {
        world.ensure_available()?;
        let camera = world.active_camera()?;
        let evaluator = VisibilityEvaluator::new(&self.config.visibility);

        let mut hidden = 0;
        for entity in self.registry.placed() {
            let bounds = world.bounds(entity.handle)?;
            let score = evaluator.evaluate(&bounds, &camera);
            if score < self.config.visibility.min_visibility_percent {
                world.set_hidden(entity.handle, true)?;
                tracing::debug!(instance_id = %entity.instance_id, score, "Hidden for low visibility");
                hidden += 1;
            }
        }
        tracing::info!(hidden, "Low-visibility entities hidden");
        Ok(hidden)
    }

    // ========================================================================
    // Annotation
    // ========================================================================

    /// Boxes for entities carrying any of `tags`. With `filter_visibility`
    /// entities below the visibility threshold are left out.
    pub fn extract_bounding_boxes(
        &self,
        world: &dyn World,
        tags: &[String],
        filter_visibility: bool,
    ) -> Result<Vec<BoundingBoxAnnotation>, WorldError> {
        let visibility = filter_visibility.then_some(&self.config.visibility);
        annotation::extract_bounding_boxes(world, tags, &self.config.annotation, visibility)
    }

    pub fn extract_poses(
        &self,
        world: &dyn World,
        tags: &[String],
        filter_visibility: bool,
    ) -> Result<Vec<PoseAnnotation>, WorldError> {
        let visibility = filter_visibility.then_some(&self.config.visibility);
        annotation::extract_poses(world, tags, visibility)
    }
}
