//! Ownership of spawned entities and authoritative cleanup.
//!
//! The registry remembers what it spawned, but the world can hold tagged
//! entities the registry never saw (pre-placed, spawned externally, leaked
//! from an earlier session). [`SpawnRegistry::sweep_and_hide`] reconciles
//! both: it clears its own entities, then scans the world by tag and forces
//! every match out of frame.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, WorldError};
use crate::geometry::Transform;
use crate::world::{EntityHandle, World};

/// Height swept entities are parked at, far below any ground geometry.
pub const GRAVEYARD_Z: f32 = -100_000.0;

/// An entity created and owned by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub instance_id: String,
    pub handle: EntityHandle,
    pub class_tag: String,
    pub position: Vec3,
    /// The radius the entity was accepted with.
    pub collision_radius: f32,
}

/// What a sweep touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub destroyed: usize,
    pub hidden: usize,
    pub skipped_locked: usize,
}

#[derive(Debug, Clone)]
struct OriginalSnapshot {
    tag: String,
    transforms: Vec<(EntityHandle, Transform)>,
}

#[derive(Debug, Clone, Default)]
pub struct SpawnRegistry {
    placed: Vec<PlacedEntity>,
    instance_counter: u32,
    locked: HashSet<String>,
    originals: Option<OriginalSnapshot>,
}

impl SpawnRegistry {
    /// Creates a registry that never touches the given entity names.
    pub fn new<I, S>(locked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locked: locked.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Allocates the next instance id, e.g. `parking_0003`.
    pub fn next_instance_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}_{:04}", self.instance_counter);
        self.instance_counter += 1;
        id
    }

    pub fn record(&mut self, entity: PlacedEntity) {
        tracing::debug!(
            instance_id = %entity.instance_id,
            class = %entity.class_tag,
            position = ?entity.position,
            radius = entity.collision_radius,
            "Entity registered"
        );
        self.placed.push(entity);
    }

    pub fn placed(&self) -> &[PlacedEntity] {
        &self.placed
    }

    pub fn find(&self, instance_id: &str) -> Option<&PlacedEntity> {
        self.placed.iter().find(|e| e.instance_id == instance_id)
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.locked.contains(name)
    }

    /// Destroys every entity this registry created and resets the
    /// instance counter. Returns the number destroyed.
    ///
    /// If the world refuses a destroy, the refused entity and everything
    /// after it stay registered and the counter is left alone.
    pub fn clear_all(&mut self, world: &mut dyn World) -> Result<usize, RegistryError> {
        world.ensure_available()?;

        let mut destroyed = 0;
        let mut processed = 0;
        let mut failure = None;
        for entity in &self.placed {
            match world.destroy(entity.handle) {
                Ok(()) => destroyed += 1,
                // Already gone: the world outlived our bookkeeping.
                Err(WorldError::MissingEntity(_)) => {
                    tracing::warn!(instance_id = %entity.instance_id, "Registered entity already destroyed");
                }
                Err(err) => {
                    failure = Some((entity.instance_id.clone(), err));
                    break;
                }
            }
            processed += 1;
        }
        self.placed.drain(..processed);

        if let Some((instance_id, err)) = failure {
            tracing::error!(
                instance_id = %instance_id,
                destroyed,
                remaining = self.placed.len(),
                error = %err,
                "Registry clear interrupted"
            );
            return Err(err.into());
        }

        self.instance_counter = 0;
        tracing::info!(destroyed, "Registry cleared");
        Ok(destroyed)
    }

    /// Two-phase cleanup: clear the registry, then hide, disable and
    /// relocate every unlocked world entity carrying `marker_tag`.
    ///
    /// Fails with [`RegistryError::SweepLeak`] if any tagged entity is still
    /// visible afterwards.
    pub fn sweep_and_hide(&mut self, world: &mut dyn World, marker_tag: &str) -> Result<SweepReport, RegistryError> {
        world.ensure_available()?;

        let mut report = SweepReport {
            destroyed: self.clear_all(world)?,
            ..Default::default()
        };

        for handle in world.entities_with_tag(marker_tag) {
            if self.is_locked(&world.name_of(handle)?) {
                report.skipped_locked += 1;
                continue;
            }
            world.set_hidden(handle, true)?;
            world.set_collision_enabled(handle, false)?;
            let mut transform = world.transform(handle)?;
            transform.position.z = GRAVEYARD_Z;
            world.set_transform(handle, transform)?;
            report.hidden += 1;
        }

        let still_visible = self.visible_count_by_sweep(world, marker_tag)?;
        if still_visible > 0 {
            tracing::error!(still_visible, tag = %marker_tag, "Sweep left tagged entities visible");
            return Err(RegistryError::SweepLeak { still_visible });
        }

        tracing::info!(
            destroyed = report.destroyed,
            hidden = report.hidden,
            skipped_locked = report.skipped_locked,
            "Sweep complete"
        );
        Ok(report)
    }

    /// Counts unlocked entities carrying `marker_tag` that are not hidden.
    pub fn visible_count_by_sweep(&self, world: &dyn World, marker_tag: &str) -> Result<usize, RegistryError> {
        world.ensure_available()?;

        let mut visible = 0;
        for handle in world.entities_with_tag(marker_tag) {
            if self.is_locked(&world.name_of(handle)?) {
                continue;
            }
            if !world.is_hidden(handle)? {
                visible += 1;
            }
        }
        Ok(visible)
    }

    /// Snapshots the transforms of every unlocked entity carrying `tag`.
    pub fn capture_originals(&mut self, world: &dyn World, tag: &str) -> Result<usize, RegistryError> {
        world.ensure_available()?;

        let mut transforms = Vec::new();
        for handle in self.unlocked_with_tag(world, tag)? {
            transforms.push((handle, world.transform(handle)?));
        }

        let count = transforms.len();
        tracing::info!(count, tag = %tag, "Original transforms captured");
        self.originals = Some(OriginalSnapshot {
            tag: tag.to_string(),
            transforms,
        });
        Ok(count)
    }

    /// Restores the captured transforms and makes the entities visible again.
    ///
    /// Aborts without applying anything if the tagged population changed
    /// since the snapshot.
    pub fn reset_to_original(&mut self, world: &mut dyn World) -> Result<usize, RegistryError> {
        world.ensure_available()?;
        let snapshot = self.originals.as_ref().ok_or(RegistryError::NoSnapshot)?;

        let current = self.unlocked_with_tag(world, &snapshot.tag)?;
        let all_present = snapshot.transforms.iter().all(|(handle, _)| current.contains(handle));
        if current.len() != snapshot.transforms.len() || !all_present {
            tracing::warn!(
                expected = snapshot.transforms.len(),
                found = current.len(),
                "Tagged population changed since capture, reset aborted"
            );
            return Err(RegistryError::OriginalCountMismatch {
                expected: snapshot.transforms.len(),
                found: current.len(),
            });
        }

        for (handle, transform) in &snapshot.transforms {
            world.set_transform(*handle, *transform)?;
            world.set_hidden(*handle, false)?;
            world.set_collision_enabled(*handle, true)?;
        }

        tracing::info!(restored = snapshot.transforms.len(), "Reset to original transforms");
        Ok(snapshot.transforms.len())
    }

    fn unlocked_with_tag(&self, world: &dyn World, tag: &str) -> Result<Vec<EntityHandle>, WorldError> {
        let mut handles = Vec::new();
        for handle in world.entities_with_tag(tag) {
            if !self.is_locked(&world.name_of(handle)?) {
                handles.push(handle);
            }
        }
        Ok(handles)
    }
}
