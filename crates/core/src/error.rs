//! Error types and spawn failure reasons.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::EntityHandle;

/// Errors reported by a world collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("no active scene")]
    Unavailable,

    #[error("entity {0:?} does not exist")]
    MissingEntity(EntityHandle),

    #[error("failed to load asset '{asset}': {reason}")]
    AssetLoad { asset: String, reason: String },

    #[error("entity name '{0}' is already in use")]
    NameInUse(String),
}

impl WorldError {
    pub fn code(&self) -> &'static str {
        match self {
            WorldError::Unavailable => "world_unavailable",
            WorldError::MissingEntity(_) => "missing_entity",
            WorldError::AssetLoad { .. } => "asset_load",
            WorldError::NameInUse(_) => "name_in_use",
        }
    }
}

/// Errors that abort a whole placement call.
///
/// Per-request problems never show up here; they are reported through
/// [`FailureReason`] on the individual [`crate::SpawnResult`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error(transparent)]
    World(#[from] WorldError),

    #[error("no spawn requests provided")]
    EmptyRequests,

    #[error("sidewalk bounds are not resolved")]
    SidewalkUnresolved,
}

impl PlacementError {
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::World(err) => err.code(),
            PlacementError::EmptyRequests => "empty_requests",
            PlacementError::SidewalkUnresolved => "sidewalk_unresolved",
        }
    }
}

/// Errors from registry cleanup and reset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    World(#[from] WorldError),

    #[error("sweep left {still_visible} tagged entities visible")]
    SweepLeak { still_visible: usize },

    #[error("tagged entity count changed from {expected} to {found}; reset aborted")]
    OriginalCountMismatch { expected: usize, found: usize },

    #[error("no original transforms captured")]
    NoSnapshot,
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::World(err) => err.code(),
            RegistryError::SweepLeak { .. } => "sweep_leak",
            RegistryError::OriginalCountMismatch { .. } => "original_count_mismatch",
            RegistryError::NoSnapshot => "no_snapshot",
        }
    }
}

/// Errors loading configuration records.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Reason a single spawn request failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Anchor missing from the cache or not resolved.
    AnchorNotFound(String),
    /// Lane missing or one of its endpoints failed to resolve.
    LaneInvalid(String),
    /// Anchor refers to a locked background entity.
    Locked(String),
    /// No collision-free candidate within the attempt budget.
    Overlap,
    /// The world refused to create the entity (asset load failure included).
    SpawnFailed(String),
}

impl FailureReason {
    /// Stable reason code for logs and protocol payloads.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::AnchorNotFound(_) => "anchor_not_found",
            FailureReason::LaneInvalid(_) => "lane_invalid",
            FailureReason::Locked(_) => "locked",
            FailureReason::Overlap => "overlap",
            FailureReason::SpawnFailed(_) => "spawn_failed",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::AnchorNotFound(name) => write!(f, "anchor '{name}' not found or invalid"),
            FailureReason::LaneInvalid(id) => write!(f, "lane '{id}' not found or invalid"),
            FailureReason::Locked(name) => write!(f, "'{name}' is a locked background entity"),
            FailureReason::Overlap => write!(f, "overlap"),
            FailureReason::SpawnFailed(reason) => write!(f, "actor spawn failed: {reason}"),
        }
    }
}
