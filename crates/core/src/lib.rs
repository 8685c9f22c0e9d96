//! Vantage Core - Deterministic Placement and Annotation
//!
//! Populates a scene with vehicles and props at reproducible, collision-free
//! positions, then extracts 2D boxes and 6-DOF poses as ground truth for
//! synthetic computer-vision datasets.
//!
//! # Determinism Rules
//!
//! 1. Every random decision draws from the session's `DeterministicRandom`
//! 2. Angles go through the software trig in `math`
//! 3. Ordered iteration - `Vec` for anything that feeds a draw or an id
//! 4. No threads, no async - one `SceneSession` owns all mutable state
//!
//! The host scene is reached only through the [`World`] trait.

pub mod anchors;
pub mod annotation;
pub mod camera;
pub mod collision;
pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod placement;
pub mod random;
pub mod registry;
pub mod session;
pub mod visibility;
pub mod world;

#[cfg(test)]
mod testing;

pub use anchors::{Anchor, AnchorKind, AnchorResolver, Lane, ResolveSummary, SidewalkBounds};
pub use annotation::{BoundingBoxAnnotation, BoundingBoxSet, PoseAnnotation, PoseSet};
pub use camera::PinholeCamera;
pub use collision::CollisionValidator;
pub use config::{AnnotationConfig, CollisionConfig, SessionConfig, SpawnConfig, VisibilityConfig};
pub use error::{ConfigError, FailureReason, PlacementError, RegistryError, WorldError};
pub use geometry::{Bounds, Rotator, Transform};
pub use placement::{ParkingMode, PlacementState, SpawnRequest, SpawnResult};
pub use random::{DeterministicRandom, RandomState};
pub use registry::{PlacedEntity, SpawnRegistry, SweepReport};
pub use session::SceneSession;
pub use visibility::{visibility_percent, VisibilityEvaluator};
pub use world::{CameraView, EntityHandle, World};
