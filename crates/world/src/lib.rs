//! Vantage World - In-Memory Reference Scene
//!
//! Implements the `vantage_core::World` contract without a game engine:
//! indexed name and tag lookups, parry3d ground geometry for downward ray
//! casts, a pinhole camera for projection, and JSON scene descriptions.
//! The CLI and the tests drive the placement engine against it.

pub mod catalog;
pub mod description;
pub mod ground;
pub mod scene;

pub use catalog::{AssetCatalog, AssetInfo};
pub use description::{EntityDescription, GroundBox, SceneDescription, SceneError};
pub use ground::{GroundGeometry, RayHit};
pub use scene::SceneWorld;
