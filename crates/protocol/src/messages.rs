//! Control message types.
//!
//! One [`Request`] maps onto one [`vantage_core::SceneSession`] operation;
//! every request yields exactly one [`Response`].

use serde::{Deserialize, Serialize};
use vantage_core::{
    BoundingBoxSet, ParkingMode, PoseSet, RandomState, ResolveSummary, SpawnRequest, SpawnResult, SweepReport,
};

/// Everything a driver can ask of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// Rebuild the anchor cache from the current scene.
    ResolveAnchors,

    /// Restart the random stream and destroy everything the session spawned.
    Reseed(ReseedMessage),

    /// Place one vehicle on a named parking slot.
    SpawnAtSlot(SpawnAtSlotMessage),

    /// Fill parking slots from a shuffled slot order.
    SpawnParking(SpawnParkingMessage),

    /// Place one vehicle at a parameter along a lane.
    SpawnAlongLane(SpawnAlongLaneMessage),

    /// Distribute vehicles evenly along every configured lane.
    SpawnLaneVehicles(SpawnLaneVehiclesMessage),

    /// Scatter props over the sidewalk area.
    SpawnInArea(SpawnInAreaMessage),

    /// Destroy everything the session spawned.
    ClearAll,

    /// Hide every unlocked entity carrying the marker tag.
    SweepAndHide(TagMessage),

    /// Count tagged entities that are still visible.
    VisibleCount(TagMessage),

    /// Remember transforms of the tagged background entities.
    CaptureOriginals(TagMessage),

    /// Restore the transforms captured by [`Request::CaptureOriginals`].
    ResetToOriginal,

    /// Hide spawned entities below the visibility threshold.
    HideLowVisibility,

    /// 2D boxes for the current frame.
    ExtractBoundingBoxes(ExtractMessage),

    /// 6-DoF poses for the current frame.
    ExtractPoses(ExtractMessage),

    /// Report the random stream position.
    QueryRandomState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReseedMessage {
    pub seed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnAtSlotMessage {
    pub anchor: String,
    pub request: SpawnRequest,
    pub mode: ParkingMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnParkingMessage {
    pub requests: Vec<SpawnRequest>,
    /// `None` spawns one vehicle per request.
    pub max_vehicles: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnAlongLaneMessage {
    pub lane_id: String,
    pub t: f32,
    pub request: SpawnRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnLaneVehiclesMessage {
    pub requests: Vec<SpawnRequest>,
    pub vehicles_per_lane: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnInAreaMessage {
    pub requests: Vec<SpawnRequest>,
    pub count: u32,
}

/// Optional tag override; `None` uses the configured marker tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMessage {
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractMessage {
    pub tags: Vec<String>,
    pub filter_visibility: bool,
}

/// Everything a session can answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Anchor resolution finished.
    Resolved(ResolveSummary),

    /// Stream restarted and owned entities destroyed.
    Reseeded(ReseedMessage),

    /// Result of a single placement.
    Spawned(SpawnResult),

    /// Results of a batch placement, in request order.
    SpawnedBatch(Vec<SpawnResult>),

    /// Number of entities destroyed, captured, restored, hidden or counted.
    Count(CountMessage),

    /// Outcome of a sweep.
    Swept(SweepReport),

    BoundingBoxes(BoundingBoxSet),

    Poses(PoseSet),

    RandomState(RandomState),

    /// The request could not be carried out.
    Error(ErrorMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMessage {
    pub count: u32,
}

/// Stable error code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl Response {
    pub fn count(count: usize) -> Self {
        Response::Count(CountMessage {
            count: u32::try_from(count).unwrap_or(u32::MAX),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}
