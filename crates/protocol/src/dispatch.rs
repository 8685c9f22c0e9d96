//! Applies requests to a session.

use vantage_core::{BoundingBoxSet, PoseSet, SceneSession, World};

use crate::messages::*;

/// Runs one request against `session` and `world`.
///
/// Operation errors become [`Response::Error`]; per-request spawn failures
/// stay inside the returned [`vantage_core::SpawnResult`]s.
pub fn dispatch(session: &mut SceneSession, world: &mut dyn World, request: Request) -> Response {
    tracing::debug!(request = request_name(&request), "Dispatching");

    let response = match request {
        Request::ResolveAnchors => match session.resolve_anchors(world) {
            Ok(summary) => Response::Resolved(summary),
            Err(err) => error(err.code(), err),
        },
        Request::Reseed(message) => match session.reseed(world, message.seed) {
            Ok(()) => Response::Reseeded(message),
            Err(err) => error(err.code(), err),
        },
        Request::SpawnAtSlot(message) => {
            match session.spawn_at_slot(world, &message.anchor, &message.request, message.mode) {
                Ok(result) => Response::Spawned(result),
                Err(err) => error(err.code(), err),
            }
        }
        Request::SpawnParking(message) => {
            let max_vehicles = message.max_vehicles.map(|n| n as usize);
            match session.spawn_parking(world, &message.requests, max_vehicles) {
                Ok(results) => Response::SpawnedBatch(results),
                Err(err) => error(err.code(), err),
            }
        }
        Request::SpawnAlongLane(message) => {
            match session.spawn_along_lane(world, &message.lane_id, message.t, &message.request) {
                Ok(result) => Response::Spawned(result),
                Err(err) => error(err.code(), err),
            }
        }
        Request::SpawnLaneVehicles(message) => {
            match session.spawn_lane_vehicles(world, &message.requests, message.vehicles_per_lane as usize) {
                Ok(results) => Response::SpawnedBatch(results),
                Err(err) => error(err.code(), err),
            }
        }
        Request::SpawnInArea(message) => match session.spawn_in_area(world, &message.requests, message.count as usize) {
            Ok(results) => Response::SpawnedBatch(results),
            Err(err) => error(err.code(), err),
        },
        Request::ClearAll => match session.clear_all(world) {
            Ok(destroyed) => Response::count(destroyed),
            Err(err) => error(err.code(), err),
        },
        Request::SweepAndHide(message) => match session.sweep_and_hide(world, message.tag.as_deref()) {
            Ok(report) => Response::Swept(report),
            Err(err) => error(err.code(), err),
        },
        Request::VisibleCount(message) => match session.visible_count_by_sweep(world, message.tag.as_deref()) {
            Ok(visible) => Response::count(visible),
            Err(err) => error(err.code(), err),
        },
        Request::CaptureOriginals(message) => match session.capture_originals(world, message.tag.as_deref()) {
            Ok(captured) => Response::count(captured),
            Err(err) => error(err.code(), err),
        },
        Request::ResetToOriginal => match session.reset_to_original(world) {
            Ok(restored) => Response::count(restored),
            Err(err) => error(err.code(), err),
        },
        Request::HideLowVisibility => match session.hide_low_visibility(world) {
            Ok(hidden) => Response::count(hidden),
            Err(err) => error(err.code(), err),
        },
        Request::ExtractBoundingBoxes(message) => {
            match session.extract_bounding_boxes(world, &message.tags, message.filter_visibility) {
                Ok(annotations) => Response::BoundingBoxes(BoundingBoxSet { annotations }),
                Err(err) => error(err.code(), err),
            }
        }
        Request::ExtractPoses(message) => match session.extract_poses(world, &message.tags, message.filter_visibility) {
            Ok(poses) => Response::Poses(PoseSet { poses }),
            Err(err) => error(err.code(), err),
        },
        Request::QueryRandomState => Response::RandomState(session.random_state()),
    };

    if let Response::Error(ref message) = response {
        tracing::warn!(code = %message.code, message = %message.message, "Request failed");
    }
    response
}

fn error(code: &str, err: impl std::fmt::Display) -> Response {
    Response::Error(ErrorMessage::new(code, err.to_string()))
}

fn request_name(request: &Request) -> &'static str {
    match request {
        Request::ResolveAnchors => "resolve_anchors",
        Request::Reseed(_) => "reseed",
        Request::SpawnAtSlot(_) => "spawn_at_slot",
        Request::SpawnParking(_) => "spawn_parking",
        Request::SpawnAlongLane(_) => "spawn_along_lane",
        Request::SpawnLaneVehicles(_) => "spawn_lane_vehicles",
        Request::SpawnInArea(_) => "spawn_in_area",
        Request::ClearAll => "clear_all",
        Request::SweepAndHide(_) => "sweep_and_hide",
        Request::VisibleCount(_) => "visible_count",
        Request::CaptureOriginals(_) => "capture_originals",
        Request::ResetToOriginal => "reset_to_original",
        Request::HideLowVisibility => "hide_low_visibility",
        Request::ExtractBoundingBoxes(_) => "extract_bounding_boxes",
        Request::ExtractPoses(_) => "extract_poses",
        Request::QueryRandomState => "query_random_state",
    }
}
