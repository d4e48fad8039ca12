//! Beacon sighting API endpoints.

use axum::extract::State;
use axum::Json;
use beaconwatch_core::types::BeaconRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::SharedState;

/// Logged beacon sightings, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BeaconsResponse {
    /// Dispatched sightings, newest first.
    pub beacons: Vec<BeaconRecord>,

    /// Number of sightings returned.
    #[schema(example = 2)]
    pub count: usize,

    /// When this snapshot was taken.
    #[schema(example = "2026-08-06T12:00:00Z")]
    pub retrieved_at_utc: String,
}

/// Result of clearing the sighting log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "cleared": 12 }))]
pub struct ClearBeaconsResponse {
    /// Number of sightings removed from the log.
    pub cleared: usize,
}

/// List logged beacon sightings.
///
/// Returns the sightings the scan session has dispatched, newest first.
/// With deduplication active, a continuously-visible beacon reappears
/// here roughly once per grace period.
#[utoipa::path(
    get,
    path = "/beacons",
    tag = "beacons",
    operation_id = "listBeacons",
    summary = "List recent beacon sightings",
    responses(
        (status = 200, description = "Logged sightings", body = BeaconsResponse)
    )
)]
pub async fn list_beacons(State(state): State<SharedState>) -> Json<BeaconsResponse> {
    let beacons = state.sightings.snapshot();

    Json(BeaconsResponse {
        count: beacons.len(),
        beacons,
        retrieved_at_utc: Utc::now().to_rfc3339(),
    })
}

/// Clear the sighting log.
///
/// Only empties the server-side log; the scan session's dedup registry
/// is untouched, so suppressed beacons stay suppressed.
#[utoipa::path(
    delete,
    path = "/beacons",
    tag = "beacons",
    operation_id = "clearBeacons",
    summary = "Clear the sighting log",
    responses(
        (status = 200, description = "Log cleared", body = ClearBeaconsResponse)
    )
)]
pub async fn clear_beacons(State(state): State<SharedState>) -> Json<ClearBeaconsResponse> {
    Json(ClearBeaconsResponse {
        cleared: state.sightings.clear(),
    })
}
