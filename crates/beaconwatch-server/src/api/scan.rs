//! Scan lifecycle API endpoints.
//!
//! Start and stop the scan session and inspect its current state. The
//! grace period governs deduplication: a beacon key is announced once,
//! then suppressed until the periodic sweep ages it out.

use std::time::Duration;

use axum::extract::State;
use axum::Json;
use beaconwatch_core::scanner::ScanState;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiResult;
use crate::state::SharedState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Scan session status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "state": "scanning",
    "dedup_enabled": true,
    "grace_period_ms": 10000,
    "sightings_logged": 12
}))]
pub struct ScanStatusResponse {
    /// Current lifecycle state.
    pub state: ScanState,

    /// Whether deduplication is active in the current session.
    pub dedup_enabled: bool,

    /// Grace period of the current session in milliseconds, when
    /// deduplication is active.
    #[schema(example = 10000)]
    pub grace_period_ms: Option<u64>,

    /// Sightings currently retained in the log.
    #[schema(example = 12)]
    pub sightings_logged: usize,
}

/// Request body for starting a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "grace_period_ms": 10000 }))]
pub struct StartScanRequest {
    /// Grace period in milliseconds; `0` disables deduplication.
    /// Defaults to the configured `scanner.grace_period_ms`.
    pub grace_period_ms: Option<u64>,
}

/// Response after starting a scan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "state": "scanning",
    "dedup_enabled": true,
    "grace_period_ms": 10000
}))]
pub struct StartScanResponse {
    /// Lifecycle state after the start.
    pub state: ScanState,

    /// Whether deduplication is active for this session.
    pub dedup_enabled: bool,

    /// Effective grace period in milliseconds.
    pub grace_period_ms: u64,
}

/// Response after stopping a scan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "state": "idle" }))]
pub struct StopScanResponse {
    /// Lifecycle state after the stop.
    pub state: ScanState,
}

// ============================================================================
// Handlers
// ============================================================================

/// Report the scan session status.
#[utoipa::path(
    get,
    path = "/scan",
    tag = "scan",
    operation_id = "getScanStatus",
    summary = "Get scan session status",
    responses(
        (status = 200, description = "Current scan status", body = ScanStatusResponse)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<ScanStatusResponse> {
    let scanner = state.scanner.lock().await;
    let grace_period = scanner.grace_period();

    Json(ScanStatusResponse {
        state: scanner.state(),
        dedup_enabled: grace_period.is_some(),
        grace_period_ms: grace_period.map(|g| g.as_millis() as u64),
        sightings_logged: state.sightings.len(),
    })
}

/// Start a scan session.
///
/// Waits for the adapter to become ready, issues the scan-start command
/// and begins delivering deduplicated sightings into the sighting log.
#[utoipa::path(
    post,
    path = "/scan/start",
    tag = "scan",
    operation_id = "startScan",
    summary = "Start scanning for beacons",
    request_body(content = StartScanRequest, description = "Optional grace period override"),
    responses(
        (status = 200, description = "Scan session started", body = StartScanResponse),
        (status = 409, description = "A scan session is already active", body = crate::api::error::ErrorResponse),
        (status = 503, description = "Bluetooth adapter unavailable or not ready", body = crate::api::error::ErrorResponse)
    )
)]
pub async fn start_scan(
    State(state): State<SharedState>,
    body: Option<Json<StartScanRequest>>,
) -> ApiResult<Json<StartScanResponse>> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let grace_period_ms = request
        .grace_period_ms
        .unwrap_or(state.config.scanner.grace_period_ms);

    let mut scanner = state.scanner.lock().await;
    scanner
        .start(Duration::from_millis(grace_period_ms))
        .await?;

    Ok(Json(StartScanResponse {
        state: scanner.state(),
        dedup_enabled: grace_period_ms > 0,
        grace_period_ms,
    }))
}

/// Stop the scan session.
///
/// Idempotent: stopping while idle succeeds and changes nothing.
#[utoipa::path(
    post,
    path = "/scan/stop",
    tag = "scan",
    operation_id = "stopScan",
    summary = "Stop scanning",
    responses(
        (status = 200, description = "Scan session stopped (or was not running)", body = StopScanResponse)
    )
)]
pub async fn stop_scan(State(state): State<SharedState>) -> Json<StopScanResponse> {
    let mut scanner = state.scanner.lock().await;
    scanner.stop().await;

    Json(StopScanResponse {
        state: scanner.state(),
    })
}
