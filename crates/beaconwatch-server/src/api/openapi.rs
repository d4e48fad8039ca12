//! OpenAPI specification for the beaconwatch API.

use utoipa::OpenApi;

use beaconwatch_core::adapter::AdapterState;
use beaconwatch_core::scanner::ScanState;
use beaconwatch_core::types::{
    Acceleration, BeaconKind, BeaconPayload, BeaconRecord, EddystoneEidFrame, EddystoneTlmFrame,
    EddystoneUidFrame, EddystoneUrlFrame, EstimoteNearableFrame, EstimoteSubFrame,
    EstimoteTelemetryFrame, IBeaconFrame,
};

use super::beacons::{BeaconsResponse, ClearBeaconsResponse};
use super::config::ConfigResponse;
use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::scan::{ScanStatusResponse, StartScanRequest, StartScanResponse, StopScanResponse};

/// Main OpenAPI document structure for beaconwatch.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "beaconwatch API",
        version = "0.1.0",
        description = r#"
# beaconwatch API

beaconwatch discovers BLE beacons (iBeacon, Eddystone, Estimote) and
delivers de-duplicated sightings.

## Overview

1. **Scan control**: start and stop the scan session; the grace period
   controls how often a continuously-visible beacon is re-announced.
2. **Sightings**: every dispatched sighting lands in a bounded log,
   newest first.
3. **Configuration**: inspect the configuration the server booted with.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local beaconwatch server")
    ),
    tags(
        (
            name = "system",
            description = "Health checks and system status"
        ),
        (
            name = "scan",
            description = "Scan session lifecycle control"
        ),
        (
            name = "beacons",
            description = "De-duplicated beacon sightings"
        ),
        (
            name = "config",
            description = "Effective server configuration"
        )
    ),
    paths(
        super::health::health_check,
        super::scan::get_status,
        super::scan::start_scan,
        super::scan::stop_scan,
        super::beacons::list_beacons,
        super::beacons::clear_beacons,
        super::config::get_config,
    ),
    components(
        schemas(
            // Error types
            ErrorResponse,
            // Health types
            HealthResponse,
            // Scan types
            ScanState,
            ScanStatusResponse,
            StartScanRequest,
            StartScanResponse,
            StopScanResponse,
            // Beacon types
            AdapterState,
            BeaconKind,
            BeaconPayload,
            BeaconRecord,
            IBeaconFrame,
            EddystoneUidFrame,
            EddystoneUrlFrame,
            EddystoneTlmFrame,
            EddystoneEidFrame,
            EstimoteTelemetryFrame,
            EstimoteSubFrame,
            EstimoteNearableFrame,
            Acceleration,
            BeaconsResponse,
            ClearBeaconsResponse,
            // Config types
            ConfigResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "beaconwatch API");
        assert!(!spec.paths.paths.is_empty());
    }

    #[test]
    fn test_openapi_spec_includes_scan_paths() {
        let json = ApiDoc::openapi().to_pretty_json().unwrap();
        assert!(json.contains("/scan/start"));
        assert!(json.contains("/beacons"));
    }
}
