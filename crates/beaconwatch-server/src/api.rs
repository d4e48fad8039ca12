//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `scan` - Scan session lifecycle control
//! - `beacons` - De-duplicated beacon sightings
//! - `config` - Effective configuration view
//! - `health` - Service health checks
//! - `error` - API error types
//! - `openapi` - OpenAPI specification

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::SharedState;

pub mod beacons;
pub mod config;
pub mod error;
pub mod health;
pub mod openapi;
pub mod scan;

// Re-export commonly used types
#[allow(unused_imports)]
pub use error::{ApiError, ApiResult, ErrorResponse};

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                - Health check
/// /docs                  - Swagger UI
/// /api
/// ├── /scan              - Scan session status
/// ├── /scan/start        - Start scanning
/// ├── /scan/stop         - Stop scanning
/// ├── /beacons           - Sighting log (GET to list, DELETE to clear)
/// ├── /config            - Effective configuration
/// └── /openapi.json      - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .route("/scan", get(scan::get_status))
                .route("/scan/start", post(scan::start_scan))
                .route("/scan/stop", post(scan::stop_scan))
                .route(
                    "/beacons",
                    get(beacons::list_beacons).delete(beacons::clear_beacons),
                )
                .route("/config", get(config::get_config)),
        )
        .merge(SwaggerUi::new("/docs").url("/api/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use beaconwatch_core::adapter::RawAdvertisement;
    use beaconwatch_core::config::Config;
    use beaconwatch_core::decoder::EDDYSTONE_SERVICE_UUID;
    use beaconwatch_core::scanner::ScanState;

    use super::beacons::BeaconsResponse;
    use super::scan::ScanStatusResponse;
    use crate::state::{AppState, RadioBackend, SharedState};

    fn test_state() -> (SharedState, RadioBackend) {
        let backend = RadioBackend::new();
        let state = AppState::with_backend(backend.clone(), Config::default());
        (state, backend)
    }

    fn eddystone_uid_advertisement() -> RawAdvertisement {
        let mut frame = vec![0x00, 0xEC];
        frame.extend_from_slice(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
        frame.extend_from_slice(&[0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);

        let mut advertisement = RawAdvertisement {
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            rssi: Some(-66),
            ..RawAdvertisement::default()
        };
        advertisement
            .service_data
            .insert(EDDYSTONE_SERVICE_UUID, frame);
        advertisement
    }

    #[tokio::test]
    async fn test_health_endpoint_reports_ok() {
        let (state, _adapter) = test_state();
        let server = TestServer::new(super::create_router(state)).unwrap();

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["scan_state"], "idle");
    }

    #[tokio::test]
    async fn test_scan_lifecycle_over_http() {
        let (state, adapter) = test_state();
        let server = TestServer::new(super::create_router(state)).unwrap();

        let response = server
            .post("/api/scan/start")
            .json(&serde_json::json!({}))
            .await;
        response.assert_status_ok();

        let status: ScanStatusResponse = server.get("/api/scan").await.json();
        assert_eq!(status.state, ScanState::Scanning);
        assert!(status.dedup_enabled);
        assert_eq!(status.grace_period_ms, Some(10_000));

        // A second start conflicts.
        let response = server
            .post("/api/scan/start")
            .json(&serde_json::json!({}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "already_scanning");

        // An injected advertisement shows up in the sighting log.
        assert!(adapter.emit(eddystone_uid_advertisement()).await);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let beacons: BeaconsResponse = server.get("/api/beacons").await.json();
        assert_eq!(beacons.count, 1);
        assert_eq!(beacons.beacons[0].id, "00010203040506070809:0a0b0c0d0e0f");

        // Stop is idempotent.
        server.post("/api/scan/stop").await.assert_status_ok();
        server.post("/api/scan/stop").await.assert_status_ok();

        let status: ScanStatusResponse = server.get("/api/scan").await.json();
        assert_eq!(status.state, ScanState::Idle);
    }

    #[tokio::test]
    async fn test_zero_grace_start_disables_dedup() {
        let (state, adapter) = test_state();
        let server = TestServer::new(super::create_router(state)).unwrap();

        let response = server
            .post("/api/scan/start")
            .json(&serde_json::json!({ "grace_period_ms": 0 }))
            .await;
        response.assert_status_ok();

        for _ in 0..3 {
            assert!(adapter.emit(eddystone_uid_advertisement()).await);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let beacons: BeaconsResponse = server.get("/api/beacons").await.json();
        assert_eq!(beacons.count, 3);
    }

    #[tokio::test]
    async fn test_clear_beacons_empties_the_log() {
        let (state, adapter) = test_state();
        let server = TestServer::new(super::create_router(state)).unwrap();

        server
            .post("/api/scan/start")
            .json(&serde_json::json!({}))
            .await
            .assert_status_ok();
        assert!(adapter.emit(eddystone_uid_advertisement()).await);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let response = server.delete("/api/beacons").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["cleared"], 1);

        let beacons: BeaconsResponse = server.get("/api/beacons").await.json();
        assert_eq!(beacons.count, 0);
    }

    #[tokio::test]
    async fn test_config_endpoint_reflects_boot_config() {
        let mut config = Config::default();
        config.scanner.grace_period_ms = 20_000;
        let backend = RadioBackend::new();
        let state = AppState::with_backend(backend, config);
        let server = TestServer::new(super::create_router(state)).unwrap();

        let response = server.get("/api/config").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["grace_period_ms"], 20_000);
        assert_eq!(body["adapter_name"], serde_json::Value::Null);
    }
}
