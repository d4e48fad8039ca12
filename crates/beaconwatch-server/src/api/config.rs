//! Configuration API endpoint (read-only view of the boot configuration).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::SharedState;

/// The effective configuration the server booted with.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "adapter_name": "hci0",
    "grace_period_ms": 10000,
    "autostart": false,
    "bind": "0.0.0.0:3000"
}))]
pub struct ConfigResponse {
    /// Configured adapter name; the system default when null.
    pub adapter_name: Option<String>,

    /// Default grace period for scan sessions in milliseconds.
    #[schema(example = 10000)]
    pub grace_period_ms: u64,

    /// Whether a scan session starts at boot.
    pub autostart: bool,

    /// Socket address the server listens on.
    #[schema(example = "0.0.0.0:3000")]
    pub bind: String,
}

/// Report the effective configuration.
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    operation_id = "getConfig",
    summary = "Get the effective configuration",
    responses(
        (status = 200, description = "Current configuration", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        adapter_name: state.config.adapter.name.clone(),
        grace_period_ms: state.config.scanner.grace_period_ms,
        autostart: state.config.scanner.autostart,
        bind: state.config.server.bind.clone(),
    })
}
