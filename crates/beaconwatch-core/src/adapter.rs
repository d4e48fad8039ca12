//! The radio adapter boundary.
//!
//! The scan engine never talks to a Bluetooth stack directly; it drives a
//! [`RadioAdapter`], which exposes exactly the capabilities the engine
//! needs: a power-state signal, scan start/stop commands, a scanning
//! flag, and a subscribable stream of raw advertisements.
//!
//! Two implementations ship with the crate:
//!
//! - `bluez::BluerAdapter` - BlueZ via the `bluer` crate (Linux,
//!   `bluetooth` feature, on by default)
//! - `mock::MockAdapter` - a scripted adapter for tests and hardware-free
//!   development (`mock-adapter` feature)

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "bluetooth")]
pub mod bluez;
#[cfg(any(test, feature = "mock-adapter", not(feature = "bluetooth")))]
pub mod mock;

/// Buffered advertisements per subscription; a full channel applies
/// backpressure to the radio pump.
pub(crate) const ADVERTISEMENT_CHANNEL_CAPACITY: usize = 64;

/// Power state of the radio adapter.
///
/// The names mirror the states the underlying stacks report; only
/// [`AdapterState::PoweredOn`] permits scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum AdapterState {
    /// The adapter is powered and ready to scan.
    PoweredOn,
    /// The adapter is present but powered off.
    PoweredOff,
    /// The process is not permitted to use the adapter.
    Unauthorized,
    /// No usable Bluetooth support on this system.
    Unsupported,
    /// The adapter is resetting.
    Resetting,
    /// The state has not been determined yet.
    Unknown,
}

impl std::fmt::Display for AdapterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PoweredOn => "poweredOn",
            Self::PoweredOff => "poweredOff",
            Self::Unauthorized => "unauthorized",
            Self::Unsupported => "unsupported",
            Self::Resetting => "resetting",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Errors reported by the radio adapter boundary.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No Bluetooth adapter was found on this system.
    #[error("no Bluetooth adapter found; ensure hardware is present and drivers are loaded")]
    NotFound,

    /// Readiness was awaited and the adapter settled in a non-ready state.
    #[error("Bluetooth adapter is not ready: entered state '{0}'")]
    NotReady(AdapterState),

    /// A readiness wait is already in flight; the gate is single-shot.
    #[error("an adapter readiness wait is already in flight")]
    ReadinessWaitInFlight,

    /// The adapter rejected the scan-start command.
    #[error("failed to start scanning: {0}")]
    ScanStart(String),

    /// A backend-specific failure outside the scan lifecycle.
    #[error("adapter backend error: {0}")]
    Backend(String),
}

/// A raw advertisement event as produced by the adapter, before decoding.
///
/// This is the generic shape of a BLE advertisement: the engine passes it
/// to the decoder boundary untouched and attaches the radio metadata to
/// whatever record the decoder yields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAdvertisement {
    /// Address of the advertising device.
    pub address: String,

    /// Broadcast local name, if present.
    pub local_name: Option<String>,

    /// Received signal strength in dBm.
    pub rssi: Option<i16>,

    /// Advertised transmit power in dBm.
    pub tx_power: Option<i16>,

    /// Manufacturer-specific data, keyed by company identifier.
    pub manufacturer_data: HashMap<u16, Vec<u8>>,

    /// Service data, keyed by service UUID.
    pub service_data: HashMap<Uuid, Vec<u8>>,
}

/// Capability interface of a scanning radio.
///
/// One scan session drives one adapter at a time; the engine serializes
/// all calls, so implementations do not need to defend against concurrent
/// scan-start commands.
#[async_trait]
pub trait RadioAdapter: Send + Sync + 'static {
    /// Current power state.
    async fn state(&self) -> AdapterState;

    /// Waits for the next power-state transition and returns the new
    /// state. Used by the readiness gate as a one-shot observer; it must
    /// not replay the current state.
    async fn next_state_change(&self) -> AdapterState;

    /// Issues the scan-start command. A single acknowledgment: `Ok` once
    /// the radio is scanning, `Err` if the command was rejected.
    async fn start_scanning(&self) -> Result<(), AdapterError>;

    /// Stops scanning. Fire-and-forget; never fails.
    async fn stop_scanning(&self);

    /// Whether the radio is currently scanning.
    async fn is_scanning(&self) -> bool;

    /// Subscribes to the raw advertisement stream.
    ///
    /// Returns the receiving end of the event channel. Only one
    /// subscription is live at a time: a new call replaces the previous
    /// sender, and dropping the receiver detaches it.
    async fn subscribe(&self) -> mpsc::Receiver<RawAdvertisement>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_state_display_matches_wire_names() {
        assert_eq!(AdapterState::PoweredOn.to_string(), "poweredOn");
        assert_eq!(AdapterState::Unauthorized.to_string(), "unauthorized");
        assert_eq!(
            serde_json::to_string(&AdapterState::PoweredOff).unwrap(),
            "\"poweredOff\""
        );
    }

    #[test]
    fn test_adapter_error_messages_name_the_state() {
        let err = AdapterError::NotReady(AdapterState::Unauthorized);
        assert!(err.to_string().contains("unauthorized"));
    }

    #[test]
    fn test_raw_advertisement_default_is_empty() {
        let adv = RawAdvertisement::default();
        assert!(adv.manufacturer_data.is_empty());
        assert!(adv.service_data.is_empty());
        assert!(adv.rssi.is_none());
    }
}
