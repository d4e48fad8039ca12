//! Advertisement decoding boundary.
//!
//! The scan session treats decoding as a pure function from a raw
//! advertisement to an optional [`DecodedBeacon`]: unrecognized or
//! malformed payloads map to `None` and are dropped silently - that is
//! normal steady-state traffic, not an error.
//!
//! [`StandardDecoder`] recognizes the well-known beacon families:
//! iBeacon, Eddystone (UID/URL/TLM/EID), Estimote telemetry and Estimote
//! nearables. Custom dialects can be supported by supplying another
//! [`AdvertisementDecoder`] to the scanner.

use uuid::Uuid;

use crate::adapter::RawAdvertisement;
use crate::types::DecodedBeacon;

mod eddystone;
mod estimote;
mod ibeacon;

/// Apple's Bluetooth SIG company identifier (iBeacon manufacturer data).
pub const APPLE_COMPANY_ID: u16 = 0x004C;

/// Estimote's Bluetooth SIG company identifier (nearable manufacturer data).
pub const ESTIMOTE_COMPANY_ID: u16 = 0x015D;

/// Eddystone service UUID (16-bit 0xFEAA on the Bluetooth base UUID).
pub const EDDYSTONE_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_FEAA_0000_1000_8000_0080_5F9B_34FB);

/// Estimote telemetry service UUID (16-bit 0xFE9A).
pub const ESTIMOTE_TELEMETRY_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_FE9A_0000_1000_8000_0080_5F9B_34FB);

/// Maps a raw advertisement to a beacon identity and payload.
///
/// Implementations must be pure with respect to the engine: no side
/// effects it can observe, and no panics on malformed input - return
/// `None` instead.
pub trait AdvertisementDecoder: Send + Sync + 'static {
    /// Decodes one advertisement, or `None` when it is not a recognized
    /// beacon.
    fn decode(&self, advertisement: &RawAdvertisement) -> Option<DecodedBeacon>;
}

/// Decoder for the well-known beacon families.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecoder;

impl StandardDecoder {
    /// Creates the decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AdvertisementDecoder for StandardDecoder {
    fn decode(&self, advertisement: &RawAdvertisement) -> Option<DecodedBeacon> {
        if let Some(data) = advertisement.manufacturer_data.get(&APPLE_COMPANY_ID) {
            if let Some(beacon) = ibeacon::parse(data) {
                return Some(beacon);
            }
        }
        if let Some(data) = advertisement.manufacturer_data.get(&ESTIMOTE_COMPANY_ID) {
            if let Some(beacon) = estimote::parse_nearable(data) {
                return Some(beacon);
            }
        }
        if let Some(data) = advertisement.service_data.get(&EDDYSTONE_SERVICE_UUID) {
            if let Some(beacon) = eddystone::parse(&advertisement.address, data) {
                return Some(beacon);
            }
        }
        if let Some(data) = advertisement.service_data.get(&ESTIMOTE_TELEMETRY_SERVICE_UUID) {
            if let Some(beacon) = estimote::parse_telemetry(&advertisement.address, data) {
                return Some(beacon);
            }
        }
        None
    }
}

/// Lowercase hex rendering used for beacon identifiers.
pub(crate) fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}
