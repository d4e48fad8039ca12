//! Beacon record types shared across the scan engine and its consumers.
//!
//! A [`BeaconRecord`] is what the scan session hands to the consumer
//! callback: the family-defined identity, the radio metadata observed at
//! reception, the `last_seen` stamp added by the session, and the decoded
//! family-specific payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The beacon protocol family an advertisement conforms to.
///
/// Serialized in the camelCase dialect used on the wire by the
/// original beacon-scanner ecosystem (`"iBeacon"`, `"eddystoneUid"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum BeaconKind {
    /// Apple iBeacon (manufacturer data, company 0x004C).
    IBeacon,
    /// Eddystone UID frame (service data 0xFEAA, frame 0x00).
    EddystoneUid,
    /// Eddystone URL frame (service data 0xFEAA, frame 0x10).
    EddystoneUrl,
    /// Eddystone telemetry frame (service data 0xFEAA, frame 0x20).
    EddystoneTlm,
    /// Eddystone ephemeral-ID frame (service data 0xFEAA, frame 0x30).
    EddystoneEid,
    /// Estimote telemetry (service data 0xFE9A).
    EstimoteTelemetry,
    /// Estimote nearable sticker (manufacturer data, company 0x015D).
    EstimoteNearable,
}

impl std::fmt::Display for BeaconKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::IBeacon => "iBeacon",
            Self::EddystoneUid => "eddystoneUid",
            Self::EddystoneUrl => "eddystoneUrl",
            Self::EddystoneTlm => "eddystoneTlm",
            Self::EddystoneEid => "eddystoneEid",
            Self::EstimoteTelemetry => "estimoteTelemetry",
            Self::EstimoteNearable => "estimoteNearable",
        };
        f.write_str(name)
    }
}

/// An iBeacon advertisement frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IBeaconFrame {
    /// Proximity UUID identifying the beacon deployment.
    pub uuid: Uuid,

    /// Major group identifier.
    pub major: u16,

    /// Minor identifier within the group.
    pub minor: u16,

    /// Calibrated signal strength at 1 m, in dBm.
    pub tx_power: i8,
}

/// An Eddystone UID frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EddystoneUidFrame {
    /// 10-byte namespace, lowercase hex.
    pub namespace: String,

    /// 6-byte instance, lowercase hex.
    pub instance: String,

    /// Calibrated signal strength at 0 m, in dBm.
    pub tx_power: i8,
}

/// An Eddystone URL frame, with the compressed URL fully expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EddystoneUrlFrame {
    /// The advertised URL.
    pub url: String,

    /// Calibrated signal strength at 0 m, in dBm.
    pub tx_power: i8,
}

/// An Eddystone TLM (telemetry) frame, unencrypted version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EddystoneTlmFrame {
    /// Battery voltage in millivolts.
    pub battery_millivolts: u16,

    /// Beacon temperature in degrees Celsius (8.8 fixed point on the wire).
    pub temperature_celsius: f32,

    /// Advertisement frames emitted since power-on.
    pub advertisement_count: u32,

    /// Seconds since power-on (deciseconds on the wire).
    pub uptime_seconds: f64,
}

/// An Eddystone EID frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EddystoneEidFrame {
    /// 8-byte ephemeral identifier, lowercase hex.
    pub ephemeral_id: String,

    /// Calibrated signal strength at 0 m, in dBm.
    pub tx_power: i8,
}

/// Acceleration vector reported by an Estimote telemetry motion sub-frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Acceleration {
    /// X axis, in g.
    pub x: f32,
    /// Y axis, in g.
    pub y: f32,
    /// Z axis, in g.
    pub z: f32,
}

/// The alternating sub-frame of an Estimote telemetry packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EstimoteSubFrame {
    /// Sub-frame A: accelerometer and motion state.
    #[serde(rename_all = "camelCase")]
    Motion {
        /// Current acceleration vector.
        acceleration: Acceleration,
        /// Whether the beacon considers itself in motion.
        moving: bool,
    },
    /// Sub-frame B: environment and housekeeping readings.
    #[serde(rename_all = "camelCase")]
    Environment {
        /// Ambient light level in lux, when the sensor reported one.
        ambient_light_lux: Option<f32>,
        /// Seconds since power-on.
        uptime_seconds: Option<u64>,
        /// Enclosure temperature in degrees Celsius.
        temperature_celsius: Option<f32>,
        /// Battery voltage in millivolts, when known.
        battery_millivolts: Option<u16>,
        /// Battery level in percent (protocol v1+), when known.
        battery_percent: Option<u8>,
    },
}

/// An Estimote telemetry frame.
///
/// The `telemetry_id` is the identity of the telemetry stream (the first
/// eight bytes of the full beacon identifier) and is used as the dedup key
/// for this family, since both sub-frames belong to the same beacon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EstimoteTelemetryFrame {
    /// 8-byte truncated beacon identifier, lowercase hex.
    pub telemetry_id: String,

    /// Telemetry protocol version (0, 1 or 2).
    pub protocol_version: u8,

    /// The decoded sub-frame.
    pub sub_frame: EstimoteSubFrame,
}

/// An Estimote nearable sticker frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EstimoteNearableFrame {
    /// 8-byte nearable identifier, lowercase hex.
    pub nearable_id: String,

    /// Sticker temperature in degrees Celsius.
    pub temperature_celsius: f32,

    /// Whether the sticker reports being in motion.
    pub moving: bool,
}

/// Family-specific payload of a decoded advertisement.
///
/// Opaque to the scan engine; it is carried through to the consumer
/// unexamined, except for the telemetry identity used in [`BeaconRecord::dedup_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum BeaconPayload {
    /// iBeacon fields.
    IBeacon(IBeaconFrame),
    /// Eddystone UID fields.
    EddystoneUid(EddystoneUidFrame),
    /// Eddystone URL fields.
    EddystoneUrl(EddystoneUrlFrame),
    /// Eddystone TLM fields.
    EddystoneTlm(EddystoneTlmFrame),
    /// Eddystone EID fields.
    EddystoneEid(EddystoneEidFrame),
    /// Estimote telemetry fields.
    EstimoteTelemetry(EstimoteTelemetryFrame),
    /// Estimote nearable fields.
    EstimoteNearable(EstimoteNearableFrame),
}

/// The output of the advertisement decoder: identity and payload, without
/// radio metadata or timestamps.
///
/// The scan session turns this into a full [`BeaconRecord`] by attaching
/// the advertisement's radio metadata and stamping `last_seen` - the
/// decoder never supplies the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBeacon {
    /// Family-defined identity (e.g. `uuid:major:minor` for iBeacon).
    pub id: String,

    /// The beacon family.
    pub kind: BeaconKind,

    /// Family-specific fields.
    pub payload: BeaconPayload,
}

/// A decoded, timestamped beacon sighting as delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BeaconRecord {
    /// Family-defined identity.
    #[schema(example = "b9407f30-f5f8-466e-aff9-25556b57fe6d:100:7")]
    pub id: String,

    /// The beacon family.
    pub kind: BeaconKind,

    /// Address of the advertising device.
    #[schema(example = "AA:BB:CC:DD:EE:FF")]
    pub address: String,

    /// Local name broadcast by the device, if any.
    pub local_name: Option<String>,

    /// Received signal strength in dBm, if reported by the adapter.
    #[schema(example = -67)]
    pub rssi: Option<i16>,

    /// Wall-clock time the advertisement was received, stamped by the
    /// scan session at reception.
    pub last_seen: DateTime<Utc>,

    /// Family-specific payload.
    pub payload: BeaconPayload,
}

impl BeaconRecord {
    /// The key under which this record is deduplicated.
    ///
    /// Estimote telemetry beacons alternate between two sub-frames of one
    /// telemetry stream, so their stream identity replaces `id`; every
    /// other family deduplicates on `id` itself.
    #[must_use]
    pub fn dedup_key(&self) -> &str {
        match &self.payload {
            BeaconPayload::EstimoteTelemetry(frame) => &frame.telemetry_id,
            _ => &self.id,
        }
    }
}
