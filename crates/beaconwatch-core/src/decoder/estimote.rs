//! Estimote frames: telemetry service data (0xFE9A) and nearable
//! manufacturer data (company 0x015D).
//!
//! A telemetry beacon alternates between two sub-frames (A: motion,
//! B: environment) that share one 8-byte stream identifier; that
//! identifier is the dedup identity of the beacon, while the record id
//! stays the device address.

use crate::decoder::hex;
use crate::types::{
    Acceleration, BeaconKind, BeaconPayload, DecodedBeacon, EstimoteNearableFrame,
    EstimoteSubFrame, EstimoteTelemetryFrame,
};

/// Lower nibble of byte 0 for telemetry frames.
const TELEMETRY_FRAME_TYPE: u8 = 0x02;

/// First payload byte of a nearable manufacturer frame.
const NEARABLE_FRAME_TYPE: u8 = 0x01;

pub(super) fn parse_telemetry(address: &str, data: &[u8]) -> Option<DecodedBeacon> {
    if data.len() < 16 {
        return None;
    }
    if data[0] & 0x0F != TELEMETRY_FRAME_TYPE {
        return None;
    }
    let protocol_version = (data[0] & 0xF0) >> 4;
    if protocol_version > 2 {
        return None;
    }

    let telemetry_id = hex(&data[1..9]);
    let sub_frame = match data[9] & 0b11 {
        0 => parse_motion(data),
        1 => parse_environment(data, protocol_version)?,
        _ => return None,
    };

    Some(DecodedBeacon {
        id: address.to_string(),
        kind: BeaconKind::EstimoteTelemetry,
        payload: BeaconPayload::EstimoteTelemetry(EstimoteTelemetryFrame {
            telemetry_id,
            protocol_version,
            sub_frame,
        }),
    })
}

/// Sub-frame A: bytes 10-12 are the acceleration vector (2 g range over a
/// signed byte), byte 15's low bits carry the motion state.
fn parse_motion(data: &[u8]) -> EstimoteSubFrame {
    let axis = |byte: u8| f32::from(byte as i8) * 2.0 / 127.0;
    EstimoteSubFrame::Motion {
        acceleration: Acceleration {
            x: axis(data[10]),
            y: axis(data[11]),
            z: axis(data[12]),
        },
        moving: data[15] & 0b11 == 1,
    }
}

/// Sub-frame B: byte 13 ambient light (4-bit exponent, 4-bit mantissa),
/// bytes 14-15 uptime (12-bit count plus 2-bit unit), a 12-bit signed
/// 1/16-degree temperature spread over bytes 15-17, and a 14-bit battery
/// voltage over bytes 17-18. Protocol v1+ appends a battery percentage.
fn parse_environment(data: &[u8], protocol_version: u8) -> Option<EstimoteSubFrame> {
    if data.len() < 19 {
        return None;
    }

    let ambient_light_lux = if data[13] == 0xFF {
        None
    } else {
        let exponent = i32::from((data[13] & 0xF0) >> 4);
        let mantissa = f32::from(data[13] & 0x0F);
        Some(mantissa * 2f32.powi(exponent) * 0.72)
    };

    let uptime_count = (u64::from(data[15] & 0x0F) << 8) | u64::from(data[14]);
    let uptime_unit_seconds: u64 = match (data[15] & 0b0011_0000) >> 4 {
        0 => 1,
        1 => 60,
        2 => 3_600,
        _ => 86_400,
    };
    let uptime_seconds = Some(uptime_count * uptime_unit_seconds);

    let raw_temperature = (i32::from(data[17] & 0b11) << 10)
        | (i32::from(data[16]) << 2)
        | (i32::from(data[15] & 0b1100_0000) >> 6);
    let raw_temperature = if raw_temperature > 2047 {
        raw_temperature - 4096
    } else {
        raw_temperature
    };
    let temperature_celsius = Some(raw_temperature as f32 / 16.0);

    let raw_voltage = (u16::from(data[18]) << 6) | (u16::from(data[17] & 0b1111_1100) >> 2);
    let battery_millivolts = (raw_voltage != 0b0011_1111_1111_1111).then_some(raw_voltage);

    let battery_percent = if protocol_version >= 1 && data.len() >= 20 && data[19] != 0xFF {
        Some(data[19])
    } else {
        None
    };

    Some(EstimoteSubFrame::Environment {
        ambient_light_lux,
        uptime_seconds,
        temperature_celsius,
        battery_millivolts,
        battery_percent,
    })
}

/// Nearable sticker frame: 8-byte identifier, a 12-bit signed 1/16-degree
/// temperature in bytes 9-10 (little endian), motion flag in byte 13.
pub(super) fn parse_nearable(data: &[u8]) -> Option<DecodedBeacon> {
    if data.len() < 14 || data[0] != NEARABLE_FRAME_TYPE {
        return None;
    }

    let nearable_id = hex(&data[1..9]);
    let raw_temperature = i32::from(u16::from_le_bytes([data[9], data[10]]) & 0x0FFF);
    let raw_temperature = if raw_temperature > 2047 {
        raw_temperature - 4096
    } else {
        raw_temperature
    };
    let moving = data[13] & 0b0100_0000 != 0;

    Some(DecodedBeacon {
        id: nearable_id.clone(),
        kind: BeaconKind::EstimoteNearable,
        payload: BeaconPayload::EstimoteNearable(EstimoteNearableFrame {
            nearable_id,
            temperature_celsius: raw_temperature as f32 / 16.0,
            moving,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";
    const STREAM_ID: [u8; 8] = [0x4F, 0x0A, 0x2B, 0x3C, 0x4D, 0x5E, 0x6F, 0x70];

    fn telemetry_header(protocol_version: u8, sub_frame: u8) -> Vec<u8> {
        let mut data = vec![(protocol_version << 4) | TELEMETRY_FRAME_TYPE];
        data.extend_from_slice(&STREAM_ID);
        data.push(sub_frame);
        data
    }

    #[test]
    fn test_motion_sub_frame() {
        let mut data = telemetry_header(2, 0x00);
        data.extend_from_slice(&[127, 0, 0x81, 0x00, 0x00, 0x01]); // +2 g, 0, -2 g, moving
        let beacon = parse_telemetry(ADDRESS, &data).unwrap();

        assert_eq!(beacon.kind, BeaconKind::EstimoteTelemetry);
        assert_eq!(beacon.id, ADDRESS);
        let BeaconPayload::EstimoteTelemetry(frame) = beacon.payload else {
            panic!("wrong payload family");
        };
        assert_eq!(frame.telemetry_id, "4f0a2b3c4d5e6f70");
        assert_eq!(frame.protocol_version, 2);

        let EstimoteSubFrame::Motion {
            acceleration,
            moving,
        } = frame.sub_frame
        else {
            panic!("wrong sub-frame");
        };
        assert!((acceleration.x - 2.0).abs() < 0.001);
        assert!(acceleration.y.abs() < 0.001);
        assert!((acceleration.z + 2.0).abs() < 0.001);
        assert!(moving);
    }

    #[test]
    fn test_environment_sub_frame() {
        let mut data = telemetry_header(1, 0x01);
        // light: 2^5 * 10 * 0.72 = 230.4 lux
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x5A]);
        // uptime count 0x21A = 538 with the minutes unit code; byte 15
        // also carries the temperature's low bits (0b01) in its top two
        data.extend_from_slice(&[0x1A, 0b0101_0010, 0x58]);
        // byte 17: temperature high bits 0b01, voltage low 6 bits 0b001010
        data.push(0b0010_1001);
        data.push(0x2E); // voltage high 8 bits -> 2954 mV total
        data.push(87); // battery percent

        let beacon = parse_telemetry(ADDRESS, &data).unwrap();
        let BeaconPayload::EstimoteTelemetry(frame) = beacon.payload else {
            panic!("wrong payload family");
        };
        let EstimoteSubFrame::Environment {
            ambient_light_lux,
            uptime_seconds,
            temperature_celsius,
            battery_millivolts,
            battery_percent,
        } = frame.sub_frame
        else {
            panic!("wrong sub-frame");
        };

        assert!((ambient_light_lux.unwrap() - 230.4).abs() < 0.01);
        assert_eq!(uptime_seconds, Some(538 * 60));
        let expected_temp = {
            let raw = (0b01 << 10) | (0x58 << 2) | 0b01;
            raw as f32 / 16.0
        };
        assert!((temperature_celsius.unwrap() - expected_temp).abs() < 0.001);
        let expected_voltage = (0x2E_u16 << 6) | 0b00_1010;
        assert_eq!(battery_millivolts, Some(expected_voltage));
        assert_eq!(battery_percent, Some(87));
    }

    #[test]
    fn test_environment_sentinels_map_to_none() {
        let mut data = telemetry_header(0, 0x01);
        data.extend_from_slice(&[0, 0, 0, 0xFF]); // light undefined
        data.extend_from_slice(&[0x00, 0x00, 0x00]);
        data.push(0b1111_1100); // voltage sentinel low bits
        data.push(0xFF); // voltage sentinel high bits
        let beacon = parse_telemetry(ADDRESS, &data).unwrap();

        let BeaconPayload::EstimoteTelemetry(frame) = beacon.payload else {
            panic!("wrong payload family");
        };
        let EstimoteSubFrame::Environment {
            ambient_light_lux,
            battery_millivolts,
            battery_percent,
            ..
        } = frame.sub_frame
        else {
            panic!("wrong sub-frame");
        };
        assert_eq!(ambient_light_lux, None);
        assert_eq!(battery_millivolts, None);
        // Protocol v0 frames carry no battery percentage.
        assert_eq!(battery_percent, None);
    }

    #[test]
    fn test_rejects_wrong_frame_type_and_version() {
        let mut data = telemetry_header(2, 0x00);
        data.extend_from_slice(&[0; 6]);
        data[0] = (2 << 4) | 0x01; // not a telemetry frame
        assert!(parse_telemetry(ADDRESS, &data).is_none());

        let mut data = telemetry_header(3, 0x00); // unknown protocol version
        data.extend_from_slice(&[0; 6]);
        assert!(parse_telemetry(ADDRESS, &data).is_none());
    }

    #[test]
    fn test_nearable_frame() {
        let mut data = vec![NEARABLE_FRAME_TYPE];
        data.extend_from_slice(&STREAM_ID);
        // temperature raw 0x160 = 352 -> 22.0 C, little endian
        data.extend_from_slice(&[0x60, 0x01]);
        data.extend_from_slice(&[0x00, 0x00]);
        data.push(0b0100_0000); // moving

        let beacon = parse_nearable(&data).unwrap();
        assert_eq!(beacon.kind, BeaconKind::EstimoteNearable);
        assert_eq!(beacon.id, "4f0a2b3c4d5e6f70");

        let BeaconPayload::EstimoteNearable(nearable) = beacon.payload else {
            panic!("wrong payload family");
        };
        assert!((nearable.temperature_celsius - 22.0).abs() < 0.001);
        assert!(nearable.moving);
    }

    #[test]
    fn test_nearable_negative_temperature() {
        let mut data = vec![NEARABLE_FRAME_TYPE];
        data.extend_from_slice(&STREAM_ID);
        // raw 0xFF0 = 4080 -> 4080 - 4096 = -16 -> -1.0 C
        data.extend_from_slice(&[0xF0, 0x0F]);
        data.extend_from_slice(&[0x00, 0x00, 0x00]);

        let beacon = parse_nearable(&data).unwrap();
        let BeaconPayload::EstimoteNearable(nearable) = beacon.payload else {
            panic!("wrong payload family");
        };
        assert!((nearable.temperature_celsius + 1.0).abs() < 0.001);
        assert!(!nearable.moving);
    }

    #[test]
    fn test_nearable_rejects_short_or_foreign_frames() {
        assert!(parse_nearable(&[NEARABLE_FRAME_TYPE, 0x00]).is_none());
        let mut data = vec![0x02];
        data.extend_from_slice(&[0; 13]);
        assert!(parse_nearable(&data).is_none());
    }
}
