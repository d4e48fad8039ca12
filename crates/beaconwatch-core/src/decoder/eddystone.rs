//! Eddystone service-data frames (service UUID 0xFEAA).
//!
//! The first service-data byte selects the frame: UID 0x00, URL 0x10,
//! TLM 0x20, EID 0x30. TLM frames carry no stable identity of their own,
//! so the advertising device's address serves as the record id.

use crate::decoder::hex;
use crate::types::{
    BeaconKind, BeaconPayload, DecodedBeacon, EddystoneEidFrame, EddystoneTlmFrame,
    EddystoneUidFrame, EddystoneUrlFrame,
};

const FRAME_UID: u8 = 0x00;
const FRAME_URL: u8 = 0x10;
const FRAME_TLM: u8 = 0x20;
const FRAME_EID: u8 = 0x30;

/// URL scheme prefixes, indexed by the byte following the tx power.
const URL_SCHEMES: [&str; 4] = ["http://www.", "https://www.", "http://", "https://"];

/// URL expansion codes 0x00..=0x0D.
const URL_EXPANSIONS: [&str; 14] = [
    ".com/", ".org/", ".edu/", ".net/", ".info/", ".biz/", ".gov/", ".com", ".org", ".edu",
    ".net", ".info", ".biz", ".gov",
];

pub(super) fn parse(address: &str, data: &[u8]) -> Option<DecodedBeacon> {
    match *data.first()? {
        FRAME_UID => parse_uid(data),
        FRAME_URL => parse_url(data),
        FRAME_TLM => parse_tlm(address, data),
        FRAME_EID => parse_eid(data),
        _ => None,
    }
}

fn parse_uid(data: &[u8]) -> Option<DecodedBeacon> {
    if data.len() < 18 {
        return None;
    }
    let tx_power = data[1] as i8;
    let namespace = hex(&data[2..12]);
    let instance = hex(&data[12..18]);

    Some(DecodedBeacon {
        id: format!("{namespace}:{instance}"),
        kind: BeaconKind::EddystoneUid,
        payload: BeaconPayload::EddystoneUid(EddystoneUidFrame {
            namespace,
            instance,
            tx_power,
        }),
    })
}

fn parse_url(data: &[u8]) -> Option<DecodedBeacon> {
    if data.len() < 4 {
        return None;
    }
    let tx_power = data[1] as i8;
    let mut url = String::from(*URL_SCHEMES.get(usize::from(data[2]))?);

    for &byte in &data[3..] {
        match byte {
            0x00..=0x0D => url.push_str(URL_EXPANSIONS[usize::from(byte)]),
            // Printable ASCII outside the expansion range; everything
            // else is reserved and marks the frame malformed.
            0x21..=0x7E => url.push(char::from(byte)),
            _ => return None,
        }
    }

    Some(DecodedBeacon {
        id: url.clone(),
        kind: BeaconKind::EddystoneUrl,
        payload: BeaconPayload::EddystoneUrl(EddystoneUrlFrame { url, tx_power }),
    })
}

fn parse_tlm(address: &str, data: &[u8]) -> Option<DecodedBeacon> {
    // Only the unencrypted TLM version (0x00) is recognized.
    if data.len() < 14 || data[1] != 0x00 {
        return None;
    }
    let battery_millivolts = u16::from_be_bytes([data[2], data[3]]);
    let temperature_celsius = f32::from(i16::from_be_bytes([data[4], data[5]])) / 256.0;
    let advertisement_count = u32::from_be_bytes([data[6], data[7], data[8], data[9]]);
    let uptime_deciseconds = u32::from_be_bytes([data[10], data[11], data[12], data[13]]);

    Some(DecodedBeacon {
        id: address.to_string(),
        kind: BeaconKind::EddystoneTlm,
        payload: BeaconPayload::EddystoneTlm(EddystoneTlmFrame {
            battery_millivolts,
            temperature_celsius,
            advertisement_count,
            uptime_seconds: f64::from(uptime_deciseconds) / 10.0,
        }),
    })
}

fn parse_eid(data: &[u8]) -> Option<DecodedBeacon> {
    if data.len() < 10 {
        return None;
    }
    let tx_power = data[1] as i8;
    let ephemeral_id = hex(&data[2..10]);

    Some(DecodedBeacon {
        id: ephemeral_id.clone(),
        kind: BeaconKind::EddystoneEid,
        payload: BeaconPayload::EddystoneEid(EddystoneEidFrame {
            ephemeral_id,
            tx_power,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

    #[test]
    fn test_uid_frame() {
        let mut data = vec![FRAME_UID, 0xEC]; // -20 dBm
        data.extend_from_slice(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
        data.extend_from_slice(&[0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);

        let beacon = parse(ADDRESS, &data).unwrap();
        assert_eq!(beacon.kind, BeaconKind::EddystoneUid);
        assert_eq!(beacon.id, "00010203040506070809:0a0b0c0d0e0f");

        let BeaconPayload::EddystoneUid(uid) = beacon.payload else {
            panic!("wrong payload family");
        };
        assert_eq!(uid.namespace, "00010203040506070809");
        assert_eq!(uid.instance, "0a0b0c0d0e0f");
        assert_eq!(uid.tx_power, -20);
    }

    #[test]
    fn test_url_frame_expands_scheme_and_suffix() {
        let data = vec![FRAME_URL, 0xEB, 0x03, b'g', b'o', b'o', 0x08];
        let beacon = parse(ADDRESS, &data).unwrap();
        assert_eq!(beacon.kind, BeaconKind::EddystoneUrl);
        assert_eq!(beacon.id, "https://goo.org");
    }

    #[test]
    fn test_url_frame_with_reserved_byte_is_malformed() {
        let data = vec![FRAME_URL, 0xEB, 0x02, b'a', 0x15, b'b'];
        assert!(parse(ADDRESS, &data).is_none());
    }

    #[test]
    fn test_url_frame_with_unknown_scheme_is_malformed() {
        let data = vec![FRAME_URL, 0xEB, 0x07, b'a'];
        assert!(parse(ADDRESS, &data).is_none());
    }

    #[test]
    fn test_tlm_frame_scales_fixed_point_fields() {
        let mut data = vec![FRAME_TLM, 0x00];
        data.extend_from_slice(&2875u16.to_be_bytes()); // battery mV
        data.extend_from_slice(&[0x15, 0x80]); // 21.5 C in 8.8 fixed point
        data.extend_from_slice(&120_000u32.to_be_bytes()); // adv count
        data.extend_from_slice(&36_000u32.to_be_bytes()); // 3600 s uptime

        let beacon = parse(ADDRESS, &data).unwrap();
        assert_eq!(beacon.kind, BeaconKind::EddystoneTlm);
        assert_eq!(beacon.id, ADDRESS);

        let BeaconPayload::EddystoneTlm(tlm) = beacon.payload else {
            panic!("wrong payload family");
        };
        assert_eq!(tlm.battery_millivolts, 2875);
        assert!((tlm.temperature_celsius - 21.5).abs() < f32::EPSILON);
        assert_eq!(tlm.advertisement_count, 120_000);
        assert!((tlm.uptime_seconds - 3600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tlm_encrypted_version_is_ignored() {
        let mut data = vec![FRAME_TLM, 0x01];
        data.extend_from_slice(&[0u8; 12]);
        assert!(parse(ADDRESS, &data).is_none());
    }

    #[test]
    fn test_eid_frame() {
        let data = vec![
            FRAME_EID, 0xEC, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11, 0x22, 0x33,
        ];
        let beacon = parse(ADDRESS, &data).unwrap();
        assert_eq!(beacon.kind, BeaconKind::EddystoneEid);
        assert_eq!(beacon.id, "deadbeef00112233");
    }

    #[test]
    fn test_unknown_frame_type_is_ignored() {
        assert!(parse(ADDRESS, &[0x40, 0x00, 0x00]).is_none());
        assert!(parse(ADDRESS, &[]).is_none());
    }
}
