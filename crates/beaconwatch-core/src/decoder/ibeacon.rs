//! iBeacon manufacturer-data frame.
//!
//! Layout (after the 0x004C company identifier): type 0x02, length 0x15,
//! 16-byte proximity UUID, big-endian major and minor, calibrated tx
//! power at 1 m as a signed byte.

use uuid::Uuid;

use crate::types::{BeaconKind, BeaconPayload, DecodedBeacon, IBeaconFrame};

const FRAME_TYPE: u8 = 0x02;
const FRAME_LENGTH: u8 = 0x15;

pub(super) fn parse(data: &[u8]) -> Option<DecodedBeacon> {
    if data.len() < 23 || data[0] != FRAME_TYPE || data[1] != FRAME_LENGTH {
        return None;
    }

    let uuid = Uuid::from_slice(&data[2..18]).ok()?;
    let major = u16::from_be_bytes([data[18], data[19]]);
    let minor = u16::from_be_bytes([data[20], data[21]]);
    let tx_power = data[22] as i8;

    Some(DecodedBeacon {
        id: format!("{uuid}:{major}:{minor}"),
        kind: BeaconKind::IBeacon,
        payload: BeaconPayload::IBeacon(IBeaconFrame {
            uuid,
            major,
            minor,
            tx_power,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(major: u16, minor: u16) -> Vec<u8> {
        let mut data = vec![FRAME_TYPE, FRAME_LENGTH];
        data.extend_from_slice(
            "f7826da6-4fa2-4e98-8024-bc5b71e0893e"
                .parse::<Uuid>()
                .unwrap()
                .as_bytes(),
        );
        data.extend_from_slice(&major.to_be_bytes());
        data.extend_from_slice(&minor.to_be_bytes());
        data.push(0xB3); // -77 dBm
        data
    }

    #[test]
    fn test_parses_uuid_major_minor_and_tx_power() {
        let beacon = parse(&frame(40004, 1)).unwrap();
        assert_eq!(beacon.kind, BeaconKind::IBeacon);
        assert_eq!(beacon.id, "f7826da6-4fa2-4e98-8024-bc5b71e0893e:40004:1");

        let BeaconPayload::IBeacon(ibeacon) = beacon.payload else {
            panic!("wrong payload family");
        };
        assert_eq!(ibeacon.major, 40004);
        assert_eq!(ibeacon.minor, 1);
        assert_eq!(ibeacon.tx_power, -77);
    }

    #[test]
    fn test_rejects_wrong_frame_type() {
        let mut data = frame(1, 2);
        data[0] = 0x03;
        assert!(parse(&data).is_none());
    }

    #[test]
    fn test_rejects_truncated_frame() {
        let data = frame(1, 2);
        assert!(parse(&data[..22]).is_none());
    }
}
