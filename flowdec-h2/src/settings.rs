//! SETTINGS parameter decoding and naming (RFC 7540 Section 6.5).
//!
//! A passive observer wants the parameters exactly as they appeared on the
//! wire (order and repeats included), so this module decodes to a pair
//! list rather than a merged settings struct.

use crate::error::H2Error;

/// Standard SETTINGS identifiers and their registered names.
///
/// Ids 1-6 come from RFC 7540, 8 from RFC 8441 and 9 from RFC 9218.
const SETTINGS_NAMES: [(u16, &str); 8] = [
    (0x1, "HEADER_TABLE_SIZE"),
    (0x2, "ENABLE_PUSH"),
    (0x3, "MAX_CONCURRENT_STREAMS"),
    (0x4, "INITIAL_WINDOW_SIZE"),
    (0x5, "MAX_FRAME_SIZE"),
    (0x6, "MAX_HEADER_LIST_SIZE"),
    (0x8, "ENABLE_CONNECT_PROTOCOL"),
    (0x9, "NO_RFC7540_PRIORITIES"),
];

/// Look up the registered name for a SETTINGS identifier.
pub fn setting_name(id: u16) -> Option<&'static str> {
    SETTINGS_NAMES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, name)| *name)
}

/// Decode a SETTINGS payload into `(id, value)` pairs in wire order.
///
/// Unknown identifiers are kept (they render with a numeric fallback);
/// a payload that is not a whole number of 6-byte entries is an error.
pub fn decode_pairs(payload: &[u8]) -> Result<Vec<(u16, u32)>, H2Error> {
    if payload.len() % 6 != 0 {
        return Err(H2Error::FrameSizeError);
    }
    let mut pairs = Vec::with_capacity(payload.len() / 6);
    for entry in payload.chunks_exact(6) {
        let id = u16::from_be_bytes([entry[0], entry[1]]);
        let value = u32::from_be_bytes([entry[2], entry[3], entry[4], entry[5]]);
        pairs.push((id, value));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_pairs_in_order() {
        let payload = [
            0x00, 0x04, 0x00, 0x01, 0x00, 0x00, // INITIAL_WINDOW_SIZE 65536
            0x00, 0x01, 0x00, 0x00, 0x10, 0x00, // HEADER_TABLE_SIZE 4096
        ];
        let pairs = decode_pairs(&payload).unwrap();
        assert_eq!(pairs, vec![(4, 65536), (1, 4096)]);
    }

    #[test]
    fn empty_payload_is_empty_list() {
        assert!(decode_pairs(&[]).unwrap().is_empty());
    }

    #[test]
    fn ragged_payload_rejected() {
        assert!(matches!(
            decode_pairs(&[0, 1, 0, 0]),
            Err(H2Error::FrameSizeError)
        ));
    }

    #[test]
    fn names() {
        assert_eq!(setting_name(1), Some("HEADER_TABLE_SIZE"));
        assert_eq!(setting_name(5), Some("MAX_FRAME_SIZE"));
        assert_eq!(setting_name(8), Some("ENABLE_CONNECT_PROTOCOL"));
        assert_eq!(setting_name(9), Some("NO_RFC7540_PRIORITIES"));
        assert_eq!(setting_name(7), None);
        assert_eq!(setting_name(0x42), None);
    }
}
