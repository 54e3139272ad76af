//! gRPC length-prefixed message framing
//! (<https://github.com/grpc/grpc/blob/master/doc/PROTOCOL-HTTP2.md>).
//!
//! Format: 1 byte compress flag + 4 byte big-endian length + payload.
//!
//! The decoder assumes one message per DATA frame and reports any
//! misalignment as an error for that frame. The protocol itself allows
//! messages to straddle frame boundaries; real gRPC stacks in captures
//! almost never do, and buffering across frames would misattribute bytes
//! when they did anyway.

use crate::error::GrpcError;

/// One decoded length-prefixed message.
#[derive(Debug, PartialEq, Eq)]
pub struct GrpcMessage {
    /// The wire compression flag. Always zero today: non-zero flags are
    /// rejected before a message is produced.
    pub compressed: u8,
    pub payload: Vec<u8>,
}

/// Decode exactly one message occupying the whole of `data`.
pub fn decode(data: &[u8]) -> Result<GrpcMessage, GrpcError> {
    if data.len() < 5 {
        return Err(GrpcError::ShortPrefix);
    }
    let compressed = data[0];
    if compressed != 0 {
        return Err(GrpcError::Compressed);
    }
    let length = u32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize;
    let rest = &data[5..];
    if rest.len() < length {
        return Err(GrpcError::LengthMismatch);
    }
    if rest.len() > length {
        return Err(GrpcError::TrailingBytes);
    }
    Ok(GrpcMessage {
        compressed,
        payload: rest.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_byte_message() {
        let mut data = vec![0x00, 0x00, 0x00, 0x00, 0x05];
        data.extend_from_slice(b"hello");
        let msg = decode(&data).unwrap();
        assert_eq!(msg.compressed, 0);
        assert_eq!(msg.payload, b"hello");
    }

    #[test]
    fn empty_message() {
        let msg = decode(&[0, 0, 0, 0, 0]).unwrap();
        assert!(msg.payload.is_empty());
    }

    #[test]
    fn short_prefix_rejected() {
        assert!(matches!(decode(&[0, 0, 0]), Err(GrpcError::ShortPrefix)));
    }

    #[test]
    fn compressed_flag_rejected() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x01, 0xaa];
        assert!(matches!(decode(&data), Err(GrpcError::Compressed)));
    }

    #[test]
    fn declared_length_exceeding_frame_rejected() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x09, b'x', b'y'];
        assert!(matches!(decode(&data), Err(GrpcError::LengthMismatch)));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x01, b'x', b'y'];
        assert!(matches!(decode(&data), Err(GrpcError::TrailingBytes)));
    }
}
