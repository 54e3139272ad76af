//! WebSocket layer for captured streams.
//!
//! After a validated 101 handshake (see [`handshake`]), every captured
//! chunk is a concatenation of WebSocket frames. The decoder walks them,
//! unmasks, reassembles fragmented messages and inflates
//! permessage-deflate payloads, then re-emits the reconstructed frames
//! as display bytes.
//!
//! Any failure while walking a chunk is terminal for the stream's
//! WebSocket decoding: the error is reported once and the caller falls
//! back to raw passthrough.

pub mod deflate;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod reassembly;

pub use error::WsError;
pub use frame::{apply_mask, parse_frame, WsFrame};
pub use handshake::{
    accept_digest, deflate_params, negotiate_extensions, parse_extensions, verify_accept,
    DeflateParams,
};
pub use reassembly::{Reassembler, DEFAULT_FRAGMENT_CAP};

use deflate::InflateContext;

/// Which endpoint of the captured connection emitted a run of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Client,
    Server,
}

/// Per-direction inflate contexts. `server_max_window_bits` governs what
/// the server sends, `client_max_window_bits` what the client sends.
struct DirectionalInflate {
    client: InflateContext,
    server: InflateContext,
}

/// Stateful decoder for the ESTABLISHED phase of one stream.
pub struct WsDecoder {
    inflate: Option<DirectionalInflate>,
    reassembler: Reassembler,
}

impl WsDecoder {
    /// `deflate` carries the negotiated permessage-deflate parameters,
    /// or `None` when the extension was not accepted.
    pub fn new(deflate: Option<DeflateParams>, fragment_cap: usize) -> Self {
        Self {
            inflate: deflate.map(|params| DirectionalInflate {
                client: InflateContext::new(params.client_max_window_bits),
                server: InflateContext::new(params.server_max_window_bits),
            }),
            reassembler: Reassembler::new(fragment_cap),
        }
    }

    /// Decode one captured chunk: every frame in it is processed and the
    /// reconstructed frames are concatenated into the returned display
    /// bytes.
    pub fn decode_chunk(&mut self, origin: Origin, data: &[u8]) -> Result<Vec<u8>, WsError> {
        let mut out = Vec::new();
        let mut rest = data;
        while !rest.is_empty() {
            let (frame, consumed) = parse_frame(rest)?;
            rest = &rest[consumed..];
            if let Some(frame) = self.process_frame(origin, frame)? {
                out.extend_from_slice(&frame.into_bytes());
            }
        }
        Ok(out)
    }

    /// Reassembly + inflation for one parsed frame. Control frames skip
    /// both. Returns `None` while fragments accumulate.
    fn process_frame(
        &mut self,
        origin: Origin,
        frame: WsFrame,
    ) -> Result<Option<WsFrame>, WsError> {
        if frame.is_control() {
            return Ok(Some(frame));
        }

        let mut frame = match self.reassembler.push(frame)? {
            Some(f) => f,
            None => return Ok(None),
        };

        // RSV1 is only meaningful on the first frame of a message (which
        // the merged header preserves), and only when the extension was
        // negotiated.
        let Some(contexts) = self.inflate.as_mut() else {
            return Ok(Some(frame));
        };
        if !frame.rsv1() {
            return Ok(Some(frame));
        }

        let ctx = match origin {
            Origin::Client => &mut contexts.client,
            Origin::Server => &mut contexts.server,
        };
        frame.payload = ctx.inflate(&frame.payload)?;
        frame.clear_rsv1();
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compress, Compression};

    fn plain_frame(fin: bool, opcode: u8, payload: &[u8]) -> Vec<u8> {
        let mut raw = vec![if fin { 0x80 } else { 0x00 } | opcode];
        assert!(payload.len() < 126);
        raw.push(payload.len() as u8);
        raw.extend_from_slice(payload);
        raw
    }

    fn compressed_frame(payload: &[u8], comp: &mut Compress) -> Vec<u8> {
        let body = deflate::compress_message(comp, payload);
        let mut raw = vec![0x80 | 0x40 | 0x1]; // FIN + RSV1 + text
        assert!(body.len() < 126);
        raw.push(body.len() as u8);
        raw.extend_from_slice(&body);
        raw
    }

    #[test]
    fn plain_frames_pass_through() {
        let mut dec = WsDecoder::new(None, DEFAULT_FRAGMENT_CAP);
        let mut data = plain_frame(true, 0x1, b"one");
        data.extend_from_slice(&plain_frame(true, 0x2, b"two"));
        let out = dec.decode_chunk(Origin::Client, &data).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn masked_frame_reemitted_unmasked() {
        let mut dec = WsDecoder::new(None, DEFAULT_FRAGMENT_CAP);
        let key = [1u8, 2, 3, 4];
        let mut payload = b"secret".to_vec();
        apply_mask(&mut payload, key);
        let mut raw = vec![0x81, 0x80 | 6];
        raw.extend_from_slice(&key);
        raw.extend_from_slice(&payload);

        let out = dec.decode_chunk(Origin::Client, &raw).unwrap();
        assert_eq!(out, plain_frame(true, 0x1, b"secret"));
    }

    #[test]
    fn compressed_message_inflated_and_rsv1_cleared() {
        let mut comp = Compress::new_with_window_bits(Compression::default(), false, 15);
        let mut dec = WsDecoder::new(Some(DeflateParams::default()), DEFAULT_FRAGMENT_CAP);

        let raw = compressed_frame(b"hello compressed world", &mut comp);
        let out = dec.decode_chunk(Origin::Server, &raw).unwrap();
        assert_eq!(out[0], 0x81, "RSV1 cleared, FIN kept");
        assert_eq!(&out[2..], b"hello compressed world");
    }

    #[test]
    fn fragments_reassemble_without_deflate() {
        let mut dec = WsDecoder::new(None, DEFAULT_FRAGMENT_CAP);
        let mut data = plain_frame(false, 0x1, b"ab");
        data.extend_from_slice(&plain_frame(true, 0x0, b"cd"));
        let out = dec.decode_chunk(Origin::Server, &data).unwrap();
        assert_eq!(out[0], 0x81);
        assert_eq!(&out[2..], b"abcd");
    }

    #[test]
    fn fragmented_message_reassembles() {
        // Fragmentation applies before inflation: queue two fragments of
        // an uncompressed message while deflate mode is active.
        let mut dec = WsDecoder::new(Some(DeflateParams::default()), DEFAULT_FRAGMENT_CAP);
        let mut data = plain_frame(false, 0x1, b"P1");
        data.extend_from_slice(&plain_frame(false, 0x0, b"P2"));
        let out = dec.decode_chunk(Origin::Client, &data).unwrap();
        assert!(out.is_empty(), "fragments emit nothing yet");

        let out = dec
            .decode_chunk(Origin::Client, &plain_frame(true, 0x0, b"P3"))
            .unwrap();
        // Merged frame: first fragment's header with FIN forced on.
        assert_eq!(out[0], 0x81);
        assert_eq!(&out[2..], b"P1P2P3");
    }

    #[test]
    fn control_frame_bypasses_deflate_state() {
        let mut dec = WsDecoder::new(Some(DeflateParams::default()), DEFAULT_FRAGMENT_CAP);
        // Queue a fragment, then a ping: the ping passes through while
        // the fragment stays queued.
        let out = dec
            .decode_chunk(Origin::Client, &plain_frame(false, 0x1, b"P1"))
            .unwrap();
        assert!(out.is_empty());
        let ping = plain_frame(true, 0x9, b"ping");
        let out = dec.decode_chunk(Origin::Client, &ping).unwrap();
        assert_eq!(out, ping);
    }

    #[test]
    fn truncated_chunk_is_error() {
        let mut dec = WsDecoder::new(None, DEFAULT_FRAGMENT_CAP);
        let raw = plain_frame(true, 0x1, b"hello");
        assert!(matches!(
            dec.decode_chunk(Origin::Client, &raw[..3]),
            Err(WsError::Truncated)
        ));
    }

    #[test]
    fn per_direction_contexts_do_not_interfere() {
        let mut comp_c = Compress::new_with_window_bits(Compression::default(), false, 15);
        let mut comp_s = Compress::new_with_window_bits(Compression::default(), false, 15);
        let mut dec = WsDecoder::new(Some(DeflateParams::default()), DEFAULT_FRAGMENT_CAP);

        for _ in 0..3 {
            let c = compressed_frame(b"client says hi", &mut comp_c);
            let s = compressed_frame(b"server says hi", &mut comp_s);
            let out = dec.decode_chunk(Origin::Client, &c).unwrap();
            assert_eq!(&out[2..], b"client says hi");
            let out = dec.decode_chunk(Origin::Server, &s).unwrap();
            assert_eq!(&out[2..], b"server says hi");
        }
    }
}
