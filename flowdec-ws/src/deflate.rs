//! permessage-deflate inflation (RFC 7692).
//!
//! Each direction owns one persistent raw-deflate context for the whole
//! stream: messages share the compression window, so contexts must never
//! be reset between messages or mixed between directions.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::WsError;

/// The trailer bytes stripped by the sender and re-appended before
/// inflation (RFC 7692 Section 7.2.1).
const DEFLATE_TRAILER: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

/// A persistent raw-inflate context for one direction.
pub struct InflateContext {
    ctx: Decompress,
}

impl InflateContext {
    /// `window_bits` comes from the negotiated
    /// `server_max_window_bits`/`client_max_window_bits` (8..=15 per RFC
    /// 7692). zlib cannot open a raw window below 9, so 8 is clamped up.
    pub fn new(window_bits: u8) -> Self {
        let bits = window_bits.clamp(9, 15);
        Self {
            ctx: Decompress::new_with_window_bits(false, bits),
        }
    }

    /// Inflate one message payload through the shared window, appending
    /// the deflate trailer first.
    pub fn inflate(&mut self, data: &[u8]) -> Result<Vec<u8>, WsError> {
        let mut input = Vec::with_capacity(data.len() + DEFLATE_TRAILER.len());
        input.extend_from_slice(data);
        input.extend_from_slice(&DEFLATE_TRAILER);

        let mut out = Vec::new();
        let mut consumed = 0usize;
        loop {
            let before_in = self.ctx.total_in();
            let before_out = self.ctx.total_out();
            let mut chunk = vec![0u8; 8192];
            let status = self
                .ctx
                .decompress(&input[consumed..], &mut chunk, FlushDecompress::Sync)
                .map_err(|e| WsError::Inflate(e.to_string()))?;
            let read = (self.ctx.total_in() - before_in) as usize;
            let written = (self.ctx.total_out() - before_out) as usize;
            consumed += read;
            out.extend_from_slice(&chunk[..written]);

            match status {
                Status::Ok | Status::BufError => {
                    if consumed >= input.len() && written == 0 {
                        break;
                    }
                    if read == 0 && written == 0 {
                        break;
                    }
                }
                Status::StreamEnd => break,
            }
        }
        Ok(out)
    }
}

/// Deflate-compress a payload the way a permessage-deflate sender would
/// (shared window, trailer stripped). Test helper for round-trips.
#[cfg(test)]
pub fn compress_message(ctx: &mut flate2::Compress, data: &[u8]) -> Vec<u8> {
    use flate2::FlushCompress;

    let mut out = Vec::new();
    let mut consumed = 0usize;
    loop {
        let before_in = ctx.total_in();
        let before_out = ctx.total_out();
        let mut chunk = vec![0u8; 8192];
        let status = ctx
            .compress(&data[consumed..], &mut chunk, FlushCompress::Sync)
            .unwrap();
        let read = (ctx.total_in() - before_in) as usize;
        let written = (ctx.total_out() - before_out) as usize;
        consumed += read;
        out.extend_from_slice(&chunk[..written]);
        if consumed >= data.len() && written < chunk.len() {
            break;
        }
        let _ = status;
    }
    // Strip the 00 00 ff ff trailer the flush appended.
    assert!(out.ends_with(&DEFLATE_TRAILER));
    out.truncate(out.len() - DEFLATE_TRAILER.len());
    out
}
