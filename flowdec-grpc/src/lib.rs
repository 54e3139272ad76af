//! gRPC extraction layer over captured HTTP/2 streams.
//!
//! Wraps the `flowdec-h2` frame decoder and upgrades the rendering of
//! DATA frames that carry gRPC: each classified frame is decoded as one
//! length-prefixed message and its payload dumped through the
//! schema-free wire renderer.
//!
//! # Architecture
//!
//! ```text
//!   captured TCP payload bytes (per direction)
//!        |
//!   +----v-----------+
//!   | flowdec-h2     |  framing + HPACK
//!   +----+-----------+
//!        |
//!   +----v-----------+
//!   | flowdec-grpc   |  content-type gate + message framing
//!   | GrpcDecoder    |  + wire-format dump
//!   +----------------+
//! ```
//!
//! Per-frame gRPC failures (compressed payloads, length mismatches) are
//! rendered inline and do not affect sibling frames; only HTTP/2 framing
//! or HPACK failures are terminal.

pub mod error;
pub mod message;
pub mod track;
pub mod wire;

pub use error::GrpcError;
pub use flowdec_h2::{H2Error, Origin};
pub use message::GrpcMessage;
pub use track::ContentTypeTracker;

use flowdec_h2::render::fmt_bytes;
use flowdec_h2::{Frame, H2Decoder};

/// HTTP/2 decoder with gRPC-aware frame rendering.
pub struct GrpcDecoder {
    h2: H2Decoder,
    track: ContentTypeTracker,
}

impl GrpcDecoder {
    pub fn new(max_frame_size: u32) -> Self {
        Self {
            h2: H2Decoder::new(max_frame_size),
            track: ContentTypeTracker::new(),
        }
    }

    /// Feed captured bytes from one endpoint; returns one rendered line
    /// per completed frame (no trailing newline).
    pub fn push(&mut self, origin: Origin, data: &[u8]) -> Result<Vec<String>, H2Error> {
        let frames = self.h2.push(origin, data)?;
        let mut lines = Vec::with_capacity(frames.len());
        for frame in frames {
            lines.push(self.render(origin, &frame)?);
        }
        Ok(lines)
    }

    /// Render a single frame, routing classified DATA frames through the
    /// gRPC message decoder.
    pub fn render(&mut self, origin: Origin, frame: &Frame) -> Result<String, H2Error> {
        if let Frame::Headers {
            stream_id,
            flags,
            block,
            ..
        } = frame
        {
            // Decode once for classification, then render from the
            // decoded fields: running the block through HPACK twice
            // would corrupt the dynamic table.
            let fields = self.h2.decode_headers(block)?;
            self.track.observe_headers(*stream_id, origin, &fields);
            return Ok(flowdec_h2::render::render_headers(
                *stream_id, *flags, &fields,
            ));
        }

        if let Frame::Data {
            stream_id, payload, ..
        } = frame
        {
            if self.track.classify_data(*stream_id, origin) && !payload.is_empty() {
                return Ok(self.render_grpc_data(frame, *stream_id, payload));
            }
        }

        self.h2.render_frame(frame)
    }

    fn render_grpc_data(&self, frame: &Frame, stream_id: u32, payload: &[u8]) -> String {
        match message::decode(payload) {
            Ok(msg) => {
                let mut out = format!(
                    "DATA(stream_id={stream_id})\ngrpc-compressed: {}\ngrpc-message-length: {}",
                    msg.compressed,
                    msg.payload.len()
                );
                match wire::render_message(&msg.payload) {
                    Ok(dump) => {
                        out.push('\n');
                        out.push_str(&dump);
                    }
                    Err(e) => {
                        tracing::debug!(stream_id, error = %e, "wire-format dump failed");
                        out.push_str(&format!(
                            "\nunparseable message payload ({e}): {}",
                            fmt_bytes(&msg.payload)
                        ));
                    }
                }
                out
            }
            Err(e) => {
                // The error replaces the dump but the frame is still
                // shown; siblings are unaffected.
                format!("{e}\nDATA(stream_id={stream_id}) {}", fmt_bytes(payload))
            }
        }
    }
}
