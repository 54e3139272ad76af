//! Passive HTTP/2 framing layer for captured streams.
//!
//! This crate decodes one side of a recorded HTTP/2 connection at a time.
//! It has zero runtime dependencies -- the caller feeds captured bytes in
//! via [`H2Decoder::push`] and receives decoded frames back. Nothing is
//! ever sent, so there is no encoder beyond the frame-header helper the
//! tests use.
//!
//! # Architecture
//!
//! ```text
//!   captured TCP payload bytes (per direction)
//!        |
//!   +----v-----------+
//!   | FrameBuffer    |  frame boundaries + connection preface
//!   +----+-----------+
//!        |
//!   +----v-----------+
//!   | Frame decode   |  DATA / HEADERS / SETTINGS / ...
//!   | hpack::Decoder |  connection-scoped header decompression
//!   +----------------+
//! ```
//!
//! The decoder deliberately keeps the maximum frame size fixed at its
//! initial value: observed SETTINGS frames are decoded and rendered but
//! never applied to the buffers. Connections that renegotiate the frame
//! size mid-stream will desynchronize, which is reported as a framing
//! error for that direction.

pub mod buffer;
pub mod error;
pub mod frame;
pub mod hpack;
mod huffman;
pub mod render;
pub mod settings;

pub use buffer::FrameBuffer;
pub use error::{ErrorCode, H2Error};
pub use frame::Frame;
pub use hpack::HeaderField;

/// Which endpoint of the captured connection emitted a run of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Client,
    Server,
}

/// Default SETTINGS_MAX_FRAME_SIZE (RFC 7540 Section 6.5.2).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16384;

/// A paired per-direction frame decoder with connection-scoped HPACK state.
///
/// Header compression state is shared between the directions on purpose:
/// HPACK dynamic tables are connection-scoped, and a passive observer has
/// to replay both header block streams through one decoder in arrival
/// order to stay synchronized.
pub struct H2Decoder {
    client: FrameBuffer,
    server: FrameBuffer,
    hpack: hpack::Decoder,
}

impl H2Decoder {
    /// Create a decoder for a fresh connection.
    ///
    /// The client-origin buffer expects the 24-byte connection preface
    /// before the first frame; the server-origin buffer starts framing
    /// immediately.
    pub fn new(max_frame_size: u32) -> Self {
        Self {
            client: FrameBuffer::new(true, max_frame_size),
            server: FrameBuffer::new(false, max_frame_size),
            hpack: hpack::Decoder::new(hpack::DEFAULT_MAX_TABLE_SIZE),
        }
    }

    /// Feed captured bytes from one endpoint, returning every frame that
    /// completed.
    ///
    /// A framing error poisons the direction it occurred on; the caller
    /// is expected to stop feeding that direction.
    pub fn push(&mut self, origin: Origin, data: &[u8]) -> Result<Vec<Frame>, H2Error> {
        let buf = match origin {
            Origin::Client => &mut self.client,
            Origin::Server => &mut self.server,
        };
        buf.push(data);
        let mut frames = Vec::new();
        while let Some(frame) = buf.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Decode an HPACK header block through the shared connection state.
    pub fn decode_headers(&mut self, block: &[u8]) -> Result<Vec<HeaderField>, H2Error> {
        self.hpack.decode(block)
    }

    /// Render one decoded frame as a display line (no trailing newline).
    pub fn render_frame(&mut self, frame: &Frame) -> Result<String, H2Error> {
        render::render_frame(frame, &mut self.hpack)
    }
}
