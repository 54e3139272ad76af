//! Content-type tracking for gRPC classification.
//!
//! HEADERS frames establish whether a logical HTTP/2 stream carries gRPC
//! in each direction. Servers routinely omit the content-type on
//! anything after the first response of a connection, so once any
//! response declared gRPC the connection stays sticky for
//! server-direction DATA frames with no classification of their own.
//! The stickiness is a heuristic: a multiplexed connection serving mixed
//! content types can be misclassified by it.

use std::collections::HashMap;

use flowdec_h2::{HeaderField, Origin};

/// Media types recognized as gRPC.
const GRPC_CONTENT_TYPES: [&str; 2] = ["application/grpc", "application/grpc+proto"];

/// Per-connection classification state.
#[derive(Debug, Default)]
pub struct ContentTypeTracker {
    flags: HashMap<(u32, OriginKey), bool>,
    server_responded_grpc: bool,
}

// Origin is not hashable by key without a small adapter; keep the map key
// explicit.
type OriginKey = bool; // true = server

fn key(stream_id: u32, origin: Origin) -> (u32, OriginKey) {
    (stream_id, matches!(origin, Origin::Server))
}

impl ContentTypeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the content-type (if any) from a decoded HEADERS block.
    pub fn observe_headers(&mut self, stream_id: u32, origin: Origin, fields: &[HeaderField]) {
        let content_type = fields
            .iter()
            .find(|f| f.name == b"content-type")
            .map(|f| String::from_utf8_lossy(&f.value).to_ascii_lowercase());
        if let Some(ct) = content_type {
            let is_grpc = GRPC_CONTENT_TYPES.contains(&ct.as_str());
            self.flags.insert(key(stream_id, origin), is_grpc);
        }
        if self.is_grpc_flag(stream_id, origin) && matches!(origin, Origin::Server) {
            self.server_responded_grpc = true;
        }
    }

    fn is_grpc_flag(&self, stream_id: u32, origin: Origin) -> bool {
        self.flags.get(&key(stream_id, origin)).copied().unwrap_or(false)
    }

    /// Should a DATA frame on this stream/direction be decoded as gRPC?
    ///
    /// An explicit content-type always wins; absent one, the sticky
    /// connection flag assumes the prior protocol continues.
    pub fn classify_data(&self, stream_id: u32, origin: Origin) -> bool {
        match self.flags.get(&key(stream_id, origin)) {
            Some(&flag) => flag,
            None => self.server_responded_grpc,
        }
    }
}
