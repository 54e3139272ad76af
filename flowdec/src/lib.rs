//! Layered protocol decoding pipeline for captured traffic streams.
//!
//! flowdec turns captured bidirectional byte streams (TCP/UDP) into
//! structured, human-readable chunks for a traffic-analysis UI. One
//! pipeline instance decodes one stream, synchronously, start to finish;
//! instances share nothing, so running many streams in parallel is the
//! host's choice.
//!
//! # Architecture
//!
//! ```text
//!   host (stdin/stdout line JSON)          src/host.rs
//!        |
//!   +----v-----------+
//!   | pipeline       |  layer stack per stream    src/pipeline.rs
//!   |  HTTP/1 -------+--> HTTP/2 (+ gRPC)         flowdec-http, flowdec-grpc
//!   |          \-----+--> WebSocket               flowdec-ws
//!   +----------------+
//! ```
//!
//! Layer transitions are monotonic: a stream leaves HTTP/1 at most once
//! and never returns. Every failure path degrades to an explanatory
//! output chunk -- the host always receives output for every input
//! chunk, and nothing here can take the process down.

pub mod chunk;
pub mod config;
pub mod host;
pub mod pipeline;
pub mod stream;

pub use chunk::{coalesce, Chunk, Direction};
pub use config::Config;
pub use pipeline::{decode_stream, StreamDecoder};
pub use stream::{Stream, StreamMetadata, Transport};
