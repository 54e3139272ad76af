//! HTTP/1 message parsing for captured streams.
//!
//! Parses one captured chunk as one HTTP/1 message. Requests are kept
//! shallow (the capture's chunking already segments messages, so request
//! bodies are simply whatever follows the headers); responses get full
//! body framing -- chunked transfer decoding and content-encoding
//! inflation -- so the UI shows the logical body instead of wire bytes.
//!
//! The parsers are direction-neutral pure functions; the pipeline driver
//! owns all per-stream state, including the upgrade handling built from
//! [`upgrade`]'s helpers.

pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod upgrade;

pub use error::HttpError;
pub use headers::Headers;
pub use request::{split_head, Request};
pub use response::Response;
