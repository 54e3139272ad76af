//! Line-delimited JSON host protocol on stdin/stdout.
//!
//! One conversation per process lifetime, repeatable for many streams:
//! a metadata object, then one object per chunk, then a blank line; the
//! decoder answers with zero or more chunk objects, a blank line and the
//! literal `{}`, flushed immediately.
//!
//! stdout belongs to the protocol; logs go to stderr only. Lines are
//! written with an explicit `\n` and flushed per result.

use std::io::{BufRead, Write};

use base64::Engine;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, Direction};
use crate::stream::{Stream, StreamMetadata, Transport};

/// Timestamp layout: ISO-8601 with microsecond precision.
const TIME_WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const TIME_READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Host protocol failures. All of them resolve to an error result for
/// the affected stream; the process keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON line: {0}")]
    BadJson(#[from] serde_json::Error),
    #[error("unknown direction: {0:?}")]
    BadDirection(String),
    #[error("unknown protocol: {0:?}")]
    BadProtocol(String),
    #[error("invalid chunk content: {0}")]
    BadContent(#[from] base64::DecodeError),
}

#[derive(Serialize, Deserialize)]
struct WireMetadata {
    #[serde(rename = "StreamID")]
    stream_id: u64,
    #[serde(rename = "ClientHost")]
    client_host: String,
    #[serde(rename = "ClientPort")]
    client_port: u16,
    #[serde(rename = "ServerHost")]
    server_host: String,
    #[serde(rename = "ServerPort")]
    server_port: u16,
    #[serde(rename = "Protocol")]
    protocol: String,
}

#[derive(Serialize, Deserialize)]
struct WireChunk {
    #[serde(rename = "Direction")]
    direction: String,
    #[serde(rename = "Content")]
    content: String,
    #[serde(rename = "Time", default, skip_serializing_if = "Option::is_none")]
    time: Option<String>,
}

impl WireChunk {
    fn parse(self) -> Result<Chunk, HostError> {
        let direction = Direction::from_str(&self.direction)
            .ok_or_else(|| HostError::BadDirection(self.direction.clone()))?;
        let content = base64::engine::general_purpose::STANDARD.decode(&self.content)?;
        let time = self.time.as_deref().and_then(|t| {
            match NaiveDateTime::parse_from_str(t, TIME_READ_FORMAT) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(time = t, error = %e, "unparseable chunk timestamp dropped");
                    None
                }
            }
        });
        Ok(Chunk {
            direction,
            content,
            time,
        })
    }

    fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            direction: chunk.direction.as_str().to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(&chunk.content),
            time: chunk
                .time
                .map(|t| t.format(TIME_WRITE_FORMAT).to_string()),
        }
    }
}

/// Read one stream conversation. Returns `Ok(None)` on clean EOF before
/// a metadata line.
///
/// On a malformed line the remainder of the conversation is drained (up
/// to the blank terminator) so the protocol stays in sync, and the error
/// is returned for the caller to answer with an error result.
pub fn read_stream(reader: &mut impl BufRead) -> Result<Option<Stream>, HostError> {
    let metadata_line = match read_line(reader)? {
        Some(line) => line,
        None => return Ok(None),
    };
    if metadata_line.is_empty() {
        // Tolerate a stray blank between conversations.
        return read_stream(reader);
    }

    let metadata = parse_metadata(&metadata_line).map_err(|e| {
        let _ = drain_stream(reader);
        e
    })?;

    let mut chunks = Vec::new();
    loop {
        let line = match read_line(reader)? {
            // EOF mid-stream: decode what we have.
            None => break,
            Some(line) if line.is_empty() => break,
            Some(line) => line,
        };
        let wire: WireChunk = serde_json::from_str(&line).map_err(|e| {
            let _ = drain_stream(reader);
            HostError::from(e)
        })?;
        let chunk = wire.parse().map_err(|e| {
            let _ = drain_stream(reader);
            e
        })?;
        chunks.push(chunk);
    }

    Ok(Some(Stream { metadata, chunks }))
}

fn parse_metadata(line: &str) -> Result<StreamMetadata, HostError> {
    let wire: WireMetadata = serde_json::from_str(line)?;
    let protocol = Transport::from_str(&wire.protocol)
        .ok_or_else(|| HostError::BadProtocol(wire.protocol.clone()))?;
    Ok(StreamMetadata {
        stream_id: wire.stream_id,
        client_host: wire.client_host,
        client_port: wire.client_port,
        server_host: wire.server_host,
        server_port: wire.server_port,
        protocol,
    })
}

/// Write one stream's result: chunk lines, blank line, `{}`, flush.
pub fn write_result(writer: &mut impl Write, chunks: &[Chunk]) -> std::io::Result<()> {
    for chunk in chunks {
        let line = serde_json::to_string(&WireChunk::from_chunk(chunk))
            .expect("chunk serialization is infallible");
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.write_all(b"\n{}\n")?;
    writer.flush()
}

/// Answer a failed conversation with a single explanatory chunk so the
/// host still receives a well-formed result.
pub fn write_error_result(writer: &mut impl Write, error: &HostError) -> std::io::Result<()> {
    let chunk = Chunk::new(
        Direction::ClientToServer,
        format!("flowdec: {error}").into_bytes(),
    );
    write_result(writer, &[chunk])
}

/// Read one line without the trailing newline. `None` on EOF.
fn read_line(reader: &mut impl BufRead) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Consume the rest of a conversation up to its blank terminator.
fn drain_stream(reader: &mut impl BufRead) -> std::io::Result<()> {
    while let Some(line) = read_line(reader)? {
        if line.is_empty() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(lines: &[&str]) -> Vec<u8> {
        let mut out = lines.join("\n").into_bytes();
        out.push(b'\n');
        out
    }

    #[test]
    fn read_one_stream() {
        let input = conversation(&[
            r#"{"StreamID": 7, "ClientHost": "10.0.0.1", "ClientPort": 40000, "ServerHost": "10.0.0.2", "ServerPort": 80, "Protocol": "TCP"}"#,
            r#"{"Direction": "client-to-server", "Content": "R0VUIC8=", "Time": "2024-05-01T12:00:00.123456"}"#,
            r#"{"Direction": "server-to-client", "Content": "T0s="}"#,
            "",
        ]);
        let mut reader = input.as_slice();
        let stream = read_stream(&mut reader).unwrap().unwrap();
        assert_eq!(stream.metadata.stream_id, 7);
        assert_eq!(stream.metadata.protocol, Transport::Tcp);
        assert_eq!(stream.chunks.len(), 2);
        assert_eq!(stream.chunks[0].content, b"GET /");
        assert!(stream.chunks[0].time.is_some());
        assert_eq!(stream.chunks[1].direction, Direction::ServerToClient);
        assert_eq!(stream.chunks[1].time, None);

        // EOF afterwards.
        assert!(read_stream(&mut reader).unwrap().is_none());
    }

    #[test]
    fn eof_returns_none() {
        let mut reader: &[u8] = b"";
        assert!(read_stream(&mut reader).unwrap().is_none());
    }

    #[test]
    fn unknown_direction_is_error_and_drains() {
        let input = conversation(&[
            r#"{"StreamID": 1, "ClientHost": "a", "ClientPort": 1, "ServerHost": "b", "ServerPort": 2, "Protocol": "TCP"}"#,
            r#"{"Direction": "sideways", "Content": ""}"#,
            r#"{"Direction": "client-to-server", "Content": ""}"#,
            "",
        ]);
        let mut reader = input.as_slice();
        assert!(matches!(
            read_stream(&mut reader),
            Err(HostError::BadDirection(_))
        ));
        // The conversation was drained: next read hits EOF cleanly.
        assert!(read_stream(&mut reader).unwrap().is_none());
    }

    #[test]
    fn bad_base64_is_error() {
        let input = conversation(&[
            r#"{"StreamID": 1, "ClientHost": "a", "ClientPort": 1, "ServerHost": "b", "ServerPort": 2, "Protocol": "TCP"}"#,
            r#"{"Direction": "client-to-server", "Content": "!!!"}"#,
            "",
        ]);
        let mut reader = input.as_slice();
        assert!(matches!(
            read_stream(&mut reader),
            Err(HostError::BadContent(_))
        ));
    }

    #[test]
    fn write_result_format() {
        let chunks = vec![Chunk::new(Direction::ServerToClient, b"OK".as_slice())];
        let mut out = Vec::new();
        write_result(&mut out, &chunks).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            r#"{"Direction":"server-to-client","Content":"T0s="}"#
        );
        assert_eq!(lines.next().unwrap(), "");
        assert_eq!(lines.next().unwrap(), "{}");
        assert!(lines.next().is_none());
    }

    #[test]
    fn timestamp_round_trip() {
        let wire = WireChunk {
            direction: "client-to-server".into(),
            content: String::new(),
            time: Some("2024-05-01T12:00:00.000007".into()),
        };
        let chunk = wire.parse().unwrap();
        let back = WireChunk::from_chunk(&chunk);
        assert_eq!(back.time.as_deref(), Some("2024-05-01T12:00:00.000007"));
    }

    #[test]
    fn empty_result_still_terminates() {
        let mut out = Vec::new();
        write_result(&mut out, &[]).unwrap();
        assert_eq!(out, b"\n{}\n");
    }
}
