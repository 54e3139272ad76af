//! Per-stream decoding pipeline.
//!
//! Every stream starts in the HTTP/1 layer. A stream may hand off
//! control exactly once, to HTTP/2 (h2c upgrade or connection preface)
//! or to WebSocket (validated 101 handshake); the transition is
//! permanent and the prior layer never runs again for that stream.
//!
//! Nothing in here propagates an error to the caller: every failure
//! degrades to an explanatory output chunk so the host receives output
//! for every input chunk.

use flowdec_grpc::GrpcDecoder;
use flowdec_h2::frame::PREFACE;
use flowdec_h2::Frame;
use flowdec_http::{split_head, upgrade, Request, Response};
use flowdec_ws::WsDecoder;

use crate::chunk::{coalesce, Chunk, Direction};
use crate::config::Config;
use crate::stream::Stream;

/// Decode one captured stream into display chunks.
pub fn decode_stream(stream: &Stream, config: &Config) -> Vec<Chunk> {
    let mut decoder = StreamDecoder::new(config.clone());
    let mut out = Vec::new();
    for chunk in coalesce(&stream.chunks) {
        out.extend(decoder.decode_chunk(&chunk));
    }
    out
}

/// The currently active layer plus its state.
enum Active {
    Http1,
    H2(H2State),
    Ws(WsState),
}

struct H2State {
    dec: GrpcDecoder,
    /// Set when the layer was activated by an h2c upgrade request: the
    /// server's first bytes are still an HTTP/1 101 header that must be
    /// stripped before framing starts.
    awaiting_switch_header: bool,
    client_failed: bool,
    server_failed: bool,
}

struct WsState {
    dec: WsDecoder,
    failed: bool,
}

/// Per-stream decoder state. Constructed fresh per stream and discarded
/// at stream end; nothing survives across streams.
pub struct StreamDecoder {
    config: Config,
    active: Active,
    ws_key: Option<Vec<u8>>,
}

impl StreamDecoder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            active: Active::Http1,
            ws_key: None,
        }
    }

    /// Decode one (coalesced) chunk through the active layer.
    pub fn decode_chunk(&mut self, chunk: &Chunk) -> Vec<Chunk> {
        match &mut self.active {
            Active::Http1 => match chunk.direction {
                Direction::ClientToServer => self.http1_client_chunk(chunk),
                Direction::ServerToClient => self.http1_server_chunk(chunk),
            },
            Active::H2(_) => self.h2_chunk(chunk),
            Active::Ws(_) => self.ws_chunk(chunk),
        }
    }

    // -- HTTP/1 layer --

    fn http1_client_chunk(&mut self, chunk: &Chunk) -> Vec<Chunk> {
        if chunk.content.starts_with(PREFACE) {
            // Prior-knowledge HTTP/2: no HTTP/1 handshake at all.
            self.active = Active::H2(H2State {
                dec: GrpcDecoder::new(self.config.max_frame_size),
                awaiting_switch_header: false,
                client_failed: false,
                server_failed: false,
            });
            return self.h2_chunk(chunk);
        }

        let request = match Request::parse(&chunk.content) {
            Ok(r) => r,
            Err(e) => {
                return vec![error_chunk(
                    chunk,
                    &format!("Unable to parse HTTP request: {e}"),
                    Some(&chunk.content),
                )]
            }
        };

        match upgrade::request_upgrade(&request) {
            Some(upgrade::UpgradeProtocol::H2c) => {
                let mut out = vec![chunk.clone()];
                let mut state = H2State {
                    dec: GrpcDecoder::new(self.config.max_frame_size),
                    awaiting_switch_header: true,
                    client_failed: false,
                    server_failed: false,
                };
                // A synthetic SETTINGS frame decodes the HTTP2-Settings
                // header before any real frame arrives.
                if let Some(value) = request.headers.get("http2-settings") {
                    out.push(render_settings_header(chunk, value, &mut state));
                }
                self.active = Active::H2(state);
                out
            }
            Some(upgrade::UpgradeProtocol::Websocket) => {
                match request.headers.get("sec-websocket-key") {
                    Some(key) => {
                        self.ws_key = Some(key.as_bytes().to_vec());
                        vec![chunk.clone()]
                    }
                    None => vec![error_chunk(chunk, "No websocket key found", None)],
                }
            }
            None => vec![chunk.clone()],
        }
    }

    fn http1_server_chunk(&mut self, chunk: &Chunk) -> Vec<Chunk> {
        let response = match Response::parse(&chunk.content) {
            Ok(r) => r,
            // IncompleteRead keeps its distinct "incomplete read" label
            // through Display; expected for truncated captures.
            Err(e) => {
                return vec![error_chunk(
                    chunk,
                    &format!("Unable to parse HTTP response: {e}"),
                    Some(&chunk.content),
                )]
            }
        };

        match upgrade::response_upgrade(&response) {
            Some(upgrade::UpgradeProtocol::Websocket) => self.websocket_switch(chunk, &response),
            Some(upgrade::UpgradeProtocol::H2c) => {
                // An h2c acceptance is only reachable here when no
                // upgrade request was seen (otherwise the HTTP/2 layer
                // already owns the stream).
                vec![error_chunk(
                    chunk,
                    "Unable to parse HTTP response: HTTP/2 upgrade request not found",
                    None,
                )]
            }
            None => {
                let mut content = response.head.clone();
                content.extend_from_slice(b"\r\n\r\n");
                content.extend_from_slice(&response.body);
                vec![chunk.with_content(content)]
            }
        }
    }

    /// Validated 101: switch the stream to the WebSocket layer. Any
    /// bytes after the 101 header are already WebSocket frames.
    fn websocket_switch(&mut self, chunk: &Chunk, response: &Response) -> Vec<Chunk> {
        let key = match &self.ws_key {
            Some(k) => k.clone(),
            None => {
                return vec![error_chunk(
                    chunk,
                    "Unable to parse HTTP response: no websocket key found",
                    None,
                )]
            }
        };
        let accept = response
            .headers
            .get("sec-websocket-accept")
            .unwrap_or_default();
        if let Err(e) = flowdec_ws::verify_accept(&key, accept) {
            return vec![error_chunk(
                chunk,
                &format!("Unable to parse HTTP response: {e}"),
                None,
            )];
        }

        let deflate = response
            .headers
            .get("sec-websocket-extensions")
            .and_then(flowdec_ws::negotiate_extensions);
        let mut state = WsState {
            dec: WsDecoder::new(deflate, self.config.fragment_cap),
            failed: false,
        };

        let mut content = response.head.clone();
        content.extend_from_slice(b"\r\n\r\n");
        let mut out = Vec::new();
        if !response.body.is_empty() {
            match state.dec.decode_chunk(ws_origin(chunk.direction), &response.body) {
                Ok(decoded) => content.extend_from_slice(&decoded),
                Err(e) => {
                    state.failed = true;
                    out.push(error_chunk(
                        chunk,
                        &format!("Error while handling websocket frame: {e}"),
                        None,
                    ));
                }
            }
        }
        out.insert(0, chunk.with_content(content));
        self.active = Active::Ws(state);
        out
    }

    // -- HTTP/2 layer --

    fn h2_chunk(&mut self, chunk: &Chunk) -> Vec<Chunk> {
        let Active::H2(state) = &mut self.active else {
            unreachable!("h2_chunk called outside the HTTP/2 layer");
        };
        let origin = h2_origin(chunk.direction);

        let failed = match origin {
            flowdec_grpc::Origin::Client => &mut state.client_failed,
            flowdec_grpc::Origin::Server => &mut state.server_failed,
        };
        if *failed {
            // Framing already desynchronized: raw passthrough.
            return vec![chunk.clone()];
        }

        let mut out = Vec::new();
        let mut data: &[u8] = &chunk.content;
        if matches!(origin, flowdec_grpc::Origin::Server) && state.awaiting_switch_header {
            state.awaiting_switch_header = false;
            // The 101 Switching Protocols header precedes the first
            // frame; emit it as-is and frame the remainder.
            if chunk.content.starts_with(b"HTTP/") {
                if let Some((head, rest)) = split_head(&chunk.content) {
                    let mut content = head.to_vec();
                    content.extend_from_slice(b"\r\n\r\n");
                    out.push(chunk.with_content(content));
                    data = rest;
                }
            }
        }

        match state.dec.push(origin, data) {
            Ok(lines) => {
                for line in lines {
                    out.push(chunk.with_content(format!("{line}\n").into_bytes()));
                }
            }
            Err(e) => {
                let what = match chunk.direction {
                    Direction::ClientToServer => "request",
                    Direction::ServerToClient => "response",
                };
                let failed = match origin {
                    flowdec_grpc::Origin::Client => &mut state.client_failed,
                    flowdec_grpc::Origin::Server => &mut state.server_failed,
                };
                *failed = true;
                out.push(error_chunk(
                    chunk,
                    &format!("Unable to parse HTTP2 {what}: {e}"),
                    None,
                ));
            }
        }
        out
    }

    // -- WebSocket layer --

    fn ws_chunk(&mut self, chunk: &Chunk) -> Vec<Chunk> {
        let Active::Ws(state) = &mut self.active else {
            unreachable!("ws_chunk called outside the WebSocket layer");
        };
        if state.failed {
            return vec![chunk.clone()];
        }
        match state.dec.decode_chunk(ws_origin(chunk.direction), &chunk.content) {
            Ok(decoded) => vec![chunk.with_content(decoded)],
            Err(e) => {
                state.failed = true;
                vec![error_chunk(
                    chunk,
                    &format!("Error while handling websocket frame: {e}"),
                    None,
                )]
            }
        }
    }
}

fn h2_origin(direction: Direction) -> flowdec_grpc::Origin {
    match direction {
        Direction::ClientToServer => flowdec_grpc::Origin::Client,
        Direction::ServerToClient => flowdec_grpc::Origin::Server,
    }
}

fn ws_origin(direction: Direction) -> flowdec_ws::Origin {
    match direction {
        Direction::ClientToServer => flowdec_ws::Origin::Client,
        Direction::ServerToClient => flowdec_ws::Origin::Server,
    }
}

/// Decode an `HTTP2-Settings` header value into a rendered synthetic
/// SETTINGS frame chunk.
fn render_settings_header(chunk: &Chunk, value: &str, state: &mut H2State) -> Chunk {
    let payload = match upgrade::decode_http2_settings(value) {
        Ok(p) => p,
        Err(e) => return error_chunk(chunk, &format!("Unable to parse HTTP request: {e}"), None),
    };
    let pairs = match flowdec_h2::settings::decode_pairs(&payload) {
        Ok(p) => p,
        Err(e) => return error_chunk(chunk, &format!("Unable to parse HTTP request: {e}"), None),
    };
    let frame = Frame::Settings { flags: 0, pairs };
    match state.dec.render(flowdec_grpc::Origin::Client, &frame) {
        Ok(line) => chunk.with_content(format!("{line}\n").into_bytes()),
        Err(e) => error_chunk(chunk, &format!("Unable to parse HTTP request: {e}"), None),
    }
}

/// Build an explanatory chunk: message, optionally followed by the raw
/// bytes it refers to.
fn error_chunk(source: &Chunk, message: &str, raw: Option<&[u8]>) -> Chunk {
    let mut content = message.as_bytes().to_vec();
    if let Some(raw) = raw {
        content.push(b'\n');
        content.extend_from_slice(raw);
    }
    source.with_content(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamMetadata, Transport};

    fn meta() -> StreamMetadata {
        StreamMetadata {
            stream_id: 1,
            client_host: "10.0.0.1".into(),
            client_port: 40000,
            server_host: "10.0.0.2".into(),
            server_port: 80,
            protocol: Transport::Tcp,
        }
    }

    fn stream(chunks: Vec<Chunk>) -> Stream {
        Stream {
            metadata: meta(),
            chunks,
        }
    }

    fn client(content: &[u8]) -> Chunk {
        Chunk::new(Direction::ClientToServer, content)
    }

    fn server(content: &[u8]) -> Chunk {
        Chunk::new(Direction::ServerToClient, content)
    }

    #[test]
    fn plain_http1_round_trip() {
        let s = stream(vec![
            client(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"),
            server(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi"),
        ]);
        let out = decode_stream(&s, &Config::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].content, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(
            out[1].content,
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi"
        );
    }

    #[test]
    fn bad_request_gets_error_prefix() {
        let s = stream(vec![client(b"\xde\xad\xbe\xef")]);
        let out = decode_stream(&s, &Config::default());
        assert_eq!(out.len(), 1);
        assert!(out[0]
            .content
            .starts_with(b"Unable to parse HTTP request:"));
        assert!(out[0].content.ends_with(b"\xde\xad\xbe\xef"));
    }

    #[test]
    fn truncated_chunked_response_reports_incomplete_read() {
        let s = stream(vec![server(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhel",
        )]);
        let out = decode_stream(&s, &Config::default());
        assert!(out[0]
            .content
            .starts_with(b"Unable to parse HTTP response: incomplete read"));
    }

    #[test]
    fn chunk_direction_and_time_preserved() {
        use chrono::NaiveDate;
        let t = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut c = client(b"GET / HTTP/1.1\r\n\r\n");
        c.time = Some(t);
        let out = decode_stream(&stream(vec![c]), &Config::default());
        assert_eq!(out[0].direction, Direction::ClientToServer);
        assert_eq!(out[0].time, Some(t));
    }
}
