//! Host protocol conversation tests: line JSON in, line JSON out.

use base64::Engine;

use flowdec::{decode_stream, host, Config};

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn metadata_line() -> String {
    r#"{"StreamID": 3, "ClientHost": "10.1.1.1", "ClientPort": 39000, "ServerHost": "10.1.1.2", "ServerPort": 80, "Protocol": "TCP"}"#.to_string()
}

fn chunk_line(direction: &str, content: &[u8]) -> String {
    format!(
        r#"{{"Direction": "{direction}", "Content": "{}"}}"#,
        b64(content)
    )
}

/// Run one full conversation through read -> decode -> write.
fn converse(input: &str) -> String {
    let mut reader = input.as_bytes();
    let mut output = Vec::new();
    loop {
        match host::read_stream(&mut reader) {
            Ok(None) => break,
            Ok(Some(stream)) => {
                let result = decode_stream(&stream, &Config::default());
                host::write_result(&mut output, &result).unwrap();
            }
            Err(e) => host::write_error_result(&mut output, &e).unwrap(),
        }
    }
    String::from_utf8(output).unwrap()
}

#[test]
fn passthrough_stream_round_trips() {
    let input = format!(
        "{}\n{}\n{}\n\n",
        metadata_line(),
        chunk_line("client-to-server", b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"),
        chunk_line("server-to-client", b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi"),
    );
    let output = converse(&input);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains(&b64(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")));
    assert!(lines[1].contains("server-to-client"));
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], "{}");
}

#[test]
fn multiple_streams_in_one_conversation() {
    let one = format!(
        "{}\n{}\n\n",
        metadata_line(),
        chunk_line("client-to-server", b"GET /a HTTP/1.1\r\n\r\n")
    );
    let two = format!(
        "{}\n{}\n\n",
        metadata_line(),
        chunk_line("client-to-server", b"GET /b HTTP/1.1\r\n\r\n")
    );
    let output = converse(&format!("{one}{two}"));
    // Two results, each terminated by a blank line and `{}`.
    assert_eq!(output.matches("\n{}\n").count(), 2);
}

#[test]
fn decoder_state_resets_between_streams() {
    // Stream 1 upgrades to WebSocket; stream 2 must start back at
    // HTTP/1 with no leftover key or layer state.
    let ws = format!(
        "{}\n{}\n{}\n\n",
        metadata_line(),
        chunk_line(
            "client-to-server",
            b"GET / HTTP/1.1\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n"
        ),
        chunk_line(
            "server-to-client",
            b"HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n"
        ),
    );
    let plain = format!(
        "{}\n{}\n\n",
        metadata_line(),
        chunk_line("client-to-server", b"GET /fresh HTTP/1.1\r\n\r\n")
    );
    let output = converse(&format!("{ws}{plain}"));
    let results: Vec<&str> = output.split("\n{}\n").collect();
    assert!(results[1].contains(&b64(b"GET /fresh HTTP/1.1\r\n\r\n")));
}

#[test]
fn empty_stream_yields_empty_result() {
    let input = format!("{}\n\n", metadata_line());
    let output = converse(&input);
    assert_eq!(output, "\n{}\n");
}

#[test]
fn malformed_chunk_line_answered_with_error_chunk() {
    let input = format!(
        "{}\n{}\n{}\n\n",
        metadata_line(),
        r#"{"Direction": "sideways", "Content": ""}"#,
        chunk_line("client-to-server", b"x"),
    );
    let output = converse(&input);
    let first_line = output.lines().next().unwrap();
    let decoded = b64_decode_content(first_line);
    assert!(String::from_utf8_lossy(&decoded).contains("unknown direction"));
    assert!(output.ends_with("\n{}\n"));
}

#[test]
fn unknown_transport_answered_with_error_chunk() {
    let metadata = r#"{"StreamID": 1, "ClientHost": "a", "ClientPort": 1, "ServerHost": "b", "ServerPort": 2, "Protocol": "SCTP"}"#;
    let output = converse(&format!("{metadata}\n\n"));
    let decoded = b64_decode_content(output.lines().next().unwrap());
    assert!(String::from_utf8_lossy(&decoded).contains("unknown protocol"));
}

fn b64_decode_content(line: &str) -> Vec<u8> {
    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    base64::engine::general_purpose::STANDARD
        .decode(value["Content"].as_str().unwrap())
        .unwrap()
}
