//! WebSocket opening handshake validation (RFC 6455 Section 4) and
//! Sec-WebSocket-Extensions parsing (RFC 6455 Section 9.1).

use base64::Engine;
use sha1::{Digest, Sha1};

use crate::error::WsError;

/// The fixed GUID appended to the client key before hashing
/// (RFC 6455 Section 1.3).
const WEBSOCKET_GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Compute the expected `Sec-WebSocket-Accept` value for a client key.
pub fn accept_digest(key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key);
    hasher.update(WEBSOCKET_GUID);
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Verify the server's accept digest against the request key. A mismatch
/// is a hard error for the stream.
pub fn verify_accept(key: &[u8], accept: &str) -> Result<(), WsError> {
    let expected = accept_digest(key);
    if accept != expected {
        return Err(WsError::BadAcceptDigest {
            got: accept.to_string(),
            expected,
        });
    }
    Ok(())
}

/// One parsed extension: name plus `k[=v]` parameters. A parameter
/// without a value keeps `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    pub params: Vec<(String, Option<String>)>,
}

impl Extension {
    pub fn param(&self, name: &str) -> Option<&Option<String>> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Parse a `Sec-WebSocket-Extensions` header value:
/// `ext-name; p1=v1; p2="v2", other-ext; flag, third-ext`.
/// Names and parameters are lowercased; quoted values are unquoted.
pub fn parse_extensions(header: &str) -> Vec<Extension> {
    let mut extensions = Vec::new();
    for raw in header.split(',') {
        let raw = raw.trim().to_ascii_lowercase();
        if raw.is_empty() {
            continue;
        }
        let mut parts = raw.split(';');
        let name = match parts.next() {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => continue,
        };
        let mut params = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            match param.split_once('=') {
                Some((k, v)) => {
                    let v = v.trim();
                    let v = v
                        .strip_prefix('"')
                        .and_then(|s| s.strip_suffix('"'))
                        .unwrap_or(v);
                    params.push((k.trim().to_string(), Some(v.to_string())));
                }
                None => params.push((param.to_string(), None)),
            }
        }
        extensions.push(Extension { name, params });
    }
    extensions
}

/// Negotiated permessage-deflate parameters (RFC 7692 Section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateParams {
    pub server_max_window_bits: u8,
    pub client_max_window_bits: u8,
}

impl Default for DeflateParams {
    fn default() -> Self {
        Self {
            server_max_window_bits: 15,
            client_max_window_bits: 15,
        }
    }
}

/// Read the response's extension header and pick out permessage-deflate.
/// Other extensions are logged and ignored.
pub fn negotiate_extensions(header: &str) -> Option<DeflateParams> {
    let extensions = parse_extensions(header);
    let mut params = None;
    for ext in &extensions {
        if ext.name == "permessage-deflate" {
            params = Some(deflate_params(ext));
        } else {
            tracing::warn!(extension = %ext.name, "unsupported websocket extension ignored");
        }
    }
    params
}

/// Extract permessage-deflate parameters from a parsed extension.
/// Missing or unparseable window-bit values keep the default of 15.
pub fn deflate_params(ext: &Extension) -> DeflateParams {
    let mut params = DeflateParams::default();
    if let Some(Some(v)) = ext.param("server_max_window_bits") {
        if let Ok(bits) = v.parse() {
            params.server_max_window_bits = bits;
        }
    }
    if let Some(Some(v)) = ext.param("client_max_window_bits") {
        if let Ok(bits) = v.parse() {
            params.client_max_window_bits = bits;
        }
    }
    params
}
