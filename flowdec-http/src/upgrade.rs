//! Protocol-upgrade signaling (RFC 7230 Section 6.7).
//!
//! Detection only: whether a captured request or response announces a
//! switch to h2c or WebSocket. Acting on it (handing the stream to the
//! next layer) is the pipeline driver's job.

use base64::Engine;

use crate::headers::Headers;
use crate::request::Request;
use crate::response::Response;

/// Protocol announced by an upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeProtocol {
    H2c,
    Websocket,
}

/// Does the `Connection` header's comma-separated token list contain
/// `Upgrade`?
fn connection_has_upgrade(headers: &Headers) -> bool {
    headers.get_all("connection").any(|v| {
        v.split(',')
            .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
    })
}

/// Check a request for upgrade signaling
/// (<https://httpwg.org/specs/rfc7540.html#discover-http>).
pub fn request_upgrade(request: &Request) -> Option<UpgradeProtocol> {
    if !connection_has_upgrade(&request.headers) {
        return None;
    }
    match request.headers.get("upgrade") {
        Some(v) if v.eq_ignore_ascii_case("h2c") => Some(UpgradeProtocol::H2c),
        Some(v) if v.eq_ignore_ascii_case("websocket") => Some(UpgradeProtocol::Websocket),
        _ => None,
    }
}

/// Check a response for the matching switch. Only a 101 accepts a
/// WebSocket upgrade; h2c switches are also announced via 101 but the
/// original deployments were lax about the status code, so only the
/// headers are checked there.
pub fn response_upgrade(response: &Response) -> Option<UpgradeProtocol> {
    if !connection_has_upgrade(&response.headers) {
        return None;
    }
    match response.headers.get("upgrade") {
        Some(v) if v.eq_ignore_ascii_case("h2c") => Some(UpgradeProtocol::H2c),
        Some(v) if v.eq_ignore_ascii_case("websocket") && response.status == 101 => {
            Some(UpgradeProtocol::Websocket)
        }
        _ => None,
    }
}

/// Decode an `HTTP2-Settings` header value (base64url, padding optional)
/// into the raw SETTINGS frame payload it carries.
pub fn decode_http2_settings(value: &str) -> Result<Vec<u8>, String> {
    let trimmed = value.trim().trim_end_matches('=');
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| format!("invalid HTTP2-Settings value: {e}"))
}
