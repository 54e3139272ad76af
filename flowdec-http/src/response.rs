//! HTTP/1 response parsing and body framing.
//!
//! Responses get the full treatment: chunked transfer decoding,
//! content-length framing, and content-encoding inflation, so the caller
//! sees the logical body. A truncated body is reported as
//! [`HttpError::IncompleteRead`] -- cut-off captures are normal and the
//! UI wants them labeled as such, not as parse failures.

use std::io::Read;

use bytes::{Bytes, BytesMut};

use crate::error::HttpError;
use crate::headers::Headers;
use crate::request::split_head;

/// A parsed HTTP/1 response with the logical (decoded) body.
#[derive(Debug)]
pub struct Response {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    /// Body after transfer-encoding and content-encoding are undone.
    pub body: Bytes,
    /// The raw header bytes as captured (for re-emission).
    pub head: Vec<u8>,
}

impl Response {
    /// Parse one captured server chunk as a response.
    pub fn parse(data: &[u8]) -> Result<Self, HttpError> {
        let (head, raw_body) = split_head(data)
            .ok_or_else(|| HttpError::BadResponse("no header terminator".into()))?;
        let head_text = std::str::from_utf8(head)
            .map_err(|_| HttpError::BadResponse("header bytes are not UTF-8".into()))?;

        let mut lines = head_text.split("\r\n");
        let status_line = lines
            .next()
            .ok_or_else(|| HttpError::BadResponse("empty response".into()))?;
        let mut parts = status_line.splitn(3, ' ');
        let version = parts
            .next()
            .filter(|v| v.starts_with("HTTP/"))
            .ok_or_else(|| HttpError::BadResponse(format!("bad status line: {status_line:?}")))?;
        let status: u16 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| HttpError::BadResponse(format!("bad status line: {status_line:?}")))?;
        let reason = parts.next().unwrap_or("");

        let headers = Headers::parse_lines(lines).map_err(HttpError::BadResponse)?;

        let framed = frame_body(&headers, raw_body)?;
        let body = decode_content_encoding(&headers, framed)?;

        Ok(Self {
            version: version.to_string(),
            status,
            reason: reason.to_string(),
            headers,
            body: body.freeze(),
            head: head.to_vec(),
        })
    }
}

/// Apply transfer-encoding / content-length framing to the raw body.
fn frame_body(headers: &Headers, raw: &[u8]) -> Result<BytesMut, HttpError> {
    let chunked = headers
        .get_all("transfer-encoding")
        .any(|v| v.to_ascii_lowercase().split(',').any(|t| t.trim() == "chunked"));
    if chunked {
        return decode_chunked(raw);
    }

    if let Some(cl) = headers.get("content-length") {
        let cl: usize = cl
            .trim()
            .parse()
            .map_err(|_| HttpError::BadResponse(format!("bad content-length: {cl:?}")))?;
        if raw.len() < cl {
            return Err(HttpError::IncompleteRead);
        }
        return Ok(BytesMut::from(&raw[..cl]));
    }

    Ok(BytesMut::from(raw))
}

/// Decode a chunked transfer-encoded body. A body that ends before the
/// zero-length terminator chunk is an incomplete read.
fn decode_chunked(mut data: &[u8]) -> Result<BytesMut, HttpError> {
    let mut out = BytesMut::new();
    loop {
        let crlf = find_crlf(data).ok_or(HttpError::IncompleteRead)?;
        let size_line = std::str::from_utf8(&data[..crlf])
            .map_err(|_| HttpError::BadChunkSize("size line is not UTF-8".into()))?;
        // Strip chunk extensions (;key=value).
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| HttpError::BadChunkSize(size_hex.to_string()))?;

        if size == 0 {
            // Terminator chunk; trailers (if any) are ignored.
            return Ok(out);
        }

        let chunk_start = crlf + 2;
        let chunk_end = chunk_start + size;
        // Chunk data plus its trailing \r\n must be present.
        if data.len() < chunk_end + 2 {
            return Err(HttpError::IncompleteRead);
        }
        out.extend_from_slice(&data[chunk_start..chunk_end]);
        data = &data[chunk_end + 2..];
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    (0..data.len().saturating_sub(1)).find(|&i| data[i] == b'\r' && data[i + 1] == b'\n')
}

/// Undo Content-Encoding. `deflate` on the wire is usually zlib-wrapped
/// but some servers send a bare deflate stream; try zlib first, then raw.
fn decode_content_encoding(headers: &Headers, body: BytesMut) -> Result<BytesMut, HttpError> {
    let encoding = match headers.get("content-encoding") {
        Some(e) => e.trim().to_ascii_lowercase(),
        None => return Ok(body),
    };
    match encoding.as_str() {
        "gzip" | "x-gzip" => {
            let mut decoder = flate2::read::GzDecoder::new(&body[..]);
            let mut decoded = Vec::new();
            decoder
                .read_to_end(&mut decoded)
                .map_err(|e| HttpError::Decode(format!("gzip: {e}")))?;
            Ok(BytesMut::from(&decoded[..]))
        }
        "deflate" => {
            let mut decoded = Vec::new();
            let zlib_ok = flate2::read::ZlibDecoder::new(&body[..])
                .read_to_end(&mut decoded)
                .is_ok();
            if !zlib_ok {
                decoded.clear();
                flate2::read::DeflateDecoder::new(&body[..])
                    .read_to_end(&mut decoded)
                    .map_err(|e| HttpError::Decode(format!("deflate: {e}")))?;
            }
            Ok(BytesMut::from(&decoded[..]))
        }
        // Unknown encodings pass through untouched; the UI still gets
        // the raw bytes.
        _ => Ok(body),
    }
}
