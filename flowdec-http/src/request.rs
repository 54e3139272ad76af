//! HTTP/1 request parsing.

use crate::error::HttpError;
use crate::headers::Headers;

/// A parsed HTTP/1 request. The body is everything after the header
/// terminator -- captures segment messages per chunk, so no request-side
/// body framing is applied.
#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    /// Parse one captured client chunk as a request.
    pub fn parse(data: &[u8]) -> Result<Self, HttpError> {
        let (head, body) = split_head(data)
            .ok_or_else(|| HttpError::BadRequest("no header terminator".into()))?;
        let head = std::str::from_utf8(head)
            .map_err(|_| HttpError::BadRequest("header bytes are not UTF-8".into()))?;

        let mut lines = head.split("\r\n");
        let request_line = lines
            .next()
            .ok_or_else(|| HttpError::BadRequest("empty request".into()))?;
        let mut parts = request_line.split(' ');
        let method = parts
            .next()
            .filter(|m| !m.is_empty() && m.bytes().all(|b| b.is_ascii_uppercase() || b == b'-'))
            .ok_or_else(|| HttpError::BadRequest(format!("bad request line: {request_line:?}")))?;
        let target = parts
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| HttpError::BadRequest(format!("bad request line: {request_line:?}")))?;
        let version = parts
            .next()
            .filter(|v| v.starts_with("HTTP/"))
            .ok_or_else(|| HttpError::BadRequest(format!("bad request line: {request_line:?}")))?;
        if parts.next().is_some() {
            return Err(HttpError::BadRequest(format!(
                "bad request line: {request_line:?}"
            )));
        }

        let headers = Headers::parse_lines(lines).map_err(HttpError::BadRequest)?;

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
            headers,
            body: body.to_vec(),
        })
    }
}

/// Split a message at the first `\r\n\r\n`. Returns (head, body).
pub fn split_head(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = (0..data.len().saturating_sub(3)).find(|&i| {
        data[i] == b'\r' && data[i + 1] == b'\n' && data[i + 2] == b'\r' && data[i + 3] == b'\n'
    })?;
    Some((&data[..pos], &data[pos + 4..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get() {
        let req = Request::parse(b"GET /path?q=1 HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.target, "/path?q=1");
        assert_eq!(req.version, "HTTP/1.1");
        assert_eq!(req.headers.get("host"), Some("example.com"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn parse_post_with_body() {
        let req =
            Request::parse(b"POST /submit HTTP/1.1\r\nContent-Length: 4\r\n\r\nab\x00d").unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.body, b"ab\x00d");
    }

    #[test]
    fn missing_terminator_rejected() {
        assert!(matches!(
            Request::parse(b"GET / HTTP/1.1\r\nHost: x\r\n"),
            Err(HttpError::BadRequest(_))
        ));
    }

    #[test]
    fn binary_garbage_rejected() {
        assert!(Request::parse(b"\x16\x03\x01\x02\x00\r\n\r\n").is_err());
    }

    #[test]
    fn lowercase_method_rejected() {
        assert!(Request::parse(b"get / HTTP/1.1\r\n\r\n").is_err());
    }
}
