/// Errors produced while parsing captured HTTP/1 messages.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request line or a request header line is malformed.
    #[error("malformed request: {0}")]
    BadRequest(String),
    /// The status line or a response header line is malformed.
    #[error("malformed response: {0}")]
    BadResponse(String),
    /// The capture ended before the body did (truncated chunked stream
    /// or short content-length body). Expected for cut-off captures and
    /// reported distinctly from a parse failure.
    #[error("incomplete read")]
    IncompleteRead,
    /// A chunked-transfer chunk size line is not valid hex.
    #[error("invalid chunk size: {0}")]
    BadChunkSize(String),
    /// Content-Encoding inflation failed.
    #[error("content decoding failed: {0}")]
    Decode(String),
}
