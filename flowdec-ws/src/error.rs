/// Errors produced while decoding a captured WebSocket stream.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// A frame header or payload extends past the captured bytes.
    #[error("truncated websocket frame")]
    Truncated,
    /// The 101 response's accept digest does not match the request key.
    #[error("invalid websocket accept digest: {got:?} != {expected:?}")]
    BadAcceptDigest { got: String, expected: String },
    /// The upgrade request carried no Sec-WebSocket-Key.
    #[error("no websocket key found")]
    MissingKey,
    /// A new message started while fragments of another were pending.
    #[error("invalid fragmented message")]
    InvalidFragment,
    /// The pending-fragment queue exceeded its cap.
    #[error("fragmented message too long")]
    FragmentedTooLong,
    /// Inflating a compressed message failed.
    #[error("permessage-deflate inflate failed: {0}")]
    Inflate(String),
}
