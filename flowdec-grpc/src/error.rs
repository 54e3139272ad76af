/// Per-frame gRPC decode failures. These never abort the stream: the
/// offending DATA frame is rendered with the error and siblings continue.
#[derive(Debug, thiserror::Error)]
pub enum GrpcError {
    /// The frame is shorter than the 5-byte message prefix.
    #[error("data length is less than 5 bytes")]
    ShortPrefix,
    /// The compression flag is non-zero; compressed messages are not
    /// supported.
    #[error("compressed grpc data is not supported")]
    Compressed,
    /// The declared message length does not match the frame's remainder.
    #[error("message length does not match the length of the message data")]
    LengthMismatch,
    /// The frame carries bytes beyond the declared message.
    #[error("message data is longer than the message length")]
    TrailingBytes,
}
