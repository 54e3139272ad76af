/// HTTP/2 error codes (RFC 7540 Section 7), as seen in RST_STREAM and
/// GOAWAY frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl ErrorCode {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            _ => Self::InternalError,
        }
    }
}

/// Errors produced while decoding a captured HTTP/2 byte stream.
#[derive(Debug)]
pub enum H2Error {
    /// The client-origin bytes do not start with the connection preface.
    BadPreface,
    /// Received a frame that violates the protocol.
    ProtocolError(String),
    /// A frame's declared length exceeds the maximum frame size, or a
    /// fixed-size frame payload has the wrong length.
    FrameSizeError,
    /// HPACK header block decoding failed; compression state is lost for
    /// the rest of the connection.
    CompressionError,
}

impl std::fmt::Display for H2Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadPreface => write!(f, "invalid HTTP/2 connection preface"),
            Self::ProtocolError(s) => write!(f, "protocol error: {s}"),
            Self::FrameSizeError => write!(f, "frame size error"),
            Self::CompressionError => write!(f, "HPACK compression error"),
        }
    }
}

impl std::error::Error for H2Error {}
