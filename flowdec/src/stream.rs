//! Captured stream model.

use crate::chunk::Chunk;

/// Transport protocol of a captured stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TCP" => Some(Self::Tcp),
            "UDP" => Some(Self::Udp),
            _ => None,
        }
    }
}

/// Endpoint and identity metadata for one captured stream.
#[derive(Debug, Clone)]
pub struct StreamMetadata {
    pub stream_id: u64,
    pub client_host: String,
    pub client_port: u16,
    pub server_host: String,
    pub server_port: u16,
    pub protocol: Transport,
}

/// One capture unit: metadata plus the ordered chunk sequence. Read-only
/// once received.
#[derive(Debug, Clone)]
pub struct Stream {
    pub metadata: StreamMetadata,
    pub chunks: Vec<Chunk>,
}
