//! Directional byte chunks and coalescing.
//!
//! Captured TCP segmentation has no relation to protocol message
//! boundaries, so adjacent chunks flowing the same way are merged into
//! one logical chunk before parsing. Coalescing is lazy and restartable:
//! the iterator borrows the slice and a fresh call starts over.

use chrono::NaiveDateTime;

/// Which way a chunk flowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl Direction {
    /// The wire name used by the host protocol.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientToServer => "client-to-server",
            Self::ServerToClient => "server-to-client",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "client-to-server" => Some(Self::ClientToServer),
            "server-to-client" => Some(Self::ServerToClient),
            _ => None,
        }
    }
}

/// One directional slice of captured bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub direction: Direction,
    pub content: Vec<u8>,
    pub time: Option<NaiveDateTime>,
}

impl Chunk {
    pub fn new(direction: Direction, content: impl Into<Vec<u8>>) -> Self {
        Self {
            direction,
            content: content.into(),
            time: None,
        }
    }

    /// Derive a copy with different content; direction and time carry
    /// over unchanged.
    pub fn with_content(&self, content: impl Into<Vec<u8>>) -> Self {
        Self {
            direction: self.direction,
            content: content.into(),
            time: self.time,
        }
    }

    /// Derive a copy flowing the other way or re-tagged.
    pub fn with_direction(&self, direction: Direction) -> Self {
        Self {
            direction,
            content: self.content.clone(),
            time: self.time,
        }
    }

    /// Derive a copy with a different timestamp.
    pub fn with_time(&self, time: Option<NaiveDateTime>) -> Self {
        Self {
            direction: self.direction,
            content: self.content.clone(),
            time,
        }
    }
}

/// Lazily merge consecutive same-direction chunks. Each merged chunk
/// carries the earliest timestamp of its run.
pub fn coalesce(chunks: &[Chunk]) -> Coalesce<'_> {
    Coalesce { chunks, pos: 0 }
}

/// Iterator returned by [`coalesce`].
#[derive(Clone)]
pub struct Coalesce<'a> {
    chunks: &'a [Chunk],
    pos: usize,
}

impl Iterator for Coalesce<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let first = self.chunks.get(self.pos)?;
        let mut merged = first.clone();
        self.pos += 1;
        while let Some(next) = self.chunks.get(self.pos) {
            if next.direction != merged.direction {
                break;
            }
            merged.content.extend_from_slice(&next.content);
            // Keep the earliest timestamp of the run; a later untimed
            // chunk never clears an earlier time.
            if merged.time.is_none() {
                merged.time = next.time;
            }
            self.pos += 1;
        }
        Some(merged)
    }
}
