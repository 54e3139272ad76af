//! Decoder configuration.

/// Tunables for one decoding pipeline. One instance serves one stream;
/// nothing here is mutated mid-stream.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum HTTP/2 frame size accepted by the per-direction frame
    /// buffers. Fixed for the stream's lifetime: SETTINGS frames
    /// renegotiating it are rendered but not applied.
    pub max_frame_size: u32,
    /// Cap on pending WebSocket fragments before the message is declared
    /// malformed and the queue dropped.
    pub fragment_cap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_frame_size: flowdec_h2::DEFAULT_MAX_FRAME_SIZE,
            fragment_cap: flowdec_ws::DEFAULT_FRAGMENT_CAP,
        }
    }
}
