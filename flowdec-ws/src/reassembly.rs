//! Fragmented message reassembly (RFC 6455 Section 5.4).
//!
//! Data frames with fin=0 queue up until the fin=1 continuation arrives;
//! the reassembled message reuses the first fragment's header with FIN
//! forced on. The queue is bounded: a capture replaying a pathological
//! peer must not buffer without limit.

use crate::error::WsError;
use crate::frame::WsFrame;

/// Default cap on pending fragments per stream.
pub const DEFAULT_FRAGMENT_CAP: usize = 50;

/// Per-stream fragment queue.
pub struct Reassembler {
    pending: Vec<WsFrame>,
    cap: usize,
}

impl Reassembler {
    pub fn new(cap: usize) -> Self {
        Self {
            pending: Vec::new(),
            cap,
        }
    }

    /// Feed one data frame.
    ///
    /// Returns `Ok(None)` while a message is accumulating, or
    /// `Ok(Some(frame))` with a complete logical frame. Contract
    /// violations clear the queue and fail the message: a fresh opcode
    /// while fragments are pending, or more than `cap` pending
    /// fragments.
    pub fn push(&mut self, frame: WsFrame) -> Result<Option<WsFrame>, WsError> {
        if !frame.fin() {
            if !self.pending.is_empty() && frame.opcode() != 0 {
                self.pending.clear();
                return Err(WsError::InvalidFragment);
            }
            self.pending.push(frame);
            if self.pending.len() > self.cap {
                self.pending.clear();
                return Err(WsError::FragmentedTooLong);
            }
            return Ok(None);
        }

        if self.pending.is_empty() {
            return Ok(Some(frame));
        }

        // Terminating continuation: must carry opcode 0.
        if frame.opcode() != 0 {
            self.pending.clear();
            return Err(WsError::InvalidFragment);
        }
        self.pending.push(frame);

        let mut merged = WsFrame {
            header: self.pending[0].header.clone(),
            payload: Vec::new(),
        };
        for fragment in &self.pending {
            merged.payload.extend_from_slice(&fragment.payload);
        }
        // The header's length field now disagrees with the payload; only
        // the flag bits matter downstream.
        merged.set_fin();
        self.pending.clear();
        Ok(Some(merged))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_frame(fin: bool, opcode: u8, payload: &[u8]) -> WsFrame {
        WsFrame {
            header: vec![
                if fin { 0x80 } else { 0x00 } | opcode,
                payload.len() as u8,
            ],
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn unfragmented_passes_through() {
        let mut r = Reassembler::new(DEFAULT_FRAGMENT_CAP);
        let out = r.push(data_frame(true, 0x1, b"solo")).unwrap().unwrap();
        assert_eq!(out.payload, b"solo");
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn three_fragments_reassemble() {
        let mut r = Reassembler::new(DEFAULT_FRAGMENT_CAP);
        assert!(r.push(data_frame(false, 0x1, b"P1")).unwrap().is_none());
        assert!(r.push(data_frame(false, 0x0, b"P2")).unwrap().is_none());
        let out = r.push(data_frame(true, 0x0, b"P3")).unwrap().unwrap();
        assert_eq!(out.payload, b"P1P2P3");
        assert!(out.fin());
        assert_eq!(out.opcode(), 0x1, "merged frame keeps the first header");
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn fresh_opcode_while_pending_fails() {
        let mut r = Reassembler::new(DEFAULT_FRAGMENT_CAP);
        r.push(data_frame(false, 0x1, b"P1")).unwrap();
        let err = r.push(data_frame(false, 0x2, b"P2")).unwrap_err();
        assert!(matches!(err, WsError::InvalidFragment));
        assert_eq!(r.pending_len(), 0, "queue cleared on failure");
    }

    #[test]
    fn final_frame_with_fresh_opcode_while_pending_fails() {
        let mut r = Reassembler::new(DEFAULT_FRAGMENT_CAP);
        r.push(data_frame(false, 0x1, b"P1")).unwrap();
        let err = r.push(data_frame(true, 0x1, b"P2")).unwrap_err();
        assert!(matches!(err, WsError::InvalidFragment));
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn cap_exceeded_fails_and_clears() {
        let mut r = Reassembler::new(50);
        for i in 0..50 {
            let opcode = if i == 0 { 0x1 } else { 0x0 };
            assert!(r.push(data_frame(false, opcode, b"x")).unwrap().is_none());
        }
        let err = r.push(data_frame(false, 0x0, b"x")).unwrap_err();
        assert!(matches!(err, WsError::FragmentedTooLong));
        assert_eq!(r.pending_len(), 0);
    }
}
