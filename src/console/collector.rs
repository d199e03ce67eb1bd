//! Line collector (receive interrupt side).
//!
//! Called once per received byte. Everything here runs inside a
//! `critical_section::with` window: append, or on `'\r'` latch the line
//! and reset the cursor. No blocking, no heap.
//!
//! Only the latest completed line is kept. If a second line completes
//! before the decoder took the first, the first is replaced and the
//! outcome says so; this mirrors the single-slot wake that signals it.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;

use crate::config::{LINE_CAPACITY, LINE_TERMINATOR};

use super::line_buffer::LineBuffer;

/// A terminated line handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedLine {
    /// Bytes before the terminator.
    pub bytes: Vec<u8, LINE_CAPACITY>,
    /// Bytes discarded because the buffer was full.
    pub dropped: u16,
}

impl CompletedLine {
    pub fn is_overflowed(&self) -> bool {
        self.dropped > 0
    }
}

/// What the collector did with one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOutcome {
    /// Appended at the cursor.
    Stored,
    /// Buffer full, byte discarded.
    Dropped,
    /// Terminator seen, line latched, cursor back at zero.
    LineComplete {
        /// An untaken line was replaced.
        coalesced: bool,
        overflowed: bool,
    },
}

struct CollectorState {
    line: LineBuffer,
    completed: Option<CompletedLine>,
}

pub struct LineCollector {
    state: Mutex<RefCell<CollectorState>>,
}

impl LineCollector {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(CollectorState {
                line: LineBuffer::new(),
                completed: None,
            })),
        }
    }

    /// Feed one received byte.
    pub fn receive(&self, byte: u8) -> ByteOutcome {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);

            if byte != LINE_TERMINATOR {
                return match state.line.push(byte) {
                    Ok(()) => ByteOutcome::Stored,
                    Err(_) => ByteOutcome::Dropped,
                };
            }

            let mut bytes = Vec::new();
            // Cannot fail: LineBuffer never holds more than LINE_CAPACITY
            let _ = bytes.extend_from_slice(state.line.as_bytes());
            let line = CompletedLine { bytes, dropped: state.line.dropped() };
            let overflowed = line.is_overflowed();

            state.line.clear();
            let coalesced = state.completed.replace(line).is_some();

            ByteOutcome::LineComplete { coalesced, overflowed }
        })
    }

    /// Take the latched line, if any.
    pub fn take_line(&self) -> Option<CompletedLine> {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).completed.take())
    }

    /// Cursor position of the line being assembled.
    pub fn cursor(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).line.len())
    }

    /// Bytes of the line being assembled, copied out.
    pub fn partial_line(&self) -> Vec<u8, LINE_CAPACITY> {
        critical_section::with(|cs| {
            let mut out = Vec::new();
            let _ = out.extend_from_slice(self.state.borrow_ref(cs).line.as_bytes());
            out
        })
    }

    pub fn has_pending_line(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).completed.is_some())
    }
}

impl Default for LineCollector {
    fn default() -> Self {
        Self::new()
    }
}
