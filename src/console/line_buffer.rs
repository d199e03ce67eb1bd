//! Receive line buffer

use crate::config::LINE_CAPACITY;
use crate::error::PipelineError;

/// Line input buffer with a write cursor.
///
/// The cursor never passes `LINE_CAPACITY`. Bytes arriving after that are
/// counted and discarded; the line is then reported as overflowed.
pub struct LineBuffer {
    buf: [u8; LINE_CAPACITY],
    len: usize,
    dropped: u16,
}

impl LineBuffer {
    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0u8; LINE_CAPACITY],
            len: 0,
            dropped: 0,
        }
    }

    /// Push a byte at the cursor
    pub fn push(&mut self, c: u8) -> Result<(), PipelineError> {
        if self.len < LINE_CAPACITY {
            self.buf[self.len] = c;
            self.len += 1;
            Ok(())
        } else {
            self.dropped = self.dropped.saturating_add(1);
            Err(PipelineError::LineOverflow)
        }
    }

    /// Reset cursor and overflow state
    pub fn clear(&mut self) {
        self.len = 0;
        self.dropped = 0;
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Current cursor position
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes discarded since the last clear
    pub fn dropped(&self) -> u16 {
        self.dropped
    }

    pub fn is_overflowed(&self) -> bool {
        self.dropped > 0
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
