//! Background fault register.
//!
//! Tasks that cannot talk to the user directly (the decoder, the timer
//! daemon) record their last failure here. The dispatcher reads it after
//! each command, reports it on the serial line, and clears it.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::error::PipelineError;

/// Fault codes for background failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// A line longer than the receive buffer was rejected. Only used for the
    /// report text; the dispatcher sees the overflow on the command itself.
    LineOverflow = 1,

    /// Command pool had no free slot, the line was discarded.
    /// Data: pool capacity.
    PoolExhausted = 2,

    /// Command queue stayed full past the configured bound.
    /// Data: queue depth.
    CommandQueueTimeout = 3,

    /// Timer service did not accept a start/stop in time.
    TimerTimeout = 4,

    /// Actuator could not be driven by the timer callback.
    ActuatorUnavailable = 5,

    /// A completed line was replaced by the next one before the decoder
    /// took it. Data: lines replaced so far.
    LineCoalesced = 6,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::LineOverflow,
            2 => FaultCode::PoolExhausted,
            3 => FaultCode::CommandQueueTimeout,
            4 => FaultCode::TimerTimeout,
            5 => FaultCode::ActuatorUnavailable,
            6 => FaultCode::LineCoalesced,
            _ => FaultCode::None,
        }
    }

    /// Fault code for a pipeline error raised in a background task.
    pub fn from_error(err: PipelineError) -> Self {
        match err {
            PipelineError::LineOverflow => FaultCode::LineOverflow,
            PipelineError::PoolExhausted => FaultCode::PoolExhausted,
            PipelineError::QueueFull => FaultCode::CommandQueueTimeout,
            PipelineError::TimerCommandTimeout | PipelineError::TimerUnavailable => {
                FaultCode::TimerTimeout
            }
            PipelineError::ActuatorUnavailable => FaultCode::ActuatorUnavailable,
            _ => FaultCode::None,
        }
    }

    /// User-facing text pushed by the dispatcher.
    pub fn report(self) -> &'static str {
        match self {
            FaultCode::None => "",
            FaultCode::LineOverflow => "\r\n Command too long, discarded.!",
            FaultCode::PoolExhausted => "\r\n Out of memory, command dropped.!",
            FaultCode::CommandQueueTimeout => "\r\n Busy, command dropped.!",
            FaultCode::TimerTimeout => "\r\n Timer busy, try again.!",
            FaultCode::ActuatorUnavailable => "\r\n LED unavailable.!",
            FaultCode::LineCoalesced => "\r\n Command lost, typed too fast.!",
        }
    }
}

/// Thread-safe fault state.
///
/// Set from any task, read and cleared by the dispatcher.
pub struct FaultState {
    /// True if fault is active.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Additional data (meaning depends on code).
    data: AtomicU32,

    /// Total fault count since start (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Set fault state. Overwrites any fault not yet reported.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Check if fault is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Get fault data.
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Get total fault count since start.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Take the active fault, clearing it. Counter is preserved.
    #[inline]
    pub fn take(&self) -> Option<FaultSnapshot> {
        if !self.active.swap(false, Ordering::AcqRel) {
            return None;
        }
        Some(FaultSnapshot {
            code: self.code(),
            data: self.data(),
            count: self.count(),
        })
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// A fault taken out of the register.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}
