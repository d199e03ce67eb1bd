//! Pipeline counters.
//!
//! Relaxed atomics only; these are diagnostics, not synchronization.

use core::sync::atomic::{AtomicU32, Ordering};

/// Running counters shared by all pipeline stages.
#[derive(Default)]
pub struct PipelineStats {
    bytes_received: AtomicU32,
    bytes_dropped: AtomicU32,
    lines_completed: AtomicU32,
    lines_coalesced: AtomicU32,
    lines_overflowed: AtomicU32,
    commands_decoded: AtomicU32,
    commands_dispatched: AtomicU32,
    commands_invalid: AtomicU32,
    timer_toggles: AtomicU32,
}

/// Counter selector for [`PipelineStats::bump`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    BytesReceived,
    BytesDropped,
    LinesCompleted,
    LinesCoalesced,
    LinesOverflowed,
    CommandsDecoded,
    CommandsDispatched,
    CommandsInvalid,
    TimerToggles,
}

impl PipelineStats {
    pub const fn new() -> Self {
        Self {
            bytes_received: AtomicU32::new(0),
            bytes_dropped: AtomicU32::new(0),
            lines_completed: AtomicU32::new(0),
            lines_coalesced: AtomicU32::new(0),
            lines_overflowed: AtomicU32::new(0),
            commands_decoded: AtomicU32::new(0),
            commands_dispatched: AtomicU32::new(0),
            commands_invalid: AtomicU32::new(0),
            timer_toggles: AtomicU32::new(0),
        }
    }

    fn slot(&self, counter: Counter) -> &AtomicU32 {
        match counter {
            Counter::BytesReceived => &self.bytes_received,
            Counter::BytesDropped => &self.bytes_dropped,
            Counter::LinesCompleted => &self.lines_completed,
            Counter::LinesCoalesced => &self.lines_coalesced,
            Counter::LinesOverflowed => &self.lines_overflowed,
            Counter::CommandsDecoded => &self.commands_decoded,
            Counter::CommandsDispatched => &self.commands_dispatched,
            Counter::CommandsInvalid => &self.commands_invalid,
            Counter::TimerToggles => &self.timer_toggles,
        }
    }

    #[inline]
    pub fn bump(&self, counter: Counter) {
        self.slot(counter).fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self, counter: Counter) -> u32 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    /// Copy all counters at once.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_received: self.get(Counter::BytesReceived),
            bytes_dropped: self.get(Counter::BytesDropped),
            lines_completed: self.get(Counter::LinesCompleted),
            lines_coalesced: self.get(Counter::LinesCoalesced),
            lines_overflowed: self.get(Counter::LinesOverflowed),
            commands_decoded: self.get(Counter::CommandsDecoded),
            commands_dispatched: self.get(Counter::CommandsDispatched),
            commands_invalid: self.get(Counter::CommandsInvalid),
            timer_toggles: self.get(Counter::TimerToggles),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub bytes_received: u32,
    pub bytes_dropped: u32,
    pub lines_completed: u32,
    pub lines_coalesced: u32,
    pub lines_overflowed: u32,
    pub commands_decoded: u32,
    pub commands_dispatched: u32,
    pub commands_invalid: u32,
    pub timer_toggles: u32,
}

impl core::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "rx={} dropped={} lines={} coalesced={} overflowed={} decoded={} dispatched={} invalid={} toggles={}",
            self.bytes_received,
            self.bytes_dropped,
            self.lines_completed,
            self.lines_coalesced,
            self.lines_overflowed,
            self.commands_decoded,
            self.commands_dispatched,
            self.commands_invalid,
            self.timer_toggles,
        )
    }
}
