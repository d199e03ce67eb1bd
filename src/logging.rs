//! Non-blocking event log for the pipeline.
//!
//! # Architecture
//!
//! ```text
//! ISR / tasks             EventLog               drain
//! ───────────             ────────               ─────
//!
//! ev_info!() ─────────▶ [E0][E1][E2] ─────────▶ stderr / log UART
//! no alloc                lock-free              blocking ok
//! never blocks            ring buffer            any context
//! ```
//!
//! # Rules
//!
//! - The receive path never calls a blocking log function.
//! - `println!` is not used by pipeline stages; they use `ev_*!` macros.
//! - Entries are dropped (and counted) when the ring is full.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 80;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Which execution context produced an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LogSource {
    Isr = 0,
    Decoder = 1,
    Dispatcher = 2,
    Writer = 3,
    Menu = 4,
    Timer = 5,
    Pipeline = 6,
}

impl LogSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LogSource::Isr => "isr",
            LogSource::Decoder => "decoder",
            LogSource::Dispatcher => "dispatcher",
            LogSource::Writer => "writer",
            LogSource::Menu => "menu",
            LogSource::Timer => "timer",
            LogSource::Pipeline => "pipeline",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Microseconds since the log was created.
    pub timestamp_us: i64,
    pub level: LogLevel,
    pub source: LogSource,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    pub const EMPTY: LogEntry = LogEntry {
        timestamp_us: 0,
        level: LogLevel::Info,
        source: LogSource::Pipeline,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text. Invalid UTF-8 yields a placeholder.
    pub fn text(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free event log (multiple producers, single consumer).
///
/// - Producers reserve a slot with a CAS on `write_idx`
/// - A slot becomes visible to the drain only after its `ready` flag is set
/// - Push never blocks (drops message if full)
pub struct EventLog<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    ready: [AtomicBool; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    epoch: Instant,
}

// SAFETY: A slot is written only by the producer that reserved it and read
// only by the single drain after `ready` is published with Release.
unsafe impl<const N: usize> Sync for EventLog<N> {}
unsafe impl<const N: usize> Send for EventLog<N> {}

impl<const N: usize> EventLog<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log. Timestamps count from now.
    pub fn new() -> Self {
        const { assert!(N.is_power_of_two(), "Log buffer size must be power of 2") };

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            ready: core::array::from_fn(|_| AtomicBool::new(false)),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            epoch: Instant::now(),
        }
    }

    /// Microseconds since this log was created.
    #[inline]
    pub fn now_us(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(i64::MAX)
    }

    /// Push a log entry (never blocks).
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    pub fn push(&self, timestamp_us: i64, level: LogLevel, source: LogSource, msg: &[u8]) -> bool {
        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: Slot `idx` was reserved by the CAS above and is not
        // published yet, so neither producers nor the drain touch it.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.source = source;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        self.ready[idx].store(true, Ordering::Release);
        true
    }

    /// Drain next log entry (single consumer).
    ///
    /// Returns `None` if no published entry is available.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;
        if !self.ready[idx].load(Ordering::Acquire) {
            // Reserved but still being written
            return None;
        }

        // SAFETY: Slot is published and only the single drain reads it
        let entry = unsafe { (*self.entries.get())[idx] };

        self.ready[idx].store(false, Ordering::Relaxed);
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for EventLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer, truncating at capacity.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = SliceWriter::new(buf);
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// `core::fmt::Write` over a fixed byte slice.
///
/// Silently truncates on a char boundary; nothing is written after the
/// first cut, so `buf[..pos]` is always valid UTF-8.
pub(crate) struct SliceWriter<'a> {
    pub(crate) buf: &'a mut [u8],
    pub(crate) pos: usize,
    full: bool,
}

impl<'a> SliceWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0, full: false }
    }
}

impl core::fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        if self.full {
            return Ok(());
        }
        let remaining = self.buf.len() - self.pos;
        let mut to_write = s.len().min(remaining);
        if to_write < s.len() {
            while !s.is_char_boundary(to_write) {
                to_write -= 1;
            }
            self.full = true;
        }
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&s.as_bytes()[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Non-blocking log macro.
///
/// # Example
///
/// ```ignore
/// ev_log!(LogLevel::Info, LogSource::Decoder, log, "code {}", code);
/// ```
#[macro_export]
macro_rules! ev_log {
    ($level:expr, $source:expr, $log:expr, $($arg:tt)*) => {{
        let log = &$log;
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        log.push(log.now_us(), $level, $source, &buf[..len]);
    }};
}

#[macro_export]
macro_rules! ev_info {
    ($source:expr, $log:expr, $($arg:tt)*) => {
        $crate::ev_log!($crate::logging::LogLevel::Info, $source, $log, $($arg)*)
    };
}

#[macro_export]
macro_rules! ev_warn {
    ($source:expr, $log:expr, $($arg:tt)*) => {
        $crate::ev_log!($crate::logging::LogLevel::Warn, $source, $log, $($arg)*)
    };
}

#[macro_export]
macro_rules! ev_error {
    ($source:expr, $log:expr, $($arg:tt)*) => {
        $crate::ev_log!($crate::logging::LogLevel::Error, $source, $log, $($arg)*)
    };
}

#[macro_export]
macro_rules! ev_debug {
    ($source:expr, $log:expr, $($arg:tt)*) => {
        $crate::ev_log!($crate::logging::LogLevel::Debug, $source, $log, $($arg)*)
    };
}

/// Maximum verbosity.
#[macro_export]
macro_rules! ev_trace {
    ($source:expr, $log:expr, $($arg:tt)*) => {
        $crate::ev_log!($crate::logging::LogLevel::Trace, $source, $log, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_basic() {
        let log = EventLog::<16>::new();

        assert!(log.push(1000, LogLevel::Info, LogSource::Decoder, b"test message"));
        assert_eq!(log.pending(), 1);

        let entry = log.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.source, LogSource::Decoder);
        assert_eq!(entry.text(), "test message");

        assert!(log.drain().is_none());
    }

    #[test]
    fn test_event_log_full() {
        let log = EventLog::<4>::new();

        assert!(log.push(1, LogLevel::Info, LogSource::Isr, b"1"));
        assert!(log.push(2, LogLevel::Info, LogSource::Isr, b"2"));
        assert!(log.push(3, LogLevel::Info, LogSource::Isr, b"3"));
        assert!(log.push(4, LogLevel::Info, LogSource::Isr, b"4"));

        // Should drop
        assert!(!log.push(5, LogLevel::Info, LogSource::Isr, b"5"));
        assert_eq!(log.dropped(), 1);

        // Drain one, should be able to push again
        assert_eq!(log.drain().unwrap().text(), "1");
        assert!(log.push(6, LogLevel::Info, LogSource::Isr, b"6"));

        let rest: Vec<i64> = core::iter::from_fn(|| log.drain()).map(|e| e.timestamp_us).collect();
        assert_eq!(rest, vec![2, 3, 4, 6]);
    }

    #[test]
    fn test_macro_formats_into_log() {
        let log = EventLog::<8>::new();
        crate::ev_warn!(LogSource::Dispatcher, log, "invalid code {}", 9);

        let entry = log.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.source, LogSource::Dispatcher);
        assert_eq!(entry.text(), "invalid code 9");
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 5];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello");
    }

    #[test]
    fn test_multiple_producers() {
        use std::sync::Arc;
        use std::thread;

        let log = Arc::new(EventLog::<64>::new());
        let mut handles = vec![];

        for i in 0..4 {
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    let msg = format!("Thread {} msg {}", i, j);
                    assert!(log.push(j as i64, LogLevel::Info, LogSource::Pipeline, msg.as_bytes()));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while log.drain().is_some() {
            count += 1;
        }
        assert_eq!(count, 40, "All messages should be present");
    }

    #[test]
    fn test_concurrent_stress_never_exceeds_capacity() {
        use std::sync::Arc;
        use std::thread;

        let log = Arc::new(EventLog::<32>::new());
        let mut handles = vec![];

        for i in 0..8 {
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let msg = format!("T{}-{}", i, j);
                    let _ = log.push((i * 100 + j) as i64, LogLevel::Debug, LogSource::Timer, msg.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0u32;
        while log.drain().is_some() {
            count += 1;
        }

        assert!(count > 0);
        assert!(count <= 32);
        assert_eq!(count + log.dropped(), 800);
    }
}
