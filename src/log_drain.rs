//! Event log output.
//!
//! Formats drained entries as `[timestamp_us] LEVEL source: message` and
//! writes them to any `core::fmt::Write` sink. On the host the sink is
//! stderr; on the board it is the log UART.

use core::fmt::Write;

use crate::logging::{EventLog, LogEntry};

/// Format log entry to a buffer.
///
/// Returns the number of bytes written.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = crate::logging::SliceWriter::new(buf);

    let _ = write!(
        writer,
        "[{:10}] {}: {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.source.as_str(),
        entry.text()
    );

    writer.pos
}

/// Drain every published entry into `out`.
///
/// Returns the number of entries written. A dropped-entry warning is
/// appended (and the counter reset) when entries were lost.
pub fn drain_into<const N: usize>(log: &EventLog<N>, out: &mut dyn Write) -> usize {
    let mut format_buf = [0u8; 160];
    let mut written = 0;

    while let Some(entry) = log.drain() {
        let len = format_log_entry(&entry, &mut format_buf);
        let line = &format_buf[..len];
        let line = match core::str::from_utf8(line) {
            Ok(line) => line,
            Err(e) => core::str::from_utf8(&line[..e.valid_up_to()]).unwrap_or_default(),
        };
        let _ = out.write_str(line);
        written += 1;
    }

    let dropped = log.dropped();
    if dropped > 0 {
        let _ = writeln!(out, "[WARN] Dropped: {}", dropped);
        log.reset_dropped();
    }

    written
}

/// Adapter so `std::io::Write` sinks (stderr, files) can take drained logs.
pub struct IoSink<W: std::io::Write>(pub W);

impl<W: std::io::Write> Write for IoSink<W> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.write_all(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}
