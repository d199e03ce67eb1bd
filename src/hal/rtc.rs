//! Real-time clock readout.

use chrono::{Datelike, Timelike, Utc};

use crate::error::PipelineError;

/// Calendar date and time of day (24h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl DateTime {
    /// Seconds since the Unix epoch (UTC). `None` outside chrono's range.
    pub fn from_unix(secs: i64) -> Option<Self> {
        chrono::DateTime::from_timestamp(secs, 0).map(Self::from)
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(t: chrono::DateTime<Utc>) -> Self {
        Self {
            year: t.year().clamp(0, i32::from(u16::MAX)) as u16,
            month: t.month() as u8,
            day: t.day() as u8,
            hours: t.hour() as u8,
            minutes: t.minute() as u8,
            seconds: t.second() as u8,
        }
    }
}

pub trait Rtc: Send {
    fn now(&self) -> Result<DateTime, PipelineError>;
}

/// Wall clock from the system time (SNTP-synced on the board).
pub struct SystemRtc;

impl Rtc for SystemRtc {
    fn now(&self) -> Result<DateTime, PipelineError> {
        Ok(DateTime::from(Utc::now()))
    }
}

/// Clock frozen at one instant.
pub struct FixedRtc(pub DateTime);

impl Rtc for FixedRtc {
    fn now(&self) -> Result<DateTime, PipelineError> {
        Ok(self.0)
    }
}
