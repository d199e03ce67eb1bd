//! Serial output messages
//!
//! Fixed texts are `&'static str`; formatted ones (RTC readout, error
//! reports) are built into a fixed-capacity string and truncated if needed.

use core::fmt::{self, Write};

use heapless::String;

use crate::config::MESSAGE_CAPACITY;
use crate::hal::rtc::DateTime;

/// Command menu, printed on start and after every completed line.
pub const MENU: &str = "\
\r\nLED_ON\t\t\t---> 1 \
\r\nLED_OFF\t\t\t---> 2 \
\r\nLED_TOGGLE\t\t---> 3 \
\r\nLED_TOGGLE_OFF\t\t---> 4 \
\r\nLED_READ_STATUS\t\t---> 5 \
\r\nRTC_PRINT_DATETIME\t---> 6 \
\r\nEXIT_APP\t\t---> 0 \
\r\nType your option here: ";

pub const LED_ON_MSG: &str = "\r\n LED is ON!! \r\n";
pub const LED_OFF_MSG: &str = "\r\n LED is OFF!! \r\n";
pub const INVALID_MSG: &str = "\r\n Invalid command.!";

/// One entry of the output queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Static(&'static str),
    Text(String<MESSAGE_CAPACITY>),
}

impl Message {
    /// Format into an owned message, truncating at `MESSAGE_CAPACITY`.
    pub fn format(args: fmt::Arguments<'_>) -> Self {
        let mut text = String::new();
        let _ = Truncating(&mut text).write_fmt(args);
        Message::Text(text)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Message::Static(s) => s,
            Message::Text(s) => s.as_str(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }
}

impl From<&'static str> for Message {
    fn from(s: &'static str) -> Self {
        Message::Static(s)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Truncating<'a>(&'a mut String<MESSAGE_CAPACITY>);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// LED status line.
pub fn led_status(on: bool) -> Message {
    Message::Static(if on { LED_ON_MSG } else { LED_OFF_MSG })
}

/// RTC readout, `HH:MM:SS` and `DD/MM/YYYY`.
pub fn format_datetime(dt: &DateTime) -> Message {
    Message::format(format_args!(
        "\r\n Time: {:02}:{:02}:{:02} \r\n Date: {:02}/{:02}/{:04} \r\n",
        dt.hours, dt.minutes, dt.seconds, dt.day, dt.month, dt.year
    ))
}
