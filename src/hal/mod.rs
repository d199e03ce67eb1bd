//! Hardware abstraction layer.
//!
//! Narrow traits for the four collaborators the pipeline touches: LED
//! actuator, serial line, RTC, software timers. `sim` backs the host build
//! and tests, `esp` the board.

pub mod actuator;
pub mod rtc;
pub mod serial;
pub mod sim;
pub mod timer;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use actuator::{Actuator, SharedActuator};
pub use rtc::{DateTime, FixedRtc, Rtc, SystemRtc};
pub use serial::{IoSerial, RxControl, SerialTx};
pub use timer::{PeriodicTimer, TimerCallback, TimerService};
