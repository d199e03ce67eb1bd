//! Software timer service.
//!
//! Start and stop are commands to the timer daemon and take a finite bound;
//! a daemon that does not accept the command in time yields
//! `TimerCommandTimeout`. Dropping the timer deletes it.

use core::time::Duration;

use crate::error::PipelineError;

/// Periodic callback, invoked with no argument once per period.
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

pub trait TimerService: Send {
    /// Create a periodic (auto-reload) timer in the dormant state.
    fn create(
        &mut self,
        name: &'static str,
        period: Duration,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, PipelineError>;
}

pub trait PeriodicTimer: Send {
    /// Arm the timer; the first expiry is one period from now.
    fn start(&mut self, wait: Duration) -> Result<(), PipelineError>;

    /// Disarm the timer. Stopping a dormant timer is not an error.
    fn stop(&mut self, wait: Duration) -> Result<(), PipelineError>;
}
