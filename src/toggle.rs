//! Periodic LED toggle controller.
//!
//! ```text
//!   Uncreated ──start──► Running ◄──start/stop──► Stopped
//! ```
//!
//! One software timer, created on the first start and reused afterwards.
//! Starting a running timer and stopping a timer that never ran are no-ops.
//! The timer is deleted when the controller is dropped.

use core::time::Duration;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::fault::{FaultCode, FaultState};
use crate::hal::{PeriodicTimer, SharedActuator, TimerService};
use crate::logging::{EventLog, LogSource};
use crate::stats::{Counter, PipelineStats};
use crate::{ev_debug, ev_error, ev_info};

pub const TIMER_NAME: &str = "LED-Timer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Uncreated,
    Running,
    Stopped,
}

pub struct ToggleController {
    timers: Box<dyn TimerService>,
    timer: Option<Box<dyn PeriodicTimer>>,
    state: ToggleState,
    period: Duration,
    command_timeout: Duration,
    actuator: SharedActuator,
    stats: Arc<PipelineStats>,
    fault: Arc<FaultState>,
    log: Arc<EventLog>,
}

impl ToggleController {
    pub fn new(
        timers: Box<dyn TimerService>,
        period: Duration,
        command_timeout: Duration,
        actuator: SharedActuator,
        stats: Arc<PipelineStats>,
        fault: Arc<FaultState>,
        log: Arc<EventLog>,
    ) -> Self {
        Self {
            timers,
            timer: None,
            state: ToggleState::Uncreated,
            period,
            command_timeout,
            actuator,
            stats,
            fault,
            log,
        }
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    /// Start toggling. Creates the timer on first use.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.state == ToggleState::Running {
            return Ok(());
        }

        if self.timer.is_none() {
            let callback = self.callback();
            let timer = self.timers.create(TIMER_NAME, self.period, callback)?;
            self.timer = Some(timer);
            self.state = ToggleState::Stopped;
            ev_debug!(LogSource::Timer, self.log, "timer created, {}ms", self.period.as_millis());
        }

        if let Some(timer) = self.timer.as_mut() {
            timer.start(self.command_timeout)?;
            self.state = ToggleState::Running;
            ev_info!(LogSource::Timer, self.log, "toggle started");
        }
        Ok(())
    }

    /// Stop toggling. No-op unless running.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        if self.state != ToggleState::Running {
            return Ok(());
        }

        if let Some(timer) = self.timer.as_mut() {
            timer.stop(self.command_timeout)?;
            self.state = ToggleState::Stopped;
            ev_info!(LogSource::Timer, self.log, "toggle stopped");
        }
        Ok(())
    }

    fn callback(&self) -> crate::hal::TimerCallback {
        let actuator = self.actuator.clone();
        let stats = Arc::clone(&self.stats);
        let fault = Arc::clone(&self.fault);
        let log = Arc::clone(&self.log);

        Box::new(move || match actuator.toggle() {
            Ok(()) => stats.bump(Counter::TimerToggles),
            Err(e) => {
                fault.set(FaultCode::from_error(e), 0);
                ev_error!(LogSource::Timer, log, "toggle failed: {}", e);
            }
        })
    }
}

impl Drop for ToggleController {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            drop(timer);
            ev_debug!(LogSource::Timer, self.log, "timer deleted");
        }
    }
}
