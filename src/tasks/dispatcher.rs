//! Command dispatcher task.
//!
//! Consumes one Command per iteration and frees it after the match,
//! whatever the branch did. This is the single place where a failure turns
//! into text on the serial line: command errors right away, background
//! faults (decoder, timer callback) after the command that follows them.

use crate::config::PipelineConfig;
use crate::console::messages::{format_datetime, led_status, INVALID_MSG};
use crate::console::{Command, CommandKind, Message, PooledCommand};
use crate::error::{PipelineError, WaitBound};
use crate::fault::FaultCode;
use crate::hal::{Rtc, RxControl, SharedActuator, TimerService};
use crate::logging::LogSource;
use crate::pipeline::Context;
use crate::stats::Counter;
use crate::toggle::{ToggleController, ToggleState};
use crate::{ev_debug, ev_info, ev_warn};

/// What the dispatch loop does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Dispatcher {
    ctx: Context,
    actuator: SharedActuator,
    rtc: Box<dyn Rtc>,
    toggle: ToggleController,
    rx_control: Box<dyn RxControl>,
    recv_wait: WaitBound,
    send_wait: WaitBound,
}

impl Dispatcher {
    pub fn new(
        ctx: Context,
        config: &PipelineConfig,
        actuator: SharedActuator,
        rtc: Box<dyn Rtc>,
        timers: Box<dyn TimerService>,
        rx_control: Box<dyn RxControl>,
    ) -> Self {
        let toggle = ToggleController::new(
            timers,
            config.toggle_period,
            config.timer_command_timeout,
            actuator.clone(),
            ctx.stats.clone(),
            ctx.fault.clone(),
            ctx.log.clone(),
        );

        Self {
            ctx,
            actuator,
            rtc,
            toggle,
            rx_control,
            recv_wait: config.command_recv_wait,
            send_wait: config.output_send_wait,
        }
    }

    /// Dispatch until `EXIT` or until the command queue closes.
    ///
    /// Hands itself back so the caller decides when the timer is deleted.
    pub fn run(mut self) -> Self {
        loop {
            match self.ctx.commands.recv(self.recv_wait) {
                Ok(cmd) => {
                    if self.dispatch(cmd) == Flow::Exit {
                        break;
                    }
                }
                Err(PipelineError::Timeout) => continue,
                Err(_) => break,
            }
        }
        self
    }

    /// Execute one command and free it.
    pub fn dispatch(&mut self, cmd: PooledCommand) -> Flow {
        let result = self.execute(&cmd);
        drop(cmd);
        self.ctx.stats.bump(Counter::CommandsDispatched);

        let flow = result.unwrap_or_else(|e| {
            self.report_error(e);
            Flow::Continue
        });

        if flow == Flow::Continue {
            self.report_fault();
        }
        flow
    }

    fn execute(&mut self, cmd: &Command) -> Result<Flow, PipelineError> {
        if cmd.is_overflowed() {
            return Err(PipelineError::LineOverflow);
        }

        let Some(kind) = cmd.kind() else {
            self.ctx.stats.bump(Counter::CommandsInvalid);
            ev_warn!(LogSource::Dispatcher, self.ctx.log, "invalid code {}", cmd.code);
            self.say(Message::Static(INVALID_MSG));
            return Ok(Flow::Continue);
        };

        ev_debug!(LogSource::Dispatcher, self.ctx.log, "{}", kind.name());

        match kind {
            CommandKind::LedOn => self.actuator.set_level(true)?,
            CommandKind::LedOff => self.actuator.set_level(false)?,
            CommandKind::LedToggle => self.toggle.start()?,
            CommandKind::LedToggleOff => self.toggle.stop()?,
            CommandKind::LedReadStatus => {
                let on = self.actuator.is_on()?;
                self.say(led_status(on));
            }
            CommandKind::RtcPrintDatetime => {
                let now = self.rtc.now()?;
                self.say(format_datetime(&now));
            }
            CommandKind::Exit => {
                self.shutdown();
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn shutdown(&mut self) {
        self.rx_control.disable_rx();
        let discarded = self.ctx.close_all();
        ev_info!(
            LogSource::Dispatcher,
            self.ctx.log,
            "exit, {} queued commands discarded",
            discarded
        );
    }

    fn say(&self, msg: Message) {
        if let Err(e) = self.ctx.output.send(msg, self.send_wait) {
            if e.reason != PipelineError::Closed {
                ev_warn!(LogSource::Dispatcher, self.ctx.log, "output dropped: {}", e.reason);
            }
        }
    }

    fn report_error(&self, err: PipelineError) {
        ev_warn!(LogSource::Dispatcher, self.ctx.log, "command failed: {}", err);
        let msg = match FaultCode::from_error(err) {
            FaultCode::None => Message::format(format_args!("\r\n Error {}.!", err)),
            code => Message::Static(code.report()),
        };
        self.say(msg);
    }

    fn report_fault(&self) {
        if let Some(fault) = self.ctx.fault.take() {
            if fault.code != FaultCode::None {
                self.say(Message::Static(fault.code.report()));
            }
        }
    }

    pub fn toggle_state(&self) -> ToggleState {
        self.toggle.state()
    }
}
