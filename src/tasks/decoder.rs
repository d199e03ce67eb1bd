//! Command decoder task.

use crate::config::{PipelineConfig, QUEUE_DEPTH};
use crate::console::{parse_line, CompletedLine};
use crate::error::{PipelineError, WaitBound};
use crate::fault::FaultCode;
use crate::logging::LogSource;
use crate::pipeline::Context;
use crate::stats::Counter;
use crate::{ev_debug, ev_warn};

pub struct Decoder {
    ctx: Context,
    notify_wait: WaitBound,
    send_wait: WaitBound,
}

impl Decoder {
    pub fn new(ctx: Context, config: &PipelineConfig) -> Self {
        Self {
            ctx,
            notify_wait: config.notify_wait,
            send_wait: config.command_send_wait,
        }
    }

    /// Wait for completed lines until the notification is closed.
    pub fn run(self) {
        loop {
            match self.ctx.decoder_wake.wait(self.notify_wait) {
                Ok(()) => {}
                Err(PipelineError::Timeout) => continue,
                Err(_) => break,
            }

            // Several lines may have completed behind one wake; only the
            // latest survives in the collector.
            let Some(line) = self.ctx.rx.take_line() else {
                continue;
            };

            match self.decode(&line) {
                Ok(()) => {}
                Err(PipelineError::Closed) => break,
                Err(e) => self.record(e),
            }
        }
        ev_debug!(LogSource::Decoder, self.ctx.log, "decoder done");
    }

    /// Build a Command from `line` and queue it for the dispatcher.
    pub fn decode(&self, line: &CompletedLine) -> Result<(), PipelineError> {
        let cmd = self.ctx.pool.alloc(parse_line(line))?;
        let code = cmd.code;

        self.ctx.commands.send(cmd, self.send_wait)?;

        self.ctx.stats.bump(Counter::CommandsDecoded);
        ev_debug!(LogSource::Decoder, self.ctx.log, "queued code {}", code);
        Ok(())
    }

    fn record(&self, err: PipelineError) {
        let data = match err {
            PipelineError::PoolExhausted => self.ctx.pool.capacity() as u32,
            PipelineError::QueueFull => QUEUE_DEPTH as u32,
            _ => 0,
        };
        self.ctx.fault.set(FaultCode::from_error(err), data);
        ev_warn!(LogSource::Decoder, self.ctx.log, "command dropped: {}", err);
    }
}
