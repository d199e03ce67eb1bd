//! Output multiplexer: the only task that touches the serial transmitter.

use crate::error::{PipelineError, WaitBound};
use crate::hal::SerialTx;
use crate::logging::LogSource;
use crate::pipeline::Context;
use crate::{ev_debug, ev_error};

pub struct Writer {
    ctx: Context,
    serial: Box<dyn SerialTx>,
    recv_wait: WaitBound,
}

impl Writer {
    pub fn new(ctx: Context, serial: Box<dyn SerialTx>, recv_wait: WaitBound) -> Self {
        Self { ctx, serial, recv_wait }
    }

    /// Transmit messages in queue order. Returns once the queue is closed
    /// and drained.
    pub fn run(mut self) {
        let mut sent = 0u32;
        loop {
            match self.ctx.output.recv(self.recv_wait) {
                Ok(msg) => {
                    if let Err(e) = self.serial.write_all(msg.as_bytes()) {
                        ev_error!(LogSource::Writer, self.ctx.log, "{}", e);
                    } else {
                        sent += 1;
                    }
                }
                Err(PipelineError::Timeout) => continue,
                Err(_) => break,
            }
        }
        ev_debug!(LogSource::Writer, self.ctx.log, "writer done, {} sent", sent);
    }
}
