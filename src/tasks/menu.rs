//! Menu task: prints the menu, then again after each completed line.

use crate::config::PipelineConfig;
use crate::console::messages::MENU;
use crate::console::Message;
use crate::error::{PipelineError, WaitBound};
use crate::logging::LogSource;
use crate::pipeline::Context;
use crate::{ev_debug, ev_warn};

pub struct Menu {
    ctx: Context,
    notify_wait: WaitBound,
    send_wait: WaitBound,
}

impl Menu {
    pub fn new(ctx: Context, config: &PipelineConfig) -> Self {
        Self {
            ctx,
            notify_wait: config.notify_wait,
            send_wait: config.output_send_wait,
        }
    }

    pub fn run(self) {
        'outer: loop {
            match self.ctx.output.send(Message::Static(MENU), self.send_wait) {
                Ok(()) => {}
                Err(e) if e.reason == PipelineError::Closed => break,
                Err(e) => ev_warn!(LogSource::Menu, self.ctx.log, "menu dropped: {}", e.reason),
            }

            loop {
                match self.ctx.menu_wake.wait(self.notify_wait) {
                    Ok(()) => break,
                    Err(PipelineError::Timeout) => continue,
                    Err(_) => break 'outer,
                }
            }
        }
        ev_debug!(LogSource::Menu, self.ctx.log, "menu done");
    }
}
