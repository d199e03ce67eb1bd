//! Module: config
//!
//! Purpose: Runtime configuration for the command pipeline.
//!
//! Wire-level sizes are compile-time constants. Waits, periods, and task
//! parameters live in [`PipelineConfig`]; every blocking wait is an
//! `Option<Duration>` where `None` means "wait forever".

use core::time::Duration;

use crate::error::WaitBound;

/// Receive line buffer capacity in bytes (terminator not stored).
pub const LINE_CAPACITY: usize = 20;

/// Reserved argument bytes carried by each Command.
pub const CMD_ARGS_LEN: usize = 10;

/// Depth of the command and output queues.
pub const QUEUE_DEPTH: usize = 10;

/// Capacity of a formatted output message.
pub const MESSAGE_CAPACITY: usize = 64;

/// Line terminator sent by the terminal on Enter.
pub const LINE_TERMINATOR: u8 = b'\r';

/// Per-task scheduling parameters.
///
/// Priorities are FreeRTOS priorities (higher runs first). Only applied on
/// the board; host threads ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub name: &'static str,
    pub priority: u8,
    pub stack_size: usize,
}

impl TaskConfig {
    pub const fn new(name: &'static str, priority: u8, stack_size: usize) -> Self {
        Self { name, priority, stack_size }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Period of the LED toggle timer.
    pub toggle_period: Duration,
    /// Bound on the timer service accepting start/stop. Always finite.
    pub timer_command_timeout: Duration,
    /// Decoder and menu wait for a line-complete notification.
    pub notify_wait: WaitBound,
    /// Decoder push into a full command queue.
    pub command_send_wait: WaitBound,
    /// Dispatcher wait for the next command.
    pub command_recv_wait: WaitBound,
    /// Producers pushing into a full output queue.
    pub output_send_wait: WaitBound,
    /// Writer wait for the next message.
    pub output_recv_wait: WaitBound,
    /// Maximum number of live Command objects.
    pub pool_capacity: usize,
    /// Run the menu task.
    pub menu_enabled: bool,
    pub writer_task: TaskConfig,
    pub menu_task: TaskConfig,
    pub decoder_task: TaskConfig,
    pub dispatcher_task: TaskConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            toggle_period: Duration::from_millis(500),
            timer_command_timeout: Duration::from_millis(100),
            notify_wait: None,
            command_send_wait: None,
            command_recv_wait: None,
            output_send_wait: None,
            output_recv_wait: None,
            pool_capacity: QUEUE_DEPTH + 2,
            menu_enabled: true,
            writer_task: TaskConfig::new("USART-Write", 5, 4096),
            menu_task: TaskConfig::new("USARTRead-MenuPrint", 4, 4096),
            decoder_task: TaskConfig::new("Command-Handling", 4, 4096),
            dispatcher_task: TaskConfig::new("Command-Processing", 5, 4096),
        }
    }
}

impl PipelineConfig {
    pub fn with_toggle_period(mut self, period: Duration) -> Self {
        self.toggle_period = period;
        self
    }

    pub fn with_timer_command_timeout(mut self, timeout: Duration) -> Self {
        self.timer_command_timeout = timeout;
        self
    }

    /// Apply one bound to every task-side wait.
    pub fn with_wait_bound(mut self, bound: WaitBound) -> Self {
        self.notify_wait = bound;
        self.command_send_wait = bound;
        self.command_recv_wait = bound;
        self.output_send_wait = bound;
        self.output_recv_wait = bound;
        self
    }

    pub fn with_command_send_wait(mut self, bound: WaitBound) -> Self {
        self.command_send_wait = bound;
        self
    }

    pub fn with_output_send_wait(mut self, bound: WaitBound) -> Self {
        self.output_send_wait = bound;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn with_menu(mut self, enabled: bool) -> Self {
        self.menu_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_wait_forever() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.notify_wait, None);
        assert_eq!(cfg.command_send_wait, None);
        assert_eq!(cfg.output_recv_wait, None);
        assert_eq!(cfg.toggle_period, Duration::from_millis(500));
        assert!(cfg.timer_command_timeout > Duration::ZERO);
    }

    #[test]
    fn test_dispatcher_not_below_decoder() {
        let cfg = PipelineConfig::default();
        assert!(cfg.dispatcher_task.priority >= cfg.decoder_task.priority);
        assert_eq!(cfg.dispatcher_task.priority, cfg.writer_task.priority);
    }

    #[test]
    fn test_with_wait_bound_sets_all() {
        let bound = Some(Duration::from_millis(5));
        let cfg = PipelineConfig::default().with_wait_bound(bound);
        assert_eq!(cfg.notify_wait, bound);
        assert_eq!(cfg.command_recv_wait, bound);
        assert_eq!(cfg.output_send_wait, bound);
    }
}
