//! Pipeline context and task lifecycle.
//!
//! All state that the tasks and the receive interrupt share lives in one
//! [`Context`], created by [`Pipeline::start`] and released once every task
//! has returned.
//!
//! Shutdown is driven by the dispatcher on `EXIT`:
//!
//! 1. receive disabled (handler gate + board interrupt mask)
//! 2. decoder and menu notifications closed
//! 3. command queue closed, leftover commands freed
//! 4. output queue closed, the writer drains it and returns
//!
//! [`Pipeline::join`] then deletes the toggle timer and reports.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::{PipelineConfig, TaskConfig, QUEUE_DEPTH};
use crate::console::{IsrResult, Message, PooledCommand, RxHandler};
use crate::error::PipelineError;
use crate::fault::FaultState;
use crate::hal::{Actuator, Rtc, RxControl, SerialTx, SharedActuator, TimerService};
use crate::logging::{EventLog, LogSource};
use crate::stats::{PipelineStats, StatsSnapshot};
use crate::sync::{BoundedQueue, Notification, PoolStats, SlotPool};
use crate::tasks::{Decoder, Dispatcher, Menu, Writer};
use crate::toggle::ToggleState;
use crate::{ev_error, ev_info};

pub type CommandQueue = BoundedQueue<PooledCommand, QUEUE_DEPTH>;
pub type OutputQueue = BoundedQueue<Message, QUEUE_DEPTH>;

/// Peripherals handed to the pipeline at start.
pub struct Board {
    pub led: Box<dyn Actuator>,
    pub serial: Box<dyn SerialTx>,
    pub rx_control: Box<dyn RxControl>,
    pub rtc: Box<dyn Rtc>,
    pub timers: Box<dyn TimerService>,
}

/// Shared state, one clone per task.
#[derive(Clone)]
pub struct Context {
    pub rx: Arc<RxHandler>,
    pub decoder_wake: Arc<Notification>,
    pub menu_wake: Arc<Notification>,
    pub commands: Arc<CommandQueue>,
    pub output: Arc<OutputQueue>,
    pub pool: Arc<SlotPool>,
    pub fault: Arc<FaultState>,
    pub stats: Arc<PipelineStats>,
    pub log: Arc<EventLog>,
}

impl Context {
    pub fn new(config: &PipelineConfig) -> Self {
        let decoder_wake = Arc::new(Notification::new());
        let menu_wake = Arc::new(Notification::new());
        let stats = Arc::new(PipelineStats::new());
        let fault = Arc::new(FaultState::new());
        let log = Arc::new(EventLog::new());

        let menu_target = config.menu_enabled.then(|| Arc::clone(&menu_wake));
        let rx = Arc::new(RxHandler::new(
            Arc::clone(&decoder_wake),
            menu_target,
            Arc::clone(&stats),
            Arc::clone(&fault),
            Arc::clone(&log),
        ));

        Self {
            rx,
            decoder_wake,
            menu_wake,
            commands: Arc::new(CommandQueue::new()),
            output: Arc::new(OutputQueue::new()),
            pool: SlotPool::new(config.pool_capacity),
            fault,
            stats,
            log,
        }
    }

    /// Release every waiter. Used on `EXIT` and on a failed start.
    pub fn close_all(&self) -> usize {
        self.rx.disable();
        self.decoder_wake.close();
        self.menu_wake.close();
        self.commands.close();

        let mut discarded = 0;
        while self.commands.try_recv().is_ok() {
            discarded += 1;
        }

        self.output.close();
        discarded
    }
}

/// Final counters after teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub stats: StatsSnapshot,
    pub pool: PoolStats,
    /// Toggle state at exit; `None` if the dispatcher did not return.
    pub toggle: Option<ToggleState>,
    pub faults: u32,
}

struct Tasks {
    writer: Option<JoinHandle<()>>,
    menu: Option<JoinHandle<()>>,
    decoder: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<Dispatcher>>,
}

/// Running command pipeline.
pub struct Pipeline {
    ctx: Context,
    config: PipelineConfig,
    tasks: Tasks,
}

impl Pipeline {
    /// Build the context and spawn the four tasks.
    pub fn start(config: PipelineConfig, board: Board) -> Result<Self, PipelineError> {
        let ctx = Context::new(&config);
        let mut tasks = Tasks { writer: None, menu: None, decoder: None, dispatcher: None };

        match Self::spawn_all(&ctx, &config, board, &mut tasks) {
            Ok(()) => {
                ev_info!(LogSource::Pipeline, ctx.log, "started, pool {}", config.pool_capacity);
                Ok(Self { ctx, config, tasks })
            }
            Err(e) => {
                ev_error!(LogSource::Pipeline, ctx.log, "start failed: {}", e);
                ctx.close_all();
                Err(e)
            }
        }
    }

    fn spawn_all(
        ctx: &Context,
        config: &PipelineConfig,
        board: Board,
        tasks: &mut Tasks,
    ) -> Result<(), PipelineError> {
        let Board { led, serial, rx_control, rtc, timers } = board;

        let writer = Writer::new(ctx.clone(), serial, config.output_recv_wait);
        tasks.writer = Some(spawn_task(&config.writer_task, move || writer.run())?);

        if config.menu_enabled {
            let menu = Menu::new(ctx.clone(), config);
            tasks.menu = Some(spawn_task(&config.menu_task, move || menu.run())?);
        }

        let decoder = Decoder::new(ctx.clone(), config);
        tasks.decoder = Some(spawn_task(&config.decoder_task, move || decoder.run())?);

        let actuator = SharedActuator::new(led);
        let dispatcher = Dispatcher::new(ctx.clone(), config, actuator, rtc, timers, rx_control);
        tasks.dispatcher = Some(spawn_task(&config.dispatcher_task, move || dispatcher.run())?);

        Ok(())
    }

    /// Receive interrupt entry point.
    pub fn on_byte(&self, byte: u8) -> IsrResult {
        self.ctx.rx.on_byte(byte)
    }

    /// Feed bytes one interrupt at a time. Returns how many were accepted.
    pub fn feed(&self, bytes: &[u8]) -> usize {
        self.ctx.rx.feed(bytes)
    }

    /// Handle for a receive pump running on another thread.
    pub fn rx(&self) -> Arc<RxHandler> {
        Arc::clone(&self.ctx.rx)
    }

    /// Queue a message for the serial line.
    pub fn say(&self, msg: Message) -> Result<(), PipelineError> {
        self.ctx
            .output
            .send(msg, self.config.output_send_wait)
            .map_err(|e| e.into_error())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.ctx.stats.snapshot()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.ctx.pool.stats()
    }

    pub fn log(&self) -> Arc<EventLog> {
        Arc::clone(&self.ctx.log)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// True once the dispatcher has returned.
    pub fn is_finished(&self) -> bool {
        self.tasks
            .dispatcher
            .as_ref()
            .map_or(true, |h| h.is_finished())
    }

    /// Wait for every task, delete the toggle timer, report.
    ///
    /// Blocks until `EXIT` has been dispatched.
    pub fn join(mut self) -> PipelineReport {
        let log = Arc::clone(&self.ctx.log);

        let toggle = match self.tasks.dispatcher.take().map(JoinHandle::join) {
            Some(Ok(dispatcher)) => {
                let state = dispatcher.toggle_state();
                drop(dispatcher);
                Some(state)
            }
            Some(Err(_)) => {
                ev_error!(LogSource::Pipeline, log, "dispatcher panicked");
                self.ctx.close_all();
                None
            }
            None => None,
        };

        for (name, handle) in [
            ("decoder", self.tasks.decoder.take()),
            ("menu", self.tasks.menu.take()),
            ("writer", self.tasks.writer.take()),
        ] {
            if let Some(Err(_)) = handle.map(JoinHandle::join) {
                ev_error!(LogSource::Pipeline, log, "{} panicked", name);
            }
        }

        let report = PipelineReport {
            stats: self.ctx.stats.snapshot(),
            pool: self.ctx.pool.stats(),
            toggle,
            faults: self.ctx.fault.count(),
        };
        ev_info!(LogSource::Pipeline, log, "stopped: {}", report.stats);
        report
    }
}

/// Spawn one task thread with its name, stack and priority.
fn spawn_task<T, F>(task: &TaskConfig, f: F) -> Result<JoinHandle<T>, PipelineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    #[cfg(target_os = "espidf")]
    {
        use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;

        ThreadSpawnConfiguration {
            priority: task.priority,
            stack_size: task.stack_size,
            ..Default::default()
        }
        .set()
        .map_err(|_| PipelineError::TaskSpawn)?;
    }

    let builder = thread::Builder::new().name(task.name.into());
    #[cfg(target_os = "espidf")]
    let builder = builder.stack_size(task.stack_size);

    let handle = builder.spawn(f).map_err(|_| PipelineError::TaskSpawn);

    #[cfg(target_os = "espidf")]
    {
        use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
        let _ = ThreadSpawnConfiguration::default().set();
    }

    handle
}
