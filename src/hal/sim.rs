//! Simulated peripherals for the host build and tests.
//!
//! Every sim device hands out a cloneable probe so a test can observe the
//! device after it was moved into the pipeline.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use core::time::Duration;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::error::PipelineError;

use super::actuator::Actuator;
use super::serial::{RxControl, SerialTx};
use super::timer::{PeriodicTimer, TimerCallback, TimerService};

// --- LED ---

#[derive(Default)]
struct LedState {
    on: AtomicBool,
    toggles: AtomicU32,
    writes: AtomicU32,
    unavailable: AtomicBool,
}

/// Simulated LED pin.
pub struct SimLed {
    state: Arc<LedState>,
}

/// Read side of a [`SimLed`].
#[derive(Clone)]
pub struct LedProbe {
    state: Arc<LedState>,
}

impl SimLed {
    pub fn new() -> (Self, LedProbe) {
        let state = Arc::new(LedState::default());
        (Self { state: Arc::clone(&state) }, LedProbe { state })
    }

    fn check(&self) -> Result<(), PipelineError> {
        if self.state.unavailable.load(Ordering::Acquire) {
            Err(PipelineError::ActuatorUnavailable)
        } else {
            Ok(())
        }
    }
}

impl Actuator for SimLed {
    fn set_level(&mut self, on: bool) -> Result<(), PipelineError> {
        self.check()?;
        self.state.on.store(on, Ordering::Release);
        self.state.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn toggle(&mut self) -> Result<(), PipelineError> {
        self.check()?;
        self.state.on.fetch_xor(true, Ordering::AcqRel);
        self.state.toggles.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_on(&self) -> Result<bool, PipelineError> {
        self.check()?;
        Ok(self.state.on.load(Ordering::Acquire))
    }
}

impl LedProbe {
    pub fn is_on(&self) -> bool {
        self.state.on.load(Ordering::Acquire)
    }

    pub fn toggles(&self) -> u32 {
        self.state.toggles.load(Ordering::Relaxed)
    }

    /// Explicit level writes (ON/OFF commands).
    pub fn writes(&self) -> u32 {
        self.state.writes.load(Ordering::Relaxed)
    }

    /// Make every pin access fail from now on.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::Release);
    }
}

// --- Serial ---

/// Transmit side that records everything written.
pub struct CaptureSerial {
    sink: Arc<Mutex<Vec<u8>>>,
}

#[derive(Clone)]
pub struct CaptureProbe {
    sink: Arc<Mutex<Vec<u8>>>,
}

impl CaptureSerial {
    pub fn new() -> (Self, CaptureProbe) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        (Self { sink: Arc::clone(&sink) }, CaptureProbe { sink })
    }
}

impl SerialTx for CaptureSerial {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        self.sink
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(bytes);
        Ok(())
    }
}

impl CaptureProbe {
    pub fn bytes(&self) -> Vec<u8> {
        self.sink.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    /// Non-overlapping occurrences of `needle` in the output so far.
    pub fn count(&self, needle: &str) -> usize {
        self.text().matches(needle).count()
    }
}

/// Receive interrupt mask that only records the call.
pub struct SimRxControl {
    disabled: Arc<AtomicBool>,
}

impl SimRxControl {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let disabled = Arc::new(AtomicBool::new(false));
        (Self { disabled: Arc::clone(&disabled) }, disabled)
    }
}

impl RxControl for SimRxControl {
    fn disable_rx(&mut self) {
        self.disabled.store(true, Ordering::Release);
    }
}

// --- Timer ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerCmd {
    Start,
    Stop,
}

const TIMER_CMD_DEPTH: usize = 4;

#[derive(Default)]
struct TimerCounters {
    created: AtomicUsize,
    deleted: AtomicUsize,
    fired: AtomicU32,
}

/// Timer service backed by one daemon thread per timer.
///
/// Start/stop travel through a short command queue, like a FreeRTOS timer
/// service task.
#[derive(Clone, Default)]
pub struct ThreadTimerService {
    counters: Arc<TimerCounters>,
}

impl ThreadTimerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.counters.created.load(Ordering::Acquire)
    }

    pub fn deleted(&self) -> usize {
        self.counters.deleted.load(Ordering::Acquire)
    }

    /// Callback invocations across all timers.
    pub fn fired(&self) -> u32 {
        self.counters.fired.load(Ordering::Acquire)
    }
}

impl TimerService for ThreadTimerService {
    fn create(
        &mut self,
        name: &'static str,
        period: Duration,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, PipelineError> {
        let (commands, daemon_commands) = bounded(TIMER_CMD_DEPTH);
        let counters = Arc::clone(&self.counters);

        let daemon = thread::Builder::new()
            .name(name.into())
            .spawn(move || timer_daemon(&daemon_commands, period, callback, &counters))
            .map_err(|_| PipelineError::TimerUnavailable)?;

        self.counters.created.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(ThreadTimer {
            commands: Some(commands),
            daemon: Some(daemon),
            counters: Arc::clone(&self.counters),
        }))
    }
}

fn timer_daemon(
    commands: &Receiver<TimerCmd>,
    period: Duration,
    mut callback: TimerCallback,
    counters: &TimerCounters,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        let next = match deadline {
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(d) => commands.recv_timeout(d.saturating_duration_since(Instant::now())),
        };
        match next {
            Ok(TimerCmd::Start) => deadline = Some(Instant::now() + period),
            Ok(TimerCmd::Stop) => deadline = None,
            Err(RecvTimeoutError::Timeout) => {
                callback();
                counters.fired.fetch_add(1, Ordering::AcqRel);
                deadline = deadline.map(|d| d + period);
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

struct ThreadTimer {
    commands: Option<Sender<TimerCmd>>,
    daemon: Option<JoinHandle<()>>,
    counters: Arc<TimerCounters>,
}

impl ThreadTimer {
    fn command(&self, cmd: TimerCmd, wait: Duration) -> Result<(), PipelineError> {
        let commands = self.commands.as_ref().ok_or(PipelineError::TimerUnavailable)?;
        commands.send_timeout(cmd, wait).map_err(|e| match e {
            SendTimeoutError::Timeout(_) => PipelineError::TimerCommandTimeout,
            SendTimeoutError::Disconnected(_) => PipelineError::TimerUnavailable,
        })
    }
}

impl PeriodicTimer for ThreadTimer {
    fn start(&mut self, wait: Duration) -> Result<(), PipelineError> {
        self.command(TimerCmd::Start, wait)
    }

    fn stop(&mut self, wait: Duration) -> Result<(), PipelineError> {
        self.command(TimerCmd::Stop, wait)
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        // Disconnecting the channel ends the daemon loop
        drop(self.commands.take());
        if let Some(daemon) = self.daemon.take() {
            let _ = daemon.join();
        }
        self.counters.deleted.fetch_add(1, Ordering::AcqRel);
    }
}
