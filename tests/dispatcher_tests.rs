//! Dispatcher tests, one command at a time against simulated peripherals

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use uart_cmd_pipeline::console::messages::{INVALID_MSG, LED_OFF_MSG, LED_ON_MSG};
use uart_cmd_pipeline::console::{parse_line, Command, PooledCommand};
use uart_cmd_pipeline::fault::FaultCode;
use uart_cmd_pipeline::hal::rtc::{DateTime, FixedRtc};
use uart_cmd_pipeline::hal::sim::{LedProbe, SimLed, SimRxControl, ThreadTimerService};
use uart_cmd_pipeline::hal::SharedActuator;
use uart_cmd_pipeline::pipeline::Context;
use uart_cmd_pipeline::tasks::{Dispatcher, Flow};
use uart_cmd_pipeline::{CommandKind, PipelineConfig, ToggleState};

const PERIOD: Duration = Duration::from_millis(20);

struct Rig {
    ctx: Context,
    dispatcher: Dispatcher,
    led: LedProbe,
    timers: ThreadTimerService,
    rx_masked: Arc<AtomicBool>,
}

fn rig() -> Rig {
    let config = PipelineConfig::default().with_toggle_period(PERIOD);
    let ctx = Context::new(&config);
    let (led, probe) = SimLed::new();
    let (rx_control, rx_masked) = SimRxControl::new();
    let timers = ThreadTimerService::new();
    let rtc = FixedRtc(DateTime { year: 2023, month: 11, day: 30, hours: 23, minutes: 59, seconds: 58 });

    let dispatcher = Dispatcher::new(
        ctx.clone(),
        &config,
        SharedActuator::new(Box::new(led)),
        Box::new(rtc),
        Box::new(timers.clone()),
        Box::new(rx_control),
    );

    Rig { ctx, dispatcher, led: probe, timers, rx_masked }
}

impl Rig {
    fn cmd(&self, code: u8) -> PooledCommand {
        self.ctx.pool.alloc(Command::new(code)).unwrap()
    }

    fn run(&mut self, code: u8) -> Flow {
        let cmd = self.cmd(code);
        self.dispatcher.dispatch(cmd)
    }

    /// Everything queued for the writer so far.
    fn output(&self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(msg) = self.ctx.output.try_recv() {
            out.push(msg.as_str().to_string());
        }
        out
    }
}

#[test]
fn test_led_on_off() {
    let mut r = rig();

    assert_eq!(r.run(CommandKind::LedOn.code()), Flow::Continue);
    assert!(r.led.is_on());
    assert_eq!(r.led.writes(), 1);

    assert_eq!(r.run(CommandKind::LedOff.code()), Flow::Continue);
    assert!(!r.led.is_on());
    assert_eq!(r.led.writes(), 2);

    assert!(r.output().is_empty());
}

#[test]
fn test_read_status() {
    let mut r = rig();

    r.run(CommandKind::LedReadStatus.code());
    r.run(CommandKind::LedOn.code());
    r.run(CommandKind::LedReadStatus.code());

    assert_eq!(r.output(), vec![LED_OFF_MSG.to_string(), LED_ON_MSG.to_string()]);
}

#[test]
fn test_rtc_print() {
    let mut r = rig();

    r.run(CommandKind::RtcPrintDatetime.code());

    assert_eq!(r.output(), vec!["\r\n Time: 23:59:58 \r\n Date: 30/11/2023 \r\n".to_string()]);
}

#[test]
fn test_invalid_code_reports_once_and_leaves_led() {
    let mut r = rig();

    assert_eq!(r.run(9), Flow::Continue);

    assert_eq!(r.output(), vec![INVALID_MSG.to_string()]);
    assert_eq!(r.led.writes(), 0);
    assert_eq!(r.led.toggles(), 0);
    assert_eq!(r.ctx.stats.snapshot().commands_invalid, 1);
}

#[test]
fn test_every_command_freed_exactly_once() {
    let mut r = rig();

    for code in [1, 2, 3, 4, 5, 6, 9, 200] {
        r.run(code);
    }
    assert_eq!(r.run(CommandKind::Exit.code()), Flow::Exit);

    let pool = r.ctx.pool.stats();
    assert_eq!(pool.allocated, 9);
    assert_eq!(pool.freed, 9);
    assert_eq!(pool.in_use, 0);
    assert_eq!(r.ctx.stats.snapshot().commands_dispatched, 9);
}

#[test]
fn test_toggle_twice_stays_running() {
    let mut r = rig();

    r.run(CommandKind::LedToggle.code());
    r.run(CommandKind::LedToggle.code());

    assert_eq!(r.dispatcher.toggle_state(), ToggleState::Running);
    assert_eq!(r.timers.created(), 1);
    assert!(r.output().is_empty());
}

#[test]
fn test_toggle_off_without_start_is_noop() {
    let mut r = rig();

    assert_eq!(r.run(CommandKind::LedToggleOff.code()), Flow::Continue);

    assert_eq!(r.dispatcher.toggle_state(), ToggleState::Uncreated);
    assert_eq!(r.timers.created(), 0);
    assert!(r.output().is_empty());
}

#[test]
fn test_toggle_observed_after_period() {
    let mut r = rig();

    r.run(CommandKind::LedToggle.code());

    let start = Instant::now();
    while r.led.toggles() == 0 && start.elapsed() < PERIOD * 50 {
        thread::sleep(Duration::from_millis(2));
    }
    assert!(r.led.toggles() >= 1);

    r.run(CommandKind::LedToggleOff.code());
    assert_eq!(r.dispatcher.toggle_state(), ToggleState::Stopped);
}

#[test]
fn test_actuator_unavailable_is_reported() {
    let mut r = rig();
    r.led.set_unavailable(true);

    assert_eq!(r.run(CommandKind::LedOn.code()), Flow::Continue);
    assert_eq!(r.output(), vec![FaultCode::ActuatorUnavailable.report().to_string()]);
}

#[test]
fn test_overflowed_line_is_rejected() {
    let mut r = rig();

    let mut cmd = Command::new(CommandKind::LedOn.code());
    cmd.dropped = 3;
    let cmd = r.ctx.pool.alloc(cmd).unwrap();

    assert_eq!(r.dispatcher.dispatch(cmd), Flow::Continue);
    assert!(!r.led.is_on());
    assert_eq!(r.output(), vec![FaultCode::LineOverflow.report().to_string()]);
    assert_eq!(r.ctx.pool.stats().in_use, 0);
}

#[test]
fn test_background_fault_reported_after_next_command() {
    let mut r = rig();
    r.ctx.fault.set(FaultCode::PoolExhausted, 12);

    r.run(CommandKind::LedOn.code());

    assert_eq!(r.output(), vec![FaultCode::PoolExhausted.report().to_string()]);
    assert!(!r.ctx.fault.is_active());
    assert_eq!(r.ctx.fault.count(), 1);
}

#[test]
fn test_replaced_line_reported_after_survivor() {
    let mut r = rig();

    // "1" completes and is overwritten by "2" before anyone takes it
    r.ctx.rx.feed(b"1\r2\r");
    let line = r.ctx.rx.take_line().unwrap();
    let cmd = r.ctx.pool.alloc(parse_line(&line)).unwrap();

    assert_eq!(r.dispatcher.dispatch(cmd), Flow::Continue);
    assert!(!r.led.is_on());
    assert_eq!(r.led.writes(), 1);
    assert_eq!(r.output(), vec![FaultCode::LineCoalesced.report().to_string()]);
}

#[test]
fn test_exit_shuts_everything_down() {
    let mut r = rig();

    // Queued behind EXIT, never executed
    r.ctx.commands.send(r.cmd(1), None).unwrap();
    r.ctx.commands.send(r.cmd(3), None).unwrap();

    assert_eq!(r.run(CommandKind::Exit.code()), Flow::Exit);

    assert!(r.rx_masked.load(Ordering::Acquire));
    assert!(!r.ctx.rx.is_enabled());
    assert!(r.ctx.decoder_wake.is_closed());
    assert!(r.ctx.menu_wake.is_closed());
    assert!(r.ctx.commands.is_closed());
    assert!(r.ctx.output.is_closed());

    assert_eq!(r.ctx.rx.feed(b"1\r"), 0);
    assert!(!r.led.is_on());
    assert_eq!(r.timers.created(), 0);

    let pool = r.ctx.pool.stats();
    assert_eq!(pool.allocated, 3);
    assert_eq!(pool.freed, 3);
}

#[test]
fn test_run_returns_after_exit() {
    let r = rig();
    r.ctx.commands.send(r.cmd(1), None).unwrap();
    r.ctx.commands.send(r.cmd(0), None).unwrap();

    let Rig { ctx, dispatcher, led, timers, .. } = r;
    let dispatcher = thread::spawn(move || dispatcher.run()).join().unwrap();
    assert_eq!(dispatcher.toggle_state(), ToggleState::Uncreated);

    drop(dispatcher);
    assert!(led.is_on());
    assert_eq!(ctx.pool.stats().in_use, 0);
    assert_eq!(timers.deleted(), 0);
}

#[test]
fn test_dropping_dispatcher_deletes_timer() {
    let mut r = rig();
    r.run(CommandKind::LedToggle.code());

    let Rig { dispatcher, timers, .. } = r;
    drop(dispatcher);

    assert_eq!(timers.created(), 1);
    assert_eq!(timers.deleted(), 1);
}
