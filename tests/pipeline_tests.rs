//! End-to-end pipeline tests over simulated peripherals

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use uart_cmd_pipeline::console::messages::{INVALID_MSG, LED_ON_MSG, MENU};
use uart_cmd_pipeline::console::Message;
use uart_cmd_pipeline::hal::rtc::{DateTime, FixedRtc};
use uart_cmd_pipeline::hal::sim::{CaptureProbe, CaptureSerial, LedProbe, SimLed, SimRxControl, ThreadTimerService};
use uart_cmd_pipeline::{Board, Pipeline, PipelineConfig, ToggleState};

const PERIOD: Duration = Duration::from_millis(20);
const LIMIT: Duration = Duration::from_secs(2);

struct Harness {
    pipeline: Pipeline,
    led: LedProbe,
    serial: CaptureProbe,
    rx_masked: Arc<AtomicBool>,
    timers: ThreadTimerService,
}

fn start(config: PipelineConfig) -> Harness {
    let (led, led_probe) = SimLed::new();
    let (serial, serial_probe) = CaptureSerial::new();
    let (rx_control, rx_masked) = SimRxControl::new();
    let timers = ThreadTimerService::new();

    let board = Board {
        led: Box::new(led),
        serial: Box::new(serial),
        rx_control: Box::new(rx_control),
        rtc: Box::new(FixedRtc(DateTime { year: 2024, month: 1, day: 2, hours: 3, minutes: 4, seconds: 5 })),
        timers: Box::new(timers.clone()),
    };

    let pipeline = Pipeline::start(config, board).unwrap();
    Harness { pipeline, led: led_probe, serial: serial_probe, rx_masked, timers }
}

fn quiet() -> PipelineConfig {
    PipelineConfig::default().with_menu(false).with_toggle_period(PERIOD)
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < LIMIT {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

impl Harness {
    /// Type one line and wait until the dispatcher is done with it.
    fn line(&self, bytes: &[u8]) {
        let before = self.pipeline.stats().commands_dispatched;
        self.pipeline.feed(bytes);
        assert!(
            wait_until(|| self.pipeline.stats().commands_dispatched > before),
            "line {:?} not dispatched",
            bytes
        );
    }
}

#[test]
fn test_on_status_off_exit() {
    let h = start(quiet());

    h.line(b"1\r");
    assert!(h.led.is_on());

    h.line(b"5\r");
    assert!(wait_until(|| h.serial.text().contains(LED_ON_MSG)));

    h.line(b"2\r");
    assert!(!h.led.is_on());

    h.line(b"0\r");
    assert!(h.rx_masked.load(Ordering::Acquire));
    assert_eq!(h.pipeline.feed(b"1\r"), 0);

    let Harness { pipeline, led, serial, .. } = h;
    let report = pipeline.join();

    assert!(!led.is_on());
    assert_eq!(led.writes(), 2);
    assert_eq!(serial.count(LED_ON_MSG), 1);
    assert_eq!(report.stats.commands_dispatched, 4);
    assert_eq!(report.pool.allocated, 4);
    assert_eq!(report.pool.freed, 4);
    assert_eq!(report.pool.in_use, 0);
}

#[test]
fn test_invalid_line_single_message() {
    let h = start(quiet());

    h.line(b"9\r");
    h.line(b"0\r");

    let Harness { pipeline, led, serial, .. } = h;
    let report = pipeline.join();

    assert_eq!(serial.count(INVALID_MSG), 1);
    assert_eq!(led.writes(), 0);
    assert_eq!(led.toggles(), 0);
    assert_eq!(report.stats.commands_invalid, 1);
}

#[test]
fn test_rtc_readout_reaches_serial() {
    let h = start(quiet());

    h.line(b"6\r");
    h.line(b"0\r");

    let Harness { pipeline, serial, .. } = h;
    pipeline.join();

    assert!(serial.text().contains("\r\n Time: 03:04:05 \r\n Date: 02/01/2024 \r\n"));
}

#[test]
fn test_toggle_runs_until_exit() {
    let h = start(quiet());

    h.line(b"3\r");
    assert!(wait_until(|| h.led.toggles() >= 1));

    h.line(b"3\r");
    h.line(b"0\r");

    let Harness { pipeline, timers, .. } = h;
    let report = pipeline.join();

    assert_eq!(report.toggle, Some(ToggleState::Running));
    assert!(report.stats.timer_toggles >= 1);
    assert_eq!(timers.created(), 1);
    assert_eq!(timers.deleted(), 1);
}

#[test]
fn test_toggle_off_without_start() {
    let h = start(quiet());

    h.line(b"4\r");
    h.line(b"0\r");

    let Harness { pipeline, timers, serial, .. } = h;
    let report = pipeline.join();

    assert_eq!(report.toggle, Some(ToggleState::Uncreated));
    assert_eq!(timers.created(), 0);
    assert!(serial.text().is_empty());
}

#[test]
fn test_long_line_rejected() {
    let h = start(quiet());

    h.line(b"1234567890123456789012345\r");
    h.line(b"0\r");

    let Harness { pipeline, led, serial, .. } = h;
    let report = pipeline.join();

    assert!(!led.is_on());
    assert!(serial.text().contains("Command too long"));
    assert_eq!(report.stats.lines_overflowed, 1);
    assert_eq!(report.stats.bytes_dropped, 5);
}

#[test]
fn test_menu_printed_on_start_and_after_lines() {
    let h = start(PipelineConfig::default().with_toggle_period(PERIOD));

    assert!(wait_until(|| h.serial.count(MENU) >= 1));

    h.line(b"5\r");
    assert!(wait_until(|| h.serial.count(MENU) >= 2));

    h.line(b"0\r");
    let Harness { pipeline, serial, .. } = h;
    pipeline.join();

    assert!(serial.count(MENU) >= 2);
}

#[test]
fn test_say_goes_out_in_order() {
    let h = start(quiet());

    h.pipeline.say(Message::Static("banner\r\n")).unwrap();
    h.line(b"9\r");
    h.line(b"0\r");

    let Harness { pipeline, serial, .. } = h;
    pipeline.join();

    let text = serial.text();
    let banner = text.find("banner").unwrap();
    let invalid = text.find(INVALID_MSG).unwrap();
    assert!(banner < invalid);
}

#[test]
fn test_is_finished_after_exit() {
    let h = start(quiet());
    assert!(!h.pipeline.is_finished());

    h.line(b"0\r");
    assert!(wait_until(|| h.pipeline.is_finished()));
    h.pipeline.join();
}
