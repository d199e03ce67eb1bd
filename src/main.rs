//! UartPipeline - entry point
//!
//! On the board: takes the peripherals, starts the pipeline and pumps UART
//! bytes into the receive handler until `EXIT`.
//!
//! On a host: same pipeline over simulated peripherals. stdin is the serial
//! receive line (`\n` becomes `\r`), stdout the transmit line, stderr the
//! event log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use uart_cmd_pipeline::console::Message;
use uart_cmd_pipeline::log_drain::{drain_into, IoSink};
use uart_cmd_pipeline::logging::EventLog;
use uart_cmd_pipeline::{Pipeline, PipelineConfig, PipelineReport};

const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

fn banner() -> Message {
    Message::Static(concat!("\r\n", env!("VERSION_STRING"), " \r\n"))
}

/// Periodically move event log entries to stderr until `stop` is set.
fn spawn_log_drain(log: Arc<EventLog>, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut sink = IoSink(std::io::stderr());
        while !stop.load(Ordering::Acquire) {
            drain_into(&*log, &mut sink);
            thread::sleep(DRAIN_INTERVAL);
        }
        drain_into(&*log, &mut sink);
    })
}

/// Join the pipeline, then stop the drain thread and flush what is left.
fn finish(
    pipeline: Pipeline,
    log: &EventLog,
    stop: &AtomicBool,
    drain: thread::JoinHandle<()>,
) -> PipelineReport {
    let report = pipeline.join();
    stop.store(true, Ordering::Release);
    let _ = drain.join();
    drain_into(log, &mut IoSink(std::io::stderr()));
    eprintln!("{}", report.stats);
    report
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    use uart_cmd_pipeline::hal::esp::take_board;

    esp_idf_svc::sys::link_patches();

    let (board, pump) = take_board()?;
    let pipeline = match Pipeline::start(PipelineConfig::default(), board) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("pipeline start failed: {}", e);
            return Ok(());
        }
    };
    let _ = pipeline.say(banner());

    let log = pipeline.log();
    let stop = Arc::new(AtomicBool::new(false));
    let drain = spawn_log_drain(Arc::clone(&log), Arc::clone(&stop));

    if let Err(e) = pump.spawn(pipeline.rx()) {
        eprintln!("rx pump: {}", e);
    }

    finish(pipeline, &log, &stop, drain);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use std::io::Read;

    use uart_cmd_pipeline::hal::serial::IoSerial;
    use uart_cmd_pipeline::hal::sim::{SimLed, SimRxControl, ThreadTimerService};
    use uart_cmd_pipeline::hal::SystemRtc;
    use uart_cmd_pipeline::Board;

    let (led, _led_probe) = SimLed::new();
    let (rx_control, _rx_masked) = SimRxControl::new();
    let board = Board {
        led: Box::new(led),
        serial: Box::new(IoSerial(std::io::stdout())),
        rx_control: Box::new(rx_control),
        rtc: Box::new(SystemRtc),
        timers: Box::new(ThreadTimerService::new()),
    };

    let pipeline = match Pipeline::start(PipelineConfig::default(), board) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("pipeline start failed: {}", e);
            std::process::exit(1);
        }
    };
    let _ = pipeline.say(banner());

    let log = pipeline.log();
    let stop = Arc::new(AtomicBool::new(false));
    let drain = spawn_log_drain(Arc::clone(&log), Arc::clone(&stop));

    let rx = pipeline.rx();
    for byte in std::io::stdin().lock().bytes() {
        let Ok(byte) = byte else { break };
        let byte = if byte == b'\n' { b'\r' } else { byte };
        rx.on_byte(byte);
        if !rx.is_enabled() {
            break;
        }
        // Typing pace: let the decoder take each line before the next one
        while byte == b'\r' && rx.collector().has_pending_line() && rx.is_enabled() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    // End of input without EXIT: shut down the same way
    if rx.is_enabled() {
        pipeline.feed(b"0\r");
    }

    finish(pipeline, &log, &stop, drain);
}
