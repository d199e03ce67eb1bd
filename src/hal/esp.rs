//! ESP-IDF board wiring.
//!
//! - LED on GPIO2 through a `PinDriver`
//! - UART1 at 115200 8N1 (TX GPIO4, RX GPIO5), split into a TX half for the
//!   writer task and an RX half for the receive pump
//! - `EspTaskTimerService` for the toggle timer (callbacks on the esp_timer task)
//! - System time for the RTC readout

use core::time::Duration;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Output, OutputPin, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartDriver, UartRxDriver, UartTxDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::{uart_disable_rx_intr, uart_port_t, EspError};
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use crate::console::RxHandler;
use crate::error::PipelineError;
use crate::pipeline::Board;

use super::actuator::Actuator;
use super::rtc::SystemRtc;
use super::serial::{RxControl, SerialTx};
use super::timer::{PeriodicTimer, TimerCallback, TimerService};

const BAUD_RATE: u32 = 115_200;
/// Longest a read blocks before the pump rechecks the receive gate.
const RX_WAIT: Duration = Duration::from_millis(100);
const RX_CHUNK: usize = 16;

// --- LED ---

pub struct EspLed {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl Actuator for EspLed {
    fn set_level(&mut self, on: bool) -> Result<(), PipelineError> {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| PipelineError::ActuatorUnavailable)
    }

    fn toggle(&mut self) -> Result<(), PipelineError> {
        self.pin.toggle().map_err(|_| PipelineError::ActuatorUnavailable)
    }

    fn is_on(&self) -> Result<bool, PipelineError> {
        Ok(self.pin.is_set_high())
    }
}

// --- UART ---

pub struct EspSerialTx {
    uart: UartTxDriver<'static>,
}

impl SerialTx for EspSerialTx {
    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), PipelineError> {
        while !bytes.is_empty() {
            let n = self.uart.write(bytes).map_err(|_| PipelineError::SerialWrite)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

pub struct EspRxControl {
    port: uart_port_t,
}

impl RxControl for EspRxControl {
    fn disable_rx(&mut self) {
        // SAFETY: port belongs to an installed driver that outlives the pipeline
        unsafe {
            uart_disable_rx_intr(self.port);
        }
    }
}

/// Moves bytes from the UART driver into the receive handler.
///
/// The IDF driver owns the real interrupt; this thread stands in for the
/// per-byte callback and stops once receive is disabled.
pub struct RxPump {
    uart: UartRxDriver<'static>,
}

impl RxPump {
    pub fn spawn(self, rx: Arc<RxHandler>) -> std::io::Result<JoinHandle<()>> {
        let timeout = TickType::from(RX_WAIT).ticks();
        thread::Builder::new()
            .name("uart-rx".into())
            .stack_size(3072)
            .spawn(move || {
                let mut chunk = [0u8; RX_CHUNK];
                while rx.is_enabled() {
                    let read = self.uart.read(&mut chunk, timeout).unwrap_or(0);
                    let mut wake = false;
                    for &byte in &chunk[..read] {
                        wake |= rx.on_byte(byte).yield_requested;
                    }
                    if wake {
                        thread::yield_now();
                    }
                }
            })
    }
}

// --- Timer ---

pub struct EspTimerSource {
    service: EspTaskTimerService,
}

struct EspPeriodicTimer {
    timer: EspTimer<'static>,
    period: Duration,
}

impl TimerService for EspTimerSource {
    fn create(
        &mut self,
        _name: &'static str,
        period: Duration,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, PipelineError> {
        let timer = self
            .service
            .timer(callback)
            .map_err(|_| PipelineError::TimerUnavailable)?;
        Ok(Box::new(EspPeriodicTimer { timer, period }))
    }
}

// esp_timer commands are applied synchronously, the wait bound is never hit
impl PeriodicTimer for EspPeriodicTimer {
    fn start(&mut self, _wait: Duration) -> Result<(), PipelineError> {
        self.timer
            .every(self.period)
            .map_err(|_| PipelineError::TimerCommandTimeout)
    }

    fn stop(&mut self, _wait: Duration) -> Result<(), PipelineError> {
        self.timer
            .cancel()
            .map(|_| ())
            .map_err(|_| PipelineError::TimerCommandTimeout)
    }
}

/// Take the peripherals and build the board, plus the receive pump.
pub fn take_board() -> Result<(Board, RxPump), EspError> {
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let led = PinDriver::output(pins.gpio2.downgrade_output())?;

    let config = UartConfig::default().baudrate(Hertz(BAUD_RATE));
    let uart = UartDriver::new(
        peripherals.uart1,
        pins.gpio4,
        pins.gpio5,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &config,
    )?;
    let port = uart.port();
    let (tx, rx) = uart.into_split();

    let board = Board {
        led: Box::new(EspLed { pin: led }),
        serial: Box::new(EspSerialTx { uart: tx }),
        rx_control: Box::new(EspRxControl { port }),
        rtc: Box::new(SystemRtc),
        timers: Box::new(EspTimerSource { service: EspTaskTimerService::new()? }),
    };

    Ok((board, RxPump { uart: rx }))
}
