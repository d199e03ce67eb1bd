//! Receive interrupt entry point.
//!
//! ```text
//!   UART RX byte ──► RxHandler::on_byte ──► LineCollector
//!                          │                     │ '\r'
//!                          │                     ▼
//!                          │            notify(decoder), notify(menu)
//!                          ▼
//!                    IsrResult { outcome, yield_requested }
//! ```
//!
//! Runs in interrupt context: no blocking, no allocation, never fails.
//! After `disable()` every byte is ignored.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::fault::{FaultCode, FaultState};
use crate::logging::{EventLog, LogSource};
use crate::stats::{Counter, PipelineStats};
use crate::sync::Notification;
use crate::{ev_debug, ev_warn};

use super::collector::{ByteOutcome, CompletedLine, LineCollector};

/// Result of one receive interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsrResult {
    /// `None` when receive is disabled.
    pub outcome: Option<ByteOutcome>,
    /// A parked task was woken; the caller should yield.
    pub yield_requested: bool,
}

impl IsrResult {
    pub const IGNORED: IsrResult = IsrResult { outcome: None, yield_requested: false };

    pub fn is_ignored(&self) -> bool {
        self.outcome.is_none()
    }
}

pub struct RxHandler {
    collector: LineCollector,
    enabled: AtomicBool,
    decoder_wake: Arc<Notification>,
    menu_wake: Option<Arc<Notification>>,
    stats: Arc<PipelineStats>,
    fault: Arc<FaultState>,
    log: Arc<EventLog>,
}

impl RxHandler {
    pub fn new(
        decoder_wake: Arc<Notification>,
        menu_wake: Option<Arc<Notification>>,
        stats: Arc<PipelineStats>,
        fault: Arc<FaultState>,
        log: Arc<EventLog>,
    ) -> Self {
        Self {
            collector: LineCollector::new(),
            enabled: AtomicBool::new(true),
            decoder_wake,
            menu_wake,
            stats,
            fault,
            log,
        }
    }

    /// Handle one received byte.
    pub fn on_byte(&self, byte: u8) -> IsrResult {
        if !self.enabled.load(Ordering::Acquire) {
            return IsrResult::IGNORED;
        }

        self.stats.bump(Counter::BytesReceived);
        let outcome = self.collector.receive(byte);
        let mut yield_requested = false;

        match outcome {
            ByteOutcome::Stored => {}
            ByteOutcome::Dropped => self.stats.bump(Counter::BytesDropped),
            ByteOutcome::LineComplete { coalesced, overflowed } => {
                self.stats.bump(Counter::LinesCompleted);
                if coalesced {
                    self.stats.bump(Counter::LinesCoalesced);
                    let lost = self.stats.get(Counter::LinesCoalesced);
                    self.fault.set(FaultCode::LineCoalesced, lost);
                    ev_debug!(LogSource::Isr, self.log, "line replaced before decode");
                }
                if overflowed {
                    self.stats.bump(Counter::LinesOverflowed);
                    ev_warn!(LogSource::Isr, self.log, "line overflow");
                }

                yield_requested |= self.decoder_wake.notify();
                if let Some(menu) = &self.menu_wake {
                    yield_requested |= menu.notify();
                }
            }
        }

        IsrResult { outcome: Some(outcome), yield_requested }
    }

    /// Feed a run of bytes, as a burst of interrupts would.
    pub fn feed(&self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| !self.on_byte(b).is_ignored()).count()
    }

    /// Stop accepting bytes. Idempotent.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Decoder side: take the latched line inside the critical section.
    pub fn take_line(&self) -> Option<CompletedLine> {
        self.collector.take_line()
    }

    pub fn collector(&self) -> &LineCollector {
        &self.collector
    }
}
