//! # UartCmdPipeline
//!
//! Interrupt-driven serial command pipeline with a periodic LED toggle.
//!
//! ## Architecture
//!
//! ```text
//!  UART RX ISR ─► LineCollector ─notify─► Decoder ─► command queue ─► Dispatcher
//!                                   │                                   │   │
//!                                   └─notify─► Menu ─┐      LED / timer ◄┘   │
//!                                                    ▼                       ▼
//!                                                 output queue ─► Writer ─► UART TX
//! ```
//!
//! - The interrupt side only appends, resets and notifies
//! - Commands are single-owner pool slots moved through the queue
//! - The dispatcher is the only stage that reports errors to the user
//! - `EXIT` is the only way down; it releases every waiting task
//!
//! Every blocking wait takes an optional bound from [`PipelineConfig`].

pub mod config;
pub mod console;
pub mod error;
pub mod fault;
pub mod hal;
pub mod log_drain;
pub mod logging;
pub mod pipeline;
pub mod stats;
pub mod sync;
pub mod tasks;
pub mod toggle;

pub use config::PipelineConfig;
pub use console::{Command, CommandKind, Message};
pub use error::{PipelineError, WaitBound};
pub use fault::{FaultCode, FaultState};
pub use pipeline::{Board, Pipeline, PipelineReport};
pub use stats::{Counter, StatsSnapshot};
pub use toggle::{ToggleController, ToggleState};
