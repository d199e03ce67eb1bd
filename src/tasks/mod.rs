//! Pipeline tasks.
//!
//! ```text
//!  RX ISR ──notify──► Decoder ──Command──► Dispatcher ──► LED / timer
//!     │                                        │
//!     └──notify──► Menu ───┐                   │
//!                          ▼                   ▼
//!                       output queue ──► Writer ──► UART TX
//! ```
//!
//! Each task owns a [`Context`](crate::pipeline::Context) clone and returns
//! when the queue or notification it blocks on is closed.

pub mod decoder;
pub mod dispatcher;
pub mod menu;
pub mod writer;

pub use decoder::Decoder;
pub use dispatcher::{Dispatcher, Flow};
pub use menu::Menu;
pub use writer::Writer;
