//! Serial command input: receive interrupt, line assembly, decoding.
//!
//! Zero heap allocation on the receive side - fixed buffers only.

pub mod collector;
pub mod command;
pub mod line_buffer;
pub mod messages;
pub mod parser;
pub mod rx;

pub use collector::{ByteOutcome, CompletedLine, LineCollector};
pub use command::{Command, CommandKind, PooledCommand};
pub use line_buffer::LineBuffer;
pub use messages::Message;
pub use parser::{command_code, parse_line};
pub use rx::{IsrResult, RxHandler};
