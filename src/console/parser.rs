//! Command line decoder
//!
//! First byte minus `'0'` is the code (wrapping, no range check), the next
//! bytes up to `CMD_ARGS_LEN` are the arguments. An empty line decodes the
//! terminator itself, which lands outside the known set.

use crate::config::{CMD_ARGS_LEN, LINE_TERMINATOR};

use super::collector::CompletedLine;
use super::command::Command;

/// Code digit of a raw line
pub fn command_code(line: &[u8]) -> u8 {
    line.first().copied().unwrap_or(LINE_TERMINATOR).wrapping_sub(b'0')
}

/// Decode a completed line into a Command
pub fn parse_line(line: &CompletedLine) -> Command {
    let bytes = line.bytes.as_slice();
    let mut cmd = Command::new(command_code(bytes));

    if bytes.len() > 1 {
        let rest = &bytes[1..];
        let take = rest.len().min(CMD_ARGS_LEN);
        let _ = cmd.args.extend_from_slice(&rest[..take]);
    }

    cmd.dropped = line.dropped;
    cmd
}
