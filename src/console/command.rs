//! Command objects
//!
//! Wire codes are the ASCII digit minus `'0'`. The decoder stores whatever
//! code it computed; only the dispatcher decides whether it is known.

use heapless::Vec;

use crate::config::CMD_ARGS_LEN;
use crate::sync::Pooled;

/// Known command set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandKind {
    Exit = 0,
    LedOn = 1,
    LedOff = 2,
    LedToggle = 3,
    LedToggleOff = 4,
    LedReadStatus = 5,
    RtcPrintDatetime = 6,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        CommandKind::Exit,
        CommandKind::LedOn,
        CommandKind::LedOff,
        CommandKind::LedToggle,
        CommandKind::LedToggleOff,
        CommandKind::LedReadStatus,
        CommandKind::RtcPrintDatetime,
    ];

    /// Menu label
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Exit => "EXIT_APP",
            CommandKind::LedOn => "LED_ON",
            CommandKind::LedOff => "LED_OFF",
            CommandKind::LedToggle => "LED_TOGGLE",
            CommandKind::LedToggleOff => "LED_TOGGLE_OFF",
            CommandKind::LedReadStatus => "LED_READ_STATUS",
            CommandKind::RtcPrintDatetime => "RTC_PRINT_DATETIME",
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CommandKind {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CommandKind::Exit),
            1 => Ok(CommandKind::LedOn),
            2 => Ok(CommandKind::LedOff),
            3 => Ok(CommandKind::LedToggle),
            4 => Ok(CommandKind::LedToggleOff),
            5 => Ok(CommandKind::LedReadStatus),
            6 => Ok(CommandKind::RtcPrintDatetime),
            other => Err(other),
        }
    }
}

/// One decoded user instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Raw code, possibly outside the known set
    pub code: u8,
    /// Bytes after the code digit (reserved, not interpreted)
    pub args: Vec<u8, CMD_ARGS_LEN>,
    /// Bytes the receive buffer had to discard for this line
    pub dropped: u16,
}

impl Command {
    pub fn new(code: u8) -> Self {
        Self { code, args: Vec::new(), dropped: 0 }
    }

    /// Known command, or `None` for the invalid-command branch
    pub fn kind(&self) -> Option<CommandKind> {
        CommandKind::try_from(self.code).ok()
    }

    /// The line did not fit in the receive buffer
    pub fn is_overflowed(&self) -> bool {
        self.dropped > 0
    }
}

/// A Command holding one pool slot. Dropping it frees the slot.
pub type PooledCommand = Pooled<Command>;
