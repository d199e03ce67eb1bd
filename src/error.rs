//! Pipeline error types
//!
//! Every fallible task-context operation returns one of these. The
//! dispatcher is the only place that turns them into serial text.

use core::time::Duration;

/// Pipeline error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// E01: Bounded wait on a queue push expired
    QueueFull,
    /// E02: Bounded wait on a queue pop or notification expired
    Timeout,
    /// E03: Queue or notification was closed by shutdown
    Closed,
    /// E04: No free Command slot
    PoolExhausted,
    /// E05: Timer service did not accept the command in time
    TimerCommandTimeout,
    /// E06: Timer could not be created
    TimerUnavailable,
    /// E07: Line exceeded the receive buffer
    LineOverflow,
    /// E08: Actuator did not respond
    ActuatorUnavailable,
    /// E09: Serial transmit failed
    SerialWrite,
    /// E10: Task thread could not be spawned
    TaskSpawn,
}

impl PipelineError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::QueueFull => "E01",
            Self::Timeout => "E02",
            Self::Closed => "E03",
            Self::PoolExhausted => "E04",
            Self::TimerCommandTimeout => "E05",
            Self::TimerUnavailable => "E06",
            Self::LineOverflow => "E07",
            Self::ActuatorUnavailable => "E08",
            Self::SerialWrite => "E09",
            Self::TaskSpawn => "E10",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::QueueFull => "queue full",
            Self::Timeout => "wait timed out",
            Self::Closed => "closed",
            Self::PoolExhausted => "out of command slots",
            Self::TimerCommandTimeout => "timer command timed out",
            Self::TimerUnavailable => "timer unavailable",
            Self::LineOverflow => "line too long",
            Self::ActuatorUnavailable => "actuator unavailable",
            Self::SerialWrite => "serial write failed",
            Self::TaskSpawn => "task spawn failed",
        }
    }
}

impl core::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for PipelineError {}

/// Failed push. Hands the undelivered item back to the caller.
pub struct SendError<T> {
    pub item: T,
    pub reason: PipelineError,
}

impl<T> SendError<T> {
    /// Drop the item and keep only the reason.
    pub fn into_error(self) -> PipelineError {
        self.reason
    }
}

impl<T> core::fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SendError").field("reason", &self.reason).finish_non_exhaustive()
    }
}

impl<T> From<SendError<T>> for PipelineError {
    fn from(e: SendError<T>) -> Self {
        e.reason
    }
}

/// Optional bound on a blocking wait. `None` waits forever.
pub type WaitBound = Option<Duration>;
