//! Single-slot task notification.
//!
//! At most one wake is pending per task. Several `notify()` calls before
//! the task runs collapse into one wake: the task learns that *at least
//! one* event happened, never how many. Callers that need a count must keep
//! it elsewhere (see `PipelineStats::LinesCoalesced`).

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

use crate::error::{PipelineError, WaitBound};

#[derive(Default)]
struct NotifyState {
    pending: bool,
    waiting: bool,
    closed: bool,
}

pub struct Notification {
    state: Mutex<NotifyState>,
    wake: Condvar,
}

impl Notification {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NotifyState::default()),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NotifyState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the pending flag. Never blocks on the waiter and never fails.
    ///
    /// Returns `true` when a task was parked on this notification, which is
    /// the caller's hint to request a context switch.
    pub fn notify(&self) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.pending = true;
        let woke = state.waiting;
        drop(state);
        self.wake.notify_one();
        woke
    }

    /// Block until a notification is pending, then consume it.
    ///
    /// Fails with `Closed` once the owner tore the notification down, and
    /// with `Timeout` when the bound expires.
    pub fn wait(&self, wait: WaitBound) -> Result<(), PipelineError> {
        let deadline = wait.map(|d| Instant::now() + d);
        let mut state = self.lock();

        loop {
            if state.closed {
                state.waiting = false;
                return Err(PipelineError::Closed);
            }
            if state.pending {
                state.pending = false;
                state.waiting = false;
                return Ok(());
            }

            state.waiting = true;
            state = match deadline {
                None => self.wake.wait(state).unwrap_or_else(|e| e.into_inner()),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        state.waiting = false;
                        return Err(PipelineError::Timeout);
                    }
                    self.wake
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(|e| e.into_inner())
                        .0
                }
            };
        }
    }

    /// True if a wake is pending and not yet consumed.
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Release the waiting task for good.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.pending = false;
        drop(state);
        self.wake.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl Default for Notification {
    fn default() -> Self {
        Self::new()
    }
}
