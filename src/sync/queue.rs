//! Bounded blocking FIFO.
//!
//! A `crossbeam_channel::bounded(N)` channel plus a shutdown channel that
//! never carries a message. Producers block while full, consumers block
//! while empty, each up to an optional bound. Closing drops the shutdown
//! sender, which wakes every waiter selecting on it.
//!
//! After close, producers fail with `Closed` and get their item back, the
//! consumer drains what is left and then sees `Closed`.

use std::sync::Mutex;

use crossbeam_channel::{bounded, Receiver, Select, Sender, TryRecvError, TrySendError};

use crate::error::{PipelineError, SendError, WaitBound};

/// Multi-producer, multi-consumer bounded queue.
pub struct BoundedQueue<T, const N: usize> {
    tx: Sender<T>,
    rx: Receiver<T>,
    shutdown: Mutex<Option<Sender<()>>>,
    closed: Receiver<()>,
}

impl<T, const N: usize> BoundedQueue<T, N> {
    pub fn new() -> Self {
        let (tx, rx) = bounded(N);
        let (shutdown, closed) = bounded(0);
        Self { tx, rx, shutdown: Mutex::new(Some(shutdown)), closed }
    }

    /// Push to the back, blocking while full.
    ///
    /// `wait = None` blocks until space frees up or the queue is closed.
    pub fn send(&self, item: T, wait: WaitBound) -> Result<(), SendError<T>> {
        if self.is_closed() {
            return Err(SendError { item, reason: PipelineError::Closed });
        }

        let mut sel = Select::new();
        let push = sel.send(&self.tx);
        let shutdown = sel.recv(&self.closed);

        let oper = match wait {
            None => sel.select(),
            Some(d) => match sel.select_timeout(d) {
                Ok(oper) => oper,
                Err(_) => return Err(SendError { item, reason: PipelineError::QueueFull }),
            },
        };

        if oper.index() == push {
            oper.send(&self.tx, item)
                .map_err(|e| SendError { item: e.into_inner(), reason: PipelineError::Closed })
        } else {
            debug_assert_eq!(oper.index(), shutdown);
            let _ = oper.recv(&self.closed);
            Err(SendError { item, reason: PipelineError::Closed })
        }
    }

    /// Push without blocking.
    pub fn try_send(&self, item: T) -> Result<(), SendError<T>> {
        if self.is_closed() {
            return Err(SendError { item, reason: PipelineError::Closed });
        }
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) => SendError { item, reason: PipelineError::QueueFull },
            TrySendError::Disconnected(item) => SendError { item, reason: PipelineError::Closed },
        })
    }

    /// Pop from the front, blocking while empty.
    ///
    /// Items queued before `close()` are still delivered.
    pub fn recv(&self, wait: WaitBound) -> Result<T, PipelineError> {
        match self.try_recv() {
            Err(PipelineError::Timeout) => {}
            done => return done,
        }

        let mut sel = Select::new();
        let pop = sel.recv(&self.rx);
        let shutdown = sel.recv(&self.closed);

        let oper = match wait {
            None => sel.select(),
            Some(d) => sel.select_timeout(d).map_err(|_| PipelineError::Timeout)?,
        };

        if oper.index() == pop {
            oper.recv(&self.rx).map_err(|_| PipelineError::Closed)
        } else {
            debug_assert_eq!(oper.index(), shutdown);
            let _ = oper.recv(&self.closed);
            // Something may have landed between the first look and the close
            self.rx.try_recv().map_err(|_| PipelineError::Closed)
        }
    }

    /// Pop without blocking.
    pub fn try_recv(&self) -> Result<T, PipelineError> {
        match self.rx.try_recv() {
            Ok(item) => Ok(item),
            Err(TryRecvError::Empty) if self.is_closed() => Err(PipelineError::Closed),
            Err(TryRecvError::Empty) => Err(PipelineError::Timeout),
            Err(TryRecvError::Disconnected) => Err(PipelineError::Closed),
        }
    }

    /// Refuse further pushes and wake every waiter.
    pub fn close(&self) {
        drop(self.shutdown.lock().unwrap_or_else(|e| e.into_inner()).take());
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.closed.try_recv(), Err(TryRecvError::Disconnected))
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for BoundedQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
