//! Bounded object pool with allocation accounting.
//!
//! A [`Pooled`] value owns one slot of its pool. The slot is returned when
//! the value is dropped, wherever that happens, so a value moved through a
//! queue is freed exactly once by whoever ends up holding it.

use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::PipelineError;

/// Slot accounting for a fixed number of live objects.
pub struct SlotPool {
    capacity: usize,
    in_use: AtomicUsize,
    allocated: AtomicU32,
    freed: AtomicU32,
    failed: AtomicU32,
}

/// Pool counters at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub in_use: usize,
    pub allocated: u32,
    pub freed: u32,
    pub failed: u32,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            in_use: AtomicUsize::new(0),
            allocated: AtomicU32::new(0),
            freed: AtomicU32::new(0),
            failed: AtomicU32::new(0),
        })
    }

    /// Take a slot for `value`.
    ///
    /// Fails with `PoolExhausted` when every slot is live; `value` is
    /// dropped in that case.
    pub fn alloc<T>(self: &Arc<Self>, value: T) -> Result<Pooled<T>, PipelineError> {
        let mut used = self.in_use.load(Ordering::Relaxed);
        loop {
            if used >= self.capacity {
                self.failed.fetch_add(1, Ordering::Relaxed);
                return Err(PipelineError::PoolExhausted);
            }
            match self.in_use.compare_exchange_weak(
                used,
                used + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => used = current,
            }
        }

        self.allocated.fetch_add(1, Ordering::Relaxed);
        Ok(Pooled { value, pool: Arc::clone(self) })
    }

    fn release(&self) {
        self.freed.fetch_add(1, Ordering::Relaxed);
        self.in_use.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            in_use: self.in_use.load(Ordering::Acquire),
            allocated: self.allocated.load(Ordering::Relaxed),
            freed: self.freed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Single-owner handle to a pooled value.
pub struct Pooled<T> {
    value: T,
    pool: Arc<SlotPool>,
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        self.pool.release();
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.value.fmt(f)
    }
}
