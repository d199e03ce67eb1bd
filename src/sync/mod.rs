//! Inter-task primitives
//!
//! Blocking queues, single-slot notifications, and the bounded pool that
//! owns Command objects in flight. Host and board builds share these; on
//! ESP-IDF the channel and condvar parking sits on FreeRTOS.

pub mod notification;
pub mod pool;
pub mod queue;

pub use notification::Notification;
pub use pool::{PoolStats, Pooled, SlotPool};
pub use queue::BoundedQueue;
