//! Command pool accounting tests

use std::sync::Arc;

use uart_cmd_pipeline::console::Command;
use uart_cmd_pipeline::sync::{BoundedQueue, SlotPool};
use uart_cmd_pipeline::PipelineError;

#[test]
fn test_alloc_and_free_once() {
    let pool = SlotPool::new(2);
    let cmd = pool.alloc(Command::new(1)).unwrap();

    assert_eq!(cmd.code, 1);
    assert_eq!(pool.stats().in_use, 1);

    drop(cmd);
    let stats = pool.stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.allocated, 1);
    assert_eq!(stats.freed, 1);
}

#[test]
fn test_exhausted_pool_fails() {
    let pool = SlotPool::new(1);
    let _held = pool.alloc(Command::new(1)).unwrap();

    let err = pool.alloc(Command::new(2)).unwrap_err();
    assert_eq!(err, PipelineError::PoolExhausted);

    let stats = pool.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.allocated, 1);
}

#[test]
fn test_slot_moves_through_queue() {
    let pool = SlotPool::new(4);
    let q: BoundedQueue<_, 4> = BoundedQueue::new();

    q.send(pool.alloc(Command::new(5)).unwrap(), None).unwrap();
    assert_eq!(pool.stats().in_use, 1);

    let cmd = q.recv(None).unwrap();
    assert_eq!(pool.stats().freed, 0);
    drop(cmd);

    assert_eq!(pool.stats().freed, 1);
}

#[test]
fn test_rejected_send_frees_slot() {
    let pool = SlotPool::new(4);
    let q: BoundedQueue<_, 1> = BoundedQueue::new();
    q.close();

    let err = q.send(pool.alloc(Command::new(1)).unwrap(), None).unwrap_err();
    drop(err);

    let stats = pool.stats();
    assert_eq!(stats.allocated, 1);
    assert_eq!(stats.freed, 1);
}

#[test]
fn test_pool_shared_across_threads() {
    let pool = SlotPool::new(8);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                for i in 0..100u8 {
                    if let Ok(cmd) = pool.alloc(Command::new(i)) {
                        drop(cmd);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.allocated, stats.freed);
}
