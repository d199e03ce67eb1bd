//! Single-slot notification tests

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use uart_cmd_pipeline::sync::Notification;
use uart_cmd_pipeline::PipelineError;

#[test]
fn test_notify_before_wait_is_kept() {
    let n = Notification::new();
    assert!(!n.notify());
    assert!(n.is_pending());
    assert_eq!(n.wait(Some(Duration::ZERO)), Ok(()));
    assert!(!n.is_pending());
}

#[test]
fn test_repeated_notifies_coalesce() {
    let n = Notification::new();
    n.notify();
    n.notify();
    n.notify();

    assert_eq!(n.wait(Some(Duration::ZERO)), Ok(()));
    assert_eq!(n.wait(Some(Duration::from_millis(10))), Err(PipelineError::Timeout));
}

#[test]
fn test_notify_wakes_parked_waiter() {
    let n = Arc::new(Notification::new());
    let waiter = {
        let n = Arc::clone(&n);
        thread::spawn(move || n.wait(None))
    };

    thread::sleep(Duration::from_millis(20));
    n.notify();

    assert_eq!(waiter.join().unwrap(), Ok(()));
    assert!(!n.is_pending());
}

#[test]
fn test_close_releases_waiter() {
    let n = Arc::new(Notification::new());
    let waiter = {
        let n = Arc::clone(&n);
        thread::spawn(move || n.wait(None))
    };

    thread::sleep(Duration::from_millis(20));
    n.close();

    assert_eq!(waiter.join().unwrap(), Err(PipelineError::Closed));
    assert!(n.is_closed());
    assert!(!n.notify());
}
