//! Line buffer tests

use uart_cmd_pipeline::config::LINE_CAPACITY;
use uart_cmd_pipeline::console::line_buffer::LineBuffer;
use uart_cmd_pipeline::PipelineError;

#[test]
fn test_line_buffer_push() {
    let mut buf = LineBuffer::new();

    buf.push(b'1').unwrap();
    buf.push(b'a').unwrap();
    buf.push(b'b').unwrap();

    assert_eq!(buf.as_bytes(), b"1ab");
    assert_eq!(buf.len(), 3);
}

#[test]
fn test_line_buffer_clear() {
    let mut buf = LineBuffer::new();

    buf.push(b'5').unwrap();
    buf.clear();

    assert!(buf.is_empty());
    assert_eq!(buf.as_bytes(), b"");
}

#[test]
fn test_line_buffer_fills_to_capacity() {
    let mut buf = LineBuffer::new();

    for i in 0..LINE_CAPACITY {
        assert!(buf.push(b'0' + (i % 10) as u8).is_ok());
    }

    assert_eq!(buf.len(), LINE_CAPACITY);
    assert!(!buf.is_overflowed());
}

// Fixed defect: an unbounded cursor used to write past the end of the buffer.
#[test]
fn test_line_buffer_overflow_is_bounded() {
    let mut buf = LineBuffer::new();

    for i in 0..(LINE_CAPACITY + 7) {
        let _ = buf.push(b'a' + (i % 26) as u8);
    }

    assert_eq!(buf.len(), LINE_CAPACITY);
    assert_eq!(buf.dropped(), 7);
    assert!(buf.is_overflowed());
    assert_eq!(buf.push(b'z'), Err(PipelineError::LineOverflow));
}

#[test]
fn test_line_buffer_clear_resets_overflow() {
    let mut buf = LineBuffer::new();

    for _ in 0..(LINE_CAPACITY + 1) {
        let _ = buf.push(b'x');
    }
    buf.clear();

    assert_eq!(buf.dropped(), 0);
    assert!(!buf.is_overflowed());
    assert!(buf.push(b'1').is_ok());
}
