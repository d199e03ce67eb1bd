//! Serial line: blocking transmit and receive-interrupt control.

use crate::error::PipelineError;

/// Blocking "transmit N bytes".
pub trait SerialTx: Send {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PipelineError>;
}

/// Control over the receive interrupt source.
pub trait RxControl: Send {
    /// Mask the receive interrupt. Must be idempotent.
    fn disable_rx(&mut self);
}

/// Adapter for any `std::io::Write` sink (stdout on the host).
pub struct IoSerial<W: std::io::Write + Send>(pub W);

impl<W: std::io::Write + Send> SerialTx for IoSerial<W> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        self.0.write_all(bytes).map_err(|_| PipelineError::SerialWrite)?;
        self.0.flush().map_err(|_| PipelineError::SerialWrite)
    }
}
