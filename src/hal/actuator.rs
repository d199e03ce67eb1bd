//! LED actuator.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::PipelineError;

/// Output pin driving the LED.
pub trait Actuator: Send {
    fn set_level(&mut self, on: bool) -> Result<(), PipelineError>;

    fn toggle(&mut self) -> Result<(), PipelineError>;

    /// Level currently driven on the pin.
    fn is_on(&self) -> Result<bool, PipelineError>;
}

/// Actuator shared by the dispatcher and the timer callback.
///
/// The lock is held only for the pin access itself.
#[derive(Clone)]
pub struct SharedActuator {
    inner: Arc<Mutex<Box<dyn Actuator>>>,
}

impl SharedActuator {
    pub fn new(actuator: Box<dyn Actuator>) -> Self {
        Self { inner: Arc::new(Mutex::new(actuator)) }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Actuator>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_level(&self, on: bool) -> Result<(), PipelineError> {
        self.lock().set_level(on)
    }

    pub fn toggle(&self) -> Result<(), PipelineError> {
        self.lock().toggle()
    }

    pub fn is_on(&self) -> Result<bool, PipelineError> {
        self.lock().is_on()
    }
}
