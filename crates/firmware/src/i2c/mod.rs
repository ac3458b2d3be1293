//! I2C transaction queue
//!
//! - [`request`] - request data model and [`RequestId`] handles
//! - [`ring`] - the pending-request FIFO
//! - [`engine`] - the interrupt-chained queue itself
//! - [`blocking`] - register helpers for start-up code
//! - [`interrupt`] - interrupt-driven controller over [`platform::BusRegisters`]
//! - `stm32` - I2C1 register access on the STM32L072 (`hardware` feature)
//!
//! [`I2cPumpJob`] is the scheduler job that keeps the queue moving.

pub mod blocking;
pub mod engine;
pub mod error;
pub mod interrupt;
pub mod request;
pub mod ring;
#[cfg(feature = "hardware")]
pub mod stm32;

pub use interrupt::{ControllerError, InterruptController};
pub use engine::{CompletionEvent, I2cEngine, I2cStats};
pub use error::I2cError;
pub use request::{I2cRequest, RequestId};
pub use ring::RequestRing;

use platform::I2cController;

use crate::jobs::{Job, JobControl};
use crate::log::error;

/// `RunRun` job that pumps one engine.
///
/// An uninitialised engine is a start-up bug, so it enters the error state.
pub struct I2cPumpJob<'e, C, const Q: usize, const S: usize> {
    engine: &'e I2cEngine<C, Q, S>,
}

impl<'e, C: I2cController, const Q: usize, const S: usize> I2cPumpJob<'e, C, Q, S> {
    /// Pump `engine`.
    pub fn new(engine: &'e I2cEngine<C, Q, S>) -> Self {
        Self { engine }
    }
}

impl<C: I2cController, const Q: usize, const S: usize> Job for I2cPumpJob<'_, C, Q, S> {
    fn run(&mut self, ctl: &JobControl) {
        if let Err(e) = self.engine.process_one() {
            error!("i2c pump: {}", e);
            ctl.error_state_enter(e.code());
        }
    }
}
