//! Blocking register helpers for start-up code.
//!
//! Sensor init sequences are short lists of register writes and
//! read-modify-writes. These helpers run them through the queue with
//! [`I2cEngine::blocking_enqueue`], reusing one caller-owned *scratch*
//! request slot for every transfer. Call them from `Init` jobs or before
//! the scheduler starts, never from a repeating job.

use platform::{I2cAddress, I2cController, TransferLen};

use super::engine::I2cEngine;
use super::error::I2cError;
use super::request::{I2cRequest, RequestId};
use crate::future::FutureState;

impl<C: I2cController, const Q: usize, const S: usize> I2cEngine<C, Q, S> {
    /// Run the scratch request to completion and map a failed future to
    /// [`I2cError::Transfer`].
    fn run_scratch(&self, scratch: RequestId) -> Result<(), I2cError> {
        match self.blocking_enqueue(scratch)? {
            FutureState::Error => {
                let code = self.future(scratch)?.error_number().unwrap_or_default();
                Err(I2cError::Transfer(code))
            }
            _ => Ok(()),
        }
    }

    /// Write `data` to consecutive registers starting at `register`.
    pub fn write_register(
        &self,
        scratch: RequestId,
        address: I2cAddress,
        register: u8,
        data: &[u8],
    ) -> Result<(), I2cError> {
        let request = I2cRequest::write(address, register, data).ok_or(I2cError::InvalidLength)?;
        self.update(scratch, |r| *r = request)?;
        self.run_scratch(scratch)
    }

    /// Read `out.len()` consecutive registers starting at `register`.
    pub fn read_register(
        &self,
        scratch: RequestId,
        address: I2cAddress,
        register: u8,
        out: &mut [u8],
    ) -> Result<(), I2cError> {
        let len = TransferLen::new(out.len()).map_err(|_| I2cError::InvalidLength)?;
        self.update(scratch, |r| *r = I2cRequest::read(address, register, len))?;
        self.run_scratch(scratch)?;
        self.with_request(scratch, |r| out.copy_from_slice(r.data()))
    }

    /// Read-modify-write one register: bits set in `mask` take their value
    /// from `value`, the rest are preserved. Returns the value written.
    pub fn update_register_bits(
        &self,
        scratch: RequestId,
        address: I2cAddress,
        register: u8,
        mask: u8,
        value: u8,
    ) -> Result<u8, I2cError> {
        let mut current = [0u8; 1];
        self.read_register(scratch, address, register, &mut current)?;
        let [old] = current;
        let new = (old & !mask) | (value & mask);
        self.write_register(scratch, address, register, &[new])?;
        Ok(new)
    }
}
