//! I2C request data model.
//!
//! A request describes one register transfer. Requests are registered once
//! into the engine's arena and addressed afterwards through a copyable
//! [`RequestId`].

use platform::config::MAX_TRANSFER_BYTES;
use platform::{I2cAction, I2cAddress, Transfer, TransferLen};

/// Handle to a request slot in an [`I2cEngine`](super::I2cEngine) arena.
///
/// Only meaningful for the engine that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestId(u8);

impl RequestId {
    pub(crate) const fn from_index(index: u8) -> Self {
        Self(index)
    }

    /// Arena slot index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One register transfer: direction, target, length and the bytes moved.
///
/// For reads, `data()` holds the bytes received by the last successful
/// transfer. For writes, it holds the payload to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cRequest {
    action: I2cAction,
    address: I2cAddress,
    register: u8,
    len: TransferLen,
    buffer: [u8; MAX_TRANSFER_BYTES],
}

impl I2cRequest {
    /// Read `len` bytes starting at `register`.
    pub const fn read(address: I2cAddress, register: u8, len: TransferLen) -> Self {
        Self {
            action: I2cAction::Read,
            address,
            register,
            len,
            buffer: [0; MAX_TRANSFER_BYTES],
        }
    }

    /// Write `data` starting at `register`.
    ///
    /// Returns `None` if `data` is empty or longer than
    /// [`MAX_TRANSFER_BYTES`].
    pub fn write(address: I2cAddress, register: u8, data: &[u8]) -> Option<Self> {
        let len = TransferLen::new(data.len()).ok()?;
        let mut buffer = [0; MAX_TRANSFER_BYTES];
        buffer.get_mut(..data.len())?.copy_from_slice(data);
        Some(Self {
            action: I2cAction::Write,
            address,
            register,
            len,
            buffer,
        })
    }

    /// Single-byte register write.
    #[allow(clippy::indexing_slicing)] // Safety: MAX_TRANSFER_BYTES >= 1
    pub const fn write_byte(address: I2cAddress, register: u8, value: u8) -> Self {
        let mut buffer = [0; MAX_TRANSFER_BYTES];
        buffer[0] = value;
        Self {
            action: I2cAction::Write,
            address,
            register,
            len: TransferLen::ONE,
            buffer,
        }
    }

    /// Transfer direction.
    pub fn action(&self) -> I2cAction {
        self.action
    }

    /// Slave address.
    pub fn address(&self) -> I2cAddress {
        self.address
    }

    /// Start register.
    pub fn register(&self) -> u8 {
        self.register
    }

    /// Number of data bytes.
    pub fn len(&self) -> TransferLen {
        self.len
    }

    /// Received bytes (reads) or payload (writes).
    pub fn data(&self) -> &[u8] {
        self.buffer.get(..self.len.get()).unwrap_or(&[])
    }

    /// Mutable view of [`data`](Self::data), for rewriting a write payload
    /// between submissions.
    pub fn data_mut(&mut self) -> &mut [u8] {
        let len = self.len.get();
        self.buffer.get_mut(..len).unwrap_or(&mut [])
    }

    /// Change the start register.
    pub fn set_register(&mut self, register: u8) {
        self.register = register;
    }

    pub(crate) fn transfer(&self) -> Transfer<'_> {
        match self.action {
            I2cAction::Read => Transfer::Read {
                address: self.address,
                register: self.register,
                len: self.len.get(),
            },
            I2cAction::Write => Transfer::Write {
                address: self.address,
                register: self.register,
                data: self.data(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: I2cAddress = I2cAddress::new(0x13);

    #[test]
    fn read_request_exposes_len_bytes() {
        let request = I2cRequest::read(ADDR, 0x85, TransferLen::new(4).unwrap());
        assert_eq!(request.action(), I2cAction::Read);
        assert_eq!(request.data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn write_request_copies_payload() {
        let request = I2cRequest::write(ADDR, 0x80, &[0x1F, 0x02]).unwrap();
        assert_eq!(request.data(), &[0x1F, 0x02]);
        assert_eq!(
            request.transfer(),
            Transfer::Write {
                address: ADDR,
                register: 0x80,
                data: &[0x1F, 0x02],
            }
        );
    }

    #[test]
    fn write_rejects_empty_and_oversized_payloads() {
        assert!(I2cRequest::write(ADDR, 0, &[]).is_none());
        assert!(I2cRequest::write(ADDR, 0, &[0; MAX_TRANSFER_BYTES + 1]).is_none());
    }

    #[test]
    fn write_byte_is_single_byte() {
        let request = I2cRequest::write_byte(ADDR, 0x89, 0x07);
        assert_eq!(request.data(), &[0x07]);
        assert_eq!(request.len(), TransferLen::ONE);
    }

    #[test]
    fn request_id_display() {
        assert_eq!(RequestId::from_index(3).to_string(), "#3");
    }
}
