//! I2C domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `I2cAddress`: 7-bit slave address, rejects the I2C-reserved ranges
//! - `TransferLen`: byte count of one register transfer, 1..=[`MAX_TRANSFER_BYTES`]
//!
//! [`MAX_TRANSFER_BYTES`]: crate::config::MAX_TRANSFER_BYTES

use crate::config::MAX_TRANSFER_BYTES;

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "value {} outside {}..={}",
            self.value, self.min, self.max
        )
    }
}

// ── I2cAddress ───────────────────────────────────────────────────────────────

/// 7-bit I2C slave address, unshifted.
///
/// The peripheral layer performs the left shift for the R/W bit; callers
/// always deal in the 7-bit form printed in sensor datasheets.
///
/// ## Reserved I2C addresses (I2C specification):
/// - 0x00–0x07: reserved (general call, CBUS, etc.)
/// - 0x78–0x7F: reserved (10-bit address prefix, device ID, etc.)
///
/// ## Usage:
/// ```rust
/// use platform::i2c_types::I2cAddress;
///
/// // LIS3DH accelerometer with SA0 low
/// let accel = I2cAddress::new(0x18);
///
/// // VCNL4020 light/proximity sensor
/// let light = I2cAddress::try_new(0x13).unwrap();
/// assert_eq!(light.get(), 0x13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// Lowest non-reserved 7-bit address.
    pub const FIRST: u8 = 0x08;

    /// Highest non-reserved 7-bit address.
    pub const LAST: u8 = 0x77;

    /// Create an I2C address without checking reserved ranges.
    ///
    /// Only the low seven bits are kept. Prefer [`try_new`][Self::try_new]
    /// in generic code; use this for hardware-fixed constants.
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Create an I2C address, rejecting I2C-reserved ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `addr <= 0x07` or `addr >= 0x78`.
    pub fn try_new(addr: u8) -> Result<Self, OutOfRangeError> {
        if (Self::FIRST..=Self::LAST).contains(&addr) {
            Ok(Self(addr))
        } else {
            Err(OutOfRangeError {
                value: u32::from(addr),
                min: u32::from(Self::FIRST),
                max: u32::from(Self::LAST),
            })
        }
    }

    /// Return the 7-bit I2C address.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Iterate every non-reserved 7-bit address, in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::FIRST..=Self::LAST).map(Self)
    }
}

impl core::fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

// ── TransferLen ──────────────────────────────────────────────────────────────

/// Number of bytes moved by one register transfer.
///
/// Wraps a `u8` with the invariant `1 <= value <= MAX_TRANSFER_BYTES`, so a
/// request buffer can always be sliced with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct TransferLen(u8);

impl TransferLen {
    /// A single-byte transfer (the common register read/write).
    pub const ONE: Self = Self(1);

    /// Create a `TransferLen`, returning an error if out of range.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `len == 0` or `len > MAX_TRANSFER_BYTES`.
    #[allow(clippy::cast_possible_truncation)] // Safety: len <= MAX_TRANSFER_BYTES (32) checked first
    pub fn new(len: usize) -> Result<Self, OutOfRangeError> {
        if len == 0 || len > MAX_TRANSFER_BYTES {
            Err(OutOfRangeError {
                value: u32::try_from(len).unwrap_or(u32::MAX),
                min: 1,
                max: MAX_TRANSFER_BYTES as u32,
            })
        } else {
            Ok(Self(len as u8))
        }
    }

    /// `const` constructor for table entries. `None` when out of range.
    #[must_use]
    pub const fn from_u8(len: u8) -> Option<Self> {
        if len == 0 || len as usize > MAX_TRANSFER_BYTES {
            None
        } else {
            Some(Self(len))
        }
    }

    /// Return the byte count.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for TransferLen {
    fn default() -> Self {
        Self::ONE
    }
}
