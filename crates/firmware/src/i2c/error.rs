//! I2C engine error type.

/// Errors returned by [`I2cEngine`](super::I2cEngine) operations.
///
/// Transfer failures on the bus are *not* reported here; they resolve the
/// request's future to `Error` instead. Only the blocking register helpers
/// turn a failed future into [`I2cError::Transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// `init` has not run yet.
    NotInitialized,
    /// `init` was called a second time.
    AlreadyInitialized,
    /// The controller rejected the bus configuration (fault code attached).
    Init(i32),
    /// The id does not name a registered request.
    UnknownRequest,
    /// Every request slot is taken.
    ArenaFull,
    /// The pending-request ring is full; nothing was queued.
    QueueFull,
    /// The request is already queued or in flight.
    AlreadyQueued,
    /// The request cannot be modified while queued or in flight.
    RequestBusy,
    /// A transfer is in flight; the bus cannot be probed.
    Busy,
    /// Buffer or payload length outside 1..=`MAX_TRANSFER_BYTES`.
    InvalidLength,
    /// A blocking transfer resolved to `Error` (fault code attached).
    Transfer(i32),
}

impl I2cError {
    /// Negative errno-style code, for storing in a job error slot.
    pub const fn code(self) -> i32 {
        match self {
            Self::NotInitialized => -19, // ENODEV
            Self::AlreadyInitialized => -114, // EALREADY
            Self::Init(_) | Self::Transfer(_) => -5, // EIO
            Self::UnknownRequest | Self::InvalidLength => -22, // EINVAL
            Self::ArenaFull | Self::QueueFull => -12, // ENOMEM
            Self::AlreadyQueued | Self::RequestBusy | Self::Busy => -16, // EBUSY
        }
    }
}

impl core::fmt::Display for I2cError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "I2C context not initialised"),
            Self::AlreadyInitialized => write!(f, "I2C context already initialised"),
            Self::Init(code) => write!(f, "I2C init failed (fault 0x{code:02X})"),
            Self::UnknownRequest => write!(f, "Unknown request id"),
            Self::ArenaFull => write!(f, "Request arena full"),
            Self::QueueFull => write!(f, "I2C queue full"),
            Self::AlreadyQueued => write!(f, "Request already queued"),
            Self::RequestBusy => write!(f, "Request busy"),
            Self::Busy => write!(f, "I2C bus busy"),
            Self::InvalidLength => write!(f, "Invalid transfer length"),
            Self::Transfer(code) => write!(f, "I2C transfer failed (fault 0x{code:02X})"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for I2cError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative() {
        for err in [
            I2cError::NotInitialized,
            I2cError::AlreadyInitialized,
            I2cError::Init(0x20),
            I2cError::UnknownRequest,
            I2cError::ArenaFull,
            I2cError::QueueFull,
            I2cError::AlreadyQueued,
            I2cError::RequestBusy,
            I2cError::Busy,
            I2cError::InvalidLength,
            I2cError::Transfer(0x04),
        ] {
            assert!(err.code() < 0, "{err}");
        }
    }

    #[test]
    fn display_includes_fault_code() {
        assert_eq!(
            I2cError::Transfer(0x04).to_string(),
            "I2C transfer failed (fault 0x04)"
        );
    }
}
