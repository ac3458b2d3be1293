//! Peripheral abstraction layer
//!
//! Provides the trait-based abstraction for the interrupt-driven I2C
//! controller the firmware's transaction queue sits on. Errors are expressed
//! through `embedded_hal::i2c::Error`, so any embedded-hal 1.0 bus error can
//! flow through unchanged and be reduced to a numeric fault code with
//! [`fault_code`].

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

use crate::i2c_types::I2cAddress;

/// Direction of a register transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cAction {
    /// Read `len` bytes starting at a device register.
    Read,
    /// Write a payload starting at a device register.
    Write,
}

/// One register-addressed transfer handed to the controller when it is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer<'a> {
    /// Register read (memory-read with repeated start).
    Read {
        /// 7-bit slave address.
        address: I2cAddress,
        /// Device-internal register to start reading from.
        register: u8,
        /// Number of bytes to read.
        len: usize,
    },
    /// Register write (register byte followed by payload).
    Write {
        /// 7-bit slave address.
        address: I2cAddress,
        /// Device-internal register to start writing at.
        register: u8,
        /// Bytes written after the register byte.
        data: &'a [u8],
    },
}

impl Transfer<'_> {
    /// Direction of this transfer.
    pub fn action(&self) -> I2cAction {
        match self {
            Self::Read { .. } => I2cAction::Read,
            Self::Write { .. } => I2cAction::Write,
        }
    }

    /// Target slave address.
    pub fn address(&self) -> I2cAddress {
        match self {
            Self::Read { address, .. } | Self::Write { address, .. } => *address,
        }
    }

    /// Device register the transfer starts at.
    pub fn register(&self) -> u8 {
        match self {
            Self::Read { register, .. } | Self::Write { register, .. } => *register,
        }
    }

    /// Number of data bytes moved (excluding the register byte).
    pub fn len(&self) -> usize {
        match self {
            Self::Read { len, .. } => *len,
            Self::Write { data, .. } => data.len(),
        }
    }

    /// `true` for a zero-length transfer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interrupt-driven I2C controller.
///
/// The controller owns one I2C peripheral. A transfer is *armed* with
/// [`start`](Self::start), which only programs the peripheral and returns;
/// the bytes move while the CPU does other work. Each bus interrupt is
/// forwarded to [`on_interrupt`](Self::on_interrupt), and once
/// [`is_done`](Self::is_done) reports the end of the transfer the outcome is
/// taken with [`collect`](Self::collect). At most one transfer is armed at a
/// time; the caller guarantees it never calls `start` again before the
/// previous outcome has been collected.
pub trait I2cController {
    /// Error type
    type Error: embedded_hal::i2c::Error;

    /// Apply bus configuration. Called once from the owner's init.
    fn configure(&mut self, config: I2cConfig) -> Result<(), Self::Error>;

    /// Arm a transfer.
    ///
    /// For writes the controller copies `data` before returning.
    fn start(&mut self, transfer: Transfer<'_>) -> Result<(), Self::Error>;

    /// Service one bus interrupt: move the next byte, react to NACK, STOP
    /// or bus faults. Controllers whose hardware finishes transfers on its
    /// own leave this empty.
    fn on_interrupt(&mut self) {}

    /// `true` once the armed transfer has finished and its outcome can be
    /// collected. Used to reject spurious completion interrupts.
    fn is_done(&self) -> bool;

    /// Collect the outcome of the finished transfer.
    ///
    /// For reads, the received bytes are copied into `buffer` (whose length
    /// equals the armed `len`). Writes ignore `buffer`.
    fn collect(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Start an address-only probe of `address`. Only valid while no
    /// transfer is armed.
    fn start_probe(&mut self, address: I2cAddress) -> Result<(), Self::Error>;

    /// Outcome of the running probe: `None` while the address phase is
    /// still on the bus, then `Some(acknowledged)` exactly once.
    fn probe_status(&mut self) -> Option<bool>;
}

// ── Register access ──────────────────────────────────────────────────────────

/// How a hardware-sequenced transfer ends once its byte count is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopMode {
    /// The peripheral generates STOP by itself.
    Automatic,
    /// The peripheral raises transfer-complete and holds the bus, so a
    /// repeated START can follow.
    Software,
}

/// Status flags latched by the peripheral since the last interrupt.
///
/// Produced by [`BusRegisters::take_flags`], which also clears them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusFlags {
    /// Transmit register empty; the next byte must be written.
    pub tx_ready: bool,
    /// Byte read out of the receive register.
    pub received: Option<u8>,
    /// Byte count reached with [`StopMode::Software`].
    pub transfer_complete: bool,
    /// The address or a data byte was not acknowledged.
    pub nack: bool,
    /// STOP condition seen; the transfer is over.
    pub stop: bool,
    /// Bus error, lost arbitration or overrun. The peripheral has already
    /// released the bus.
    pub fault: Option<ErrorKind>,
}

impl BusFlags {
    /// Nothing latched.
    pub const NONE: Self = Self {
        tx_ready: false,
        received: None,
        transfer_complete: false,
        nack: false,
        stop: false,
        fault: None,
    };
    /// Only TXIS.
    pub const TX_READY: Self = Self {
        tx_ready: true,
        ..Self::NONE
    };
    /// Only TC.
    pub const TRANSFER_COMPLETE: Self = Self {
        transfer_complete: true,
        ..Self::NONE
    };
    /// Only NACKF.
    pub const NACK: Self = Self {
        nack: true,
        ..Self::NONE
    };
    /// Only STOPF.
    pub const STOP: Self = Self {
        stop: true,
        ..Self::NONE
    };

    /// Only RXNE, carrying `byte`.
    pub const fn received(byte: u8) -> Self {
        Self {
            received: Some(byte),
            ..Self::NONE
        }
    }

    /// Only an error flag.
    pub const fn fault(kind: ErrorKind) -> Self {
        Self {
            fault: Some(kind),
            ..Self::NONE
        }
    }
}

/// Register-level access to an I2C master that sequences transfers in
/// hardware (START, address, byte counting, STOP), as the STM32 I2C v2
/// peripheral does.
///
/// Every method is a handful of register accesses and returns at once.
pub trait BusRegisters {
    /// Program timing for `config`. The peripheral stays enabled afterwards
    /// with its event and error interrupts unmasked.
    fn configure(&mut self, config: I2cConfig) -> Result<(), ErrorKind>;

    /// Generate START and the address byte for a transfer of `nbytes`.
    fn begin(&mut self, address: I2cAddress, action: I2cAction, nbytes: u8, stop: StopMode);

    /// Write one byte to the transmit register.
    fn transmit(&mut self, byte: u8);

    /// Generate STOP after the current byte.
    fn stop(&mut self);

    /// Read and clear the latched status flags.
    fn take_flags(&mut self) -> BusFlags;

    /// Discard any byte left in the transmit register after a failure.
    fn flush(&mut self);
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Addressing mode
    pub address_mode: AddressMode,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: crate::config::I2C_BUS_FREQUENCY_HZ,
            address_mode: AddressMode::SevenBit,
        }
    }
}

/// I2C addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    /// 7-bit addressing
    SevenBit,
    /// 10-bit addressing
    TenBit,
}

// ── Fault codes ──────────────────────────────────────────────────────────────
//
// Numeric codes stored in a failed transfer's future. The bit values follow
// the STM32 HAL `HAL_I2C_ERROR_*` flags so codes read the same in RTT logs
// as in ST's reference material.

/// Misplaced START/STOP detected (bus error).
pub const FAULT_BUS: i32 = 0x01;
/// Arbitration lost to another master.
pub const FAULT_ARBITRATION: i32 = 0x02;
/// Address or data byte not acknowledged.
pub const FAULT_NACK: i32 = 0x04;
/// Receive overrun / transmit underrun.
pub const FAULT_OVERRUN: i32 = 0x08;
/// Any other controller failure (DMA, timeout, unsupported configuration).
pub const FAULT_OTHER: i32 = 0x20;

/// Reduce an embedded-hal I2C error kind to a numeric fault code.
pub fn fault_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Bus => FAULT_BUS,
        ErrorKind::ArbitrationLoss => FAULT_ARBITRATION,
        ErrorKind::NoAcknowledge(_) => FAULT_NACK,
        ErrorKind::Overrun => FAULT_OVERRUN,
        _ => FAULT_OTHER,
    }
}

/// Inverse of [`fault_code`], used when a code has to be re-raised as an
/// `embedded_hal` error (mocks, fault injection).
pub fn fault_kind(code: i32) -> ErrorKind {
    match code {
        FAULT_BUS => ErrorKind::Bus,
        FAULT_ARBITRATION => ErrorKind::ArbitrationLoss,
        FAULT_NACK => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
        FAULT_OVERRUN => ErrorKind::Overrun,
        _ => ErrorKind::Other,
    }
}
