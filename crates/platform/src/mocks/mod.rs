//! Mock implementations for testing
//!
//! This module provides a simulated interrupt-driven I2C controller for use
//! in unit and integration tests, plus a scripted register file for testing
//! drivers written against [`BusRegisters`]. Devices are modelled as
//! 256-byte register files; reads and writes go straight to them.

#![cfg(any(test, feature = "std"))]

use crate::i2c_types::I2cAddress;
use crate::peripheral::{
    fault_kind, BusFlags, BusRegisters, I2cAction, I2cConfig, I2cController, StopMode, Transfer,
    FAULT_NACK, FAULT_OTHER,
};
use crate::config::MAX_TRANSFER_BYTES;
use embedded_hal::i2c::ErrorKind;

/// Maximum number of simulated devices on one mock bus.
pub const MOCK_DEVICES: usize = 8;

/// Number of transfer records kept by [`MockI2c`].
pub const MOCK_HISTORY: usize = 64;

/// Error raised by [`MockI2c`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockI2cError {
    kind: ErrorKind,
}

impl MockI2cError {
    /// Build an error from a numeric fault code.
    pub fn from_code(code: i32) -> Self {
        Self {
            kind: fault_kind(code),
        }
    }
}

impl embedded_hal::i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// One armed transfer, as the mock saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRecord {
    /// Direction.
    pub action: I2cAction,
    /// Slave address.
    pub address: I2cAddress,
    /// Start register.
    pub register: u8,
    /// Byte count.
    pub len: usize,
}

struct MockDevice {
    address: I2cAddress,
    registers: [u8; 256],
}

struct Pending {
    len: usize,
    outcome: Result<heapless::Vec<u8, MAX_TRANSFER_BYTES>, i32>,
}

/// Simulated interrupt-driven I2C controller.
///
/// By default every armed transfer finishes immediately, so the caller only
/// has to invoke its completion handler. Call
/// [`set_auto_complete(false)`](Self::set_auto_complete) to hold transfers
/// until [`complete`](Self::complete) is called.
pub struct MockI2c {
    devices: heapless::Vec<MockDevice, MOCK_DEVICES>,
    pending: Option<Pending>,
    done: bool,
    auto_complete: bool,
    fail_next_transfer: Option<i32>,
    reject_next_start: Option<i32>,
    fail_configure: Option<i32>,
    config: Option<I2cConfig>,
    history: heapless::Vec<TransferRecord, MOCK_HISTORY>,
    arm_count: usize,
    overlapping_arms: usize,
    probe_count: usize,
    probe_result: Option<bool>,
}

impl MockI2c {
    /// Create an empty mock bus.
    pub fn new() -> Self {
        Self {
            devices: heapless::Vec::new(),
            pending: None,
            done: false,
            auto_complete: true,
            fail_next_transfer: None,
            reject_next_start: None,
            fail_configure: None,
            config: None,
            history: heapless::Vec::new(),
            arm_count: 0,
            overlapping_arms: 0,
            probe_count: 0,
            probe_result: None,
        }
    }

    /// Attach a device at `address` with all registers zeroed.
    ///
    /// Silently ignored once [`MOCK_DEVICES`] devices are attached.
    #[must_use]
    pub fn with_device(mut self, address: I2cAddress) -> Self {
        self.add_device(address);
        self
    }

    /// Attach a device at `address` with all registers zeroed.
    pub fn add_device(&mut self, address: I2cAddress) {
        if self.device_mut(address).is_none() {
            let _ = self.devices.push(MockDevice {
                address,
                registers: [0; 256],
            });
        }
    }

    /// Set one register of an attached device. No-op for unknown addresses.
    pub fn set_register(&mut self, address: I2cAddress, register: u8, value: u8) {
        if let Some(device) = self.device_mut(address) {
            if let Some(slot) = device.registers.get_mut(usize::from(register)) {
                *slot = value;
            }
        }
    }

    /// Read one register of an attached device.
    pub fn register(&self, address: I2cAddress, register: u8) -> Option<u8> {
        self.devices
            .iter()
            .find(|d| d.address == address)
            .and_then(|d| d.registers.get(usize::from(register)).copied())
    }

    /// Hold (false) or immediately finish (true) armed transfers.
    pub fn set_auto_complete(&mut self, enabled: bool) {
        self.auto_complete = enabled;
    }

    /// Finish the held transfer, as the hardware would before raising its
    /// completion interrupt.
    pub fn complete(&mut self) {
        if self.pending.is_some() {
            self.done = true;
        }
    }

    /// Make the next collected transfer fail with `code`, including one that
    /// is already armed. Writes still reach the register file.
    pub fn fail_next_transfer(&mut self, code: i32) {
        self.fail_next_transfer = Some(code);
    }

    /// Make the next `start` call fail with `code`.
    pub fn reject_next_start(&mut self, code: i32) {
        self.reject_next_start = Some(code);
    }

    /// Make `configure` fail with `code`.
    pub fn fail_configure(&mut self, code: i32) {
        self.fail_configure = Some(code);
    }

    /// Configuration applied by the last successful `configure`.
    pub fn config(&self) -> Option<I2cConfig> {
        self.config
    }

    /// Every armed transfer, oldest first (capped at [`MOCK_HISTORY`]).
    pub fn history(&self) -> &[TransferRecord] {
        &self.history
    }

    /// Number of successful `start` calls.
    pub fn arm_count(&self) -> usize {
        self.arm_count
    }

    /// Number of `start` calls made while a previous transfer was still
    /// uncollected. Always zero for a correct driver.
    pub fn overlapping_arms(&self) -> usize {
        self.overlapping_arms
    }

    /// Number of `start_probe` calls.
    pub fn probe_count(&self) -> usize {
        self.probe_count
    }

    /// `true` while a transfer is armed and not yet collected.
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    fn device_mut(&mut self, address: I2cAddress) -> Option<&mut MockDevice> {
        self.devices.iter_mut().find(|d| d.address == address)
    }

    fn execute(&mut self, transfer: &Transfer<'_>) -> Result<heapless::Vec<u8, MAX_TRANSFER_BYTES>, i32> {
        let Some(device) = self.device_mut(transfer.address()) else {
            return Err(FAULT_NACK);
        };
        let mut received = heapless::Vec::new();
        let mut register = transfer.register();
        match transfer {
            Transfer::Read { len, .. } => {
                for _ in 0..*len {
                    let value = device
                        .registers
                        .get(usize::from(register))
                        .copied()
                        .unwrap_or_default();
                    received.push(value).map_err(|_| FAULT_OTHER)?;
                    register = register.wrapping_add(1);
                }
            }
            Transfer::Write { data, .. } => {
                for byte in *data {
                    if let Some(slot) = device.registers.get_mut(usize::from(register)) {
                        *slot = *byte;
                    }
                    register = register.wrapping_add(1);
                }
            }
        }
        Ok(received)
    }
}

impl Default for MockI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cController for MockI2c {
    type Error = MockI2cError;

    fn configure(&mut self, config: I2cConfig) -> Result<(), Self::Error> {
        if let Some(code) = self.fail_configure {
            return Err(MockI2cError::from_code(code));
        }
        self.config = Some(config);
        Ok(())
    }

    fn start(&mut self, transfer: Transfer<'_>) -> Result<(), Self::Error> {
        if self.pending.is_some() {
            self.overlapping_arms = self.overlapping_arms.saturating_add(1);
        }
        if let Some(code) = self.reject_next_start.take() {
            return Err(MockI2cError::from_code(code));
        }
        let _ = self.history.push(TransferRecord {
            action: transfer.action(),
            address: transfer.address(),
            register: transfer.register(),
            len: transfer.len(),
        });
        self.arm_count = self.arm_count.saturating_add(1);

        let outcome = self.execute(&transfer);
        self.pending = Some(Pending {
            len: transfer.len(),
            outcome,
        });
        self.done = self.auto_complete;
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.pending.is_some() && self.done
    }

    fn collect(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let Some(pending) = self.pending.take() else {
            return Err(MockI2cError::from_code(FAULT_OTHER));
        };
        self.done = false;
        if let Some(code) = self.fail_next_transfer.take() {
            return Err(MockI2cError::from_code(code));
        }
        let received = pending.outcome.map_err(MockI2cError::from_code)?;
        let n = pending.len.min(received.len()).min(buffer.len());
        if let (Some(dst), Some(src)) = (buffer.get_mut(..n), received.get(..n)) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    fn start_probe(&mut self, address: I2cAddress) -> Result<(), Self::Error> {
        if self.pending.is_some() {
            self.overlapping_arms = self.overlapping_arms.saturating_add(1);
        }
        self.probe_count = self.probe_count.saturating_add(1);
        self.probe_result = Some(self.devices.iter().any(|d| d.address == address));
        Ok(())
    }

    fn probe_status(&mut self) -> Option<bool> {
        self.probe_result.take()
    }
}

// ── Scripted register file ───────────────────────────────────────────────────

/// One command a driver issued to [`ScriptedRegisters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOp {
    /// `configure` with the given settings.
    Configure(I2cConfig),
    /// START plus address byte.
    Begin {
        /// Slave address.
        address: I2cAddress,
        /// Direction of the data phase.
        action: I2cAction,
        /// Programmed byte count.
        nbytes: u8,
        /// End-of-transfer behaviour.
        stop: StopMode,
    },
    /// Byte written to the transmit register.
    Transmit(u8),
    /// Software STOP.
    Stop,
    /// Transmit register flushed.
    Flush,
}

/// Scripted stand-in for a hardware-sequenced I2C peripheral.
///
/// Tests play the hardware: they latch status flags with
/// [`raise`](Self::raise), call the driver's interrupt handler, then check
/// the commands it issued with [`ops`](Self::ops).
#[derive(Debug, Default)]
pub struct ScriptedRegisters {
    flags: BusFlags,
    ops: heapless::Vec<RegisterOp, MOCK_HISTORY>,
    fail_configure: Option<ErrorKind>,
}

impl ScriptedRegisters {
    /// Create a register file with no flags latched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch `flags` on top of whatever is already pending.
    pub fn raise(&mut self, flags: BusFlags) {
        let pending = self.flags;
        self.flags = BusFlags {
            tx_ready: pending.tx_ready || flags.tx_ready,
            received: flags.received.or(pending.received),
            transfer_complete: pending.transfer_complete || flags.transfer_complete,
            nack: pending.nack || flags.nack,
            stop: pending.stop || flags.stop,
            fault: flags.fault.or(pending.fault),
        };
    }

    /// Make `configure` fail with `kind`.
    pub fn fail_configure(&mut self, kind: ErrorKind) {
        self.fail_configure = Some(kind);
    }

    /// Commands issued so far, oldest first (capped at [`MOCK_HISTORY`]).
    pub fn ops(&self) -> &[RegisterOp] {
        &self.ops
    }

    /// Most recent command.
    pub fn last_op(&self) -> Option<RegisterOp> {
        self.ops.last().copied()
    }

    /// Forget recorded commands.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    fn record(&mut self, op: RegisterOp) {
        let _ = self.ops.push(op);
    }
}

impl BusRegisters for ScriptedRegisters {
    fn configure(&mut self, config: I2cConfig) -> Result<(), ErrorKind> {
        if let Some(kind) = self.fail_configure {
            return Err(kind);
        }
        self.record(RegisterOp::Configure(config));
        Ok(())
    }

    fn begin(&mut self, address: I2cAddress, action: I2cAction, nbytes: u8, stop: StopMode) {
        self.record(RegisterOp::Begin {
            address,
            action,
            nbytes,
            stop,
        });
    }

    fn transmit(&mut self, byte: u8) {
        self.record(RegisterOp::Transmit(byte));
    }

    fn stop(&mut self) {
        self.record(RegisterOp::Stop);
    }

    fn take_flags(&mut self) -> BusFlags {
        core::mem::take(&mut self.flags)
    }

    fn flush(&mut self) {
        self.record(RegisterOp::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripheral::{fault_code, FAULT_ARBITRATION};
    use embedded_hal::i2c::Error as _;

    const ACCEL: I2cAddress = I2cAddress::new(0x18);

    #[test]
    fn read_returns_register_contents() {
        let mut bus = MockI2c::new().with_device(ACCEL);
        bus.set_register(ACCEL, 0x0F, 0x33);
        bus.start(Transfer::Read {
            address: ACCEL,
            register: 0x0F,
            len: 1,
        })
        .unwrap();
        assert!(bus.is_done());
        let mut buf = [0u8; 1];
        bus.collect(&mut buf).unwrap();
        assert_eq!(buf, [0x33]);
        assert!(!bus.is_armed());
    }

    #[test]
    fn write_updates_register_file() {
        let mut bus = MockI2c::new().with_device(ACCEL);
        bus.start(Transfer::Write {
            address: ACCEL,
            register: 0x20,
            data: &[0x57, 0x08],
        })
        .unwrap();
        bus.collect(&mut []).unwrap();
        assert_eq!(bus.register(ACCEL, 0x20), Some(0x57));
        assert_eq!(bus.register(ACCEL, 0x21), Some(0x08));
    }

    #[test]
    fn absent_device_nacks() {
        let mut bus = MockI2c::new();
        bus.start(Transfer::Read {
            address: ACCEL,
            register: 0,
            len: 1,
        })
        .unwrap();
        let err = bus.collect(&mut [0u8; 1]).unwrap_err();
        assert_eq!(fault_code(err.kind()), FAULT_NACK);
    }

    #[test]
    fn held_transfer_is_not_done_until_completed() {
        let mut bus = MockI2c::new().with_device(ACCEL);
        bus.set_auto_complete(false);
        bus.start(Transfer::Read {
            address: ACCEL,
            register: 0,
            len: 1,
        })
        .unwrap();
        assert!(!bus.is_done());
        bus.complete();
        assert!(bus.is_done());
    }

    #[test]
    fn injected_faults_fire_once() {
        let mut bus = MockI2c::new().with_device(ACCEL);
        bus.reject_next_start(FAULT_ARBITRATION);
        let read = Transfer::Read {
            address: ACCEL,
            register: 0,
            len: 1,
        };
        assert!(bus.start(read).is_err());
        assert_eq!(bus.arm_count(), 0);
        bus.start(read).unwrap();
        bus.collect(&mut [0u8; 1]).unwrap();
        assert_eq!(bus.arm_count(), 1);
    }

    #[test]
    fn overlapping_arm_is_counted() {
        let mut bus = MockI2c::new().with_device(ACCEL);
        let read = Transfer::Read {
            address: ACCEL,
            register: 0,
            len: 1,
        };
        bus.start(read).unwrap();
        bus.start(read).unwrap();
        assert_eq!(bus.overlapping_arms(), 1);
    }

    #[test]
    fn address_check_sees_only_attached_devices() {
        let mut bus = MockI2c::new().with_device(ACCEL);
        assert_eq!(bus.probe_status(), None);
        bus.start_probe(ACCEL).unwrap();
        assert_eq!(bus.probe_status(), Some(true));
        assert_eq!(bus.probe_status(), None);
        bus.start_probe(I2cAddress::new(0x19)).unwrap();
        assert_eq!(bus.probe_status(), Some(false));
        assert_eq!(bus.probe_count(), 2);
    }

    #[test]
    fn fault_injected_after_arming_hits_the_armed_transfer() {
        let mut bus = MockI2c::new().with_device(ACCEL);
        bus.set_auto_complete(false);
        bus.start(Transfer::Read {
            address: ACCEL,
            register: 0,
            len: 1,
        })
        .unwrap();
        bus.fail_next_transfer(FAULT_ARBITRATION);
        bus.complete();
        let err = bus.collect(&mut [0u8; 1]).unwrap_err();
        assert_eq!(fault_code(err.kind()), FAULT_ARBITRATION);

        bus.start(Transfer::Read {
            address: ACCEL,
            register: 0,
            len: 1,
        })
        .unwrap();
        bus.complete();
        bus.collect(&mut [0u8; 1]).unwrap();
    }

    #[test]
    fn scripted_flags_accumulate_until_taken() {
        let mut regs = ScriptedRegisters::new();
        regs.raise(BusFlags {
            received: Some(0x42),
            ..BusFlags::default()
        });
        regs.raise(BusFlags {
            stop: true,
            ..BusFlags::default()
        });
        let flags = regs.take_flags();
        assert_eq!(flags.received, Some(0x42));
        assert!(flags.stop);
        assert_eq!(regs.take_flags(), BusFlags::default());
    }

    #[test]
    fn scripted_registers_record_commands() {
        let mut regs = ScriptedRegisters::new();
        regs.begin(ACCEL, I2cAction::Write, 2, StopMode::Automatic);
        regs.transmit(0x20);
        regs.stop();
        assert_eq!(regs.ops().len(), 3);
        assert_eq!(regs.last_op(), Some(RegisterOp::Stop));
        regs.clear_ops();
        assert!(regs.ops().is_empty());
    }
}
