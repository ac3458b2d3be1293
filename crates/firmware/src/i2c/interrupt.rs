//! Interrupt-driven controller for hardware-sequenced I2C masters.
//!
//! [`InterruptController`] runs the engine's register transfers on any
//! [`BusRegisters`] implementation. Nothing here waits on the bus: `start`
//! programs the first phase and returns, and every later step happens in
//! [`on_interrupt`](I2cController::on_interrupt) as the peripheral latches
//! its flags.
//!
//! ```text
//! read   START W n=1 (software end) ─ TXIS: reg ─ TC ─ START R n=len (auto) ─ RXNE × len ─ STOPF
//! write  START W n=1+len (auto) ─ TXIS × (1+len) ─ STOPF
//! probe  START W n=0 (auto) ─ STOPF          (NACKF first when nobody answers)
//! ```

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use platform::config::MAX_TRANSFER_BYTES;
use platform::{
    AddressMode, BusRegisters, I2cAction, I2cAddress, I2cConfig, I2cController, StopMode, Transfer,
};

/// Error raised by [`InterruptController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    /// The transfer failed on the bus.
    Bus(ErrorKind),
    /// 10-bit addressing or a transfer length the peripheral cannot count.
    Unsupported,
    /// `collect` was called before the transfer finished.
    NothingArmed,
}

impl embedded_hal::i2c::Error for ControllerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Bus(kind) => *kind,
            Self::Unsupported | Self::NothingArmed => ErrorKind::Other,
        }
    }
}

/// Register byte plus the largest payload.
#[allow(clippy::arithmetic_side_effects)] // Safety: compile-time constant, no overflow
const FRAME_BYTES: usize = MAX_TRANSFER_BYTES + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    /// First phase of a read: the register byte, ending in TC.
    Addressing { address: I2cAddress, len: u8 },
    /// Second phase of a read, after the repeated START.
    Receiving { len: u8 },
    Sending,
    Probing,
    Finished(Result<(), ErrorKind>),
    Probed(bool),
}

/// [`I2cController`] over a hardware-sequenced peripheral.
pub struct InterruptController<R> {
    regs: R,
    stage: Stage,
    /// Bytes to transmit: register, then the write payload.
    frame: heapless::Vec<u8, FRAME_BYTES>,
    sent: usize,
    received: heapless::Vec<u8, MAX_TRANSFER_BYTES>,
    nacked: bool,
}

impl<R: BusRegisters> InterruptController<R> {
    /// Drive `regs`. Call [`configure`](I2cController::configure) before the
    /// first transfer.
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            stage: Stage::Idle,
            frame: heapless::Vec::new(),
            sent: 0,
            received: heapless::Vec::new(),
            nacked: false,
        }
    }

    /// Register access, for board glue and tests.
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Mutable register access, for board glue and tests.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// `true` while a transfer or probe is on the bus.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.stage,
            Stage::Addressing { .. } | Stage::Receiving { .. } | Stage::Sending | Stage::Probing
        )
    }

    fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.frame.clear();
        self.received.clear();
        self.sent = 0;
        self.nacked = false;
    }

    fn finish(&mut self, outcome: Result<(), ErrorKind>) {
        self.stage = match self.stage {
            Stage::Probing => Stage::Probed(outcome.is_ok()),
            _ => Stage::Finished(outcome),
        };
    }

    fn send_next(&mut self) {
        if let Some(&byte) = self.frame.get(self.sent) {
            self.regs.transmit(byte);
            self.sent = self.sent.saturating_add(1);
        }
    }

    fn on_stop(&mut self) {
        let outcome = if self.nacked {
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown))
        } else {
            match self.stage {
                Stage::Receiving { len } if self.received.len() == usize::from(len) => Ok(()),
                Stage::Sending if self.sent == self.frame.len() => Ok(()),
                Stage::Probing => Ok(()),
                _ => Err(ErrorKind::Other),
            }
        };
        self.finish(outcome);
    }
}

impl<R: BusRegisters> I2cController for InterruptController<R> {
    type Error = ControllerError;

    fn configure(&mut self, config: I2cConfig) -> Result<(), Self::Error> {
        if config.address_mode != AddressMode::SevenBit {
            return Err(ControllerError::Unsupported);
        }
        self.reset();
        self.regs.configure(config).map_err(ControllerError::Bus)
    }

    fn start(&mut self, transfer: Transfer<'_>) -> Result<(), Self::Error> {
        self.reset();
        match transfer {
            Transfer::Read {
                address,
                register,
                len,
            } => {
                let len = u8::try_from(len)
                    .ok()
                    .filter(|&n| n > 0 && usize::from(n) <= MAX_TRANSFER_BYTES)
                    .ok_or(ControllerError::Unsupported)?;
                self.frame
                    .push(register)
                    .map_err(|_| ControllerError::Unsupported)?;
                self.stage = Stage::Addressing { address, len };
                self.regs.begin(address, I2cAction::Write, 1, StopMode::Software);
            }
            Transfer::Write {
                address,
                register,
                data,
            } => {
                self.frame
                    .push(register)
                    .map_err(|_| ControllerError::Unsupported)?;
                self.frame
                    .extend_from_slice(data)
                    .map_err(|_| ControllerError::Unsupported)?;
                let nbytes =
                    u8::try_from(self.frame.len()).map_err(|_| ControllerError::Unsupported)?;
                self.stage = Stage::Sending;
                self.regs
                    .begin(address, I2cAction::Write, nbytes, StopMode::Automatic);
            }
        }
        Ok(())
    }

    fn on_interrupt(&mut self) {
        let flags = self.regs.take_flags();
        if !self.is_busy() {
            return;
        }
        if let Some(kind) = flags.fault {
            // BERR and ARLO release the bus without a STOP to wait for.
            self.regs.flush();
            self.finish(Err(kind));
            return;
        }
        if let (Some(byte), Stage::Receiving { .. }) = (flags.received, self.stage) {
            // Overflow shows up as a length mismatch at STOP.
            let _ = self.received.push(byte);
        }
        if flags.tx_ready {
            self.send_next();
        }
        if flags.nack {
            self.nacked = true;
            self.regs.flush();
            // Automatic-end phases stop on NACK by themselves.
            if matches!(self.stage, Stage::Addressing { .. }) {
                self.regs.stop();
            }
        }
        if flags.transfer_complete && !self.nacked {
            if let Stage::Addressing { address, len } = self.stage {
                self.stage = Stage::Receiving { len };
                self.regs
                    .begin(address, I2cAction::Read, len, StopMode::Automatic);
            }
        }
        if flags.stop {
            self.on_stop();
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Finished(_))
    }

    fn collect(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let Stage::Finished(outcome) = self.stage else {
            return Err(ControllerError::NothingArmed);
        };
        self.stage = Stage::Idle;
        outcome.map_err(ControllerError::Bus)?;
        let n = self.received.len().min(buffer.len());
        if let (Some(dst), Some(src)) = (buffer.get_mut(..n), self.received.get(..n)) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    fn start_probe(&mut self, address: I2cAddress) -> Result<(), Self::Error> {
        self.reset();
        self.stage = Stage::Probing;
        self.regs
            .begin(address, I2cAction::Write, 0, StopMode::Automatic);
        Ok(())
    }

    fn probe_status(&mut self) -> Option<bool> {
        match self.stage {
            Stage::Probed(acknowledged) => {
                self.stage = Stage::Idle;
                Some(acknowledged)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::Error as _;
    use platform::mocks::{RegisterOp, ScriptedRegisters};
    use platform::{fault_code, BusFlags, FAULT_ARBITRATION, FAULT_NACK, FAULT_OTHER};

    const ACCEL: I2cAddress = I2cAddress::new(0x18);

    type Controller = InterruptController<ScriptedRegisters>;

    fn controller() -> Controller {
        let mut controller = InterruptController::new(ScriptedRegisters::new());
        controller.configure(I2cConfig::default()).unwrap();
        controller.registers_mut().clear_ops();
        controller
    }

    fn irq(controller: &mut Controller, flags: BusFlags) {
        controller.registers_mut().raise(flags);
        controller.on_interrupt();
    }

    fn begin(action: I2cAction, nbytes: u8, stop: StopMode) -> RegisterOp {
        RegisterOp::Begin {
            address: ACCEL,
            action,
            nbytes,
            stop,
        }
    }

    #[test]
    fn read_sends_register_then_restarts_for_data() {
        let mut c = controller();
        c.start(Transfer::Read {
            address: ACCEL,
            register: 0x28,
            len: 2,
        })
        .unwrap();
        assert_eq!(
            c.registers().ops(),
            &[begin(I2cAction::Write, 1, StopMode::Software)]
        );
        assert!(c.is_busy());

        irq(&mut c, BusFlags::TX_READY);
        assert_eq!(c.registers().last_op(), Some(RegisterOp::Transmit(0x28)));
        irq(&mut c, BusFlags::TRANSFER_COMPLETE);
        assert_eq!(
            c.registers().last_op(),
            Some(begin(I2cAction::Read, 2, StopMode::Automatic))
        );

        irq(&mut c, BusFlags::received(0x33));
        assert!(!c.is_done());
        c.registers_mut().raise(BusFlags::received(0x44));
        irq(&mut c, BusFlags::STOP);
        assert!(c.is_done());

        let mut buf = [0u8; 2];
        c.collect(&mut buf).unwrap();
        assert_eq!(buf, [0x33, 0x44]);
        assert!(!c.is_done());
    }

    #[test]
    fn write_streams_register_and_payload() {
        let mut c = controller();
        c.start(Transfer::Write {
            address: ACCEL,
            register: 0x20,
            data: &[0x57, 0x08],
        })
        .unwrap();
        for _ in 0..3 {
            irq(&mut c, BusFlags::TX_READY);
        }
        irq(&mut c, BusFlags::STOP);
        assert_eq!(
            c.registers().ops(),
            &[
                begin(I2cAction::Write, 3, StopMode::Automatic),
                RegisterOp::Transmit(0x20),
                RegisterOp::Transmit(0x57),
                RegisterOp::Transmit(0x08),
            ]
        );
        c.collect(&mut []).unwrap();
    }

    #[test]
    fn address_nack_on_read_issues_stop_and_fails() {
        let mut c = controller();
        c.start(Transfer::Read {
            address: ACCEL,
            register: 0x0F,
            len: 1,
        })
        .unwrap();
        irq(&mut c, BusFlags::NACK);
        assert_eq!(
            &c.registers().ops()[1..],
            &[RegisterOp::Flush, RegisterOp::Stop]
        );
        assert!(!c.is_done());

        irq(&mut c, BusFlags::STOP);
        let err = c.collect(&mut [0u8; 1]).unwrap_err();
        assert_eq!(fault_code(err.kind()), FAULT_NACK);
    }

    #[test]
    fn data_nack_on_write_waits_for_automatic_stop() {
        let mut c = controller();
        c.start(Transfer::Write {
            address: ACCEL,
            register: 0x20,
            data: &[0x01],
        })
        .unwrap();
        irq(&mut c, BusFlags::TX_READY);
        irq(&mut c, BusFlags::NACK);
        assert_eq!(c.registers().last_op(), Some(RegisterOp::Flush));
        irq(&mut c, BusFlags::STOP);
        let err = c.collect(&mut []).unwrap_err();
        assert_eq!(fault_code(err.kind()), FAULT_NACK);
    }

    #[test]
    fn arbitration_loss_fails_without_waiting_for_stop() {
        let mut c = controller();
        c.start(Transfer::Write {
            address: ACCEL,
            register: 0x20,
            data: &[0x01],
        })
        .unwrap();
        irq(&mut c, BusFlags::fault(ErrorKind::ArbitrationLoss));
        assert!(c.is_done());
        let err = c.collect(&mut []).unwrap_err();
        assert_eq!(fault_code(err.kind()), FAULT_ARBITRATION);
    }

    #[test]
    fn short_read_is_reported_as_failure() {
        let mut c = controller();
        c.start(Transfer::Read {
            address: ACCEL,
            register: 0x28,
            len: 2,
        })
        .unwrap();
        irq(&mut c, BusFlags::TX_READY);
        irq(&mut c, BusFlags::TRANSFER_COMPLETE);
        c.registers_mut().raise(BusFlags::received(0x01));
        irq(&mut c, BusFlags::STOP);
        let mut buf = [0xAAu8; 2];
        let err = c.collect(&mut buf).unwrap_err();
        assert_eq!(fault_code(err.kind()), FAULT_OTHER);
        assert_eq!(buf, [0xAA, 0xAA]);
    }

    #[test]
    fn address_check_reports_ack_and_nack_once() {
        let mut c = controller();
        c.start_probe(ACCEL).unwrap();
        assert_eq!(
            c.registers().ops(),
            &[begin(I2cAction::Write, 0, StopMode::Automatic)]
        );
        assert_eq!(c.probe_status(), None);
        irq(&mut c, BusFlags::STOP);
        assert_eq!(c.probe_status(), Some(true));
        assert_eq!(c.probe_status(), None);

        c.start_probe(ACCEL).unwrap();
        irq(&mut c, BusFlags::NACK);
        irq(&mut c, BusFlags::STOP);
        assert_eq!(c.probe_status(), Some(false));
        assert!(!c.is_done());
    }

    #[test]
    fn stray_flags_while_idle_are_ignored() {
        let mut c = controller();
        irq(&mut c, BusFlags::STOP);
        irq(&mut c, BusFlags::TX_READY);
        assert!(!c.is_done());
        assert!(c.registers().ops().is_empty());
        assert_eq!(c.collect(&mut []), Err(ControllerError::NothingArmed));
    }

    #[test]
    fn unsupported_transfers_are_refused() {
        let mut c = controller();
        for len in [0, MAX_TRANSFER_BYTES + 1] {
            let read = Transfer::Read {
                address: ACCEL,
                register: 0,
                len,
            };
            assert_eq!(c.start(read), Err(ControllerError::Unsupported));
        }
        assert!(c.registers().ops().is_empty());

        let ten_bit = I2cConfig {
            address_mode: AddressMode::TenBit,
            ..I2cConfig::default()
        };
        assert_eq!(c.configure(ten_bit), Err(ControllerError::Unsupported));
    }

    #[test]
    fn configure_reaches_the_registers() {
        let mut c = InterruptController::new(ScriptedRegisters::new());
        c.configure(I2cConfig::default()).unwrap();
        assert_eq!(
            c.registers().ops(),
            &[RegisterOp::Configure(I2cConfig::default())]
        );

        let mut failing = ScriptedRegisters::new();
        failing.fail_configure(ErrorKind::Bus);
        let mut c = InterruptController::new(failing);
        assert_eq!(
            c.configure(I2cConfig::default()),
            Err(ControllerError::Bus(ErrorKind::Bus))
        );
    }
}
