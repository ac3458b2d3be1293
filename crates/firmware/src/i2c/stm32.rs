//! STM32L0 I2C1 register access.
//!
//! Implements [`BusRegisters`] on the I2C v2 peripheral through the
//! embassy-stm32 PAC. The embassy I2C driver is not used: it owns the I2C1
//! vector, and the engine needs that vector for its own completion handler.
//!
//! Pins are fixed to PB6 (SCL) / PB7 (SDA), alternate function 1. The
//! kernel clock is HSI16 so bus timing does not depend on the system clock
//! tree.

use embassy_stm32::pac;
use embassy_stm32::pac::i2c::vals;
use embassy_stm32::peripherals;
use embedded_hal::i2c::ErrorKind;
use platform::{BusFlags, BusRegisters, I2cAction, I2cAddress, I2cConfig, StopMode};

// RCC and GPIO bits, STM32L0x2 reference manual.
const RCC_CR_HSI16ON: u32 = 0x0000_0001;
const RCC_CR_HSI16RDYF: u32 = 0x0000_0004;
const RCC_CCIPR_I2C1SEL_MASK: u32 = 0x0000_3000;
const RCC_CCIPR_I2C1SEL_HSI16: u32 = 0x0000_2000;
const RCC_APB1ENR_I2C1EN: u32 = 0x0020_0000;
const RCC_IOPENR_IOPBEN: u32 = 0x0000_0002;
const GPIO_PB6_PB7_MODER_MASK: u32 = 0x0000_F000;
const GPIO_PB6_PB7_MODER_ALTERNATE: u32 = 0x0000_A000;
const GPIO_PB6_PB7_OPEN_DRAIN: u32 = 0x0000_00C0;
const GPIO_PB6_PB7_VERY_HIGH_SPEED: u32 = 0x0000_F000;
const GPIO_PB6_PB7_AFRL_MASK: u32 = 0xFF00_0000;
const GPIO_PB6_PB7_AF1: u32 = 0x1100_0000;

/// TIMINGR for 400 kHz from a 16 MHz kernel clock.
const TIMING_FAST_MODE: u32 = 0x1032_0309;
/// TIMINGR for 100 kHz from a 16 MHz kernel clock.
const TIMING_STANDARD_MODE: u32 = 0x3042_0F13;

/// I2C1 of the STM32L072.
pub struct Stm32I2c1 {
    _i2c: peripherals::I2C1,
    _scl: peripherals::PB6,
    _sda: peripherals::PB7,
}

impl Stm32I2c1 {
    /// Clock I2C1 from HSI16 and route it to PB6/PB7.
    ///
    /// The peripheral stays disabled until `configure`.
    pub fn new(i2c: peripherals::I2C1, scl: peripherals::PB6, sda: peripherals::PB7) -> Self {
        let rcc = pac::RCC;
        rcc.cr().modify(|w| w.0 |= RCC_CR_HSI16ON);
        while rcc.cr().read().0 & RCC_CR_HSI16RDYF == 0 {
            core::hint::spin_loop();
        }
        rcc.ccipr()
            .modify(|w| w.0 = (w.0 & !RCC_CCIPR_I2C1SEL_MASK) | RCC_CCIPR_I2C1SEL_HSI16);
        rcc.iopenr().modify(|w| w.0 |= RCC_IOPENR_IOPBEN);
        rcc.apb1enr().modify(|w| w.0 |= RCC_APB1ENR_I2C1EN);

        let gpiob = pac::GPIOB;
        gpiob.otyper().modify(|w| w.0 |= GPIO_PB6_PB7_OPEN_DRAIN);
        gpiob
            .ospeedr()
            .modify(|w| w.0 |= GPIO_PB6_PB7_VERY_HIGH_SPEED);
        gpiob
            .afr(0)
            .modify(|w| w.0 = (w.0 & !GPIO_PB6_PB7_AFRL_MASK) | GPIO_PB6_PB7_AF1);
        gpiob
            .moder()
            .modify(|w| w.0 = (w.0 & !GPIO_PB6_PB7_MODER_MASK) | GPIO_PB6_PB7_MODER_ALTERNATE);

        Self {
            _i2c: i2c,
            _scl: scl,
            _sda: sda,
        }
    }
}

impl BusRegisters for Stm32I2c1 {
    fn configure(&mut self, config: I2cConfig) -> Result<(), ErrorKind> {
        let timing = match config.frequency {
            400_000 => TIMING_FAST_MODE,
            100_000 => TIMING_STANDARD_MODE,
            _ => return Err(ErrorKind::Other),
        };
        let i2c = pac::I2C1;
        i2c.cr1().modify(|w| w.set_pe(false));
        i2c.timingr().write_value(pac::i2c::regs::Timingr(timing));
        i2c.cr1().modify(|w| {
            w.set_txie(true);
            w.set_rxie(true);
            w.set_tcie(true);
            w.set_stopie(true);
            w.set_nackie(true);
            w.set_errie(true);
            w.set_pe(true);
        });
        Ok(())
    }

    fn begin(&mut self, address: I2cAddress, action: I2cAction, nbytes: u8, stop: StopMode) {
        pac::I2C1.cr2().write(|w| {
            w.set_sadd(u16::from(address.get()).wrapping_shl(1));
            w.set_dir(match action {
                I2cAction::Read => vals::Dir::READ,
                I2cAction::Write => vals::Dir::WRITE,
            });
            w.set_nbytes(nbytes);
            w.set_autoend(match stop {
                StopMode::Automatic => vals::Autoend::AUTOMATIC,
                StopMode::Software => vals::Autoend::SOFTWARE,
            });
            w.set_start(true);
        });
    }

    fn transmit(&mut self, byte: u8) {
        pac::I2C1.txdr().write(|w| w.set_txdata(byte));
    }

    fn stop(&mut self) {
        pac::I2C1.cr2().modify(|w| w.set_stop(true));
    }

    fn take_flags(&mut self) -> BusFlags {
        let i2c = pac::I2C1;
        let isr = i2c.isr().read();
        let fault = if isr.berr() {
            Some(ErrorKind::Bus)
        } else if isr.arlo() {
            Some(ErrorKind::ArbitrationLoss)
        } else if isr.ovr() {
            Some(ErrorKind::Overrun)
        } else {
            None
        };
        let received = isr.rxne().then(|| i2c.rxdr().read().rxdata());
        i2c.icr().write(|w| {
            w.set_stopcf(isr.stopf());
            w.set_nackcf(isr.nackf());
            w.set_berrcf(isr.berr());
            w.set_arlocf(isr.arlo());
            w.set_ovrcf(isr.ovr());
        });
        BusFlags {
            tx_ready: isr.txis(),
            received,
            transfer_complete: isr.tc(),
            nack: isr.nackf(),
            stop: isr.stopf(),
            fault,
        }
    }

    fn flush(&mut self) {
        let i2c = pac::I2C1;
        if i2c.isr().read().txis() {
            i2c.txdr().write(|w| w.set_txdata(0));
        }
        if !i2c.isr().read().txe() {
            i2c.isr().modify(|w| w.set_txe(true));
        }
    }
}
