//! Sensor clients
//!
//! Register encodings belong to the individual sensor drivers; this module
//! only knows where each sensor lives on the bus and which register block
//! the firmware samples.

pub mod poller;

pub use poller::{FaultPolicy, PollerState, RegisterPoller};

use platform::{I2cAddress, TransferLen};

/// Bus location and sampled register block of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSpec {
    /// Name for log output.
    pub name: &'static str,
    /// 7-bit slave address.
    pub address: I2cAddress,
    /// Identity register read at start-up.
    pub id_register: u8,
    /// Expected identity value, if the part has one.
    pub id_value: Option<u8>,
    /// First register of the sampled block.
    pub data_register: u8,
    /// Size of the sampled block.
    pub data_len: TransferLen,
}

const fn len(n: u8) -> TransferLen {
    match TransferLen::from_u8(n) {
        Some(len) => len,
        None => TransferLen::ONE,
    }
}

/// LIS3DH accelerometer (SA0 low). Six output bytes, auto-increment bit set.
pub const ACCELEROMETER: SensorSpec = SensorSpec {
    name: "accel",
    address: I2cAddress::new(0x18),
    id_register: 0x0F,
    id_value: Some(0x33),
    data_register: 0x28 | 0x80,
    data_len: len(6),
};

/// VCNL4020 proximity / ambient light. Ambient + proximity result registers.
pub const LIGHT: SensorSpec = SensorSpec {
    name: "light",
    address: I2cAddress::new(0x13),
    id_register: 0x81,
    id_value: Some(0x21),
    data_register: 0x85,
    data_len: len(4),
};

/// TMP102 temperature sensor (ADD0 to ground). 12-bit result register.
pub const TEMPERATURE: SensorSpec = SensorSpec {
    name: "temp",
    address: I2cAddress::new(0x48),
    id_register: 0x01,
    id_value: None,
    data_register: 0x00,
    data_len: len(2),
};

/// Every sensor on the board.
pub const ALL: [SensorSpec; 3] = [ACCELEROMETER, LIGHT, TEMPERATURE];
