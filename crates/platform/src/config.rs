//! Application configuration and constants
//!
//! This module defines central configuration values used across the firmware.
//! Table sizes (queue depth, arena size, jobs per phase) are compile-time
//! constants because every table is statically allocated.

/// The application name
pub const APP_NAME: &str = "Widget";

/// The application type/category
pub const APP_TYPE: &str = "Wearable";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Development mode banner
pub const fn dev_banner() -> &'static str {
    "Widget - Development Mode"
}

// ── I2C ──────────────────────────────────────────────────────────────────────

/// Pending-request ring capacity per I2C context. Must be a power of two.
pub const I2C_QUEUE_DEPTH: usize = 16;

/// Number of request slots a single I2C context can hold.
///
/// Each sensor driver owns one or more slots for the lifetime of the
/// firmware (accelerometer data + interrupt source, light sensor data +
/// interrupt status, temperature).
pub const I2C_REQUEST_SLOTS: usize = 16;

/// Largest single register transfer in bytes.
///
/// The accelerometer FIFO burst (6 axes x 2 bytes + status) is the largest
/// consumer; 32 leaves headroom without bloating every slot.
pub const MAX_TRANSFER_BYTES: usize = 32;

/// I2C SCL frequency for the sensor bus (fast mode).
pub const I2C_BUS_FREQUENCY_HZ: u32 = 400_000;

/// Number of address probes `device_is_ready` performs before giving up.
pub const DEVICE_READY_TRIALS: u32 = 3;

/// Status polls one address probe may take before it counts as no ACK.
///
/// An address phase lasts about 25 µs at 400 kHz; the limit only matters
/// when SDA or SCL is held low and the peripheral never reaches STOP.
pub const PROBE_POLL_LIMIT: u32 = 10_000;

// ── Scheduler ────────────────────────────────────────────────────────────────

/// Maximum number of jobs registered under any one scheduler phase.
pub const JOBS_PER_PHASE: usize = 16;

const _: () = assert!(I2C_QUEUE_DEPTH.is_power_of_two());
const _: () = assert!(I2C_REQUEST_SLOTS <= u8::MAX as usize);
const _: () = assert!(MAX_TRANSFER_BYTES <= u8::MAX as usize);
