//! Hardware Abstraction Layer (HAL) for the Widget wearable
//!
//! This crate provides the trait-based abstraction for the sensor I2C bus,
//! enabling the firmware's transaction queue to be developed and tested
//! without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: scheduler, I2C queue, sensor jobs)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC)
//! ```
//!
//! # Contents
//!
//! - [`I2cController`] - interrupt-driven register transfers
//! - [`BusRegisters`] - register access for hardware-sequenced I2C masters
//! - [`i2c_types`] - validated I2C newtypes ([`I2cAddress`], [`TransferLen`])
//! - [`config`] - compile-time table sizes and bus settings
//! - [`fault_code`] - reduce bus errors to numeric fault codes
//!
//! # Features
//!
//! - `std`: Enable standard library support and [`mocks`] (for testing)
//! - `defmt`: Enable defmt logging
//!
//! # Example
//!
//! ```
//! use platform::{I2cAddress, I2cController, Transfer};
//!
//! fn read_who_am_i<C: I2cController>(bus: &mut C) -> Result<(), C::Error> {
//!     bus.start(Transfer::Read {
//!         address: I2cAddress::new(0x18),
//!         register: 0x0F,
//!         len: 1,
//!     })
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod i2c_types;
pub mod mocks;
pub mod peripheral;

// Re-export I2C newtypes
pub use i2c_types::{I2cAddress, OutOfRangeError, TransferLen};

// Re-export peripheral types
pub use peripheral::{
    fault_code, fault_kind, AddressMode, BusFlags, BusRegisters, I2cAction, I2cConfig,
    I2cController, StopMode, Transfer, FAULT_ARBITRATION, FAULT_BUS, FAULT_NACK, FAULT_OTHER,
    FAULT_OVERRUN,
};
