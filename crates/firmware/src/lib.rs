//! Widget wearable firmware
//!
//! Runtime substrate for a battery-powered STM32L0 wearable with no RTOS:
//! every subsystem makes progress through one cooperative loop, and every
//! sensor transfer goes through one interrupt-chained I2C queue.
//!
//! # Architecture
//!
//! ```text
//! main.rs (board bring-up, interrupt glue)
//!         ↓
//! jobs (five-phase scheduler)  ←  sensors (polling jobs)
//!         ↓                          ↓
//!     i2c (transaction queue)  →  future (completion flags)
//!         ↓
//! platform::I2cController (Embassy HAL on hardware, mocks on host)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the STM32L072 target (embassy, defmt, RTT)
//! - `defmt` - Log through defmt
//! - `tracing` - Log through tracing (host builds)
//! - `std` - Enable standard library (for testing)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv6m-none-eabi --features hardware
//! ```
//!
//! ## Host tests
//!
//! ```bash
//! cargo test -p firmware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::indexing_slicing,
        clippy::arithmetic_side_effects
    )
)]

mod log;

pub mod future;
pub mod i2c;
pub mod jobs;
pub mod sensors;

// Re-export key types
pub use future::{FutureState, IoFuture};
pub use i2c::{
    ControllerError, I2cEngine, I2cError, I2cPumpJob, I2cRequest, InterruptController, RequestId,
};
pub use jobs::{Job, JobControl, JobError, JobScheduler, Phase};
