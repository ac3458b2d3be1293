//! Tri-state completion future
//!
//! An [`IoFuture`] bridges the interrupt context that finishes a hardware
//! operation and the mainline jobs that poll for its outcome. It carries no
//! payload; results live next to it (for I2C, in the request buffer).
//!
//! ## Protocol
//!
//! - exactly one producer per generation: the submitter calls
//!   [`set_waiting`](IoFuture::set_waiting), then the completing context
//!   calls [`finish`](IoFuture::finish) or [`error_out`](IoFuture::error_out)
//! - any number of readers poll [`state`](IoFuture::state)
//! - the error code is stored before the `Error` state is published
//!   (release), so a reader that observes `Error` (acquire) always reads the
//!   matching code
//!
//! Only load/store atomics are used, so the type works on Cortex-M0+ which
//! has no compare-and-swap.

use core::sync::atomic::{AtomicI32, AtomicU8, Ordering};

/// Observable state of an [`IoFuture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FutureState {
    /// Operation submitted, outcome not yet known.
    Waiting = 0,
    /// Operation completed successfully.
    Finished = 1,
    /// Operation failed; [`IoFuture::error_number`] holds the fault code.
    Error = 2,
}

impl FutureState {
    /// Short lowercase name for log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Finished,
            2 => Self::Error,
            _ => Self::Waiting,
        }
    }
}

impl core::fmt::Display for FutureState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion flag shared between a producer (usually an ISR) and polling
/// readers.
pub struct IoFuture {
    state: AtomicU8,
    error_number: AtomicI32,
}

impl IoFuture {
    /// Create a future in the `Waiting` state.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(FutureState::Waiting as u8),
            error_number: AtomicI32::new(0),
        }
    }

    /// Start a new generation. Called by the submitter before handing the
    /// operation to the completing context.
    pub fn set_waiting(&self) {
        self.state.store(FutureState::Waiting as u8, Ordering::Release);
    }

    /// Publish success.
    pub fn finish(&self) {
        self.state.store(FutureState::Finished as u8, Ordering::Release);
    }

    /// Publish failure with `code`.
    pub fn error_out(&self, code: i32) {
        self.error_number.store(code, Ordering::Relaxed);
        self.state.store(FutureState::Error as u8, Ordering::Release);
    }

    /// Current state.
    pub fn state(&self) -> FutureState {
        FutureState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// `true` while the outcome is unknown.
    pub fn is_waiting(&self) -> bool {
        self.state() == FutureState::Waiting
    }

    /// `true` once the operation succeeded.
    pub fn is_finished(&self) -> bool {
        self.state() == FutureState::Finished
    }

    /// `true` once the operation failed.
    pub fn is_errored(&self) -> bool {
        self.state() == FutureState::Error
    }

    /// Fault code of a failed operation, `None` unless in the `Error` state.
    pub fn error_number(&self) -> Option<i32> {
        match self.state() {
            FutureState::Error => Some(self.error_number.load(Ordering::Relaxed)),
            _ => None,
        }
    }

    /// Busy-wait until the future leaves `Waiting` and return the final state.
    ///
    /// Never returns if nothing completes the operation. Only for start-up
    /// code that runs before the scheduler loop; jobs must poll
    /// [`state`](Self::state) instead.
    pub fn spin_wait(&self) -> FutureState {
        loop {
            let state = self.state();
            if state != FutureState::Waiting {
                return state;
            }
            core::hint::spin_loop();
        }
    }
}

impl Default for IoFuture {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for IoFuture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IoFuture")
            .field("state", &self.state())
            .field("error_number", &self.error_number())
            .finish()
    }
}
