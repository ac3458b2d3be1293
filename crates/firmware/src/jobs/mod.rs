//! Cooperative five-phase job scheduler
//!
//! The scheduler is the firmware's only execution loop. Every subsystem
//! registers its per-tick work as a [`Job`] under a [`Phase`]; each call to
//! [`JobScheduler::run`] executes exactly one job.
//!
//! Jobs must return promptly. Long operations are split into state machines
//! that poll a future and return.

mod phase;
mod scheduler;

use core::sync::atomic::{AtomicI32, AtomicU8, Ordering};

pub use phase::Phase;
pub use scheduler::JobScheduler;

/// A unit of cooperative work.
///
/// Closures taking `&JobControl` implement this trait.
pub trait Job {
    /// Do one bounded slice of work.
    fn run(&mut self, ctl: &JobControl);
}

impl<F: FnMut(&JobControl)> Job for F {
    fn run(&mut self, ctl: &JobControl) {
        self(ctl);
    }
}

/// Errors returned by [`JobScheduler::job_add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobError {
    /// The phase already holds its maximum number of jobs.
    PhaseFull(Phase),
    /// Raw phase number out of range.
    InvalidPhase(u8),
    /// Jobs can only be added before the first `run`.
    AlreadyStarted,
}

impl JobError {
    /// Negative errno-style code.
    pub const fn code(self) -> i32 {
        match self {
            Self::PhaseFull(_) => -12,    // ENOMEM
            Self::InvalidPhase(_) => -22, // EINVAL
            Self::AlreadyStarted => -16,  // EBUSY
        }
    }
}

impl core::fmt::Display for JobError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PhaseFull(phase) => write!(f, "Phase {phase} is full"),
            Self::InvalidPhase(raw) => write!(f, "Invalid phase number {raw}"),
            Self::AlreadyStarted => write!(f, "Scheduler already started"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for JobError {}

/// Handle passed to every running job.
///
/// Carries the current phase and the error slot. Entering the error state
/// is one-way; only a reset leaves it.
#[derive(Debug)]
pub struct JobControl {
    phase: AtomicU8,
    error_code: AtomicI32,
}

impl JobControl {
    pub(crate) const fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Init as u8),
            error_code: AtomicI32::new(0),
        }
    }

    /// Phase the scheduler is in.
    pub fn phase(&self) -> Phase {
        Phase::try_from(self.phase.load(Ordering::Acquire)).unwrap_or(Phase::ErrorRun)
    }

    /// `true` once the error state has been entered.
    pub fn in_error(&self) -> bool {
        self.phase().is_error()
    }

    /// Code passed to the most recent [`error_state_enter`](Self::error_state_enter),
    /// `None` outside the error state.
    pub fn error_code(&self) -> Option<i32> {
        if self.in_error() {
            Some(self.error_code.load(Ordering::Acquire))
        } else {
            None
        }
    }

    /// Abandon normal operation: record `code` and switch to
    /// [`Phase::ErrorEntry`]. Once on the error track only the code is
    /// updated.
    pub fn error_state_enter(&self, code: i32) {
        critical_section::with(|_| {
            self.error_code.store(code, Ordering::Release);
            if !self.in_error() {
                self.phase.store(Phase::ErrorEntry as u8, Ordering::Release);
            }
        });
    }

    /// Move `from` → `from.next()` unless the phase changed meanwhile.
    pub(crate) fn advance(&self, from: Phase) {
        critical_section::with(|_| {
            if self.phase() == from {
                self.phase.store(from.next() as u8, Ordering::Release);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_init_without_error() {
        let ctl = JobControl::new();
        assert_eq!(ctl.phase(), Phase::Init);
        assert_eq!(ctl.error_code(), None);
    }

    #[test]
    fn error_state_enter_records_code() {
        let ctl = JobControl::new();
        ctl.error_state_enter(-5);
        assert_eq!(ctl.phase(), Phase::ErrorEntry);
        assert_eq!(ctl.error_code(), Some(-5));
    }

    #[test]
    fn repeated_error_only_updates_code() {
        let ctl = JobControl::new();
        ctl.error_state_enter(-5);
        ctl.advance(Phase::ErrorEntry);
        ctl.error_state_enter(-12);
        assert_eq!(ctl.phase(), Phase::ErrorRun);
        assert_eq!(ctl.error_code(), Some(-12));
    }

    #[test]
    fn advance_is_skipped_after_concurrent_error() {
        let ctl = JobControl::new();
        ctl.error_state_enter(1);
        ctl.advance(Phase::Init);
        assert_eq!(ctl.phase(), Phase::ErrorEntry);
    }

    #[test]
    fn closures_are_jobs() {
        let ctl = JobControl::new();
        let mut count = 0;
        let mut job = |_: &JobControl| count += 1;
        job.run(&ctl);
        job.run(&ctl);
        assert_eq!(count, 2);
    }

    #[test]
    fn job_error_display() {
        assert_eq!(
            JobError::PhaseFull(Phase::RunRun).to_string(),
            "Phase run is full"
        );
        assert_eq!(JobError::InvalidPhase(9).code(), -22);
    }
}
