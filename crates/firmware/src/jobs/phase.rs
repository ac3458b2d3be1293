//! Scheduler phases.

use super::JobError;

/// Scheduler phase a job is registered under.
///
/// ```text
/// Init ──► RunEntry ──► RunRun ⟲
///   any ──error_state_enter──► ErrorEntry ──► ErrorRun ⟲
/// ```
///
/// `Init`, `RunEntry` and `ErrorEntry` jobs run once each; `RunRun` and
/// `ErrorRun` jobs run round-robin forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Phase {
    /// Start-up, runs once.
    Init = 0,
    /// Entering normal operation, runs once.
    RunEntry = 1,
    /// Normal operation, repeats.
    RunRun = 2,
    /// Entering the error state, runs once.
    ErrorEntry = 3,
    /// Error state, repeats until reset.
    ErrorRun = 4,
}

impl Phase {
    /// Number of phases.
    pub const COUNT: usize = 5;

    /// Every phase, in raw-number order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Init,
        Self::RunEntry,
        Self::RunRun,
        Self::ErrorEntry,
        Self::ErrorRun,
    ];

    /// Phase entered once every job of this phase has run in a pass.
    pub const fn next(self) -> Self {
        match self {
            Self::Init => Self::RunEntry,
            Self::RunEntry | Self::RunRun => Self::RunRun,
            Self::ErrorEntry | Self::ErrorRun => Self::ErrorRun,
        }
    }

    /// `true` for `ErrorEntry` and `ErrorRun`.
    pub const fn is_error(self) -> bool {
        matches!(self, Self::ErrorEntry | Self::ErrorRun)
    }

    /// Index into per-phase tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name for log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::RunEntry => "run-entry",
            Self::RunRun => "run",
            Self::ErrorEntry => "error-entry",
            Self::ErrorRun => "error",
        }
    }
}

impl TryFrom<u8> for Phase {
    type Error = JobError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(raw))
            .copied()
            .ok_or(JobError::InvalidPhase(raw))
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
