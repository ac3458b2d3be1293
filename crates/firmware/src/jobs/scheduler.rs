use platform::config::JOBS_PER_PHASE;

use super::{Job, JobControl, JobError, Phase};
use crate::log::{error, info};

/// Five-phase round-robin job scheduler.
///
/// Jobs are registered with [`job_add`](Self::job_add) before the first
/// [`run`](Self::run), in the order they should execute, and are never
/// removed. `N` bounds the number of jobs per phase.
pub struct JobScheduler<'a, const N: usize = JOBS_PER_PHASE> {
    phases: [heapless::Vec<&'a mut dyn Job, N>; Phase::COUNT],
    control: JobControl,
    cursor: usize,
    error_latched: bool,
    started: bool,
}

impl<'a, const N: usize> JobScheduler<'a, N> {
    /// Create an empty scheduler in [`Phase::Init`].
    pub fn new() -> Self {
        Self {
            phases: core::array::from_fn(|_| heapless::Vec::new()),
            control: JobControl::new(),
            cursor: 0,
            error_latched: false,
            started: false,
        }
    }

    /// Register `job` at the end of `phase`'s list.
    pub fn job_add(&mut self, job: &'a mut dyn Job, phase: Phase) -> Result<(), JobError> {
        if self.started {
            return Err(JobError::AlreadyStarted);
        }
        let list = self
            .phases
            .get_mut(phase.index())
            .ok_or(JobError::InvalidPhase(phase as u8))?;
        list.push(job).map_err(|_| JobError::PhaseFull(phase))
    }

    /// [`job_add`](Self::job_add) with a raw phase number.
    pub fn job_add_raw(&mut self, job: &'a mut dyn Job, raw_phase: u8) -> Result<(), JobError> {
        let phase = Phase::try_from(raw_phase)?;
        self.job_add(job, phase)
    }

    /// Execute one step.
    ///
    /// Runs the next job of the current phase, or, once every job of the
    /// phase has run in this pass, rewinds and moves to the next phase
    /// without running anything.
    pub fn run(&mut self) {
        self.started = true;
        let phase = self.control.phase();
        if phase == Phase::ErrorEntry && !self.error_latched {
            self.error_latched = true;
            self.cursor = 0;
            error!(
                "jobs: entering error state, code {}",
                self.control.error_code().unwrap_or_default()
            );
        }

        let job = self
            .phases
            .get_mut(phase.index())
            .and_then(|list| list.get_mut(self.cursor));
        match job {
            Some(job) => {
                job.run(&self.control);
                self.cursor = self.cursor.saturating_add(1);
            }
            None => {
                self.cursor = 0;
                self.control.advance(phase);
                if phase != phase.next() {
                    info!("jobs: {} -> {}", phase, phase.next());
                }
            }
        }
    }

    /// Call [`run`](Self::run) forever. This is the body of `main`.
    pub fn run_forever(&mut self) -> ! {
        loop {
            self.run();
        }
    }

    /// Shared control handle (also passed to every job).
    pub fn control(&self) -> &JobControl {
        &self.control
    }

    /// Abandon normal operation from outside a job.
    pub fn error_state_enter(&self, code: i32) {
        self.control.error_state_enter(code);
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.control.phase()
    }

    /// Error code, once in the error state.
    pub fn error_code(&self) -> Option<i32> {
        self.control.error_code()
    }

    /// Number of jobs registered under `phase`.
    pub fn job_count(&self, phase: Phase) -> usize {
        self.phases.get(phase.index()).map_or(0, |jobs| jobs.len())
    }
}

impl<const N: usize> Default for JobScheduler<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
