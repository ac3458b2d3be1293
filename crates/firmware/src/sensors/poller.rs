//! Polling register reader job.
//!
//! The shape every sensor client on the board follows: a `RunRun` job that
//! submits a read, returns, and on later passes checks the request's future
//! without ever blocking.
//!
//! ```text
//!        enqueue ok             future Finished
//! Ready ───────────► Pending ───────────────────► Ready (sample stored)
//!   │                   │ future Error
//!   │ enqueue failed    ▼
//!   └──────────────► failure ── budget left ──► Ready
//!                       │ budget spent
//!                       ▼
//!                    Faulted (policy: isolate, or halt the scheduler)
//! ```

use platform::config::MAX_TRANSFER_BYTES;
use platform::I2cController;

use crate::future::FutureState;
use crate::i2c::{I2cEngine, RequestId};
use crate::jobs::{Job, JobControl};
use crate::log::{debug, error, warning};

/// Poller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollerState {
    /// Idle; the next read is submitted once the interval has elapsed.
    Ready,
    /// A read is queued or in flight.
    Pending,
    /// Retry budget exhausted; the poller no longer submits reads.
    Faulted(i32),
}

/// What a poller does once its retry budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultPolicy {
    /// Stop polling; the rest of the firmware keeps running.
    #[default]
    Isolate,
    /// Enter the scheduler's error state with the fault code.
    Halt,
}

/// Periodically reads one registered request and keeps the latest sample.
pub struct RegisterPoller<'e, C, const Q: usize, const S: usize> {
    name: &'static str,
    engine: &'e I2cEngine<C, Q, S>,
    request: RequestId,
    state: PollerState,
    interval: u32,
    countdown: u32,
    retries: u8,
    failures: u8,
    policy: FaultPolicy,
    sample: heapless::Vec<u8, MAX_TRANSFER_BYTES>,
    samples: u32,
}

impl<'e, C: I2cController, const Q: usize, const S: usize> RegisterPoller<'e, C, Q, S> {
    /// Poll `request` on every pass, no retries, isolate on fault.
    pub fn new(name: &'static str, engine: &'e I2cEngine<C, Q, S>, request: RequestId) -> Self {
        Self {
            name,
            engine,
            request,
            state: PollerState::Ready,
            interval: 0,
            countdown: 0,
            retries: 0,
            failures: 0,
            policy: FaultPolicy::Isolate,
            sample: heapless::Vec::new(),
            samples: 0,
        }
    }

    /// Skip `passes` scheduler passes between a sample and the next read.
    #[must_use]
    pub fn every(mut self, passes: u32) -> Self {
        self.interval = passes;
        self
    }

    /// Tolerate `retries` consecutive failures before faulting.
    #[must_use]
    pub fn retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Choose what happens when the retry budget runs out.
    #[must_use]
    pub fn on_fault(mut self, policy: FaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current state.
    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Bytes of the most recent successful read.
    pub fn latest(&self) -> Option<&[u8]> {
        if self.samples == 0 {
            None
        } else {
            Some(&self.sample)
        }
    }

    /// Number of successful reads.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Name used in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn submit(&mut self, ctl: &JobControl) {
        if self.countdown > 0 {
            self.countdown = self.countdown.saturating_sub(1);
            return;
        }
        match self.engine.enqueue(self.request) {
            Ok(()) => self.state = PollerState::Pending,
            Err(e) => {
                warning!("{}: enqueue failed: {}", self.name, e);
                self.fail(ctl, e.code());
            }
        }
    }

    fn check(&mut self, ctl: &JobControl) {
        match self.engine.state(self.request) {
            Ok(FutureState::Waiting) => {}
            Ok(FutureState::Finished) => {
                let stored = self.engine.with_request(self.request, |r| {
                    self.sample.clear();
                    self.sample.extend_from_slice(r.data())
                });
                if matches!(stored, Ok(Ok(()))) {
                    self.samples = self.samples.saturating_add(1);
                }
                self.failures = 0;
                self.countdown = self.interval;
                self.state = PollerState::Ready;
            }
            Ok(FutureState::Error) => {
                let code = self
                    .engine
                    .future(self.request)
                    .ok()
                    .and_then(|f| f.error_number())
                    .unwrap_or_default();
                warning!("{}: read failed, fault {}", self.name, code);
                self.fail(ctl, code);
            }
            Err(e) => self.fail(ctl, e.code()),
        }
    }

    fn fail(&mut self, ctl: &JobControl, code: i32) {
        self.failures = self.failures.saturating_add(1);
        if self.failures <= self.retries {
            debug!("{}: retry {} of {}", self.name, self.failures, self.retries);
            self.state = PollerState::Ready;
            return;
        }
        self.state = PollerState::Faulted(code);
        match self.policy {
            FaultPolicy::Isolate => error!("{}: disabled after fault {}", self.name, code),
            FaultPolicy::Halt => ctl.error_state_enter(code),
        }
    }
}

impl<C: I2cController, const Q: usize, const S: usize> Job for RegisterPoller<'_, C, Q, S> {
    fn run(&mut self, ctl: &JobControl) {
        match self.state {
            PollerState::Ready => self.submit(ctl),
            PollerState::Pending => self.check(ctl),
            PollerState::Faulted(_) => {}
        }
    }
}
