//! Interrupt-chained I2C transaction engine.
//!
//! One [`I2cEngine`] owns one I2C peripheral and serialises every sensor
//! transfer on that bus. Drivers register their requests once, then submit
//! them with [`enqueue`](I2cEngine::enqueue) and poll the request's
//! [`IoFuture`].
//!
//! The queue advances from two contexts:
//!
//! ```text
//!   mainline                               bus interrupt
//!   ────────                               ─────────────
//!   enqueue ──┐ (bus idle: implicit arm)
//!             ├──► Armed ──── transfer done ──► on_transfer_complete
//!   process_one ┘   ▲                              │ finish / error_out
//!      │            └──── queue non-empty ─────────┤ release bus
//!      └◄── CompletionEvent channel ◄──────────────┘ post event
//! ```
//!
//! Queue state lives behind an embassy-sync critical-section mutex, so the
//! mainline and the interrupt never observe it half-updated. The lock is
//! only held for register accesses: arming programs the peripheral and
//! returns, and the bytes move while interrupts are enabled. At most one
//! transfer is armed at any time.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embedded_hal::i2c::Error as _;
use platform::config::{I2C_QUEUE_DEPTH, I2C_REQUEST_SLOTS, PROBE_POLL_LIMIT};
use platform::{fault_code, I2cAddress, I2cConfig, I2cController, FAULT_OTHER};

use super::error::I2cError;
use super::request::{I2cRequest, RequestId};
use super::ring::RequestRing;
use crate::future::{FutureState, IoFuture};
use crate::log::{debug, info, trace, warning};

/// Outcome of one transfer, posted by the completion interrupt and drained
/// by [`I2cEngine::process_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompletionEvent {
    /// Request that completed.
    pub id: RequestId,
    /// Fault code if the transfer failed.
    pub error: Option<i32>,
}

/// Engine counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cStats {
    /// Successful `enqueue` calls.
    pub enqueued: u32,
    /// `enqueue` calls rejected because the queue was full.
    pub rejected: u32,
    /// Completion events drained with a successful outcome.
    pub completed: u32,
    /// Completion events drained with a failed outcome.
    pub failed: u32,
    /// Completion events lost because the event channel was full.
    pub dropped_events: u32,
}

struct Slot {
    request: I2cRequest,
    /// Set from enqueue until the outcome is published.
    queued: bool,
}

struct Inner<C, const Q: usize, const S: usize> {
    controller: C,
    ring: RequestRing<Q>,
    slots: heapless::Vec<Slot, S>,
    current: Option<RequestId>,
    stats: I2cStats,
}

/// I2C transaction queue bound to one controller.
///
/// `Q` is the pending-ring depth (power of two), `S` the number of request
/// slots.
pub struct I2cEngine<C, const Q: usize = I2C_QUEUE_DEPTH, const S: usize = I2C_REQUEST_SLOTS> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<C, Q, S>>>,
    futures: [IoFuture; S],
    bus_in_use: AtomicBool,
    initialized: AtomicBool,
    completions: Channel<CriticalSectionRawMutex, CompletionEvent, Q>,
}

impl<C: I2cController, const Q: usize, const S: usize> I2cEngine<C, Q, S> {
    /// Bind `controller`. The engine is unusable until [`init`](Self::init).
    pub fn new(controller: C) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                controller,
                ring: RequestRing::new(),
                slots: heapless::Vec::new(),
                current: None,
                stats: I2cStats::default(),
            })),
            futures: core::array::from_fn(|_| IoFuture::new()),
            bus_in_use: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            completions: Channel::new(),
        }
    }

    /// Configure the bus and reset the queue to empty.
    ///
    /// Must run exactly once before any other operation.
    pub fn init(&self, config: I2cConfig) -> Result<(), I2cError> {
        if self.initialized.load(Ordering::Acquire) {
            return Err(I2cError::AlreadyInitialized);
        }
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            inner
                .controller
                .configure(config)
                .map_err(|e| I2cError::Init(fault_code(e.kind())))?;
            inner.ring.clear();
            inner.current = None;
            for slot in &mut inner.slots {
                slot.queued = false;
            }
            while self.completions.try_receive().is_ok() {}
            self.bus_in_use.store(false, Ordering::Release);
            Ok(())
        })?;
        self.initialized.store(true, Ordering::Release);
        info!("i2c: initialised at {} Hz", config.frequency);
        Ok(())
    }

    /// `true` once [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn ensure_init(&self) -> Result<(), I2cError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(I2cError::NotInitialized)
        }
    }

    // ── Request arena ────────────────────────────────────────────────────────

    /// Store `request` in a free slot and return its handle.
    ///
    /// Slots are never freed; register each request once at start-up.
    pub fn register(&self, request: I2cRequest) -> Result<RequestId, I2cError> {
        self.ensure_init()?;
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let index = u8::try_from(inner.slots.len()).map_err(|_| I2cError::ArenaFull)?;
            inner
                .slots
                .push(Slot {
                    request,
                    queued: false,
                })
                .map_err(|_| I2cError::ArenaFull)?;
            Ok(RequestId::from_index(index))
        })
    }

    /// Number of registered requests.
    pub fn registered(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().slots.len())
    }

    /// Modify a request that is neither queued nor in flight.
    pub fn update<R>(
        &self,
        id: RequestId,
        f: impl FnOnce(&mut I2cRequest) -> R,
    ) -> Result<R, I2cError> {
        self.ensure_init()?;
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let slot = inner
                .slots
                .get_mut(id.index())
                .ok_or(I2cError::UnknownRequest)?;
            if slot.queued {
                return Err(I2cError::RequestBusy);
            }
            Ok(f(&mut slot.request))
        })
    }

    /// Inspect a request, typically to read the bytes of a finished read.
    pub fn with_request<R>(
        &self,
        id: RequestId,
        f: impl FnOnce(&I2cRequest) -> R,
    ) -> Result<R, I2cError> {
        self.inner.lock(|cell| {
            let inner = cell.borrow();
            let slot = inner.slots.get(id.index()).ok_or(I2cError::UnknownRequest)?;
            Ok(f(&slot.request))
        })
    }

    /// Future of a request. Always safe to poll.
    pub fn future(&self, id: RequestId) -> Result<&IoFuture, I2cError> {
        self.futures.get(id.index()).ok_or(I2cError::UnknownRequest)
    }

    /// Current state of a request's future.
    pub fn state(&self, id: RequestId) -> Result<FutureState, I2cError> {
        self.future(id).map(IoFuture::state)
    }

    // ── Queue ────────────────────────────────────────────────────────────────

    /// Append a request to the queue.
    ///
    /// On success the request's future is reset to `Waiting`, and if the bus
    /// is idle the request is armed before returning. On failure nothing
    /// changes, including the future.
    pub fn enqueue(&self, id: RequestId) -> Result<(), I2cError> {
        self.ensure_init()?;
        let future = self.future(id)?;
        self.inner.lock(|cell| {
            let mut guard = cell.borrow_mut();
            let inner = &mut *guard;
            let slot = inner
                .slots
                .get_mut(id.index())
                .ok_or(I2cError::UnknownRequest)?;
            if slot.queued {
                return Err(I2cError::AlreadyQueued);
            }
            if inner.ring.is_full() {
                inner.stats.rejected = inner.stats.rejected.saturating_add(1);
                return Err(I2cError::QueueFull);
            }
            future.set_waiting();
            inner.ring.push(id).map_err(|_| I2cError::QueueFull)?;
            slot.queued = true;
            inner.stats.enqueued = inner.stats.enqueued.saturating_add(1);
            trace!("i2c: queued {}", id);
            self.arm_locked(inner);
            Ok(())
        })
    }

    /// Mainline pump.
    ///
    /// Drains completion events, then arms the head of the queue if the bus
    /// is idle. Returns the request armed by this call, if any.
    pub fn process_one(&self) -> Result<Option<RequestId>, I2cError> {
        self.ensure_init()?;
        self.drain_completions();
        Ok(self.inner.lock(|cell| {
            let mut guard = cell.borrow_mut();
            self.arm_locked(&mut guard)
        }))
    }

    /// Bus interrupt handler.
    ///
    /// Lets the controller service the interrupt. Once the in-flight
    /// transfer has finished, publishes its outcome, releases the bus and
    /// arms the next queued request before returning. Returns the request
    /// armed next, if any. Calls that do not finish a transfer (byte-level
    /// events, nothing in flight) change nothing else.
    pub fn on_transfer_complete(&self) -> Option<RequestId> {
        if !self.is_initialized() {
            return None;
        }
        self.inner.lock(|cell| {
            let mut guard = cell.borrow_mut();
            let inner = &mut *guard;
            inner.controller.on_interrupt();
            let id = inner.current?;
            if !inner.controller.is_done() {
                return None;
            }
            let result = match inner.slots.get_mut(id.index()) {
                Some(slot) => {
                    slot.queued = false;
                    inner
                        .controller
                        .collect(slot.request.data_mut())
                        .map_err(|e| fault_code(e.kind()))
                }
                None => Err(FAULT_OTHER),
            };
            inner.current = None;
            self.bus_in_use.store(false, Ordering::Release);
            self.resolve(inner, id, result);
            self.arm_locked(inner)
        })
    }

    /// Arm the head of the queue if nothing is in flight. Requests the
    /// controller refuses to start are failed and skipped.
    fn arm_locked(&self, inner: &mut Inner<C, Q, S>) -> Option<RequestId> {
        if inner.current.is_some() || self.bus_in_use.load(Ordering::Acquire) {
            return None;
        }
        while let Some(id) = inner.ring.pop() {
            let Some(slot) = inner.slots.get_mut(id.index()) else {
                continue;
            };
            self.bus_in_use.store(true, Ordering::Release);
            inner.current = Some(id);
            match inner.controller.start(slot.request.transfer()) {
                Ok(()) => {
                    trace!("i2c: armed {}", id);
                    return Some(id);
                }
                Err(e) => {
                    slot.queued = false;
                    inner.current = None;
                    self.bus_in_use.store(false, Ordering::Release);
                    self.resolve(inner, id, Err(fault_code(e.kind())));
                }
            }
        }
        None
    }

    fn resolve(&self, inner: &mut Inner<C, Q, S>, id: RequestId, result: Result<(), i32>) {
        if let Some(future) = self.futures.get(id.index()) {
            match result {
                Ok(()) => future.finish(),
                Err(code) => future.error_out(code),
            }
        }
        let event = CompletionEvent {
            id,
            error: result.err(),
        };
        if self.completions.try_send(event).is_err() {
            inner.stats.dropped_events = inner.stats.dropped_events.saturating_add(1);
        }
    }

    fn drain_completions(&self) {
        while let Ok(event) = self.completions.try_receive() {
            match event.error {
                None => debug!("i2c: {} finished", event.id),
                Some(code) => warning!("i2c: {} failed, fault {}", event.id, code),
            }
            self.inner.lock(|cell| {
                let stats = &mut cell.borrow_mut().stats;
                if event.error.is_some() {
                    stats.failed = stats.failed.saturating_add(1);
                } else {
                    stats.completed = stats.completed.saturating_add(1);
                }
            });
        }
    }

    // ── Blocking / init-time ─────────────────────────────────────────────────

    /// Enqueue and spin until the request's future resolves.
    ///
    /// Start-up only. Also polls the controller for completion, so it works
    /// before the completion interrupt is unmasked.
    pub fn blocking_enqueue(&self, id: RequestId) -> Result<FutureState, I2cError> {
        self.enqueue(id)?;
        let future = self.future(id)?;
        loop {
            self.process_one()?;
            let state = future.state();
            if state != FutureState::Waiting {
                return Ok(state);
            }
            self.on_transfer_complete();
            core::hint::spin_loop();
        }
    }

    /// Probe whether a device acknowledges `address`, up to `trials` times.
    ///
    /// Independent of the queue; refused with [`I2cError::Busy`] while a
    /// transfer is in flight. The bus token is held for the whole probe, so
    /// requests enqueued meanwhile wait and are armed when it ends. The
    /// engine lock is only taken per status poll.
    pub fn device_is_ready(&self, address: I2cAddress, trials: u32) -> Result<bool, I2cError> {
        self.ensure_init()?;
        self.inner.lock(|cell| {
            if cell.borrow().current.is_some() || self.bus_in_use.load(Ordering::Acquire) {
                return Err(I2cError::Busy);
            }
            self.bus_in_use.store(true, Ordering::Release);
            Ok(())
        })?;
        let ready = (0..trials).any(|_| self.probe_once(address));
        self.inner.lock(|cell| {
            self.bus_in_use.store(false, Ordering::Release);
            self.arm_locked(&mut cell.borrow_mut());
        });
        Ok(ready)
    }

    /// One address probe. A probe the controller refuses, or one that never
    /// reaches STOP within [`PROBE_POLL_LIMIT`] polls, counts as no ACK.
    fn probe_once(&self, address: I2cAddress) -> bool {
        let started = self
            .inner
            .lock(|cell| cell.borrow_mut().controller.start_probe(address).is_ok());
        if !started {
            return false;
        }
        for _ in 0..PROBE_POLL_LIMIT {
            let status = self.inner.lock(|cell| {
                let mut inner = cell.borrow_mut();
                inner.controller.on_interrupt();
                inner.controller.probe_status()
            });
            if let Some(acknowledged) = status {
                return acknowledged;
            }
            core::hint::spin_loop();
        }
        warning!("i2c: probe of {} timed out", address);
        false
    }

    /// Probe every non-reserved 7-bit address, calling `on_found` for each
    /// responder. Returns the number of responders.
    pub fn scan(&self, mut on_found: impl FnMut(I2cAddress)) -> Result<usize, I2cError> {
        let mut found = 0usize;
        for address in I2cAddress::all() {
            if self.device_is_ready(address, 1)? {
                debug!("i2c: device at {}", address);
                on_found(address);
                found = found.saturating_add(1);
            }
        }
        Ok(found)
    }

    // ── Introspection ────────────────────────────────────────────────────────

    /// Run `f` with exclusive access to the controller.
    ///
    /// Intended for board glue and tests; arming a transfer behind the
    /// engine's back breaks the single-in-flight guarantee.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut().controller))
    }

    /// Number of requests waiting in the ring (excluding the one in flight).
    pub fn queue_len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().ring.len())
    }

    /// Request currently in flight.
    pub fn current_request(&self) -> Option<RequestId> {
        self.inner.lock(|cell| cell.borrow().current)
    }

    /// `true` when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.inner.lock(|cell| {
            let inner = cell.borrow();
            inner.current.is_none() && inner.ring.is_empty()
        })
    }

    /// Bus mutual-exclusion token.
    pub fn bus_in_use(&self) -> bool {
        self.bus_in_use.load(Ordering::Acquire)
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> I2cStats {
        self.inner.lock(|cell| cell.borrow().stats)
    }
}
