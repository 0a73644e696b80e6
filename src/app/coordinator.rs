//! Dispense coordinator: bounded request queue plus its single worker.
//!
//! Any number of producers (HTTP handler, button, scheduler) call
//! [`DispenseCoordinator::enqueue`], which never blocks.  Exactly one
//! [`DispenseWorker`] owns the actuator and drains the queue, so motor
//! access is serialized by ownership rather than by a lock.
//!
//! ```text
//!  producer ─┐   try_send   ┌────────────────┐  receive  ┌──────────────┐
//!  producer ─┼─────────────▶│ Channel (cap N)│──────────▶│ DispenseWorker│──▶ StepperPort
//!  producer ─┘  (drop if    └────────────────┘  (blocks) │ Idle ⇄ Disp(k)│
//!                full)                                  └──────────────┘
//! ```
//!
//! The channel is an `embassy-sync` channel with a fixed 16-slot backing
//! store.  The configured capacity (1..=16) is enforced by reserving a
//! slot in an atomic counter *before* sending, so concurrent producers
//! can never push the queue past it.
//!
//! Completion is fire-and-forget: nothing is reported back to the
//! producer, and a physical failure is unobservable, so nothing is retried.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};

use crate::config::{DispenserConfig, MAX_QUEUE_CAPACITY};

use super::events::AppEvent;
use super::ports::{Clock, EventSink, StepperPort};
use super::request::DispenseRequest;

/// Default queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Result of a non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum EnqueueOutcome {
    /// Queued; the worker will dispense it.
    Accepted,
    /// Queue was at capacity; the request was discarded.
    Dropped,
}

impl EnqueueOutcome {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

// ───────────────────────────────────────────────────────────────
// Coordinator (shared, producer side)
// ───────────────────────────────────────────────────────────────

/// Bounded FIFO of [`DispenseRequest`]s.  Share it via `Arc`.
pub struct DispenseCoordinator {
    channel: Channel<CriticalSectionRawMutex, DispenseRequest, MAX_QUEUE_CAPACITY>,
    capacity: usize,
    /// Slots reserved by producers and not yet taken by the worker.
    pending: AtomicUsize,
    dropped: AtomicU32,
    dispatched: AtomicU32,
}

impl DispenseCoordinator {
    /// Create a queue holding at most `capacity` requests (clamped to 1..=16).
    pub fn new(capacity: usize) -> Self {
        Self {
            channel: Channel::new(),
            capacity: capacity.clamp(1, MAX_QUEUE_CAPACITY),
            pending: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
            dispatched: AtomicU32::new(0),
        }
    }

    pub fn from_config(config: &DispenserConfig) -> Self {
        Self::new(config.queue_capacity)
    }

    /// Queue `count` units without blocking.
    ///
    /// `count` is expected to be validated to `1..=10` already and is not
    /// checked again here.  A full queue drops the request.
    pub fn enqueue(&self, count: u8) -> EnqueueOutcome {
        let request = DispenseRequest::new(count);

        let reserved = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok();
        if !reserved {
            return self.record_drop(count);
        }

        match self.channel.try_send(request) {
            Ok(()) => {
                debug!("Dispense: queued count={} (depth {})", count, self.len());
                EnqueueOutcome::Accepted
            }
            Err(_) => {
                // Backing store full despite a reservation; give the slot back.
                self.pending.fetch_sub(1, Ordering::AcqRel);
                self.record_drop(count)
            }
        }
    }

    /// Wait for the next request.  Only the worker calls this.
    pub async fn receive(&self) -> DispenseRequest {
        let request = self.channel.receive().await;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        request
    }

    /// Take the next request if one is queued.
    pub fn try_receive(&self) -> Option<DispenseRequest> {
        let request = self.channel.try_receive().ok()?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Some(request)
    }

    /// Requests currently queued.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Requests dropped on a full queue since boot.
    pub fn dropped_total(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Requests fully driven by the worker since boot.
    pub fn dispatched_total(&self) -> u32 {
        self.dispatched.load(Ordering::Relaxed)
    }

    fn record_drop(&self, count: u8) -> EnqueueOutcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            "Dispense: queue full ({}), dropping count={}",
            self.capacity, count
        );
        EnqueueOutcome::Dropped
    }
}

impl Default for DispenseCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

// ───────────────────────────────────────────────────────────────
// Worker (single consumer, actuator owner)
// ───────────────────────────────────────────────────────────────

/// Sole owner of the actuator.  Runs `Idle → Dispensing(k) → Idle`
/// forever; no reentrancy, no overlap.
pub struct DispenseWorker<S, C, E> {
    queue: Arc<DispenseCoordinator>,
    stepper: S,
    clock: C,
    sink: E,
    steps_per_unit: i32,
    inter_unit_delay_ms: u32,
}

impl<S: StepperPort, C: Clock, E: EventSink> DispenseWorker<S, C, E> {
    pub fn new(
        queue: Arc<DispenseCoordinator>,
        stepper: S,
        clock: C,
        sink: E,
        config: &DispenserConfig,
    ) -> Self {
        Self {
            queue,
            stepper,
            clock,
            sink,
            steps_per_unit: config.steps_per_dispense_unit,
            inter_unit_delay_ms: config.inter_unit_delay_ms,
        }
    }

    /// Block until a request arrives, then dispense it.
    pub fn run_once(&mut self) {
        let request = futures_lite::future::block_on(self.queue.receive());
        self.dispense(request);
    }

    /// Dispense the next queued request, if any.  Returns whether one ran.
    pub fn try_run_once(&mut self) -> bool {
        match self.queue.try_receive() {
            Some(request) => {
                self.dispense(request);
                true
            }
            None => false,
        }
    }

    /// Worker loop.  Never returns.
    pub fn run(mut self) -> ! {
        info!(
            "Dispense worker running (capacity={}, steps/unit={}, gap={}ms)",
            self.queue.capacity(),
            self.steps_per_unit,
            self.inter_unit_delay_ms
        );
        loop {
            self.run_once();
        }
    }

    /// Drive `request.count()` units, pacing consecutive units.
    pub fn dispense(&mut self, request: DispenseRequest) {
        let count = request.count();
        let started = self.clock.now_ms();
        self.sink.emit(&AppEvent::DispenseStarted { count });

        for unit in 0..count {
            if unit > 0 {
                self.clock.sleep_ms(self.inter_unit_delay_ms);
            }
            self.stepper.step(self.steps_per_unit);
        }

        self.queue.dispatched.fetch_add(1, Ordering::Relaxed);
        let elapsed_ms = self.clock.now_ms().saturating_sub(started);
        self.sink.emit(&AppEvent::DispenseCompleted { count, elapsed_ms });
    }

    pub fn queue(&self) -> &Arc<DispenseCoordinator> {
        &self.queue
    }

    /// Hand back the owned stepper, clock and sink.
    pub fn into_parts(self) -> (S, C, E) {
        (self.stepper, self.clock, self.sink)
    }
}
