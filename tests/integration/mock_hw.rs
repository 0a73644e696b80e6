//! Mock adapters for integration tests.
//!
//! The stepper and the clock write into one shared timeline so tests can
//! assert on the exact interleaving of moves and pauses.  Everything is
//! `Send` so a worker can run on its own thread.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use goodboy::app::events::AppEvent;
use goodboy::app::ports::{Clock, ConnectivityPort, EventSink, StepperPort};
use goodboy::error::CommsError;

// ── Timeline ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Step(i32),
    Sleep(u32),
}

pub type Timeline = Arc<Mutex<Vec<Op>>>;

pub fn timeline() -> Timeline {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn steps(t: &Timeline) -> Vec<i32> {
    t.lock()
        .unwrap()
        .iter()
        .filter_map(|op| match op {
            Op::Step(n) => Some(*n),
            Op::Sleep(_) => None,
        })
        .collect()
}

// ── MockStepper ───────────────────────────────────────────────

pub struct MockStepper {
    timeline: Timeline,
}

impl MockStepper {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: Arc::clone(timeline),
        }
    }
}

impl StepperPort for MockStepper {
    fn step(&mut self, steps: i32) {
        self.timeline.lock().unwrap().push(Op::Step(steps));
    }
}

// ── VirtualClock ──────────────────────────────────────────────

/// Time only moves when someone sleeps.
pub struct VirtualClock {
    now_ms: u64,
    timeline: Timeline,
}

impl VirtualClock {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            now_ms: 0,
            timeline: Arc::clone(timeline),
        }
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
        self.timeline.lock().unwrap().push(Op::Sleep(ms));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default, Clone)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── MockLink ──────────────────────────────────────────────────

/// Scripted link: comes up on the `succeed_on`-th attempt.
#[derive(Debug, Default)]
pub struct MockLink {
    pub up: bool,
    pub attempts: u32,
    pub succeed_on: Option<u32>,
    pub refuse_start: bool,
}

impl MockLink {
    pub fn up_on_attempt(n: u32) -> Self {
        Self {
            succeed_on: Some(n),
            ..Self::default()
        }
    }

    pub fn never_up() -> Self {
        Self::default()
    }

    pub fn drop_link(&mut self) {
        self.up = false;
    }
}

impl ConnectivityPort for MockLink {
    fn begin_connect(&mut self) -> Result<(), CommsError> {
        self.attempts += 1;
        if self.refuse_start {
            return Err(CommsError::ConnectFailed);
        }
        if self.succeed_on.is_some_and(|n| self.attempts >= n) {
            self.up = true;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn rssi(&self) -> Option<i8> {
        self.up.then_some(-55)
    }
}
