//! Unipolar stepper driver (28BYJ-48 on a ULN2003 board).
//!
//! Drives four coil lines through the 8-phase half-step cycle, in either
//! direction, and de-energises all coils once a move completes so the
//! motor draws no holding current while idle.
//!
//! ```text
//!  phase  IN1 IN2 IN3 IN4
//!    0     1   0   0   0
//!    1     1   1   0   0
//!    2     0   1   0   0
//!    3     0   1   1   0
//!    4     0   0   1   0
//!    5     0   0   1   1
//!    6     0   0   0   1
//!    7     1   0   0   1
//! ```
//!
//! Open loop: there is no position or stall feedback.  A coil write that
//! fails is logged and otherwise ignored, because nothing upstream could
//! act on it.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal` output pins and delay.  On ESP-IDF these are
//! `PinDriver`s and `Ets`; on host tests they are recording mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::StepperPort;

/// Half-step coil patterns, one nibble per phase, IN1 in the high bit.
pub const HALF_STEP_SEQUENCE: [u8; 8] = [
    0b1000, 0b1100, 0b0100, 0b0110, 0b0010, 0b0011, 0b0001, 0b1001,
];

/// Number of phases in one electrical cycle.
pub const PHASES: u8 = HALF_STEP_SEQUENCE.len() as u8;

/// Default hold per phase (µs).
pub const DEFAULT_STEP_DELAY_US: u32 = 1200;

/// Line levels (IN1..IN4) for `phase`, taken modulo 8.
pub const fn coil_levels(phase: u8) -> [bool; 4] {
    let bits = HALF_STEP_SEQUENCE[(phase % PHASES) as usize];
    [bits & 0b1000 != 0, bits & 0b0100 != 0, bits & 0b0010 != 0, bits & 0b0001 != 0]
}

/// Half-step sequencer over four coil lines.
///
/// Owns its pins: whoever owns the sequencer is the only writer.
pub struct HalfStepSequencer<P, D> {
    coils: [P; 4],
    delay: D,
    step_delay_us: u32,
    phase: u8,
}

impl<P: OutputPin, D: DelayNs> HalfStepSequencer<P, D> {
    /// Take ownership of the coil lines (IN1..IN4) and leave them released.
    pub fn new(coils: [P; 4], delay: D, step_delay_us: u32) -> Self {
        let mut seq = Self {
            coils,
            delay,
            step_delay_us,
            phase: 0,
        };
        seq.release();
        seq
    }

    /// Hold time per phase.  Larger = slower, more torque.
    pub fn set_step_delay_us(&mut self, us: u32) {
        self.step_delay_us = us;
    }

    pub fn step_delay_us(&self) -> u32 {
        self.step_delay_us
    }

    /// Current phase index (0..8).
    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Advance `steps` half-steps (negative = reverse), then release.
    pub fn step(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let delta: u8 = if steps > 0 { 1 } else { PHASES - 1 };
        for _ in 0..steps.unsigned_abs() {
            self.phase = (self.phase + delta) % PHASES;
            self.drive(coil_levels(self.phase));
            self.delay.delay_us(self.step_delay_us);
        }
        self.release();
    }

    /// De-energise every coil.
    pub fn release(&mut self) {
        self.drive([false; 4]);
    }

    fn drive(&mut self, levels: [bool; 4]) {
        for (line, (pin, high)) in self.coils.iter_mut().zip(levels).enumerate() {
            if let Err(e) = pin.set_state(PinState::from(high)) {
                warn!("Stepper: IN{} write failed: {:?}", line + 1, e);
            }
        }
    }
}

impl<P: OutputPin, D: DelayNs> StepperPort for HalfStepSequencer<P, D> {
    fn step(&mut self, steps: i32) {
        HalfStepSequencer::step(self, steps);
    }
}
