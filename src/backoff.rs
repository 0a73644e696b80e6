//! Exponential backoff with deterministic jitter.
//!
//! [`Backoff`] paces retries for any caller that needs them (Wi-Fi
//! reconnection is the main consumer).  Each call to
//! [`next_delay`](Backoff::next_delay) returns the *current* base delay
//! perturbed by up to ±`jitter` of itself, then grows the base by `factor`
//! for the following call:
//!
//! ```text
//!   base:   500 ─▶ 1000 ─▶ 2000 ─▶ 4000 ─▶ … ─▶ max ─▶ max
//!   delay:  base · (1 + jitter · u),   u ∈ [-1, 1)
//! ```
//!
//! The jitter source is a 32-bit LCG owned by the instance, so two
//! generators built with the same arguments and seed produce identical
//! sequences.  Tests rely on this.
//!
//! Not shared: every owner holds its own instance.  Out-of-range
//! constructor arguments (zero initial delay, negative factor) are the
//! caller's problem; the only guard is that the base never drops below
//! `initial_ms`, so a factor below 1 yields a constant sequence.

use crate::config::DispenserConfig;

/// Seed used when none (or zero) is supplied.
pub const DEFAULT_SEED: u32 = 0x1234_5678;

// Numerical Recipes LCG constants.
const LCG_MUL: u32 = 1_664_525;
const LCG_INC: u32 = 1_013_904_223;

/// Jittered exponential backoff generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    initial_ms: u32,
    max_ms: u32,
    factor: f32,
    jitter: f32,
    /// Base delay handed out by the next call (pre-jitter).
    current_ms: u32,
    rng_state: u32,
}

impl Backoff {
    pub fn new(initial_ms: u32, max_ms: u32, factor: f32, jitter: f32) -> Self {
        Self {
            initial_ms,
            max_ms,
            factor,
            jitter,
            current_ms: initial_ms,
            rng_state: DEFAULT_SEED,
        }
    }

    /// Build from the reconnect fields of the system configuration.
    pub fn from_config(config: &DispenserConfig) -> Self {
        Self::new(
            config.initial_backoff_ms,
            config.max_backoff_ms,
            config.backoff_factor,
            config.jitter_fraction,
        )
    }

    /// Reseed the jitter source.  Zero maps to [`DEFAULT_SEED`] because an
    /// all-zero state would make the first draw predictable.
    pub fn set_seed(&mut self, seed: u32) {
        self.rng_state = if seed == 0 { DEFAULT_SEED } else { seed };
    }

    /// Restart the sequence at `initial_ms`.  The PRNG state is untouched.
    pub fn reset(&mut self) {
        self.current_ms = self.initial_ms;
    }

    /// Return the next delay in milliseconds and advance the base.
    pub fn next_delay(&mut self) -> u32 {
        let base = self.current_ms;
        self.advance();

        if self.jitter <= 0.0 {
            return base;
        }

        let span = f64::from(base) * f64::from(self.jitter);
        let lo = f64::from(base) - span;
        let hi = f64::from(base) + span;
        let val = (lo + (hi - lo) * self.next_unit()).max(0.0);
        val.round() as u32
    }

    /// Base delay the next call will start from (no jitter, no mutation).
    pub fn peek(&self) -> u32 {
        self.current_ms
    }

    pub fn initial(&self) -> u32 {
        self.initial_ms
    }

    pub fn maximum(&self) -> u32 {
        self.max_ms
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn jitter(&self) -> f32 {
        self.jitter
    }

    fn advance(&mut self) {
        let grown = (f64::from(self.current_ms) * f64::from(self.factor)).max(1.0);
        // `as` saturates, so an overflowing product lands on u32::MAX and is
        // then capped by max_ms.
        let grown = grown.ceil() as u32;
        self.current_ms = grown.max(self.initial_ms).min(self.max_ms);
    }

    /// Uniform draw in [0, 1) from the top 24 bits of the LCG state.
    fn next_unit(&mut self) -> f64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(LCG_MUL)
            .wrapping_add(LCG_INC);
        let x = (self.rng_state >> 8) & 0x00FF_FFFF;
        f64::from(x) / f64::from(0x0100_0000_u32)
    }
}

impl Default for Backoff {
    /// 500 ms → 30 s, doubling, ±10 % jitter.
    fn default() -> Self {
        Self::new(500, 30_000, 2.0, 0.1)
    }
}

/// An endless stream of delays.
impl Iterator for Backoff {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        Some(self.next_delay())
    }
}
