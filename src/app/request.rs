//! Dispense request value.
//!
//! Created by the admission layer, consumed exactly once by the dispense
//! worker, then dropped.

/// Largest number of units a single request may ask for.
pub const MAX_COUNT_PER_REQUEST: u8 = 10;

/// One queued dispense: `count` units, each one full
/// `steps_per_dispense_unit` move of the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseRequest {
    count: u8,
}

impl DispenseRequest {
    /// Wrap a count without checking it.
    ///
    /// Range checks belong to admission; a zero count here simply moves
    /// nothing.
    pub const fn new(count: u8) -> Self {
        Self { count }
    }

    /// Checked constructor for untrusted input.
    pub fn try_new(count: i64, max_count: u8) -> Option<Self> {
        let max = i64::from(max_count.min(MAX_COUNT_PER_REQUEST));
        (1..=max).contains(&count).then_some(Self { count: count as u8 })
    }

    pub const fn count(self) -> u8 {
        self.count
    }
}
