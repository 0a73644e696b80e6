//! Connectivity blink indicator on a single GPIO LED.
//!
//! Fast blink while the link is up, slow blink while it is down.  Driven
//! by [`StatusBlinker::tick`] from whatever loop owns the LED; the blinker
//! keeps no timer of its own.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

/// Toggle period while connected (ms).
pub const CONNECTED_PERIOD_MS: u64 = 250;
/// Toggle period while disconnected (ms).
pub const DISCONNECTED_PERIOD_MS: u64 = 750;

pub const fn blink_period_ms(connected: bool) -> u64 {
    if connected {
        CONNECTED_PERIOD_MS
    } else {
        DISCONNECTED_PERIOD_MS
    }
}

pub struct StatusBlinker<P> {
    pin: P,
    lit: bool,
    last_toggle_ms: u64,
}

impl<P: OutputPin> StatusBlinker<P> {
    /// Take the LED pin and switch it off.
    pub fn new(pin: P) -> Self {
        let mut blinker = Self {
            pin,
            lit: false,
            last_toggle_ms: 0,
        };
        blinker.write();
        blinker
    }

    /// Toggle the LED if the period for the current link state has elapsed.
    /// Returns whether it toggled.
    pub fn tick(&mut self, now_ms: u64, connected: bool) -> bool {
        if now_ms.saturating_sub(self.last_toggle_ms) < blink_period_ms(connected) {
            return false;
        }
        self.last_toggle_ms = now_ms;
        self.lit = !self.lit;
        self.write();
        true
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn write(&mut self) {
        if let Err(e) = self.pin.set_state(PinState::from(self.lit)) {
            warn!("StatusLed: write failed: {:?}", e);
        }
    }
}
