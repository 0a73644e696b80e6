//! GPIO assignments for the GoodBoy dispenser board (ESP32 DevKit).
//!
//! `main` checks every pin it claims from `Peripherals` against these.

// ---------------------------------------------------------------------------
// Stepper (28BYJ-48 via ULN2003)
// ---------------------------------------------------------------------------

/// Coil line IN1.
pub const STEPPER_IN1_GPIO: i32 = 19;
/// Coil line IN2.
pub const STEPPER_IN2_GPIO: i32 = 18;
/// Coil line IN3.
pub const STEPPER_IN3_GPIO: i32 = 5;
/// Coil line IN4.
pub const STEPPER_IN4_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// On-board blue LED, active HIGH.
pub const STATUS_LED_GPIO: i32 = 2;
