//! Actuator and indicator drivers, plus core-pinned task spawning.

pub mod status_led;
pub mod stepper;
pub mod task_pin;
