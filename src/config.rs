//! System configuration parameters
//!
//! All tunable parameters for the GoodBoy dispenser.
//! Values can be overridden via NVS (non-volatile storage) or a JSON
//! provisioning blob.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::app::request::MAX_COUNT_PER_REQUEST;
use crate::drivers::stepper::DEFAULT_STEP_DELAY_US;

/// Hard upper bound on the dispense queue depth.
pub const MAX_QUEUE_CAPACITY: usize = 16;

/// Log verbosity, matching the 0..3 levels of the serial console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// How the connectivity layer paces reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconnectStrategy {
    /// Retry every `reconnect_interval_ms`.
    FixedInterval,
    /// Jittered exponential backoff from the `*_backoff_*` fields.
    Backoff,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispenserConfig {
    // --- Identity ---
    /// Human-readable device name. Empty = derive from MAC.
    pub device_name: heapless::String<32>,

    // --- Wi-Fi ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,

    // --- Reconnect pacing ---
    /// First backoff delay (milliseconds)
    pub initial_backoff_ms: u32,
    /// Backoff ceiling (milliseconds)
    pub max_backoff_ms: u32,
    /// Multiplier applied to the base delay after each attempt
    pub backoff_factor: f32,
    /// Jitter as a fraction of the base delay (0.0–1.0)
    pub jitter_fraction: f32,
    pub reconnect_strategy: ReconnectStrategy,
    /// Retry period when `reconnect_strategy` is `FixedInterval` (milliseconds)
    pub reconnect_interval_ms: u32,

    // --- Actuator ---
    /// Half-steps per dispensed unit (sign selects rotation direction)
    pub steps_per_dispense_unit: i32,
    /// Hold time per half-step phase (microseconds). Larger = slower, more torque.
    pub inter_step_delay_us: u32,
    /// Pause between consecutive units of one request (milliseconds)
    pub inter_unit_delay_ms: u32,

    // --- Request queue ---
    /// Pending dispense requests held before new ones are dropped
    pub queue_capacity: usize,
    /// Largest count a single request may ask for
    pub max_count_per_request: u8,
    /// Report queue overflow to the requester instead of claiming success
    pub report_queue_overflow: bool,

    // --- Logging ---
    pub log_level: LogLevel,
}

impl Default for DispenserConfig {
    fn default() -> Self {
        Self {
            device_name: heapless::String::new(),
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),

            // Reconnect
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            backoff_factor: 2.0,
            jitter_fraction: 0.1,
            reconnect_strategy: ReconnectStrategy::Backoff,
            reconnect_interval_ms: 10_000,

            // Actuator (28BYJ-48 via ULN2003)
            steps_per_dispense_unit: 180,
            inter_step_delay_us: DEFAULT_STEP_DELAY_US,
            inter_unit_delay_ms: 50,

            // Queue
            queue_capacity: 4,
            max_count_per_request: MAX_COUNT_PER_REQUEST,
            report_queue_overflow: true,

            log_level: LogLevel::Info,
        }
    }
}

impl DispenserConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_backoff_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "initial_backoff_ms must be > 0",
            ));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(ConfigError::ValidationFailed(
                "max_backoff_ms must be >= initial_backoff_ms",
            ));
        }
        if !self.backoff_factor.is_finite() || !(0.0..=16.0).contains(&self.backoff_factor) {
            return Err(ConfigError::ValidationFailed(
                "backoff_factor must be 0.0–16.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err(ConfigError::ValidationFailed(
                "jitter_fraction must be 0.0–1.0",
            ));
        }
        if !(1000..=3_600_000).contains(&self.reconnect_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "reconnect_interval_ms must be 1000–3600000",
            ));
        }
        if self.steps_per_dispense_unit == 0 || self.steps_per_dispense_unit.unsigned_abs() > 40_960 {
            return Err(ConfigError::ValidationFailed(
                "steps_per_dispense_unit must be non-zero and within ±40960",
            ));
        }
        if !(500..=20_000).contains(&self.inter_step_delay_us) {
            return Err(ConfigError::ValidationFailed(
                "inter_step_delay_us must be 500–20000",
            ));
        }
        if self.inter_unit_delay_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "inter_unit_delay_ms must be 0–10000",
            ));
        }
        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.queue_capacity) {
            return Err(ConfigError::ValidationFailed(
                "queue_capacity must be 1–16",
            ));
        }
        if !(1..=MAX_COUNT_PER_REQUEST).contains(&self.max_count_per_request) {
            return Err(ConfigError::ValidationFailed(
                "max_count_per_request must be 1–10",
            ));
        }
        Ok(())
    }

    /// Parse a JSON provisioning blob and validate it.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
