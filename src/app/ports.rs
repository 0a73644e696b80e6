//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Coordinator / Supervisor (domain)
//! ```
//!
//! Driven adapters (stepper, clock, event sinks, config storage, Wi-Fi)
//! implement these traits.  The domain consumes them via generics, so the
//! core never touches hardware directly and tests can substitute mocks
//! and a virtual clock.

use crate::config::DispenserConfig;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Stepper port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Open-loop rotary actuator.
pub trait StepperPort {
    /// Move `steps` half-steps (negative = reverse), then de-energise.
    /// There is no feedback, so no result.
    fn step(&mut self, steps: i32);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ time)
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus blocking sleep.
///
/// Injected wherever the domain paces itself, so tests can advance
/// virtual time instead of sleeping.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// # Security
///
/// Implementations MUST call [`DispenserConfig::validate`] before
/// persisting.  Invalid ranges are rejected with
/// [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`DispenserConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<DispenserConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &DispenserConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain ↔ network link)
// ───────────────────────────────────────────────────────────────

/// Minimal view of the network link used by the reconnect supervisor.
pub trait ConnectivityPort {
    /// Start a (re)connection attempt.  Must not block until associated.
    fn begin_connect(&mut self) -> Result<(), CommsError>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// Signal strength in dBm when connected.
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
