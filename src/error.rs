//! Unified error types for the GoodBoy firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! binary's top-level error handling uniform.  All variants are `Copy` so
//! they can be passed around without allocation.
//!
//! The actuation core (sequencer, coordinator, worker) has no error path:
//! the hardware gives no feedback, so nothing in it can fail observably.
//! Errors only arise at the edges: request admission, connectivity and
//! configuration.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An externally supplied dispense request was rejected.
    Request(RequestError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Request errors
// ---------------------------------------------------------------------------

/// Validation failures raised by the request-admission layer.  The
/// dispense core never observes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// Count is not an integer in `1..=max_count_per_request`.
    InvalidCount,
    /// Body could not be parsed at all.
    MalformedBody,
}

impl RequestError {
    /// Stable machine-readable code for replies.
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidCount => "invalid_count",
            Self::MalformedBody => "malformed_body",
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCount => write!(f, "count out of range"),
            Self::MalformedBody => write!(f, "malformed request body"),
        }
    }
}

impl From<RequestError> for Error {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
