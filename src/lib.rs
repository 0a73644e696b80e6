//! GoodBoy treat dispenser firmware library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, with host simulation in its place.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod backoff;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
