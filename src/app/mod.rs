//! Application core: pure domain logic, zero I/O.
//!
//! Request admission, the dispense queue and its single worker, and the
//! reconnect supervisor.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod admission;
pub mod connectivity;
pub mod coordinator;
pub mod events;
pub mod ports;
pub mod request;
