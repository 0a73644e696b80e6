//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! tagged line to the logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::connectivity::ConnectivityEvent;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::DispenseStarted { count } => {
                info!("DISPENSE | start count={}", count);
            }
            AppEvent::DispenseCompleted { count, elapsed_ms } => {
                info!("DISPENSE | done count={} in {}ms", count, elapsed_ms);
            }
            AppEvent::Link(ConnectivityEvent::Connected { rssi }) => match rssi {
                Some(dbm) => info!("LINK | up rssi={}dBm", dbm),
                None => info!("LINK | up"),
            },
            AppEvent::Link(ConnectivityEvent::ConnectionLost { retry_in_ms }) => {
                warn!("LINK | lost, retry in {}ms", retry_in_ms);
            }
            AppEvent::Link(ConnectivityEvent::RetryAttempted {
                attempt,
                next_retry_in_ms,
            }) => {
                info!("LINK | attempt #{} (next in {}ms)", attempt, next_retry_in_ms);
            }
        }
    }
}
