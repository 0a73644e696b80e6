//! Wall-clock sync over SNTP.
//!
//! The client is started the first time the link reports
//! [`ConnectivityEvent::Connected`] and keeps running in the background
//! afterwards.  Dispensing never depends on wall time; this only makes log
//! timestamps meaningful.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::sntp::EspSntp` with the
//!   default `pool.ntp.org` servers.
//! - **all other targets**: records that a start was requested.

use log::info;

use crate::app::connectivity::ConnectivityEvent;

/// Unix time before 2020-09-13: the clock has never been set.
pub const PLAUSIBLE_UNIX_S: u64 = 1_600_000_000;

pub struct TimeSync {
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
    #[cfg(not(target_os = "espidf"))]
    started: bool,
    synced: bool,
}

impl Default for TimeSync {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSync {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            sntp: None,
            #[cfg(not(target_os = "espidf"))]
            started: false,
            synced: false,
        }
    }

    /// Start the client on the first `Connected`.  A failed start is
    /// retried on the next one.
    pub fn on_link_event(&mut self, event: &ConnectivityEvent) {
        if matches!(event, ConnectivityEvent::Connected { .. }) && !self.is_started() {
            self.start();
        }
    }

    /// Report whether the wall clock is set, given the current Unix time.
    /// Logs once when it first looks plausible.
    pub fn poll(&mut self, unix_now_s: u64) -> bool {
        if !self.synced && self.is_started() && unix_now_s >= PLAUSIBLE_UNIX_S {
            self.synced = true;
            info!("SNTP: time synced ({})", unix_now_s);
        }
        self.synced
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    #[cfg(target_os = "espidf")]
    pub fn is_started(&self) -> bool {
        self.sntp.is_some()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[cfg(target_os = "espidf")]
    fn start(&mut self) {
        match esp_idf_svc::sntp::EspSntp::new_default() {
            Ok(sntp) => {
                info!("SNTP: sync started");
                self.sntp = Some(sntp);
            }
            Err(e) => log::warn!("SNTP: start failed: {}", e),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn start(&mut self) {
        info!("SNTP(sim): sync started");
        self.started = true;
    }
}
