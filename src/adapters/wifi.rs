//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the only view of the network the
//! [`ReconnectSupervisor`](crate::app::connectivity::ReconnectSupervisor)
//! has.  The adapter starts attempts and reports link state; retry pacing
//! lives in the supervisor.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in STA mode.
//! - **all other targets**: a scripted simulation for host-side tests.

use log::{info, warn};

use crate::app::ports::ConnectivityPort;
use crate::config::DispenserConfig;
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// 1-32 printable ASCII bytes.
pub fn validate_ssid(ssid: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidSsid);
    }
    Ok(())
}

/// Empty (open network) or 8-64 bytes (WPA2).
pub fn validate_password(password: &str) -> Result<(), CommsError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CommsError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Credential selection
// ───────────────────────────────────────────────────────────────

/// Credentials compiled in from the `WIFI_SSID` / `WIFI_PASS` build
/// environment, if any.
pub fn build_time_credentials() -> Option<(&'static str, &'static str)> {
    let ssid = option_env!("WIFI_SSID").filter(|s| !s.is_empty())?;
    Some((ssid, option_env!("WIFI_PASS").unwrap_or("")))
}

/// Stored credentials win; an empty stored SSID falls back to `fallback`.
/// With neither, both strings are empty and the link stays offline.
pub fn select_credentials<'a>(
    config: &'a DispenserConfig,
    fallback: Option<(&'a str, &'a str)>,
) -> (&'a str, &'a str) {
    if !config.wifi_ssid.is_empty() {
        return (config.wifi_ssid.as_str(), config.wifi_password.as_str());
    }
    match fallback {
        Some((ssid, password)) if !ssid.is_empty() => {
            info!("WiFi: no stored SSID, using build-time credentials");
            (ssid, password)
        }
        _ => ("", ""),
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimLink {
    up: bool,
    /// Attempts that will start but never associate.
    fail_next: u32,
    attempts: u32,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimLink,
}

impl WifiAdapter {
    /// Take the driver, apply credentials and start the STA interface.
    /// Does not connect; the supervisor's first poll does.  With no SSID
    /// the interface stays stopped and every attempt fails with
    /// [`CommsError::NoCredentials`].
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>, ssid: &str, password: &str) -> Result<Self, CommsError> {
        let mut adapter = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            wifi,
        };
        if ssid.is_empty() {
            warn!("WiFi: no SSID configured, staying offline");
            return Ok(adapter);
        }
        adapter.set_credentials(ssid, password)?;

        let auth_method = if adapter.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: adapter.ssid.as_str().try_into().map_err(|_| CommsError::InvalidSsid)?,
            password: adapter
                .password
                .as_str()
                .try_into()
                .map_err(|_| CommsError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        adapter.wifi.set_configuration(&conf).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            CommsError::ConnectFailed
        })?;
        adapter.wifi.start().map_err(|e| {
            warn!("WiFi: start failed: {}", e);
            CommsError::ConnectFailed
        })?;
        info!("WiFi: STA started for '{}'", adapter.ssid);
        Ok(adapter)
    }

    /// Simulated adapter.  With no SSID, every attempt fails with
    /// [`CommsError::NoCredentials`].
    #[cfg(not(target_os = "espidf"))]
    pub fn new(ssid: &str, password: &str) -> Result<Self, CommsError> {
        let mut adapter = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim: SimLink::default(),
        };
        if !ssid.is_empty() {
            adapter.set_credentials(ssid, password)?;
        }
        Ok(adapter)
    }

    /// Validate and store credentials.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), CommsError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| CommsError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| CommsError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect failed: {}", e);
            CommsError::ConnectFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        self.sim.attempts += 1;
        if self.sim.fail_next > 0 {
            self.sim.fail_next -= 1;
            warn!("WiFi(sim): attempt {} will not associate", self.sim.attempts);
            return Ok(());
        }
        self.sim.up = true;
        info!("WiFi(sim): connected to '{}' (attempt {})", self.ssid, self.sim.attempts);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        if !self.platform_is_connected() {
            return None;
        }
        // SAFETY: zeroed is a valid bit pattern for this plain C struct, and
        // the call only writes into it.
        let mut ap: esp_idf_svc::sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap) };
        (ret == esp_idf_svc::sys::ESP_OK as i32).then_some(ap.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        // Oscillate around -60 dBm so logs show some variation.
        self.sim
            .up
            .then(|| -60_i8.saturating_add((self.sim.attempts % 12) as i8 - 6))
    }

    // ── Simulation controls ───────────────────────────────────

    /// Drop the simulated link.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        info!("WiFi(sim): link dropped");
        self.sim.up = false;
    }

    /// Make the next `n` attempts start but never associate.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim.fail_next = n;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_attempts(&self) -> u32 {
        self.sim.attempts
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn begin_connect(&mut self) -> Result<(), CommsError> {
        if self.ssid.is_empty() {
            return Err(CommsError::NoCredentials);
        }
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_connect()
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn rssi(&self) -> Option<i8> {
        self.platform_rssi()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
