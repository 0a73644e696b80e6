//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements        | Connects to                |
//! |---------------|-------------------|----------------------------|
//! | `log_sink`    | EventSink         | Serial log output          |
//! | `nvs`         | ConfigPort        | NVS / in-memory store      |
//! | `time`        | Clock             | ESP32 system timer         |
//! | `sntp`        | n/a               | SNTP wall-clock sync       |
//! | `wifi`        | ConnectivityPort  | ESP-IDF WiFi STA           |
//! | `control_api` | (driving)         | HTTP `POST /api/dispense`  |
//! | `device_id`   | n/a               | eFuse MAC                  |

#[cfg(target_os = "espidf")]
pub mod control_api;
pub mod device_id;
pub mod log_sink;
pub mod nvs;
pub mod sntp;
pub mod time;
pub mod wifi;
