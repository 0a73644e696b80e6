//! HTTP control endpoint (ESP-IDF only).
//!
//! `POST /api/dispense` with `{"count": n}`.  The body is handed to
//! [`DispenseAdmission::handle_json`] and its reply is written back with
//! the matching status (200, 400 or 503).  Nothing else is served.

use anyhow::Result;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{Read, Write};
use log::{info, warn};

use crate::app::admission::{AdmissionReply, DispenseAdmission};
use crate::error::RequestError;

/// Bodies longer than this are rejected as malformed.
const MAX_BODY_LEN: usize = 256;

const JSON_HEADERS: &[(&str, &str)] = &[("Content-Type", "application/json")];

/// Start the server and register the dispense handler.  The server stops
/// when the returned handle is dropped.
pub fn start(admission: DispenseAdmission) -> Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&Configuration::default())?;

    server.fn_handler::<anyhow::Error, _>("/api/dispense", Method::Post, move |mut req| {
        let mut buf = [0u8; MAX_BODY_LEN + 1];
        let mut len = 0;
        while len < buf.len() {
            let n = req.read(&mut buf[len..])?;
            if n == 0 {
                break;
            }
            len += n;
        }

        let reply = if len > MAX_BODY_LEN {
            warn!("ControlApi: body too large, rejecting");
            AdmissionReply::rejected(RequestError::MalformedBody)
        } else {
            admission.handle_json(&buf[..len])
        };

        let mut resp = req.into_response(reply.status(), None, JSON_HEADERS)?;
        resp.write_all(&reply.to_json())?;
        Ok(())
    })?;

    info!("ControlApi: listening on POST /api/dispense");
    Ok(server)
}
