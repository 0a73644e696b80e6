//! Request admission: the only path from the outside world into the
//! dispense queue.
//!
//! Validates externally supplied counts so the dispense core never sees
//! an invalid one, then enqueues and maps the outcome to a reply.
//!
//! ## Overflow reporting
//!
//! A full queue drops the request.  With `report_queue_overflow = true`
//! the requester is told (`queue_full`).  With `false` the reply claims
//! success regardless, which is how the first appliance firmware behaved;
//! kept only for clients that depend on it.

use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::DispenserConfig;
use crate::error::RequestError;

use super::coordinator::{DispenseCoordinator, EnqueueOutcome};
use super::request::DispenseRequest;

/// JSON reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmissionReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enqueued: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl AdmissionReply {
    const fn accepted() -> Self {
        Self {
            ok: true,
            enqueued: Some(true),
            error: None,
        }
    }

    const fn queue_full() -> Self {
        Self {
            ok: false,
            enqueued: Some(false),
            error: Some("queue_full"),
        }
    }

    /// Reply for a request that failed validation.
    pub const fn rejected(e: RequestError) -> Self {
        Self {
            ok: false,
            enqueued: None,
            error: Some(e.code()),
        }
    }

    /// HTTP status matching this reply.
    pub fn status(&self) -> u16 {
        match (self.ok, self.error) {
            (true, _) => 200,
            (false, Some("queue_full")) => 503,
            (false, _) => 400,
        }
    }

    pub fn to_json(&self) -> Vec<u8> {
        // Serialising a flat struct of bools and static strs cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// What admission did with a valid request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Accepted,
    /// Dropped on a full queue and reported as such.
    Dropped,
    /// Dropped on a full queue but reported as accepted (legacy mode).
    DroppedSilently,
}

/// Validates and forwards dispense requests.  Cheap to clone; every
/// producer context can hold its own.
#[derive(Clone)]
pub struct DispenseAdmission {
    queue: Arc<DispenseCoordinator>,
    max_count: u8,
    report_overflow: bool,
}

impl DispenseAdmission {
    pub fn new(queue: Arc<DispenseCoordinator>, config: &DispenserConfig) -> Self {
        Self {
            queue,
            max_count: config.max_count_per_request,
            report_overflow: config.report_queue_overflow,
        }
    }

    /// Validate `count` and enqueue it.
    pub fn admit(&self, count: i64) -> Result<AdmissionOutcome, RequestError> {
        let Some(request) = DispenseRequest::try_new(count, self.max_count) else {
            warn!("Admission: rejected count={}", count);
            return Err(RequestError::InvalidCount);
        };

        match self.queue.enqueue(request.count()) {
            EnqueueOutcome::Accepted => {
                info!("Admission: accepted count={}", request.count());
                Ok(AdmissionOutcome::Accepted)
            }
            EnqueueOutcome::Dropped if self.report_overflow => Ok(AdmissionOutcome::Dropped),
            EnqueueOutcome::Dropped => Ok(AdmissionOutcome::DroppedSilently),
        }
    }

    /// Handle a raw JSON request body and produce the reply.
    pub fn handle_json(&self, body: &[u8]) -> AdmissionReply {
        let count = match parse_count(body) {
            Ok(c) => c,
            Err(e) => return AdmissionReply::rejected(e),
        };
        match self.admit(count) {
            Ok(AdmissionOutcome::Accepted | AdmissionOutcome::DroppedSilently) => {
                AdmissionReply::accepted()
            }
            Ok(AdmissionOutcome::Dropped) => AdmissionReply::queue_full(),
            Err(e) => AdmissionReply::rejected(e),
        }
    }
}

/// Extract an integral count from a `{"count": n}` body.  An empty body
/// counts as `{}`; a missing or null `count` means 1.  Anything other than
/// a JSON object is malformed.
fn parse_count(body: &[u8]) -> Result<i64, RequestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(1);
    }
    let object: Map<String, Value> =
        serde_json::from_slice(body).map_err(|_| RequestError::MalformedBody)?;
    let raw = match object.get("count") {
        None | Some(Value::Null) => 1.0,
        Some(Value::Number(n)) => n.as_f64().ok_or(RequestError::InvalidCount)?,
        Some(_) => return Err(RequestError::MalformedBody),
    };
    if !raw.is_finite() || raw.fract() != 0.0 || raw.abs() > f64::from(u32::MAX) {
        return Err(RequestError::InvalidCount);
    }
    Ok(raw as i64)
}
