//! Request admission against a real coordinator: validation, JSON
//! replies, and both queue-overflow reporting policies.

use std::sync::Arc;

use goodboy::app::admission::{AdmissionOutcome, DispenseAdmission};
use goodboy::app::coordinator::DispenseCoordinator;
use goodboy::config::DispenserConfig;
use goodboy::error::RequestError;

fn admission(capacity: usize, report_overflow: bool) -> (DispenseAdmission, Arc<DispenseCoordinator>) {
    let config = DispenserConfig {
        queue_capacity: capacity,
        report_queue_overflow: report_overflow,
        ..DispenserConfig::default()
    };
    let queue = Arc::new(DispenseCoordinator::from_config(&config));
    (DispenseAdmission::new(Arc::clone(&queue), &config), queue)
}

// ── Validation ────────────────────────────────────────────────

#[test]
fn out_of_range_counts_never_reach_the_queue() {
    let (adm, queue) = admission(4, true);
    for bad in [0, -1, 11, 1_000, i64::MIN] {
        assert_eq!(adm.admit(bad), Err(RequestError::InvalidCount), "count {bad}");
    }
    assert!(queue.is_empty());
    assert_eq!(queue.dropped_total(), 0);
}

#[test]
fn configured_max_is_honoured() {
    let config = DispenserConfig {
        max_count_per_request: 3,
        ..DispenserConfig::default()
    };
    let queue = Arc::new(DispenseCoordinator::from_config(&config));
    let adm = DispenseAdmission::new(Arc::clone(&queue), &config);
    assert_eq!(adm.admit(3), Ok(AdmissionOutcome::Accepted));
    assert_eq!(adm.admit(4), Err(RequestError::InvalidCount));
}

#[test]
fn json_body_is_validated() {
    let (adm, queue) = admission(4, true);

    let reply = adm.handle_json(br#"{"count": 12}"#);
    assert_eq!(reply.status(), 400);
    assert_eq!(reply.to_json(), br#"{"ok":false,"error":"invalid_count"}"#);

    let reply = adm.handle_json(b"{count: 2");
    assert_eq!(reply.status(), 400);
    assert_eq!(reply.error, Some("malformed_body"));

    assert!(queue.is_empty());
}

#[test]
fn array_body_is_malformed_not_a_count() {
    let (adm, queue) = admission(4, true);
    let reply = adm.handle_json(b"[3]");
    assert_eq!(reply.status(), 400);
    assert_eq!(reply.to_json(), br#"{"ok":false,"error":"malformed_body"}"#);
    assert!(queue.is_empty());
}

#[test]
fn missing_count_dispenses_one() {
    let (adm, queue) = admission(4, true);
    let reply = adm.handle_json(b"{}");
    assert_eq!(reply.status(), 200);
    assert_eq!(queue.try_receive().map(|r| r.count()), Some(1));
}

// ── Overflow reporting ────────────────────────────────────────

#[test]
fn overflow_is_reported_when_enabled() {
    let (adm, queue) = admission(2, true);
    assert_eq!(adm.handle_json(br#"{"count":1}"#).status(), 200);
    assert_eq!(adm.handle_json(br#"{"count":1}"#).status(), 200);

    let reply = adm.handle_json(br#"{"count":1}"#);
    assert_eq!(reply.status(), 503);
    assert_eq!(
        reply.to_json(),
        br#"{"ok":false,"enqueued":false,"error":"queue_full"}"#
    );
    assert_eq!(adm.admit(5), Ok(AdmissionOutcome::Dropped));
    assert_eq!(queue.dropped_total(), 2);
}

#[test]
fn legacy_mode_claims_success_on_overflow() {
    let (adm, queue) = admission(1, false);
    assert_eq!(adm.handle_json(br#"{"count":2}"#).status(), 200);

    let reply = adm.handle_json(br#"{"count":2}"#);
    assert_eq!(reply.status(), 200);
    assert_eq!(reply.to_json(), br#"{"ok":true,"enqueued":true}"#);
    assert_eq!(adm.admit(2), Ok(AdmissionOutcome::DroppedSilently));

    // The request really was dropped.
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.dropped_total(), 2);
}

#[test]
fn clones_share_one_queue() {
    let (adm, queue) = admission(4, true);
    let other = adm.clone();
    assert!(adm.admit(1).is_ok());
    assert!(other.admit(2).is_ok());
    assert_eq!(queue.len(), 2);
}
