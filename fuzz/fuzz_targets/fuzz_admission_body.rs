//! Fuzz target: dispense request admission
//!
//! Feeds arbitrary bytes as the HTTP body and checks:
//! - No panics
//! - The reply always serialises to valid JSON with a matching status
//! - Only accepted replies grow the queue, and never past its capacity
//!
//! cargo fuzz run fuzz_admission_body

#![no_main]

use std::sync::Arc;

use goodboy::app::admission::DispenseAdmission;
use goodboy::app::coordinator::DispenseCoordinator;
use goodboy::config::DispenserConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = DispenserConfig {
        queue_capacity: 2,
        ..DispenserConfig::default()
    };
    let queue = Arc::new(DispenseCoordinator::from_config(&config));
    let admission = DispenseAdmission::new(Arc::clone(&queue), &config);

    // Two passes so the second can hit a non-empty queue.
    for _ in 0..2 {
        let before = queue.len();
        let reply = admission.handle_json(data);

        let json: serde_json::Value =
            serde_json::from_slice(&reply.to_json()).expect("reply must be valid JSON");
        assert_eq!(json["ok"].as_bool(), Some(reply.ok));

        match reply.status() {
            200 => assert_eq!(queue.len(), before + 1),
            400 | 503 => assert_eq!(queue.len(), before),
            other => panic!("unexpected status {other}"),
        }
        assert!(queue.len() <= queue.capacity());
    }
});
