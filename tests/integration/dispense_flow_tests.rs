//! End-to-end dispense flow: enqueue → worker → stepper, against a
//! virtual clock.

use std::sync::Arc;
use std::time::Duration;

use goodboy::app::coordinator::{DispenseCoordinator, DispenseWorker, EnqueueOutcome};
use goodboy::app::events::AppEvent;
use goodboy::app::ports::Clock;
use goodboy::config::DispenserConfig;

use crate::mock_hw::{MockStepper, Op, RecordingSink, VirtualClock, steps, timeline};

type Worker = DispenseWorker<MockStepper, VirtualClock, RecordingSink>;

fn rig(config: &DispenserConfig) -> (Arc<DispenseCoordinator>, Worker, crate::mock_hw::Timeline, RecordingSink) {
    let t = timeline();
    let queue = Arc::new(DispenseCoordinator::from_config(config));
    let sink = RecordingSink::new();
    let worker = DispenseWorker::new(
        Arc::clone(&queue),
        MockStepper::new(&t),
        VirtualClock::new(&t),
        sink.clone(),
        config,
    );
    (queue, worker, t, sink)
}

// ── Single request ────────────────────────────────────────────

#[test]
fn three_units_produce_three_paced_moves() {
    let config = DispenserConfig {
        steps_per_dispense_unit: 180,
        inter_unit_delay_ms: 50,
        ..DispenserConfig::default()
    };
    let (queue, mut worker, t, _sink) = rig(&config);

    assert_eq!(queue.enqueue(3), EnqueueOutcome::Accepted);
    assert!(worker.try_run_once());

    assert_eq!(
        *t.lock().unwrap(),
        [
            Op::Step(180),
            Op::Sleep(50),
            Op::Step(180),
            Op::Sleep(50),
            Op::Step(180),
        ]
    );
    assert!(!worker.try_run_once(), "nothing else queued");
    assert_eq!(queue.dispatched_total(), 1);
}

#[test]
fn single_unit_has_no_pause() {
    let (queue, mut worker, t, _sink) = rig(&DispenserConfig::default());
    assert!(queue.enqueue(1).is_accepted());
    worker.run_once();
    assert_eq!(*t.lock().unwrap(), [Op::Step(180)]);
}

#[test]
fn reverse_unit_direction_is_passed_through() {
    let config = DispenserConfig {
        steps_per_dispense_unit: -90,
        ..DispenserConfig::default()
    };
    let (queue, mut worker, t, _sink) = rig(&config);
    assert!(queue.enqueue(2).is_accepted());
    assert!(worker.try_run_once());
    assert_eq!(steps(&t), [-90, -90]);
}

#[test]
fn events_bracket_each_request() {
    let config = DispenserConfig {
        inter_unit_delay_ms: 40,
        ..DispenserConfig::default()
    };
    let (queue, mut worker, _t, sink) = rig(&config);
    assert!(queue.enqueue(4).is_accepted());
    assert!(worker.try_run_once());

    assert_eq!(
        sink.snapshot(),
        [
            AppEvent::DispenseStarted { count: 4 },
            AppEvent::DispenseCompleted {
                count: 4,
                elapsed_ms: 120
            },
        ]
    );
}

#[test]
fn requests_are_served_in_order_without_overlap() {
    let (queue, mut worker, t, _sink) = rig(&DispenserConfig {
        inter_unit_delay_ms: 10,
        ..DispenserConfig::default()
    });
    assert!(queue.enqueue(2).is_accepted());
    assert!(queue.enqueue(1).is_accepted());
    while worker.try_run_once() {}

    // 2 units (one pause) then 1 unit; no pause between requests.
    assert_eq!(
        *t.lock().unwrap(),
        [Op::Step(180), Op::Sleep(10), Op::Step(180), Op::Step(180)]
    );
    assert_eq!(queue.dispatched_total(), 2);
}

// ── Backpressure ──────────────────────────────────────────────

#[test]
fn excess_requests_are_dropped_while_worker_is_idle() {
    let config = DispenserConfig {
        queue_capacity: 4,
        ..DispenserConfig::default()
    };
    let (queue, mut worker, t, _sink) = rig(&config);

    let outcomes: Vec<EnqueueOutcome> = (0..7).map(|_| queue.enqueue(1)).collect();
    let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
    assert_eq!(accepted, 4);
    assert_eq!(queue.dropped_total(), 3);

    while worker.try_run_once() {}
    assert_eq!(steps(&t).len(), 4);
    assert_eq!(queue.dispatched_total(), 4);
}

#[test]
fn concurrent_producers_never_exceed_capacity() {
    let queue = Arc::new(DispenseCoordinator::new(3));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let q = Arc::clone(&queue);
            std::thread::spawn(move || (0..50).filter(|_| q.enqueue(1).is_accepted()).count())
        })
        .collect();
    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(accepted, 3);
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.dropped_total() as usize, 8 * 50 - 3);
}

// ── Threaded worker ───────────────────────────────────────────

#[test]
fn worker_thread_drains_requests_from_other_threads() {
    let config = DispenserConfig {
        queue_capacity: 16,
        inter_unit_delay_ms: 5,
        ..DispenserConfig::default()
    };
    let (queue, mut worker, t, sink) = rig(&config);

    let handle = std::thread::spawn(move || {
        for _ in 0..5 {
            worker.run_once();
        }
        worker
    });

    for count in [1, 2, 3, 2, 1] {
        assert!(queue.enqueue(count).is_accepted());
        std::thread::sleep(Duration::from_millis(1));
    }

    let worker = handle.join().unwrap();
    assert_eq!(worker.queue().dispatched_total(), 5);
    assert_eq!(steps(&t).len(), 9);
    let completed = sink
        .snapshot()
        .into_iter()
        .filter(|e| matches!(e, AppEvent::DispenseCompleted { .. }))
        .count();
    assert_eq!(completed, 5);
    assert!(queue.is_empty());

    // Pauses: 0 + 1 + 2 + 1 + 0 between units, 5 ms each.
    let (_stepper, clock, _sink) = worker.into_parts();
    assert_eq!(clock.now_ms(), 20);
}
