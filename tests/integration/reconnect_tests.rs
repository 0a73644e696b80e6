//! Reconnect supervisor driven by virtual time.

use goodboy::app::connectivity::{ConnectivityEvent, ReconnectSupervisor, RetryPolicy};
use goodboy::backoff::Backoff;
use goodboy::config::{DispenserConfig, ReconnectStrategy};

use crate::mock_hw::MockLink;

/// Poll every `tick_ms` from 0 up to `until_ms`, collecting events.
fn run<C: goodboy::app::ports::ConnectivityPort>(
    sup: &mut ReconnectSupervisor<C>,
    from_ms: u64,
    until_ms: u64,
    tick_ms: u64,
) -> Vec<(u64, ConnectivityEvent)> {
    (from_ms..=until_ms)
        .step_by(tick_ms as usize)
        .filter_map(|t| sup.poll(t).map(|e| (t, e)))
        .collect()
}

#[test]
fn fixed_interval_retries_every_ten_seconds() {
    let config = DispenserConfig {
        reconnect_strategy: ReconnectStrategy::FixedInterval,
        ..DispenserConfig::default()
    };
    let mut sup = ReconnectSupervisor::new(MockLink::never_up(), RetryPolicy::from_config(&config));

    let attempts: Vec<u64> = run(&mut sup, 0, 35_000, 20)
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert_eq!(attempts, [0, 10_000, 20_000, 30_000]);
    assert_eq!(sup.link().attempts, 4);
}

#[test]
fn backoff_spaces_attempts_exponentially_until_connected() {
    let policy = RetryPolicy::Backoff(Backoff::new(500, 4_000, 2.0, 0.0));
    let mut sup = ReconnectSupervisor::new(MockLink::up_on_attempt(5), policy);

    let events = run(&mut sup, 0, 20_000, 10);
    let times: Vec<u64> = events.iter().map(|(t, _)| *t).collect();

    // Attempts at 0, +500, +1000, +2000, +4000; the fifth succeeds and
    // is seen on the next tick.
    assert_eq!(times, [0, 500, 1_500, 3_500, 7_500, 7_510]);
    assert_eq!(
        events.last().map(|(_, e)| *e),
        Some(ConnectivityEvent::Connected { rssi: Some(-55) })
    );
    assert!(sup.is_up());
    assert_eq!(sup.attempts(), 0);
}

#[test]
fn lost_link_starts_a_fresh_backoff() {
    let policy = RetryPolicy::Backoff(Backoff::new(100, 1_000, 2.0, 0.0));
    let mut sup = ReconnectSupervisor::new(MockLink::up_on_attempt(3), policy);
    let _ = run(&mut sup, 0, 1_000, 10);
    assert!(sup.is_up());

    sup.link_mut().drop_link();
    assert_eq!(
        sup.poll(2_000),
        Some(ConnectivityEvent::ConnectionLost { retry_in_ms: 100 })
    );
    assert_eq!(sup.poll(2_050), None);
    assert_eq!(
        sup.poll(2_100),
        Some(ConnectivityEvent::RetryAttempted {
            attempt: 1,
            next_retry_in_ms: 200
        })
    );
    // The scripted link succeeds on every attempt from the third on.
    assert_eq!(
        sup.poll(2_110),
        Some(ConnectivityEvent::Connected { rssi: Some(-55) })
    );
}

#[test]
fn refused_attempt_is_still_paced() {
    let mut link = MockLink::never_up();
    link.refuse_start = true;
    let mut sup = ReconnectSupervisor::new(link, RetryPolicy::FixedInterval(1_000));
    let events = run(&mut sup, 0, 2_500, 50);
    assert_eq!(events.len(), 3);
    assert!(!sup.is_up());
    assert_eq!(sup.attempts(), 3);
}

#[test]
fn seeded_supervisors_desynchronise() {
    let config = DispenserConfig::default();
    let mut a = RetryPolicy::from_config(&config);
    let mut b = RetryPolicy::from_config(&config);
    a.set_seed(0x0000_0001);
    b.set_seed(0x0000_0002);
    let da: Vec<u32> = (0..8).map(|_| a.next_delay()).collect();
    let db: Vec<u32> = (0..8).map(|_| b.next_delay()).collect();
    assert_ne!(da, db);
}
