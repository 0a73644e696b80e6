//! Reconnect supervisor.
//!
//! Polled from the main loop with the current time.  Watches the link
//! through [`ConnectivityPort`] and, while it is down, paces reconnection
//! attempts with a [`RetryPolicy`].  State changes are returned as
//! [`ConnectivityEvent`] values; nothing is called back.
//!
//! ```text
//!            is_connected()
//!   ┌──────┐ ───────────────▶ ┌──────┐
//!   │ Down │                  │  Up  │
//!   └──────┘ ◀─────────────── └──────┘
//!     │  ▲     link dropped
//!     └──┘ now ≥ next_attempt: begin_connect(), schedule next
//! ```
//!
//! Time is whatever the caller passes in, so tests drive it with a
//! virtual clock.

use log::{debug, warn};

use crate::backoff::Backoff;
use crate::config::{DispenserConfig, ReconnectStrategy};

use super::ports::ConnectivityPort;

/// How long to wait between reconnection attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryPolicy {
    /// Same delay every time.
    FixedInterval(u32),
    /// Jittered exponential backoff, reset once the link comes up.
    Backoff(Backoff),
}

impl RetryPolicy {
    pub fn from_config(config: &DispenserConfig) -> Self {
        match config.reconnect_strategy {
            ReconnectStrategy::FixedInterval => Self::FixedInterval(config.reconnect_interval_ms),
            ReconnectStrategy::Backoff => Self::Backoff(Backoff::from_config(config)),
        }
    }

    /// Delay before the next attempt.
    pub fn next_delay(&mut self) -> u32 {
        match self {
            Self::FixedInterval(ms) => *ms,
            Self::Backoff(b) => b.next_delay(),
        }
    }

    pub fn reset(&mut self) {
        if let Self::Backoff(b) = self {
            b.reset();
        }
    }

    /// Reseed the jitter source.  No effect on a fixed interval.
    pub fn set_seed(&mut self, seed: u32) {
        if let Self::Backoff(b) = self {
            b.set_seed(seed);
        }
    }
}

/// Link transitions and retries reported by [`ReconnectSupervisor::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Connected { rssi: Option<i8> },
    ConnectionLost { retry_in_ms: u32 },
    RetryAttempted { attempt: u32, next_retry_in_ms: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Up,
    Down { next_attempt_ms: u64 },
}

pub struct ReconnectSupervisor<C> {
    link: C,
    policy: RetryPolicy,
    state: LinkState,
    attempts: u32,
}

impl<C: ConnectivityPort> ReconnectSupervisor<C> {
    /// Starts out down with the first attempt due immediately.
    pub fn new(link: C, policy: RetryPolicy) -> Self {
        Self {
            link,
            policy,
            state: LinkState::Down { next_attempt_ms: 0 },
            attempts: 0,
        }
    }

    /// Advance the supervisor to `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<ConnectivityEvent> {
        let connected = self.link.is_connected();
        match self.state {
            LinkState::Up if connected => None,
            LinkState::Up => {
                let retry_in_ms = self.policy.next_delay();
                self.state = LinkState::Down {
                    next_attempt_ms: now_ms + u64::from(retry_in_ms),
                };
                self.attempts = 0;
                debug!("Link: lost, retrying in {}ms", retry_in_ms);
                Some(ConnectivityEvent::ConnectionLost { retry_in_ms })
            }
            LinkState::Down { .. } if connected => {
                debug!("Link: up after {} attempt(s)", self.attempts);
                self.policy.reset();
                self.state = LinkState::Up;
                self.attempts = 0;
                let rssi = self.link.rssi();
                Some(ConnectivityEvent::Connected { rssi })
            }
            LinkState::Down { next_attempt_ms } if now_ms >= next_attempt_ms => {
                self.attempts = self.attempts.saturating_add(1);
                if let Err(e) = self.link.begin_connect() {
                    warn!("Link: attempt {} failed to start: {}", self.attempts, e);
                }
                let next_retry_in_ms = self.policy.next_delay();
                self.state = LinkState::Down {
                    next_attempt_ms: now_ms + u64::from(next_retry_in_ms),
                };
                Some(ConnectivityEvent::RetryAttempted {
                    attempt: self.attempts,
                    next_retry_in_ms,
                })
            }
            LinkState::Down { .. } => None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.state == LinkState::Up
    }

    /// Attempts made since the link was last up.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn link(&self) -> &C {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut C {
        &mut self.link
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommsError;

    #[derive(Default)]
    struct Link {
        up: bool,
        begun: u32,
    }

    impl ConnectivityPort for Link {
        fn begin_connect(&mut self) -> Result<(), CommsError> {
            self.begun += 1;
            Ok(())
        }
        fn is_connected(&self) -> bool {
            self.up
        }
        fn rssi(&self) -> Option<i8> {
            self.up.then_some(-60)
        }
    }

    #[test]
    fn first_poll_attempts_immediately() {
        let mut sup = ReconnectSupervisor::new(Link::default(), RetryPolicy::FixedInterval(10_000));
        assert_eq!(
            sup.poll(0),
            Some(ConnectivityEvent::RetryAttempted { attempt: 1, next_retry_in_ms: 10_000 })
        );
        assert_eq!(sup.link().begun, 1);
    }

    #[test]
    fn fixed_interval_waits_full_period() {
        let mut sup = ReconnectSupervisor::new(Link::default(), RetryPolicy::FixedInterval(10_000));
        let _ = sup.poll(0);
        assert_eq!(sup.poll(9_999), None);
        assert_eq!(
            sup.poll(10_000),
            Some(ConnectivityEvent::RetryAttempted { attempt: 2, next_retry_in_ms: 10_000 })
        );
    }

    #[test]
    fn connect_resets_backoff() {
        let policy = RetryPolicy::Backoff(Backoff::new(100, 800, 2.0, 0.0));
        let mut sup = ReconnectSupervisor::new(Link::default(), policy);
        let _ = sup.poll(0);
        let _ = sup.poll(100);
        let RetryPolicy::Backoff(b) = sup.policy() else { unreachable!() };
        assert_eq!(b.peek(), 400);

        sup.link_mut().up = true;
        assert_eq!(sup.poll(150), Some(ConnectivityEvent::Connected { rssi: Some(-60) }));
        assert!(sup.is_up());
        let RetryPolicy::Backoff(b) = sup.policy() else { unreachable!() };
        assert_eq!(b.peek(), 100);
    }

    #[test]
    fn fixed_policy_ignores_seed_and_reset() {
        let mut p = RetryPolicy::FixedInterval(250);
        p.set_seed(7);
        p.reset();
        assert_eq!(p.next_delay(), 250);
    }
}
