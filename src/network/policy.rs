//! Reconnect decision logic for abnormal closes.

use crate::constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL_MS};

/// What to do after an abnormal close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Schedule exactly one `connect()` after `delay_ms`; `attempt` is the
    /// new value of the consecutive-attempt counter.
    Retry { attempt: u32, delay_ms: u32 },
    /// Attempts are exhausted; stay `Closed` and emit the terminal event.
    GiveUp,
}

/// Fixed-interval retry policy bounded by an attempt count.
///
/// The interval is deliberately flat rather than exponential; determinism of
/// "exactly `max_attempts` tries, then the terminal event" is what consumers
/// and tests rely on.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    interval_ms: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            interval_ms: RECONNECT_INTERVAL_MS,
        }
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, interval_ms: u32) -> Self {
        Self {
            max_attempts,
            interval_ms,
        }
    }

    /// Decide the next step given the attempts already consumed in this
    /// channel lifetime (the counter includes the connect that just failed).
    pub fn next_action(&self, attempts_so_far: u32) -> RetryAction {
        let attempt = attempts_so_far + 1;
        if attempt < self.max_attempts {
            RetryAction::Retry {
                attempt,
                delay_ms: self.interval_ms,
            }
        } else {
            RetryAction::GiveUp
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_until_attempts_reach_the_limit() {
        let policy = ReconnectPolicy::new(5, 5_000);

        assert_eq!(
            policy.next_action(0),
            RetryAction::Retry { attempt: 1, delay_ms: 5_000 }
        );
        assert_eq!(
            policy.next_action(3),
            RetryAction::Retry { attempt: 4, delay_ms: 5_000 }
        );
    }

    #[test]
    fn gives_up_once_the_limit_is_reached() {
        let policy = ReconnectPolicy::new(5, 5_000);
        assert_eq!(policy.next_action(4), RetryAction::GiveUp);
        assert_eq!(policy.next_action(17), RetryAction::GiveUp);
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let policy = ReconnectPolicy::new(1, 100);
        assert_eq!(policy.next_action(0), RetryAction::GiveUp);
    }
}
