//! Bounded retry wrapper for notification sinks.

use std::time::Duration;

use crate::payload::OrderNotification;
use crate::sink::NotificationSink;

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Base backoff; attempt N sleeps `backoff * N` before retrying.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Wraps any sink with a bounded retry loop.
///
/// Retrying stays inside the delivery attempt of a single order: the overall
/// semantics remain best-effort and at-most-once per order from the
/// workflow's perspective, since the endpoint sees at most `max_attempts`
/// identical payloads and the workflow never re-enqueues.
#[derive(Debug)]
pub struct RetryingSink<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSink<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<S> NotificationSink for RetryingSink<S>
where
    S: NotificationSink,
{
    type Error = S::Error;

    fn deliver(&self, notification: &OrderNotification) -> Result<(), Self::Error> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..attempts {
            match self.inner.deliver(notification) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        error = ?e,
                        "notification delivery attempt failed"
                    );
                    std::thread::sleep(self.policy.backoff * attempt);
                }
            }
        }

        // Final attempt; its error is the caller's error.
        self.inner.deliver(notification)
    }
}
