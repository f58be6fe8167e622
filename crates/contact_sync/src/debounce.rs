//! Notification debounce policy.

/// Fingerprint and time of the last delivered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationRecord {
    /// Content hash of the delivered contact set.
    pub content_hash: u64,
    /// Delivery time in unix milliseconds.
    pub notified_at_ms: u64,
}

/// Outcome of [`DebouncePolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyDecision {
    /// Nothing has been delivered yet this session.
    FirstFetch,
    /// The user asked for this refresh.
    UserRequested,
    /// The content hash differs from the last delivered one.
    ContentChanged,
    /// Content looks unchanged but the re-notify interval has passed.
    RenotifyIntervalElapsed,
    /// Redundant; do not notify.
    Suppress,
}

impl NotifyDecision {
    /// Returns whether the delegate should be notified.
    pub const fn should_notify(self) -> bool {
        !matches!(self, Self::Suppress)
    }

    /// Stable token for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstFetch => "first-fetch",
            Self::UserRequested => "user-requested",
            Self::ContentChanged => "content-changed",
            Self::RenotifyIntervalElapsed => "renotify-interval-elapsed",
            Self::Suppress => "suppress",
        }
    }
}

/// Suppresses redundant notifications unless content changed, the interval elapsed, or the user
/// explicitly asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    /// Interval after which an unchanged set is delivered again.
    pub renotify_interval_ms: u64,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self {
            renotify_interval_ms: crate::config::DEFAULT_RENOTIFY_INTERVAL_MS,
        }
    }
}

impl DebouncePolicy {
    /// Decides whether a freshly fetched set with `content_hash` should be delivered.
    ///
    /// The interval must be strictly exceeded. A clock that moved backwards counts as no time
    /// elapsed.
    pub fn decide(
        &self,
        last: Option<NotificationRecord>,
        content_hash: u64,
        user_requested: bool,
        now_ms: u64,
    ) -> NotifyDecision {
        let Some(last) = last else {
            return NotifyDecision::FirstFetch;
        };
        if user_requested {
            return NotifyDecision::UserRequested;
        }
        if last.content_hash != content_hash {
            return NotifyDecision::ContentChanged;
        }
        if now_ms.saturating_sub(last.notified_at_ms) > self.renotify_interval_ms {
            return NotifyDecision::RenotifyIntervalElapsed;
        }
        NotifyDecision::Suppress
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn record(content_hash: u64, notified_at_ms: u64) -> Option<NotificationRecord> {
        Some(NotificationRecord {
            content_hash,
            notified_at_ms,
        })
    }

    #[test]
    fn first_fetch_always_notifies() {
        let policy = DebouncePolicy::default();
        assert_eq!(policy.decide(None, 7, false, 0), NotifyDecision::FirstFetch);
    }

    #[test]
    fn unchanged_content_within_interval_is_suppressed() {
        let policy = DebouncePolicy::default();
        let decision = policy.decide(record(7, 0), 7, false, 11 * HOUR_MS);
        assert_eq!(decision, NotifyDecision::Suppress);
        assert!(!decision.should_notify());
    }

    #[test]
    fn user_request_bypasses_suppression() {
        let policy = DebouncePolicy::default();
        assert_eq!(
            policy.decide(record(7, 0), 7, true, 1),
            NotifyDecision::UserRequested
        );
    }

    #[test]
    fn changed_content_notifies() {
        let policy = DebouncePolicy::default();
        assert_eq!(
            policy.decide(record(7, 0), 8, false, 1),
            NotifyDecision::ContentChanged
        );
    }

    #[test]
    fn interval_must_be_strictly_exceeded() {
        let policy = DebouncePolicy::default();
        assert_eq!(
            policy.decide(record(7, 0), 7, false, 12 * HOUR_MS),
            NotifyDecision::Suppress
        );
        assert_eq!(
            policy.decide(record(7, 0), 7, false, 12 * HOUR_MS + 1),
            NotifyDecision::RenotifyIntervalElapsed
        );
    }

    #[test]
    fn clock_moving_backwards_counts_as_no_elapsed_time() {
        let policy = DebouncePolicy {
            renotify_interval_ms: 10,
        };
        assert_eq!(
            policy.decide(record(7, 1_000), 7, false, 5),
            NotifyDecision::Suppress
        );
    }
}
