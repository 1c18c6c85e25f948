//! Sliding-window rate governor backed by DashMap.

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

/// Per-caller sliding-window admission control.
///
/// One timestamp window is kept per caller identifier, created lazily on the
/// first request and pruned of aged-out entries on every check. The governor
/// is process-scoped state constructed at startup and injected where needed;
/// a restart resets all counters, which is acceptable for abuse mitigation.
/// Checks for one identifier are serialized through the map's entry lock, so
/// concurrent callers observe a consistent count.
#[derive(Default)]
pub struct RateGovernor {
    windows: DashMap<String, Vec<i64>>,
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or reject a request from `identifier`.
    ///
    /// Drops timestamps older than `window_ms`, rejects without recording the
    /// attempt when `limit` requests remain in the window, and otherwise
    /// records now and admits.
    pub fn admit(&self, identifier: &str, limit: usize, window_ms: i64) -> bool {
        self.admit_at(identifier, limit, window_ms, Utc::now().timestamp_millis())
    }

    fn admit_at(&self, identifier: &str, limit: usize, window_ms: i64, now_ms: i64) -> bool {
        let mut window = self.windows.entry(identifier.to_string()).or_default();
        window.retain(|&ts| now_ms - ts < window_ms);

        if window.len() >= limit {
            debug!(identifier, limit, "request rejected by rate governor");
            return false;
        }

        window.push(now_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let governor = RateGovernor::new();
        let now = 1_700_000_000_000;

        for i in 0..10 {
            assert!(
                governor.admit_at("caller-1", 10, 60_000, now + i),
                "request {i} should be admitted"
            );
        }
        assert!(!governor.admit_at("caller-1", 10, 60_000, now + 10));
    }

    #[test]
    fn window_elapse_admits_again() {
        let governor = RateGovernor::new();
        let now = 1_700_000_000_000;

        for i in 0..10 {
            assert!(governor.admit_at("caller-1", 10, 60_000, now + i));
        }
        assert!(!governor.admit_at("caller-1", 10, 60_000, now + 30_000));

        // All recorded timestamps age out of the trailing window.
        assert!(governor.admit_at("caller-1", 10, 60_000, now + 60_010));
    }

    #[test]
    fn rejection_does_not_consume_a_slot() {
        let governor = RateGovernor::new();
        let now = 1_700_000_000_000;

        for _ in 0..3 {
            assert!(governor.admit_at("caller-1", 3, 60_000, now));
        }
        // Rejected attempts are not recorded, so the same three timestamps
        // still occupy the window.
        for _ in 0..5 {
            assert!(!governor.admit_at("caller-1", 3, 60_000, now + 1));
        }
        assert!(governor.admit_at("caller-1", 3, 60_000, now + 60_001));
    }

    #[test]
    fn identifiers_are_independent() {
        let governor = RateGovernor::new();
        let now = 1_700_000_000_000;

        assert!(governor.admit_at("caller-1", 1, 60_000, now));
        assert!(!governor.admit_at("caller-1", 1, 60_000, now));
        assert!(governor.admit_at("caller-2", 1, 60_000, now));
    }
}
