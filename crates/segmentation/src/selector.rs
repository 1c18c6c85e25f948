//! Named segment queries. Each is a pure function of a reference time and
//! store contents, and returns recipients already reduced to [`PushTarget`]:
//! push enabled, token present. Callers must not re-filter.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tidypush_core::types::{ActivitySummary, PushTarget};
use tidypush_core::NotifyResult;
use tidypush_store::{RecipientFilter, RecipientStore};
use tracing::debug;

/// Dormancy window bounds, in days before the reference time. The interval
/// is half-open: oldest bound inclusive, newest bound exclusive.
const DORMANT_OLDEST_DAYS: i64 = 7;
const DORMANT_NEWEST_DAYS: i64 = 3;

/// Trailing window for the weekly digest segment.
const DIGEST_WINDOW_DAYS: i64 = 7;

pub struct SegmentSelector {
    store: Arc<dyn RecipientStore>,
}

impl SegmentSelector {
    pub fn new(store: Arc<dyn RecipientStore>) -> Self {
        Self { store }
    }

    /// Everyone reachable by push, independent of entitlement. Used for
    /// general reminders.
    pub async fn idle_targets(&self, _now: DateTime<Utc>) -> NotifyResult<Vec<PushTarget>> {
        let recipients = self
            .store
            .find_recipients(&RecipientFilter::default())
            .await?;
        let targets: Vec<PushTarget> = recipients.iter().filter_map(|r| r.push_target()).collect();
        debug!(candidates = recipients.len(), targets = targets.len(), "idle segment selected");
        Ok(targets)
    }

    /// Free-tier recipients whose last activity falls in `[now - 7d, now - 3d)`.
    /// Used for re-engagement offers.
    pub async fn dormant_targets(&self, now: DateTime<Utc>) -> NotifyResult<Vec<PushTarget>> {
        let filter = RecipientFilter {
            premium: Some(false),
            last_active_between: Some((
                now - Duration::days(DORMANT_OLDEST_DAYS),
                now - Duration::days(DORMANT_NEWEST_DAYS),
            )),
            ..Default::default()
        };
        let recipients = self.store.find_recipients(&filter).await?;
        let targets: Vec<PushTarget> = recipients.iter().filter_map(|r| r.push_target()).collect();
        debug!(candidates = recipients.len(), targets = targets.len(), "dormant segment selected");
        Ok(targets)
    }

    /// Free-tier recipients with at least one clean-log entry in the trailing
    /// seven days, paired with their activity aggregate over that window.
    /// Used for weekly digests.
    pub async fn active_with_history(
        &self,
        now: DateTime<Utc>,
    ) -> NotifyResult<Vec<(PushTarget, ActivitySummary)>> {
        let since = now - Duration::days(DIGEST_WINDOW_DAYS);
        let filter = RecipientFilter {
            premium: Some(false),
            active_since: Some(since),
            ..Default::default()
        };
        let recipients = self.store.find_recipients(&filter).await?;

        let mut out = Vec::new();
        for recipient in &recipients {
            let Some(target) = recipient.push_target() else {
                continue;
            };
            let summary = self.store.sum_activity(recipient.id, since).await?;
            out.push((target, summary));
        }
        debug!(candidates = recipients.len(), targets = out.len(), "weekly digest segment selected");
        Ok(out)
    }
}
