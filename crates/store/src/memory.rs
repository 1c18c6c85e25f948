//! In-memory recipient store backed by DashMap.
//!
//! Production: implement [`RecipientStore`] against PostgreSQL or similar.
//! This provides the same API surface for development and testing.

use crate::{RecipientFilter, RecipientStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tidypush_core::types::{
    ActivitySummary, CleanLogEntry, DeviceSettings, Platform, Recipient,
};
use tidypush_core::{NotifyError, NotifyResult};
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for recipients and their clean logs.
#[derive(Default)]
pub struct InMemoryStore {
    recipients: DashMap<Uuid, Recipient>,
    clean_logs: DashMap<Uuid, Vec<CleanLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a handful of recipients, mirroring the
    /// seed data used by the app's development database.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        let now = Utc::now();

        // Free user, token registered, recently active.
        let active = store.insert_demo(
            "John Doe",
            false,
            now - Duration::hours(6),
            Some("ExponentPushToken[demo-john]"),
            Platform::Ios,
            true,
        );
        store.record_clean(CleanLogEntry {
            recipient_id: active,
            timestamp: now - Duration::days(1),
            space_freed_mb: 250.0,
            files_removed: 42,
        });

        // Premium user.
        store.insert_demo(
            "Jane Smith",
            true,
            now - Duration::hours(2),
            Some("ExponentPushToken[demo-jane]"),
            Platform::Android,
            true,
        );

        // Free user, notifications declined.
        store.insert_demo(
            "Bob Johnson",
            false,
            now - Duration::days(2),
            None,
            Platform::Ios,
            false,
        );

        // Free user, dormant for five days.
        store.insert_demo(
            "Dana Lee",
            false,
            now - Duration::days(5),
            Some("ExponentPushToken[demo-dana]"),
            Platform::Android,
            true,
        );

        info!("In-memory store seeded with demo recipients");
        store
    }

    fn insert_demo(
        &self,
        name: &str,
        is_premium: bool,
        last_active_at: DateTime<Utc>,
        token: Option<&str>,
        platform: Platform,
        push_enabled: bool,
    ) -> Uuid {
        let recipient = Recipient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_premium,
            last_active_at,
            device: DeviceSettings {
                push_token: token.map(String::from),
                platform,
                push_enabled,
                token_updated_at: token.map(|_| last_active_at),
            },
        };
        let id = recipient.id;
        self.recipients.insert(id, recipient);
        id
    }

    pub fn insert_recipient(&self, recipient: Recipient) {
        self.recipients.insert(recipient.id, recipient);
    }

    pub fn record_clean(&self, entry: CleanLogEntry) {
        self.clean_logs
            .entry(entry.recipient_id)
            .or_default()
            .push(entry);
    }

    fn matches(&self, recipient: &Recipient, filter: &RecipientFilter) -> bool {
        if let Some(premium) = filter.premium {
            if recipient.is_premium != premium {
                return false;
            }
        }
        if let Some((from, to)) = filter.last_active_between {
            if recipient.last_active_at < from || recipient.last_active_at >= to {
                return false;
            }
        }
        if let Some(since) = filter.active_since {
            let has_activity = self
                .clean_logs
                .get(&recipient.id)
                .map(|logs| logs.iter().any(|l| l.timestamp >= since))
                .unwrap_or(false);
            if !has_activity {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl RecipientStore for InMemoryStore {
    async fn find_recipients(&self, filter: &RecipientFilter) -> NotifyResult<Vec<Recipient>> {
        let mut matched: Vec<Recipient> = self
            .recipients
            .iter()
            .filter(|r| self.matches(r.value(), filter))
            .map(|r| r.value().clone())
            .collect();
        // DashMap iteration order is arbitrary; sort for a stable return order.
        matched.sort_by_key(|r| r.id);
        Ok(matched)
    }

    async fn get_recipient(&self, id: Uuid) -> NotifyResult<Option<Recipient>> {
        Ok(self.recipients.get(&id).map(|r| r.value().clone()))
    }

    async fn sum_activity(
        &self,
        recipient_id: Uuid,
        since: DateTime<Utc>,
    ) -> NotifyResult<ActivitySummary> {
        let summary = self
            .clean_logs
            .get(&recipient_id)
            .map(|logs| {
                logs.iter()
                    .filter(|l| l.timestamp >= since)
                    .fold(ActivitySummary::default(), |mut acc, l| {
                        acc.space_freed_mb += l.space_freed_mb;
                        acc.files_removed += l.files_removed;
                        acc
                    })
            })
            .unwrap_or_default();
        Ok(summary)
    }

    async fn last_activity(&self, recipient_id: Uuid) -> NotifyResult<Option<CleanLogEntry>> {
        Ok(self.clean_logs.get(&recipient_id).and_then(|logs| {
            logs.iter()
                .max_by_key(|l| l.timestamp)
                .cloned()
        }))
    }

    async fn update_push_token(
        &self,
        recipient_id: Uuid,
        token: Option<String>,
        platform: Option<Platform>,
        enabled: bool,
    ) -> NotifyResult<()> {
        let mut entry = self
            .recipients
            .get_mut(&recipient_id)
            .ok_or(NotifyError::RecipientNotFound(recipient_id))?;
        let device = &mut entry.value_mut().device;
        device.token_updated_at = token.as_ref().map(|_| Utc::now());
        device.push_token = token;
        if let Some(platform) = platform {
            device.platform = platform;
        }
        device.push_enabled = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(is_premium: bool, last_active_at: DateTime<Utc>) -> Recipient {
        Recipient {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            is_premium,
            last_active_at,
            device: DeviceSettings {
                push_token: Some("ExponentPushToken[test]".to_string()),
                platform: Platform::Ios,
                push_enabled: true,
                token_updated_at: None,
            },
        }
    }

    #[tokio::test]
    async fn filter_by_premium_and_window() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let free_dormant = recipient(false, now - Duration::days(5));
        let free_fresh = recipient(false, now - Duration::hours(1));
        let premium_dormant = recipient(true, now - Duration::days(5));
        let dormant_id = free_dormant.id;
        store.insert_recipient(free_dormant);
        store.insert_recipient(free_fresh);
        store.insert_recipient(premium_dormant);

        let filter = RecipientFilter {
            premium: Some(false),
            last_active_between: Some((now - Duration::days(7), now - Duration::days(3))),
            ..Default::default()
        };
        let found = store.find_recipients(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, dormant_id);
    }

    #[tokio::test]
    async fn sum_activity_respects_window() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let r = recipient(false, now);
        let id = r.id;
        store.insert_recipient(r);
        for (days_ago, mb, files) in [(1, 100.0, 10), (2, 50.5, 5), (20, 999.0, 99)] {
            store.record_clean(CleanLogEntry {
                recipient_id: id,
                timestamp: now - Duration::days(days_ago),
                space_freed_mb: mb,
                files_removed: files,
            });
        }

        let summary = store.sum_activity(id, now - Duration::days(7)).await.unwrap();
        assert_eq!(summary.space_freed_mb, 150.5);
        assert_eq!(summary.files_removed, 15);
    }

    #[tokio::test]
    async fn update_push_token_clears_and_sets() {
        let store = InMemoryStore::new();
        let r = recipient(false, Utc::now());
        let id = r.id;
        store.insert_recipient(r);

        store.update_push_token(id, None, None, false).await.unwrap();
        let cleared = store.get_recipient(id).await.unwrap().unwrap();
        assert!(cleared.device.push_token.is_none());
        assert!(!cleared.device.push_enabled);
        assert!(cleared.device.token_updated_at.is_none());

        store
            .update_push_token(
                id,
                Some("ExponentPushToken[new]".to_string()),
                Some(Platform::Android),
                true,
            )
            .await
            .unwrap();
        let set = store.get_recipient(id).await.unwrap().unwrap();
        assert_eq!(set.device.push_token.as_deref(), Some("ExponentPushToken[new]"));
        assert_eq!(set.device.platform, Platform::Android);
        assert!(set.device.token_updated_at.is_some());
    }

    #[tokio::test]
    async fn unknown_recipient_update_is_an_error() {
        let store = InMemoryStore::new();
        let err = store
            .update_push_token(Uuid::new_v4(), None, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::RecipientNotFound(_)));
    }
}
