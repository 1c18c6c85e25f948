//! Read/write boundary to the recipient store.
//!
//! The engine consumes recipients, activity logs, and aggregate sums through
//! the [`RecipientStore`] trait and only ever writes back token updates.
//! Production deployments implement the trait against their database; the
//! in-memory implementation here serves development and tests.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tidypush_core::types::{ActivitySummary, CleanLogEntry, Platform, Recipient};
use tidypush_core::NotifyResult;
use uuid::Uuid;

/// Behavioral criteria a recipient query can filter on. Fields compose with
/// AND semantics; `None` means "don't care".
#[derive(Debug, Clone, Default)]
pub struct RecipientFilter {
    pub premium: Option<bool>,
    /// Half-open window on the last-activity timestamp: `[from, to)`.
    pub last_active_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// At least one clean-log entry at or after this instant.
    pub active_since: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Recipients matching `filter`, in the store's return order.
    async fn find_recipients(&self, filter: &RecipientFilter) -> NotifyResult<Vec<Recipient>>;

    async fn get_recipient(&self, id: Uuid) -> NotifyResult<Option<Recipient>>;

    /// Sum of space freed and files removed over the recipient's clean-log
    /// entries at or after `since`.
    async fn sum_activity(
        &self,
        recipient_id: Uuid,
        since: DateTime<Utc>,
    ) -> NotifyResult<ActivitySummary>;

    /// The recipient's most recent clean-log entry, if any.
    async fn last_activity(&self, recipient_id: Uuid) -> NotifyResult<Option<CleanLogEntry>>;

    /// Update the stored push token. `None` clears it. Setting a token also
    /// refreshes `token_updated_at`; `platform` is updated when provided.
    async fn update_push_token(
        &self,
        recipient_id: Uuid,
        token: Option<String>,
        platform: Option<Platform>,
        enabled: bool,
    ) -> NotifyResult<()>;
}

pub use memory::InMemoryStore;
