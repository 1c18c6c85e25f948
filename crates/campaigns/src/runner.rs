//! Campaign orchestration: segment → compose → dispatch, plus receipt
//! application. One runner instance is shared by all trigger endpoints;
//! everything per-invocation is local to the call.

use crate::templates::{self, CampaignTemplate, MessageCopy};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tidypush_core::config::PushConfig;
use tidypush_core::types::{
    CampaignOutcome, NotificationMessage, MessagePriority, Receipt, ReceiptSummary, TicketRef,
};
use tidypush_core::{NotifyError, NotifyResult};
use tidypush_delivery::{BatchDispatcher, DispatchReport, PushTransport, ReceiptReconciler, TokenRegistry};
use tidypush_segmentation::SegmentSelector;
use tidypush_store::RecipientStore;
use tracing::info;
use uuid::Uuid;

pub struct CampaignRunner {
    store: Arc<dyn RecipientStore>,
    selector: SegmentSelector,
    dispatcher: BatchDispatcher,
    reconciler: ReceiptReconciler,
    registry: TokenRegistry,
}

impl CampaignRunner {
    pub fn new(
        store: Arc<dyn RecipientStore>,
        transport: Arc<dyn PushTransport>,
        config: &PushConfig,
    ) -> Self {
        Self {
            selector: SegmentSelector::new(store.clone()),
            dispatcher: BatchDispatcher::new(transport.clone(), config),
            reconciler: ReceiptReconciler::new(transport, config),
            registry: TokenRegistry::new(store.clone()),
            store,
        }
    }

    /// General cleaning reminder to every reachable recipient. The body
    /// references the recipient's most recent clean when one exists.
    pub async fn run_daily_reminders(&self, now: DateTime<Utc>) -> NotifyResult<CampaignOutcome> {
        let targets = self.selector.idle_targets(now).await?;

        let mut messages = Vec::with_capacity(targets.len());
        for target in &targets {
            let last_clean_mb = self
                .store
                .last_activity(target.recipient_id)
                .await?
                .map(|entry| entry.space_freed_mb);
            messages.push(templates::compose(
                target,
                &CampaignTemplate::DailyReminder { last_clean_mb },
            ));
        }

        self.dispatch("daily_reminders", messages).await
    }

    /// Weekly digest to free-tier recipients with activity in the trailing
    /// week, reporting their aggregate stats.
    pub async fn run_weekly_stats(&self, now: DateTime<Utc>) -> NotifyResult<CampaignOutcome> {
        let selected = self.selector.active_with_history(now).await?;

        let messages = selected
            .iter()
            .map(|(target, summary)| {
                templates::compose(target, &CampaignTemplate::WeeklyStats { summary: *summary })
            })
            .collect();

        self.dispatch("weekly_stats", messages).await
    }

    /// Re-engagement offers to dormant free-tier recipients. The offer
    /// variant rotates by segment position so a rerun over the same ordering
    /// reproduces the same assignment.
    pub async fn run_re_engagement(&self, now: DateTime<Utc>) -> NotifyResult<CampaignOutcome> {
        let targets = self.selector.dormant_targets(now).await?;

        let messages = targets
            .iter()
            .enumerate()
            .map(|(index, target)| {
                templates::compose(target, &CampaignTemplate::ReEngagement { variant: index })
            })
            .collect();

        self.dispatch("re_engagement", messages).await
    }

    /// Premium upsell to every reachable free-tier recipient, with optional
    /// operator-supplied copy.
    pub async fn run_premium_reminder(
        &self,
        custom: Option<MessageCopy>,
    ) -> NotifyResult<CampaignOutcome> {
        let targets = self.selector.idle_targets(Utc::now()).await?;

        let messages = targets
            .iter()
            .filter(|t| !t.is_premium)
            .map(|target| {
                templates::compose(
                    target,
                    &CampaignTemplate::PremiumReminder {
                        custom: custom.clone(),
                    },
                )
            })
            .collect();

        self.dispatch("premium_reminder", messages).await
    }

    /// Operator-triggered send to a single recipient.
    pub async fn send_direct(
        &self,
        recipient_id: Uuid,
        title: String,
        body: String,
        data: HashMap<String, serde_json::Value>,
    ) -> NotifyResult<CampaignOutcome> {
        let recipient = self
            .store
            .get_recipient(recipient_id)
            .await?
            .ok_or(NotifyError::RecipientNotFound(recipient_id))?;
        let target = recipient
            .push_target()
            .ok_or_else(|| NotifyError::NotEligible("no push token registered".to_string()))?;

        let message = NotificationMessage {
            to: target.token,
            title,
            body,
            data,
            sound: Some("default".to_string()),
            badge: None,
            channel_id: None,
            priority: Some(MessagePriority::High),
        };
        self.dispatch("direct", vec![message]).await
    }

    /// Battery upsell to one free-tier recipient. Premium recipients are not
    /// eligible for this notification.
    pub async fn send_battery_alert(
        &self,
        recipient_id: Uuid,
        battery_level: u8,
    ) -> NotifyResult<CampaignOutcome> {
        let recipient = self
            .store
            .get_recipient(recipient_id)
            .await?
            .ok_or(NotifyError::RecipientNotFound(recipient_id))?;
        if recipient.is_premium {
            return Err(NotifyError::NotEligible(
                "premium recipients do not receive battery alerts".to_string(),
            ));
        }
        let target = recipient
            .push_target()
            .ok_or_else(|| NotifyError::NotEligible("push notifications not enabled".to_string()))?;

        let message = templates::compose(&target, &CampaignTemplate::BatteryAlert { battery_level });
        self.dispatch("battery_alert", vec![message]).await
    }

    /// Look up receipts for stored tickets and apply them: terminal statuses
    /// are counted, and a device-invalid receipt purges the recipient's
    /// token so future segment queries exclude them. `unknown` receipts are
    /// left for a later retry.
    pub async fn reconcile_receipts(&self, refs: &[TicketRef]) -> NotifyResult<ReceiptSummary> {
        let ids: Vec<String> = refs.iter().map(|r| r.id.clone()).collect();
        let receipts = self.reconciler.reconcile(&ids).await;

        let mut summary = ReceiptSummary::default();
        for ticket_ref in refs {
            match receipts.get(&ticket_ref.id) {
                Some(Receipt::Ok) => summary.ok += 1,
                Some(receipt @ Receipt::Error { .. }) => {
                    summary.error += 1;
                    if receipt.is_device_invalid() {
                        self.registry.deregister(ticket_ref.recipient_id).await?;
                        summary.purged.push(ticket_ref.recipient_id);
                    }
                }
                Some(Receipt::Unknown) | None => summary.unknown += 1,
            }
        }

        info!(
            ok = summary.ok,
            error = summary.error,
            unknown = summary.unknown,
            purged = summary.purged.len(),
            "receipts reconciled"
        );
        Ok(summary)
    }

    async fn dispatch(
        &self,
        campaign: &'static str,
        messages: Vec<NotificationMessage>,
    ) -> NotifyResult<CampaignOutcome> {
        let attempted = messages.len();
        let report = self.dispatcher.dispatch(messages).await;
        let outcome = outcome_of(attempted, report);

        info!(
            campaign,
            attempted = outcome.attempted,
            submitted = outcome.submitted,
            tickets_ok = outcome.tickets_ok,
            tickets_error = outcome.tickets_error,
            dropped_invalid = outcome.dropped_invalid,
            failed = outcome.failed_tokens.len(),
            "campaign dispatched"
        );
        metrics::counter!("campaigns.runs", "campaign" => campaign).increment(1);
        Ok(outcome)
    }
}

fn outcome_of(attempted: usize, report: DispatchReport) -> CampaignOutcome {
    CampaignOutcome {
        attempted,
        submitted: report.submitted(),
        tickets_ok: report.tickets_ok(),
        tickets_error: report.tickets_error(),
        dropped_invalid: report.invalid_tokens.len(),
        failed_tokens: report.failed_tokens,
    }
}
