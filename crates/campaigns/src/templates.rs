//! Campaign templates and message composition.
//!
//! `compose` is pure and deterministic: the same target, template, and
//! variant index always produce the same message, so re-runs over the same
//! segment ordering are reproducible.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tidypush_core::types::{
    ActivitySummary, MessagePriority, NotificationMessage, PushTarget,
};

/// Rotating re-engagement offers. The variant is chosen by the member's
/// position within the segment, passed in explicitly by the caller.
const RE_ENGAGEMENT_VARIANTS: [(&str, &str); 3] = [
    (
        "💎 Limited Time: 20% Off Premium!",
        "We miss you! Get 20% off Premium subscription for the next 48 hours.",
    ),
    (
        "🚀 New Features Unlocked for Premium",
        "Advanced battery optimization and duplicate finder now available!",
    ),
    (
        "🎁 Special Offer Just for You",
        "Come back and get your first month of Premium at 50% off!",
    ),
];

/// Operator-supplied title/body override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCopy {
    pub title: String,
    pub body: String,
}

/// One campaign's message recipe plus its per-recipient inputs.
#[derive(Debug, Clone)]
pub enum CampaignTemplate {
    DailyReminder { last_clean_mb: Option<f64> },
    WeeklyStats { summary: ActivitySummary },
    ReEngagement { variant: usize },
    BatteryAlert { battery_level: u8 },
    PremiumReminder { custom: Option<MessageCopy> },
}

/// Build the concrete notification for `target`.
pub fn compose(target: &PushTarget, template: &CampaignTemplate) -> NotificationMessage {
    let (title, body, data) = match template {
        CampaignTemplate::DailyReminder { last_clean_mb } => {
            let body = match last_clean_mb {
                Some(mb) => format!("You freed {mb}MB last time. Clean your device again!"),
                None => "Your device needs cleaning! Free up space now.".to_string(),
            };
            (
                "🧹 Time to Clean Your Device".to_string(),
                body,
                data_map(&[
                    ("screen", serde_json::json!("Cleaner")),
                    ("type", serde_json::json!("daily_reminder")),
                ]),
            )
        }
        CampaignTemplate::WeeklyStats { summary } => (
            "📊 Your Weekly Cleaning Stats".to_string(),
            format!(
                "Great job! You freed {:.1}MB and removed {} files this week. Go Premium for unlimited cleaning!",
                summary.space_freed_mb, summary.files_removed
            ),
            data_map(&[
                ("screen", serde_json::json!("Reports")),
                ("type", serde_json::json!("weekly_stats")),
                (
                    "stats",
                    serde_json::json!({
                        "spaceFreed": summary.space_freed_mb,
                        "filesRemoved": summary.files_removed,
                    }),
                ),
            ]),
        ),
        CampaignTemplate::ReEngagement { variant } => {
            let (title, body) = RE_ENGAGEMENT_VARIANTS[variant % RE_ENGAGEMENT_VARIANTS.len()];
            (
                title.to_string(),
                body.to_string(),
                data_map(&[
                    ("screen", serde_json::json!("Plans")),
                    ("type", serde_json::json!("re_engagement")),
                    ("discount", serde_json::json!(true)),
                ]),
            )
        }
        CampaignTemplate::BatteryAlert { battery_level } => (
            "🔋 Battery Optimization Available".to_string(),
            format!(
                "Your battery is at {battery_level}%. Premium users get advanced battery optimization!"
            ),
            data_map(&[
                ("screen", serde_json::json!("Plans")),
                ("reason", serde_json::json!("battery_alert")),
            ]),
        ),
        CampaignTemplate::PremiumReminder { custom } => {
            let title = custom
                .as_ref()
                .map(|c| c.title.clone())
                .unwrap_or_else(|| "🌟 Upgrade to Premium Today!".to_string());
            let body = custom.as_ref().map(|c| c.body.clone()).unwrap_or_else(|| {
                "Get unlimited cleaning, advanced features, and ad-free experience!".to_string()
            });
            (
                title,
                body,
                data_map(&[
                    ("screen", serde_json::json!("Plans")),
                    ("recipientId", serde_json::json!(target.recipient_id)),
                ]),
            )
        }
    };

    NotificationMessage {
        to: target.token.clone(),
        title,
        body,
        data,
        sound: Some("default".to_string()),
        badge: None,
        channel_id: None,
        priority: Some(MessagePriority::High),
    }
}

fn data_map(entries: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tidypush_core::types::Platform;
    use uuid::Uuid;

    fn target() -> PushTarget {
        PushTarget {
            recipient_id: Uuid::new_v4(),
            name: "Test".to_string(),
            token: "ExponentPushToken[abc]".to_string(),
            platform: Platform::Ios,
            is_premium: false,
            last_active_at: Utc::now(),
        }
    }

    #[test]
    fn weekly_stats_reports_rounded_sum() {
        let summary = ActivitySummary {
            space_freed_mb: 1250.5 + 890.2 + 159.3,
            files_removed: 150,
        };
        let msg = compose(&target(), &CampaignTemplate::WeeklyStats { summary });
        assert!(msg.body.contains("2300.0MB"), "body was: {}", msg.body);
        assert!(msg.body.contains("150 files"));
        assert_eq!(msg.data["stats"]["filesRemoved"], 150);
    }

    #[test]
    fn daily_reminder_varies_on_last_clean() {
        let with_history = compose(
            &target(),
            &CampaignTemplate::DailyReminder {
                last_clean_mb: Some(250.0),
            },
        );
        assert!(with_history.body.contains("You freed 250MB last time"));

        let without_history = compose(
            &target(),
            &CampaignTemplate::DailyReminder { last_clean_mb: None },
        );
        assert!(without_history.body.contains("needs cleaning"));
    }

    #[test]
    fn re_engagement_rotates_deterministically() {
        let t = target();
        let by_index: Vec<String> = (0..6)
            .map(|variant| compose(&t, &CampaignTemplate::ReEngagement { variant }).title)
            .collect();
        assert_eq!(by_index[0], by_index[3]);
        assert_eq!(by_index[1], by_index[4]);
        assert_eq!(by_index[2], by_index[5]);
        assert_ne!(by_index[0], by_index[1]);

        // Same index twice yields the same message.
        let again = compose(&t, &CampaignTemplate::ReEngagement { variant: 1 });
        assert_eq!(again.title, by_index[1]);
    }

    #[test]
    fn premium_reminder_accepts_custom_copy() {
        let custom = compose(
            &target(),
            &CampaignTemplate::PremiumReminder {
                custom: Some(MessageCopy {
                    title: "Custom title".to_string(),
                    body: "Custom body".to_string(),
                }),
            },
        );
        assert_eq!(custom.title, "Custom title");

        let default = compose(&target(), &CampaignTemplate::PremiumReminder { custom: None });
        assert!(default.title.contains("Upgrade to Premium"));
    }

    #[test]
    fn composed_messages_use_high_priority_default_sound() {
        let msg = compose(&target(), &CampaignTemplate::BatteryAlert { battery_level: 15 });
        assert_eq!(msg.priority, Some(MessagePriority::High));
        assert_eq!(msg.sound.as_deref(), Some("default"));
        assert!(msg.body.contains("15%"));
    }
}
