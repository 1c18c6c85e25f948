//! Request and response types for the trigger API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tidypush_campaigns::MessageCopy;
use tidypush_core::types::{CampaignOutcome, Platform, ReceiptSummary, TicketRef};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Response to a campaign trigger. The outcome always reports attempted vs.
/// delivered counts; a failed chunk shows up in `failed_tokens` rather than
/// being silently absorbed into a success.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: CampaignOutcome,
    pub timestamp: DateTime<Utc>,
}

impl TriggerResponse {
    /// `success` is only true when every submitted chunk went through; a
    /// campaign with failed chunks still returns 200, but flags the gap.
    pub fn new(outcome: CampaignOutcome) -> Self {
        Self {
            success: outcome.failed_tokens.is_empty(),
            outcome,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct BatteryAlertRequest {
    pub recipient_id: Uuid,
    pub battery_level: u8,
}

#[derive(Debug, Deserialize, Default)]
pub struct PremiumReminderRequest {
    #[serde(default)]
    pub custom_message: Option<MessageCopy>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptsRequest {
    pub tickets: Vec<TicketRef>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: ReceiptSummary,
}

#[derive(Debug, Deserialize)]
pub struct RegisterTokenRequest {
    pub recipient_id: Uuid,
    pub push_token: String,
    pub platform: Platform,
}

#[derive(Debug, Deserialize)]
pub struct DeregisterTokenRequest {
    pub recipient_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}
