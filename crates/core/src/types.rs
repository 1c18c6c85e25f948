use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ─── Recipients ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

/// Per-device notification settings stored on the recipient record.
/// Every recognized field is enumerated here; the store validates on write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    pub push_token: Option<String>,
    pub platform: Platform,
    pub push_enabled: bool,
    pub token_updated_at: Option<DateTime<Utc>>,
}

/// A recipient as read from the store. The engine never writes recipients
/// except through the token-lifecycle operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    pub name: String,
    pub is_premium: bool,
    pub last_active_at: DateTime<Utc>,
    pub device: DeviceSettings,
}

impl Recipient {
    /// Project this recipient into a deliverable target.
    ///
    /// Returns `None` unless push is enabled and a token is present. This is
    /// the only place that filter is applied; segment queries return
    /// `PushTarget`s so downstream code cannot see an undeliverable recipient.
    pub fn push_target(&self) -> Option<PushTarget> {
        if !self.device.push_enabled {
            return None;
        }
        self.device.push_token.as_ref().map(|token| PushTarget {
            recipient_id: self.id,
            name: self.name.clone(),
            token: token.clone(),
            platform: self.device.platform,
            is_premium: self.is_premium,
            last_active_at: self.last_active_at,
        })
    }
}

/// A recipient that is guaranteed deliverable: push enabled, token present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushTarget {
    pub recipient_id: Uuid,
    pub name: String,
    pub token: String,
    pub platform: Platform,
    pub is_premium: bool,
    pub last_active_at: DateTime<Utc>,
}

// ─── Activity log ──────────────────────────────────────────────────────────

/// One clean-run record from the app's activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanLogEntry {
    pub recipient_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub space_freed_mb: f64,
    pub files_removed: u64,
}

/// Aggregate over clean-log entries within a query window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivitySummary {
    pub space_freed_mb: f64,
    pub files_removed: u64,
}

// ─── Messages ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Default,
    Normal,
    High,
}

/// A composed push notification, immutable once built. Serializes to the
/// transport's wire format (camelCase keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<MessagePriority>,
}

// ─── Tickets and receipts ──────────────────────────────────────────────────

/// Error codes the transport reports alongside a failed ticket or receipt.
/// Codes this engine does not act on deserialize to `Unknown` rather than
/// failing the whole response parse.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TransportErrorCode {
    DeviceNotRegistered,
    MessageTooBig,
    MessageRateExceeded,
    InvalidCredentials,
    Unknown,
}

impl<'de> Deserialize<'de> for TransportErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Ok(match code.as_str() {
            "DeviceNotRegistered" => Self::DeviceNotRegistered,
            "MessageTooBig" => Self::MessageTooBig,
            "MessageRateExceeded" => Self::MessageRateExceeded,
            "InvalidCredentials" => Self::InvalidCredentials,
            _ => Self::Unknown,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TransportErrorCode>,
}

/// Synchronous per-message acknowledgment from a batch send. An `ok` ticket
/// means the transport accepted the message, not that it was delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryTicket {
    Ok { id: String },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<ErrorDetails>,
    },
}

impl DeliveryTicket {
    pub fn delivery_id(&self) -> Option<&str> {
        match self {
            DeliveryTicket::Ok { id } => Some(id),
            DeliveryTicket::Error { .. } => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, DeliveryTicket::Ok { .. })
    }
}

/// Terminal delivery status looked up later against a ticket's delivery id.
/// `Unknown` is produced locally when the transport has no answer yet (or a
/// lookup chunk failed); it never appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Receipt {
    Ok,
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<ErrorDetails>,
    },
    Unknown,
}

impl Receipt {
    /// Whether this receipt says the destination token is permanently
    /// unusable and must be purged.
    pub fn is_device_invalid(&self) -> bool {
        matches!(
            self,
            Receipt::Error {
                details: Some(ErrorDetails {
                    error: Some(TransportErrorCode::DeviceNotRegistered),
                }),
                ..
            }
        )
    }
}

/// A stored (delivery id, recipient) pair used for receipt reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRef {
    pub id: String,
    pub recipient_id: Uuid,
}

// ─── Campaign results ──────────────────────────────────────────────────────

/// Outcome of one campaign run, reported to the trigger caller. `attempted`
/// counts composed messages; the remaining fields account for every one of
/// them, so a failed chunk is visible rather than silently undercounted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignOutcome {
    pub attempted: usize,
    pub submitted: usize,
    pub tickets_ok: usize,
    pub tickets_error: usize,
    pub dropped_invalid: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_tokens: Vec<String>,
}

/// Result of applying receipts: terminal counts plus the recipients whose
/// tokens were purged because the device is gone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub ok: usize,
    pub error: usize,
    pub unknown: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purged: Vec<Uuid>,
}
