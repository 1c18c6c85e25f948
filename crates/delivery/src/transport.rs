//! The push transport boundary.
//!
//! [`PushTransport`] is the seam between the engine and the provider's
//! gateway. [`MemoryTransport`] captures traffic in memory for tests and
//! development, with scriptable failures per call.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tidypush_core::types::{DeliveryTicket, ErrorDetails, NotificationMessage, Receipt, TransportErrorCode};
use tidypush_core::{NotifyError, NotifyResult};

#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Submit one size-bounded batch. Returns one ticket per message, in
    /// submission order.
    async fn send_batch(&self, messages: &[NotificationMessage])
        -> NotifyResult<Vec<DeliveryTicket>>;

    /// Look up terminal delivery status for previously returned delivery ids.
    /// Ids the transport has no answer for yet are absent from the result.
    async fn get_receipts(&self, ids: &[String]) -> NotifyResult<HashMap<String, Receipt>>;
}

/// In-memory transport that records batches and returns deterministic
/// tickets (`ticket-0`, `ticket-1`, ...).
#[derive(Default)]
pub struct MemoryTransport {
    batches: Mutex<Vec<Vec<NotificationMessage>>>,
    error_tokens: Mutex<HashMap<String, TransportErrorCode>>,
    failing_send_calls: Mutex<HashSet<usize>>,
    failing_receipt_calls: Mutex<HashSet<usize>>,
    receipts: Mutex<HashMap<String, Receipt>>,
    send_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
    ticket_seq: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the nth `send_batch` call (0-based) fail at the transport level.
    pub fn fail_send_call(&self, call: usize) {
        self.failing_send_calls.lock().expect("transport mutex poisoned").insert(call);
    }

    /// Make the nth `get_receipts` call (0-based) fail.
    pub fn fail_receipt_call(&self, call: usize) {
        self.failing_receipt_calls.lock().expect("transport mutex poisoned").insert(call);
    }

    /// Messages to this token get an error ticket instead of an id.
    pub fn reject_token(&self, token: &str, code: TransportErrorCode) {
        self.error_tokens
            .lock()
            .expect("transport mutex poisoned")
            .insert(token.to_string(), code);
    }

    /// Script the receipt returned for a delivery id.
    pub fn set_receipt(&self, id: &str, receipt: Receipt) {
        self.receipts
            .lock()
            .expect("transport mutex poisoned")
            .insert(id.to_string(), receipt);
    }

    /// All batches submitted so far, in submission order.
    pub fn batches(&self) -> Vec<Vec<NotificationMessage>> {
        self.batches.lock().expect("transport mutex poisoned").clone()
    }
}

#[async_trait]
impl PushTransport for MemoryTransport {
    async fn send_batch(
        &self,
        messages: &[NotificationMessage],
    ) -> NotifyResult<Vec<DeliveryTicket>> {
        let call = self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_send_calls.lock().expect("transport mutex poisoned").contains(&call) {
            return Err(NotifyError::Transport(format!(
                "simulated network failure on call {call}"
            )));
        }

        self.batches
            .lock()
            .expect("transport mutex poisoned")
            .push(messages.to_vec());

        let error_tokens = self.error_tokens.lock().expect("transport mutex poisoned");
        let tickets = messages
            .iter()
            .map(|message| match error_tokens.get(&message.to) {
                Some(&code) => DeliveryTicket::Error {
                    message: format!("\"{}\" was rejected by the gateway", message.to),
                    details: Some(ErrorDetails { error: Some(code) }),
                },
                None => {
                    let seq = self.ticket_seq.fetch_add(1, Ordering::SeqCst);
                    DeliveryTicket::Ok {
                        id: format!("ticket-{seq}"),
                    }
                }
            })
            .collect();
        Ok(tickets)
    }

    async fn get_receipts(&self, ids: &[String]) -> NotifyResult<HashMap<String, Receipt>> {
        let call = self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_receipt_calls.lock().expect("transport mutex poisoned").contains(&call) {
            return Err(NotifyError::Transport(format!(
                "simulated receipt lookup failure on call {call}"
            )));
        }

        let receipts = self.receipts.lock().expect("transport mutex poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| receipts.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }
}
