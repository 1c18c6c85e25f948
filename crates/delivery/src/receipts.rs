//! Asynchronous receipt reconciliation.

use crate::transport::PushTransport;
use std::collections::HashMap;
use std::sync::Arc;
use tidypush_core::config::PushConfig;
use tidypush_core::types::Receipt;
use tracing::warn;

/// Converts stored delivery ids into terminal receipt statuses.
pub struct ReceiptReconciler {
    transport: Arc<dyn PushTransport>,
    batch_size: usize,
}

impl ReceiptReconciler {
    pub fn new(transport: Arc<dyn PushTransport>, config: &PushConfig) -> Self {
        Self {
            transport,
            batch_size: config.receipt_batch_size.max(1),
        }
    }

    /// Look up receipts for `ids`, batching to the transport's lookup limit.
    ///
    /// Every requested id appears in the result: ids the transport has no
    /// answer for, and all ids of a lookup chunk that failed, resolve to
    /// [`Receipt::Unknown`] so the caller can retry them later.
    pub async fn reconcile(&self, ids: &[String]) -> HashMap<String, Receipt> {
        let mut out = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(self.batch_size) {
            match self.transport.get_receipts(chunk).await {
                Ok(mut receipts) => {
                    for id in chunk {
                        out.insert(
                            id.clone(),
                            receipts.remove(id).unwrap_or(Receipt::Unknown),
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        size = chunk.len(),
                        error = %e,
                        "receipt lookup chunk failed; statuses left unknown"
                    );
                    for id in chunk {
                        out.insert(id.clone(), Receipt::Unknown);
                    }
                }
            }
        }
        out
    }
}
