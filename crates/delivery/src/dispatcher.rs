//! Chunked batch dispatch with partial-failure isolation.

use crate::token;
use crate::transport::PushTransport;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tidypush_core::config::PushConfig;
use tidypush_core::types::{DeliveryTicket, NotificationMessage};
use tracing::{error, warn};

/// Result of one dispatch call. `tickets` holds one entry per successfully
/// submitted message, in submission order; the other two fields account for
/// every message that did not make it that far, so a caller can retry or
/// report the gap instead of silently undercounting.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub tickets: Vec<DeliveryTicket>,
    /// Tokens that failed syntactic validation and never reached the transport.
    pub invalid_tokens: Vec<String>,
    /// Tokens belonging to chunks whose transport call failed.
    pub failed_tokens: Vec<String>,
}

impl DispatchReport {
    pub fn submitted(&self) -> usize {
        self.tickets.len()
    }

    pub fn tickets_ok(&self) -> usize {
        self.tickets.iter().filter(|t| t.is_ok()).count()
    }

    pub fn tickets_error(&self) -> usize {
        self.tickets.len() - self.tickets_ok()
    }
}

/// Partitions composed messages into transport-sized chunks and drives them
/// through the transport with bounded concurrency.
pub struct BatchDispatcher {
    transport: Arc<dyn PushTransport>,
    max_batch_size: usize,
    chunk_concurrency: usize,
}

impl BatchDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>, config: &PushConfig) -> Self {
        Self {
            transport,
            max_batch_size: config.max_batch_size.max(1),
            chunk_concurrency: config.chunk_concurrency.max(1),
        }
    }

    /// Dispatch `messages`, dropping syntactically invalid tokens up front
    /// and isolating chunk-level transport failures: a failed chunk is
    /// logged, contributes zero tickets, and does not abort the remaining
    /// chunks.
    pub async fn dispatch(&self, messages: Vec<NotificationMessage>) -> DispatchReport {
        let mut invalid_tokens = Vec::new();
        let mut valid = Vec::with_capacity(messages.len());
        for message in messages {
            if token::is_valid_push_token(&message.to) {
                valid.push(message);
            } else {
                invalid_tokens.push(message.to);
            }
        }
        if !invalid_tokens.is_empty() {
            warn!(count = invalid_tokens.len(), "dropped messages with invalid push tokens");
            metrics::counter!("push.invalid_tokens").increment(invalid_tokens.len() as u64);
        }

        let chunks: Vec<Vec<NotificationMessage>> = valid
            .chunks(self.max_batch_size)
            .map(<[NotificationMessage]>::to_vec)
            .collect();

        let mut results: Vec<(usize, Result<Vec<DeliveryTicket>, Vec<String>>)> =
            stream::iter(chunks.into_iter().enumerate())
                .map(|(index, chunk)| {
                    let transport = Arc::clone(&self.transport);
                    async move {
                        match transport.send_batch(&chunk).await {
                            Ok(tickets) => (index, Ok(tickets)),
                            Err(e) => {
                                error!(
                                    chunk = index,
                                    size = chunk.len(),
                                    error = %e,
                                    "chunk send failed; continuing with remaining chunks"
                                );
                                metrics::counter!("push.chunks_failed").increment(1);
                                (index, Err(chunk.into_iter().map(|m| m.to).collect()))
                            }
                        }
                    }
                })
                .buffer_unordered(self.chunk_concurrency)
                .collect()
                .await;

        // Chunks may complete out of order; tickets are concatenated in
        // chunk-index order so the sequence lines up with the submitted list.
        results.sort_by_key(|(index, _)| *index);

        let mut report = DispatchReport {
            invalid_tokens,
            ..Default::default()
        };
        for (_, result) in results {
            match result {
                Ok(tickets) => report.tickets.extend(tickets),
                Err(tokens) => report.failed_tokens.extend(tokens),
            }
        }

        metrics::counter!("push.tickets_ok").increment(report.tickets_ok() as u64);
        metrics::counter!("push.tickets_error").increment(report.tickets_error() as u64);
        report
    }
}
