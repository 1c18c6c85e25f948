//! Token lifecycle operations exposed to the registration subsystem.

use crate::token;
use std::sync::Arc;
use tidypush_core::types::Platform;
use tidypush_core::{NotifyError, NotifyResult};
use tidypush_store::RecipientStore;
use tracing::info;
use uuid::Uuid;

/// Idempotent register/deregister of push tokens against the store.
pub struct TokenRegistry {
    store: Arc<dyn RecipientStore>,
}

impl TokenRegistry {
    pub fn new(store: Arc<dyn RecipientStore>) -> Self {
        Self { store }
    }

    /// Store `token` for the recipient and enable push. Registering the same
    /// token again is a no-op beyond refreshing `token_updated_at`.
    pub async fn register(
        &self,
        recipient_id: Uuid,
        token: &str,
        platform: Platform,
    ) -> NotifyResult<()> {
        if !token::is_valid_push_token(token) {
            return Err(NotifyError::InvalidToken(token.to_string()));
        }
        self.store
            .update_push_token(recipient_id, Some(token.to_string()), Some(platform), true)
            .await?;
        info!(recipient_id = %recipient_id, "push token registered");
        Ok(())
    }

    /// Clear the recipient's token and disable push. Deregistering an absent
    /// token (or an unknown recipient) is a no-op, not an error.
    pub async fn deregister(&self, recipient_id: Uuid) -> NotifyResult<()> {
        match self
            .store
            .update_push_token(recipient_id, None, None, false)
            .await
        {
            Ok(()) => {
                info!(recipient_id = %recipient_id, "push token deregistered");
                Ok(())
            }
            Err(NotifyError::RecipientNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
