//! CancelPurchaseHandler - handles the buyer's explicit checkout
//! cancellation.

use std::sync::Arc;

use crate::domain::purchase::PurchaseError;
use crate::ports::{PurchaseRepository, UpdateResult};

use super::MAX_UPDATE_RETRIES;

/// Command carrying the session id from the cancel redirect.
#[derive(Debug, Clone)]
pub struct CancelPurchaseCommand {
    pub session_id: String,
}

/// Handler for explicit user cancellation.
///
/// Marks a matching pending purchase failed with a cancellation marker;
/// silently a no-op when no purchase matches the session or the purchase
/// was already settled by the webhook.
pub struct CancelPurchaseHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl CancelPurchaseHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }

    pub async fn handle(&self, cmd: CancelPurchaseCommand) -> Result<(), PurchaseError> {
        for _ in 0..MAX_UPDATE_RETRIES {
            let Some(mut purchase) = self.purchases.find_by_session_id(&cmd.session_id).await?
            else {
                tracing::debug!(session_id = %cmd.session_id, "cancel for unknown session");
                return Ok(());
            };
            let loaded_version = purchase.version;

            if !purchase.cancel() {
                // Already settled; nothing to write.
                return Ok(());
            }

            match self.purchases.update(&purchase, loaded_version).await? {
                UpdateResult::Updated => {
                    tracing::info!(purchase_id = %purchase.id, "purchase cancelled by user");
                    return Ok(());
                }
                UpdateResult::VersionConflict => continue,
            }
        }

        Err(PurchaseError::Conflict)
    }
}
