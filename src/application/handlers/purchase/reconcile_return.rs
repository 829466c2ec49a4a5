//! ReconcileReturnHandler - reconciles a purchase on the buyer's
//! synchronous return from hosted checkout.

use std::sync::Arc;

use crate::domain::purchase::{GatewayOutcome, Purchase, PurchaseError};
use crate::ports::{PaymentGateway, PurchaseRepository, UpdateResult};

use super::MAX_UPDATE_RETRIES;

/// Command carrying the session id from the success redirect.
#[derive(Debug, Clone)]
pub struct ReconcileReturnCommand {
    pub session_id: String,
}

/// Handler for the synchronous return path.
///
/// Fetches the authoritative session state from the gateway and moves the
/// purchase toward `Completed` when the gateway reports paid; an unpaid
/// session leaves the purchase pending. Idempotent: replaying the same
/// return duplicates the log snapshot (acceptable) but never regresses a
/// completed purchase.
pub struct ReconcileReturnHandler {
    purchases: Arc<dyn PurchaseRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ReconcileReturnHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { purchases, gateway }
    }

    pub async fn handle(&self, cmd: ReconcileReturnCommand) -> Result<Purchase, PurchaseError> {
        // A stale or unknown session is a recoverable condition the caller
        // surfaces with a message, never a fault.
        if self
            .purchases
            .find_by_session_id(&cmd.session_id)
            .await?
            .is_none()
        {
            tracing::warn!(session_id = %cmd.session_id, "return for unknown session");
            return Err(PurchaseError::PurchaseNotFound);
        }

        let session = self
            .gateway
            .retrieve_session(&cmd.session_id)
            .await
            .map_err(|e| PurchaseError::GatewaySession(e.message))?;

        let outcome = if session.payment_status.is_paid() {
            GatewayOutcome::Paid {
                payment_intent: session.payment_intent.clone(),
            }
        } else {
            GatewayOutcome::StillPending
        };

        // Per-purchase read-modify-write; a racing webhook costs us one
        // retry, after which the re-read observes its result.
        for _ in 0..MAX_UPDATE_RETRIES {
            let mut purchase = self
                .purchases
                .find_by_session_id(&cmd.session_id)
                .await?
                .ok_or(PurchaseError::PurchaseNotFound)?;
            let loaded_version = purchase.version;

            purchase.apply_gateway_outcome(outcome.clone());
            purchase.record_gateway_snapshot(session.raw.clone());

            match self.purchases.update(&purchase, loaded_version).await? {
                UpdateResult::Updated => {
                    purchase.version = loaded_version + 1;
                    tracing::info!(
                        purchase_id = %purchase.id,
                        status = ?purchase.status,
                        "purchase reconciled from return"
                    );
                    return Ok(purchase);
                }
                UpdateResult::VersionConflict => continue,
            }
        }

        Err(PurchaseError::Conflict)
    }
}
