//! AdminSetStatusHandler - admin override of a purchase's status.

use std::sync::Arc;

use crate::domain::foundation::{PurchaseId, UserId};
use crate::domain::purchase::{Purchase, PurchaseError, PurchaseStatus};
use crate::ports::{PurchaseRepository, UpdateResult};

use super::MAX_UPDATE_RETRIES;

/// Command to overwrite a purchase's status.
///
/// The caller is an already-authorized admin; capability checking is the
/// calling layer's job.
#[derive(Debug, Clone)]
pub struct AdminSetStatusCommand {
    pub purchase_id: PurchaseId,
    pub new_status: PurchaseStatus,
    pub admin_id: UserId,
    pub note: Option<String>,
}

/// Handler for the admin status override.
///
/// Any transition is permitted, including resurrecting failed purchases;
/// every override appends an audit entry with the admin identity. Refunds
/// go through this path.
pub struct AdminSetStatusHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl AdminSetStatusHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }

    pub async fn handle(&self, cmd: AdminSetStatusCommand) -> Result<Purchase, PurchaseError> {
        for _ in 0..MAX_UPDATE_RETRIES {
            let mut purchase = self
                .purchases
                .find_by_id(&cmd.purchase_id)
                .await?
                .ok_or(PurchaseError::PurchaseNotFound)?;
            let loaded_version = purchase.version;

            purchase.admin_override(cmd.admin_id, cmd.new_status, cmd.note.clone());

            match self.purchases.update(&purchase, loaded_version).await? {
                UpdateResult::Updated => {
                    purchase.version = loaded_version + 1;
                    tracing::info!(
                        purchase_id = %purchase.id,
                        admin_id = %cmd.admin_id,
                        status = ?cmd.new_status,
                        "purchase status overridden by admin"
                    );
                    return Ok(purchase);
                }
                UpdateResult::VersionConflict => continue,
            }
        }

        Err(PurchaseError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::purchase::testing::*;
    use crate::domain::foundation::PackageId;
    use crate::domain::purchase::{GatewayOutcome, PaymentEvent};
    use std::sync::Arc;

    fn completed_purchase() -> Purchase {
        let mut purchase = Purchase::initiate(UserId::new(), PackageId::new(), money(12000));
        purchase.record_checkout_session("cs_1");
        purchase.apply_gateway_outcome(GatewayOutcome::Paid {
            payment_intent: Some("pi_1".to_string()),
        });
        purchase
    }

    #[tokio::test]
    async fn admin_refunds_completed_purchase_with_audit_entry() {
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let purchase = completed_purchase();
        let purchase_id = purchase.id;
        purchases.insert(purchase);
        let handler = AdminSetStatusHandler::new(purchases.clone());
        let admin = UserId::new();

        let updated = handler
            .handle(AdminSetStatusCommand {
                purchase_id,
                new_status: PurchaseStatus::Refunded,
                admin_id: admin,
                note: Some("duplicate charge".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(updated.status, PurchaseStatus::Refunded);
        assert!(updated.events.iter().any(|e| matches!(
            e,
            PaymentEvent::AdminOverride { admin_id, status: PurchaseStatus::Refunded, note: Some(n), .. }
                if *admin_id == admin && n == "duplicate charge"
        )));

        let stored = purchases.get(&purchase_id).unwrap();
        assert_eq!(stored.status, PurchaseStatus::Refunded);
    }

    #[tokio::test]
    async fn admin_may_resurrect_failed_purchase() {
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let mut purchase = Purchase::initiate(UserId::new(), PackageId::new(), money(12000));
        purchase.cancel();
        let purchase_id = purchase.id;
        purchases.insert(purchase);
        let handler = AdminSetStatusHandler::new(purchases.clone());

        let updated = handler
            .handle(AdminSetStatusCommand {
                purchase_id,
                new_status: PurchaseStatus::Pending,
                admin_id: UserId::new(),
                note: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.status, PurchaseStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_purchase_reports_not_found() {
        let handler = AdminSetStatusHandler::new(Arc::new(InMemoryPurchaseRepository::new()));

        let result = handler
            .handle(AdminSetStatusCommand {
                purchase_id: PurchaseId::new(),
                new_status: PurchaseStatus::Refunded,
                admin_id: UserId::new(),
                note: None,
            })
            .await;

        assert!(matches!(result, Err(PurchaseError::PurchaseNotFound)));
    }

    #[tokio::test]
    async fn amount_is_untouched_by_override() {
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let purchase = completed_purchase();
        let purchase_id = purchase.id;
        purchases.insert(purchase);
        let handler = AdminSetStatusHandler::new(purchases.clone());

        let updated = handler
            .handle(AdminSetStatusCommand {
                purchase_id,
                new_status: PurchaseStatus::Refunded,
                admin_id: UserId::new(),
                note: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.amount, money(12000));
    }
}
