//! InitiatePurchaseHandler - command handler for starting a checkout.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::foundation::{PackageId, UserId};
use crate::domain::purchase::{Purchase, PurchaseError};
use crate::ports::{
    CreateCheckoutRequest, PackageRepository, PaymentGateway, PurchaseRepository, UpdateResult,
};

/// Redirect URLs handed to the gateway at session creation. The session id
/// placeholder is substituted by the provider.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Command to initiate a package purchase.
#[derive(Debug, Clone)]
pub struct InitiatePurchaseCommand {
    pub user_id: UserId,
    pub email: String,
    pub package_id: PackageId,
    /// Date the price is resolved for; defaults to today.
    pub purchase_date: Option<NaiveDate>,
    /// Free-form buyer note, captured in the event log.
    pub note: Option<String>,
}

/// Result of successful checkout initiation.
#[derive(Debug, Clone)]
pub struct InitiatePurchaseResult {
    pub purchase: Purchase,
    pub checkout_url: String,
}

/// Handler for initiating a purchase.
///
/// Creates a pending purchase with the resolved price snapshot, then asks
/// the gateway for a checkout session. A gateway failure marks the purchase
/// failed before the error surfaces - a purchase is never left silently
/// pending after a gateway error.
pub struct InitiatePurchaseHandler {
    packages: Arc<dyn PackageRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    gateway: Arc<dyn PaymentGateway>,
    urls: CheckoutUrls,
    currency: String,
}

impl InitiatePurchaseHandler {
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        gateway: Arc<dyn PaymentGateway>,
        urls: CheckoutUrls,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            packages,
            purchases,
            gateway,
            urls,
            currency: currency.into(),
        }
    }

    pub async fn handle(
        &self,
        cmd: InitiatePurchaseCommand,
    ) -> Result<InitiatePurchaseResult, PurchaseError> {
        // 1. Load the package and confirm it is sellable. No purchase row
        //    exists until pricing succeeds.
        let package = self
            .packages
            .find_by_id(&cmd.package_id)
            .await?
            .ok_or(PurchaseError::PackageNotFound)?;

        if !package.is_purchasable() {
            return Err(PurchaseError::PricingUnavailable);
        }

        // 2. Resolve the price for the requested date (default today).
        let purchase_date = cmd
            .purchase_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let quote = package
            .resolve_price(purchase_date)
            .ok_or(PurchaseError::PricingUnavailable)?;

        // 3. Create the pending purchase with the amount snapshot.
        let mut purchase = Purchase::initiate(cmd.user_id, package.id, quote.price);
        purchase.record_initiation_details(
            purchase_date,
            quote.category.as_str(),
            cmd.note.clone(),
        );
        self.purchases.create(&purchase).await?;
        let created_version = purchase.version;

        // 4. Request a checkout session, with the purchase id as the
        //    correlation token.
        let session_result = self
            .gateway
            .create_checkout_session(CreateCheckoutRequest {
                purchase_id: purchase.id,
                package_id: package.id,
                package_name: package.name.clone(),
                package_description: package.description.clone(),
                buyer_id: cmd.user_id,
                buyer_email: cmd.email,
                amount: purchase.amount,
                currency: self.currency.clone(),
                price_category: quote.category.as_str().to_string(),
                success_url: self.urls.success_url.clone(),
                cancel_url: self.urls.cancel_url.clone(),
            })
            .await;

        let session = match session_result {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(
                    purchase_id = %purchase.id,
                    error = %err,
                    "checkout session creation failed, marking purchase failed"
                );
                purchase.mark_initiation_failed(err.to_string());
                if let Err(update_err) = self.purchases.update(&purchase, created_version).await {
                    tracing::error!(
                        purchase_id = %purchase.id,
                        error = %update_err,
                        "failed to record initiation failure"
                    );
                }
                return Err(PurchaseError::GatewaySession(err.message));
            }
        };

        // 5. Record the session id before handing the buyer the redirect.
        purchase.record_checkout_session(&session.id);
        match self.purchases.update(&purchase, created_version).await? {
            UpdateResult::Updated => {}
            UpdateResult::VersionConflict => return Err(PurchaseError::Conflict),
        }
        purchase.version = created_version + 1;

        tracing::info!(
            purchase_id = %purchase.id,
            session_id = %session.id,
            amount_minor = purchase.amount.as_minor(),
            "purchase initiated"
        );

        Ok(InitiatePurchaseResult {
            purchase,
            checkout_url: session.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::purchase::testing::*;
    use crate::domain::purchase::{PaymentEvent, PurchaseStatus};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn urls() -> CheckoutUrls {
        CheckoutUrls {
            success_url: "https://app.test/purchase/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://app.test/purchase/cancel?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
        }
    }

    fn command(package_id: crate::domain::foundation::PackageId) -> InitiatePurchaseCommand {
        InitiatePurchaseCommand {
            user_id: crate::domain::foundation::UserId::new(),
            email: "buyer@example.com".to_string(),
            package_id,
            purchase_date: NaiveDate::from_ymd_opt(2025, 12, 19), // a Friday
            note: Some("anniversary trip".to_string()),
        }
    }

    fn handler(
        packages: Arc<InMemoryPackageRepository>,
        purchases: Arc<InMemoryPurchaseRepository>,
        gateway: Arc<MockGateway>,
    ) -> InitiatePurchaseHandler {
        InitiatePurchaseHandler::new(packages, purchases, gateway, urls(), "usd")
    }

    #[tokio::test]
    async fn initiation_snapshots_weekend_price_and_records_session() {
        let package = standard_package();
        let package_id = package.id;
        let packages = Arc::new(InMemoryPackageRepository::with_package(package));
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let gateway = Arc::new(MockGateway::new());
        let handler = handler(packages, purchases.clone(), gateway.clone());

        let result = handler.handle(command(package_id)).await.unwrap();

        // Friday resolves to the weekend rule.
        assert_eq!(result.purchase.amount, money(15000));
        assert_eq!(result.purchase.status, PurchaseStatus::Pending);
        assert_eq!(
            result.purchase.checkout_session_id.as_deref(),
            Some("cs_test_1")
        );
        assert!(result.checkout_url.contains("cs_test_1"));

        // The stored row carries the session id and bumped version.
        let stored = purchases.get(&result.purchase.id).unwrap();
        assert_eq!(stored.checkout_session_id.as_deref(), Some("cs_test_1"));
        assert_eq!(stored.version, 1);

        // The gateway got the purchase id as correlation token and the
        // snapshot amount.
        let requests = gateway.created_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].purchase_id, result.purchase.id);
        assert_eq!(requests[0].amount, money(15000));
        assert_eq!(requests[0].price_category, "weekend");
    }

    #[tokio::test]
    async fn initiation_captures_note_and_date_in_event_log() {
        let package = standard_package();
        let package_id = package.id;
        let handler = handler(
            Arc::new(InMemoryPackageRepository::with_package(package)),
            Arc::new(InMemoryPurchaseRepository::new()),
            Arc::new(MockGateway::new()),
        );

        let result = handler.handle(command(package_id)).await.unwrap();

        assert!(result.purchase.events.iter().any(|e| matches!(
            e,
            PaymentEvent::InitiationDetails { note: Some(n), price_category, .. }
                if n == "anniversary trip" && price_category == "weekend"
        )));
    }

    #[tokio::test]
    async fn unknown_package_fails_without_creating_purchase() {
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let handler = handler(
            Arc::new(InMemoryPackageRepository::new()),
            purchases.clone(),
            Arc::new(MockGateway::new()),
        );

        let result = handler
            .handle(command(crate::domain::foundation::PackageId::new()))
            .await;

        assert!(matches!(result, Err(PurchaseError::PackageNotFound)));
        assert_eq!(purchases.len(), 0);
    }

    #[tokio::test]
    async fn inactive_package_fails_with_pricing_unavailable_and_no_purchase() {
        let mut package = standard_package();
        package.active = false;
        let package_id = package.id;
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let handler = handler(
            Arc::new(InMemoryPackageRepository::with_package(package)),
            purchases.clone(),
            Arc::new(MockGateway::new()),
        );

        let result = handler.handle(command(package_id)).await;

        assert!(matches!(result, Err(PurchaseError::PricingUnavailable)));
        assert_eq!(purchases.len(), 0);
    }

    #[tokio::test]
    async fn missing_price_rule_fails_with_pricing_unavailable() {
        // Package with no weekend rule cannot price a Friday.
        let mut package = standard_package();
        package.price_rules.retain(|r| {
            !matches!(
                r.kind,
                crate::domain::catalog::PriceRuleKind::Weekend { .. }
            )
        });
        let package_id = package.id;
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let handler = handler(
            Arc::new(InMemoryPackageRepository::with_package(package)),
            purchases.clone(),
            Arc::new(MockGateway::new()),
        );

        let result = handler.handle(command(package_id)).await;

        assert!(matches!(result, Err(PurchaseError::PricingUnavailable)));
        assert_eq!(purchases.len(), 0);
    }

    #[tokio::test]
    async fn gateway_failure_marks_purchase_failed_with_reason() {
        let package = standard_package();
        let package_id = package.id;
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let handler = handler(
            Arc::new(InMemoryPackageRepository::with_package(package)),
            purchases.clone(),
            Arc::new(MockGateway::failing()),
        );

        let result = handler.handle(command(package_id)).await;

        assert!(matches!(result, Err(PurchaseError::GatewaySession(_))));

        // The purchase exists, is failed, and carries the error in its log.
        assert_eq!(purchases.len(), 1);
        let stored = purchases
            .get(&purchases.any_id().unwrap())
            .unwrap();
        assert_eq!(stored.status, PurchaseStatus::Failed);
        assert!(stored.events.iter().any(|e| matches!(
            e,
            PaymentEvent::FailureReason { reason, .. } if reason.contains("gateway outage")
        )));
    }

    #[tokio::test]
    async fn date_range_override_prices_the_requested_date() {
        let mut package = standard_package();
        package.price_rules.push(
            crate::domain::catalog::PriceRule::date_range(
                package.id,
                money(50000),
                NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 26).unwrap(),
            )
            .unwrap(),
        );
        let package_id = package.id;
        let handler = handler(
            Arc::new(InMemoryPackageRepository::with_package(package)),
            Arc::new(InMemoryPurchaseRepository::new()),
            Arc::new(MockGateway::new()),
        );

        let mut cmd = command(package_id);
        cmd.purchase_date = NaiveDate::from_ymd_opt(2025, 12, 25);
        let result = handler.handle(cmd).await.unwrap();

        assert_eq!(result.purchase.amount, money(50000));
    }
}
