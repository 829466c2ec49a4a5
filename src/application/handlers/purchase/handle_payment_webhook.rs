//! HandlePaymentWebhookHandler - processes signed provider webhook events.
//!
//! The asynchronous reconciliation path. Events arrive any number of times,
//! in any order relative to the buyer's synchronous return; signature
//! verification gates every mutation, the event ledger deduplicates
//! deliveries, and the purchase's monotonic transitions absorb replays.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::purchase::{
    GatewayOutcome, IdempotentWebhookProcessor, StripeEvent, StripeEventType, WebhookDispatcher,
    WebhookError, WebhookEventHandler,
};
use crate::ports::{
    PaymentGateway, PurchaseRepository, UpdateResult, WebhookEventRepository, WebhookResult,
};

use super::MAX_UPDATE_RETRIES;

/// Checkout session object carried by `checkout.session.completed`.
#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    payment_intent: Option<String>,
}

/// Payment intent object carried by `payment_intent.payment_failed`.
#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    last_payment_error: Option<LastPaymentError>,
}

#[derive(Debug, Deserialize)]
struct LastPaymentError {
    message: Option<String>,
}

/// Handles `checkout.session.completed`: the purchase (looked up by session
/// id) moves to completed and the transaction id is recorded.
pub struct CheckoutCompletedHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl CheckoutCompletedHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::CheckoutSessionCompleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let object: CheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        for _ in 0..MAX_UPDATE_RETRIES {
            let Some(mut purchase) = self.purchases.find_by_session_id(&object.id).await? else {
                tracing::warn!(
                    session_id = %object.id,
                    event_id = %event.id,
                    "checkout completed for unknown session"
                );
                return Err(WebhookError::PurchaseNotFound);
            };
            let loaded_version = purchase.version;

            purchase.apply_gateway_outcome(GatewayOutcome::Paid {
                payment_intent: object.payment_intent.clone(),
            });

            match self.purchases.update(&purchase, loaded_version).await? {
                UpdateResult::Updated => {
                    tracing::info!(
                        purchase_id = %purchase.id,
                        status = ?purchase.status,
                        "purchase reconciled from checkout webhook"
                    );
                    return Ok(());
                }
                UpdateResult::VersionConflict => continue,
            }
        }

        Err(WebhookError::Conflict)
    }
}

/// Handles `payment_intent.payment_failed`: the purchase (looked up by
/// transaction id) moves to failed with the provider's reason, defaulting
/// to "Unknown".
pub struct PaymentFailedHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl PaymentFailedHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentFailedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::PaymentIntentFailed]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let object: PaymentIntentObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let reason = object
            .last_payment_error
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown".to_string());

        for _ in 0..MAX_UPDATE_RETRIES {
            let Some(mut purchase) = self
                .purchases
                .find_by_payment_intent_id(&object.id)
                .await?
            else {
                tracing::warn!(
                    payment_intent = %object.id,
                    event_id = %event.id,
                    "payment failure for unknown transaction"
                );
                return Err(WebhookError::PurchaseNotFound);
            };
            let loaded_version = purchase.version;

            purchase.apply_gateway_outcome(GatewayOutcome::Failed {
                reason: reason.clone(),
            });

            match self.purchases.update(&purchase, loaded_version).await? {
                UpdateResult::Updated => {
                    tracing::info!(
                        purchase_id = %purchase.id,
                        status = ?purchase.status,
                        "purchase reconciled from failure webhook"
                    );
                    return Ok(());
                }
                UpdateResult::VersionConflict => continue,
            }
        }

        Err(WebhookError::Conflict)
    }
}

/// Routes purchase webhook events to their handlers.
pub struct PurchaseWebhookDispatcher {
    checkout_completed: CheckoutCompletedHandler,
    payment_failed: PaymentFailedHandler,
}

impl PurchaseWebhookDispatcher {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self {
            checkout_completed: CheckoutCompletedHandler::new(purchases.clone()),
            payment_failed: PaymentFailedHandler::new(purchases),
        }
    }
}

#[async_trait]
impl WebhookDispatcher for PurchaseWebhookDispatcher {
    fn get_handler(&self, event_type: &StripeEventType) -> Option<&dyn WebhookEventHandler> {
        match event_type {
            StripeEventType::CheckoutSessionCompleted => Some(&self.checkout_completed),
            StripeEventType::PaymentIntentFailed => Some(&self.payment_failed),
            StripeEventType::Unknown => None,
        }
    }
}

/// Entry point for the webhook transport: verify, then process idempotently.
pub struct HandlePaymentWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    processor: IdempotentWebhookProcessor<Arc<dyn WebhookEventRepository>, PurchaseWebhookDispatcher>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        purchases: Arc<dyn PurchaseRepository>,
    ) -> Self {
        Self {
            gateway,
            processor: IdempotentWebhookProcessor::new(
                webhook_events,
                PurchaseWebhookDispatcher::new(purchases),
            ),
        }
    }

    /// Verifies the event signature and processes it exactly once.
    ///
    /// Signature or payload failures mutate nothing and surface as client
    /// errors at the transport layer.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookResult, WebhookError> {
        let event = self.gateway.verify_webhook(payload, signature_header)?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            "webhook received"
        );

        self.processor.process(event).await
    }
}
