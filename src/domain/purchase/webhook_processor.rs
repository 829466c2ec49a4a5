//! Webhook processor - orchestrates idempotent webhook event handling.
//!
//! Coordination layer between verified Stripe events and the purchase
//! reconciliation handlers, ensuring each event is processed exactly once
//! under at-least-once delivery.
//!
//! ## Race Condition Handling
//!
//! When multiple deliveries of the same event arrive simultaneously:
//! - First to save wins (database PRIMARY KEY constraint on event id)
//! - Others get `AlreadyExists` and return `AlreadyProcessed`

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

use super::stripe_event::{StripeEvent, StripeEventType};
use super::webhook_errors::WebhookError;

/// Handler for a specific type of Stripe webhook event.
///
/// Implementations should be stateless and focus on a single event type.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Returns the event type(s) this handler processes.
    fn handles(&self) -> Vec<StripeEventType>;

    /// Handles the webhook event.
    ///
    /// Returns `Ok(())` on success.
    /// Returns `Err(WebhookError::Ignored(_))` if the event should be
    /// acknowledged but not processed. Other `Err` variants are actual
    /// failures.
    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError>;
}

/// Dispatches webhook events to the appropriate handler.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Find a handler for the given event type.
    fn get_handler(&self, event_type: &StripeEventType) -> Option<&dyn WebhookEventHandler>;

    /// Dispatch an event to its handler.
    ///
    /// Returns `Err(WebhookError::Ignored)` if no handler is registered.
    async fn dispatch(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let event_type = event.parsed_type();
        match self.get_handler(&event_type) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "No handler for event type: {:?}",
                event_type
            ))),
        }
    }
}

/// Processes webhook events with idempotency guarantees.
pub struct IdempotentWebhookProcessor<R: WebhookEventRepository, D: WebhookDispatcher> {
    repository: R,
    dispatcher: D,
}

impl<R: WebhookEventRepository, D: WebhookDispatcher> IdempotentWebhookProcessor<R, D> {
    /// Creates a new processor with the given repository and dispatcher.
    pub fn new(repository: R, dispatcher: D) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Process a webhook event exactly once.
    ///
    /// 1. Check if the event was already processed
    /// 2. Process the event if not
    /// 3. Record the outcome (first writer wins)
    ///
    /// Failed attempts are NOT recorded: the transport answers 5xx, the
    /// provider redelivers (at-least-once), and the retry runs the handler
    /// again instead of being swallowed by the ledger.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - Event was processed
    /// - `Ok(WebhookResult::AlreadyProcessed)` - Idempotent skip
    /// - `Err(_)` - Processing failed; safe to redeliver
    pub async fn process(&self, event: StripeEvent) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let result = self.dispatcher.dispatch(&event).await;

        let payload = serde_json::to_value(&event)
            .map_err(|e| WebhookError::ParseError(format!("Failed to serialize event: {}", e)))?;
        let record = match result {
            Ok(()) => WebhookEventRecord::success(&event.id, &event.event_type, payload),
            // Ignored and unknown-purchase events are acknowledged and
            // recorded; they count as processed for idempotency.
            Err(WebhookError::Ignored(reason)) => {
                WebhookEventRecord::ignored(&event.id, &event.event_type, reason, payload)
            }
            Err(WebhookError::PurchaseNotFound) => WebhookEventRecord::ignored(
                &event.id,
                &event.event_type,
                "purchase not found",
                payload,
            ),
            Err(e) => return Err(e),
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => Ok(WebhookResult::Processed),
            SaveResult::AlreadyExists => Ok(WebhookResult::AlreadyProcessed),
        }
    }
}

/// Converts DomainError to WebhookError for repository operations.
impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
