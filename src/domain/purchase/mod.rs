//! Purchase domain - the payment lifecycle of a package purchase.

mod errors;
mod events;
mod purchase;
mod status;
mod stripe_event;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use errors::PurchaseError;
pub use events::PaymentEvent;
pub use purchase::{GatewayOutcome, Purchase};
pub use status::PurchaseStatus;
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler};
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
