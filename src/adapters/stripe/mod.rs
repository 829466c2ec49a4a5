//! Stripe adapter - the hosted-checkout payment gateway.
//!
//! `StripeGateway` implements the `PaymentGateway` port against the Stripe
//! API; `MockPaymentGateway` is an in-memory stand-in for tests and local
//! development without network access.

mod gateway;
mod mock_gateway;
mod webhook_types;

pub use gateway::{StripeGateway, StripeGatewayConfig};
pub use mock_gateway::{MockPaymentGateway, MOCK_WEBHOOK_SECRET};
pub use webhook_types::StripeCheckoutSessionObject;
