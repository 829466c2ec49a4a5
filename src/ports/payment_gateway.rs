//! Payment gateway port for the external hosted-checkout provider.
//!
//! Defines the contract the purchase lifecycle needs from a payment
//! provider: create a checkout session, fetch authoritative session state,
//! and verify inbound webhook events. The provider itself is an external
//! collaborator and is never reimplemented here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, PackageId, PurchaseId, UserId};
use crate::domain::purchase::{StripeEvent, WebhookError};

/// Port for the hosted-checkout payment provider.
///
/// The session-creation call is a blocking network call with no built-in
/// retry; a failure is terminal for that initiation attempt.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for a purchase.
    ///
    /// The purchase id travels as the correlation token; the returned
    /// session id is recorded on the purchase before the buyer is
    /// redirected.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Fetch the authoritative state of a checkout session.
    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, GatewayError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Returns the parsed event if the signature is valid; any failure is
    /// reported without state mutation.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError>;
}

/// Request to create a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Purchase id, passed to the provider as the correlation token.
    pub purchase_id: PurchaseId,

    /// Purchased package.
    pub package_id: PackageId,

    /// Package name shown on the hosted checkout page.
    pub package_name: String,

    /// Package description shown on the hosted checkout page (truncated by
    /// the adapter if the provider caps its length).
    pub package_description: String,

    /// Buying user.
    pub buyer_id: UserId,

    /// Buyer email for checkout pre-fill.
    pub buyer_email: String,

    /// Amount to charge, snapshotted from the pricing resolver.
    pub amount: Money,

    /// ISO currency code (lowercase).
    pub currency: String,

    /// Category the price was resolved under, carried as metadata.
    pub price_category: String,

    /// URL to redirect after successful checkout.
    pub success_url: String,

    /// URL to redirect after cancelled checkout.
    pub cancel_url: String,
}

/// Checkout session issued by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session id.
    pub id: String,

    /// URL the buyer is redirected to.
    pub url: String,

    /// When the session expires (Unix timestamp), if the provider says.
    pub expires_at: Option<i64>,
}

/// Payment state of a checkout session as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPaymentStatus {
    /// Payment collected.
    Paid,
    /// Payment not collected (yet).
    Unpaid,
    /// Session did not require payment.
    NoPaymentRequired,
    /// Unrecognized status string.
    Unknown,
}

impl SessionPaymentStatus {
    /// Parse the provider's payment_status string.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "paid" => Self::Paid,
            "unpaid" => Self::Unpaid,
            "no_payment_required" => Self::NoPaymentRequired,
            _ => Self::Unknown,
        }
    }

    /// Returns true if the session counts as paid for reconciliation.
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// Authoritative session state fetched from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    /// Provider's session id.
    pub id: String,

    /// Payment state.
    pub payment_status: SessionPaymentStatus,

    /// Payment transaction id, once the provider assigned one.
    pub payment_intent: Option<String>,

    /// Raw session object, appended to the purchase event log.
    pub raw: serde_json::Value,
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone)]
pub struct GatewayError {
    /// Error code for categorization.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    /// Create a provider API error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorCode {
    /// Network connectivity issue.
    NetworkError,
    /// API authentication failed.
    AuthenticationError,
    /// Resource not found at the provider.
    NotFound,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Provider API error.
    ProviderError,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
