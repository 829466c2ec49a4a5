//! In-memory payment gateway for tests and local development.
//!
//! Behaves like the Stripe adapter without network access: sessions are
//! issued from a counter, `retrieve_session` serves primed state, and
//! webhook verification runs the real HMAC verifier against a well-known
//! secret.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::purchase::{StripeEvent, StripeWebhookVerifier, WebhookError};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, GatewayError, GatewaySession, PaymentGateway,
    SessionPaymentStatus,
};

/// Webhook signing secret the mock verifies against by default.
pub const MOCK_WEBHOOK_SECRET: &str = "whsec_mock_gateway_secret";

/// Configurable in-memory `PaymentGateway`.
pub struct MockPaymentGateway {
    fail_create: bool,
    sessions: Mutex<HashMap<String, GatewaySession>>,
    created_requests: Mutex<Vec<CreateCheckoutRequest>>,
    session_counter: Mutex<u64>,
    verifier: StripeWebhookVerifier,
}

impl MockPaymentGateway {
    /// Gateway that succeeds on every call.
    pub fn new() -> Self {
        Self::with_webhook_secret(MOCK_WEBHOOK_SECRET)
    }

    /// Gateway whose session creation always fails with a network error.
    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::new()
        }
    }

    /// Gateway verifying webhooks against a custom secret.
    pub fn with_webhook_secret(secret: impl Into<String>) -> Self {
        Self {
            fail_create: false,
            sessions: Mutex::new(HashMap::new()),
            created_requests: Mutex::new(Vec::new()),
            session_counter: Mutex::new(0),
            verifier: StripeWebhookVerifier::new(secret),
        }
    }

    /// Requests `create_checkout_session` has seen, in order.
    pub fn created_requests(&self) -> Vec<CreateCheckoutRequest> {
        self.created_requests.lock().unwrap().clone()
    }

    /// Primes the state `retrieve_session` returns for a session id.
    pub fn set_session(&self, session: GatewaySession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    /// A paid session fixture.
    pub fn paid_session(session_id: &str, payment_intent: &str) -> GatewaySession {
        GatewaySession {
            id: session_id.to_string(),
            payment_status: SessionPaymentStatus::Paid,
            payment_intent: Some(payment_intent.to_string()),
            raw: serde_json::json!({
                "id": session_id,
                "payment_status": "paid",
                "payment_intent": payment_intent,
            }),
        }
    }

    /// An unpaid session fixture.
    pub fn unpaid_session(session_id: &str) -> GatewaySession {
        GatewaySession {
            id: session_id.to_string(),
            payment_status: SessionPaymentStatus::Unpaid,
            payment_intent: None,
            raw: serde_json::json!({
                "id": session_id,
                "payment_status": "unpaid",
            }),
        }
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::network("simulated gateway outage"));
        }

        self.created_requests.lock().unwrap().push(request);

        let mut counter = self.session_counter.lock().unwrap();
        *counter += 1;
        let id = format!("cs_test_{}", *counter);

        Ok(CheckoutSession {
            id: id.clone(),
            url: format!("https://checkout.test/pay/{}", id),
            expires_at: None,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, GatewayError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found("checkout session"))
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verifier.verify_and_parse(payload, signature_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, PackageId, PurchaseId, UserId};

    fn request() -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            purchase_id: PurchaseId::new(),
            package_id: PackageId::new(),
            package_name: "Pass".to_string(),
            package_description: "desc".to_string(),
            buyer_id: UserId::new(),
            buyer_email: "buyer@example.com".to_string(),
            amount: Money::from_minor(10000).unwrap(),
            currency: "usd".to_string(),
            price_category: "weekday".to_string(),
            success_url: "https://app.test/success".to_string(),
            cancel_url: "https://app.test/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn issues_sequential_session_ids() {
        let gateway = MockPaymentGateway::new();

        let first = gateway.create_checkout_session(request()).await.unwrap();
        let second = gateway.create_checkout_session(request()).await.unwrap();

        assert_eq!(first.id, "cs_test_1");
        assert_eq!(second.id, "cs_test_2");
        assert_eq!(gateway.created_requests().len(), 2);
    }

    #[tokio::test]
    async fn failing_gateway_rejects_session_creation() {
        let gateway = MockPaymentGateway::failing();
        let result = gateway.create_checkout_session(request()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn retrieve_serves_primed_sessions() {
        let gateway = MockPaymentGateway::new();
        gateway.set_session(MockPaymentGateway::paid_session("cs_1", "pi_1"));

        let session = gateway.retrieve_session("cs_1").await.unwrap();
        assert!(session.payment_status.is_paid());

        let missing = gateway.retrieve_session("cs_other").await;
        assert!(missing.is_err());
    }
}
