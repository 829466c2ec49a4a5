//! Stripe implementation of the PaymentGateway port.
//!
//! # Security
//!
//! - HMAC-SHA256 webhook signature verification with constant-time
//!   comparison (delegated to the domain verifier)
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeGatewayConfig::new(api_key, webhook_secret);
//! let gateway = StripeGateway::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::purchase::{StripeEvent, StripeWebhookVerifier, WebhookError};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, GatewayError, GatewaySession, PaymentGateway,
    SessionPaymentStatus,
};

use super::webhook_types::StripeCheckoutSessionObject;

/// Stripe caps the product description shown on hosted checkout.
const MAX_DESCRIPTION_LEN: usize = 200;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeGatewayConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,
}

impl StripeGatewayConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe payment gateway adapter.
pub struct StripeGateway {
    config: StripeGatewayConfig,
    http_client: reqwest::Client,
    verifier: StripeWebhookVerifier,
}

impl StripeGateway {
    /// Create a new Stripe gateway with the given configuration.
    pub fn new(config: StripeGatewayConfig) -> Self {
        let verifier =
            StripeWebhookVerifier::new(config.webhook_secret.expose_secret().to_string());
        Self {
            config,
            http_client: reqwest::Client::new(),
            verifier,
        }
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<serde_json::Value, GatewayError> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(path, error = %error_text, "Stripe API call failed");
            return Err(GatewayError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("Failed to parse Stripe response: {}", e)))
    }
}

/// Builds the form-encoded body for a checkout session creation call.
///
/// The purchase id travels both as `client_reference_id` and in the session
/// metadata, so either side of a later lookup can correlate.
fn checkout_form_params(request: &CreateCheckoutRequest) -> Vec<(String, String)> {
    let description: String = request
        .package_description
        .chars()
        .take(MAX_DESCRIPTION_LEN)
        .collect();

    vec![
        ("payment_method_types[0]".into(), "card".into()),
        (
            "line_items[0][price_data][currency]".into(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][product_data][name]".into(),
            request.package_name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]".into(),
            description,
        ),
        (
            "line_items[0][price_data][unit_amount]".into(),
            request.amount.as_minor().to_string(),
        ),
        ("line_items[0][quantity]".into(), "1".into()),
        ("mode".into(), "payment".into()),
        ("success_url".into(), request.success_url.clone()),
        ("cancel_url".into(), request.cancel_url.clone()),
        ("customer_email".into(), request.buyer_email.clone()),
        (
            "client_reference_id".into(),
            request.purchase_id.to_string(),
        ),
        (
            "metadata[package_id]".into(),
            request.package_id.to_string(),
        ),
        (
            "metadata[package_name]".into(),
            request.package_name.clone(),
        ),
        ("metadata[user_id]".into(), request.buyer_id.to_string()),
        ("metadata[user_email]".into(), request.buyer_email.clone()),
        (
            "metadata[purchase_id]".into(),
            request.purchase_id.to_string(),
        ),
        (
            "metadata[price_type]".into(),
            request.price_category.clone(),
        ),
    ]
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let params = checkout_form_params(&request);
        let raw = self.post_form("/v1/checkout/sessions", &params).await?;

        let session: StripeCheckoutSessionObject = serde_json::from_value(raw).map_err(|e| {
            GatewayError::provider(format!("Failed to parse checkout session: {}", e))
        })?;

        let url = session
            .url
            .ok_or_else(|| GatewayError::provider("Checkout session has no redirect URL"))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
            expires_at: session.expires_at,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, GatewayError> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found("checkout session"));
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let session: StripeCheckoutSessionObject =
            serde_json::from_value(raw.clone()).map_err(|e| {
                GatewayError::provider(format!("Failed to parse checkout session: {}", e))
            })?;

        let payment_status = session
            .payment_status
            .as_deref()
            .map(SessionPaymentStatus::from_provider)
            .unwrap_or(SessionPaymentStatus::Unknown);

        Ok(GatewaySession {
            id: session.id,
            payment_status,
            payment_intent: session.payment_intent,
            raw,
        })
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
    use crate::domain::purchase::compute_test_signature;

    fn request() -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            purchase_id: PurchaseId::new(),
            package_id: PackageId::new(),
            package_name: "Summit Day Pass".to_string(),
            package_description: "Full day on the mountain".to_string(),
            buyer_id: UserId::new(),
            buyer_email: "buyer@example.com".to_string(),
            amount: Money::from_minor(15000).unwrap(),
            currency: "usd".to_string(),
            price_category: "weekend".to_string(),
            success_url: "https://app.test/purchase/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://app.test/purchase/cancel?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn checkout_params_carry_snapshot_amount_in_minor_units() {
        let req = request();
        let params = checkout_form_params(&req);

        assert_eq!(
            param(&params, "line_items[0][price_data][unit_amount]"),
            Some("15000")
        );
        assert_eq!(
            param(&params, "line_items[0][price_data][currency]"),
            Some("usd")
        );
        assert_eq!(param(&params, "mode"), Some("payment"));
    }

    #[test]
    fn checkout_params_correlate_via_purchase_id() {
        let req = request();
        let params = checkout_form_params(&req);

        let purchase_id = req.purchase_id.to_string();
        assert_eq!(
            param(&params, "client_reference_id"),
            Some(purchase_id.as_str())
        );
        assert_eq!(
            param(&params, "metadata[purchase_id]"),
            Some(purchase_id.as_str())
        );
        assert_eq!(param(&params, "metadata[price_type]"), Some("weekend"));
    }

    #[test]
    fn checkout_params_truncate_long_descriptions() {
        let mut req = request();
        req.package_description = "x".repeat(500);
        let params = checkout_form_params(&req);

        let description = param(&params, "line_items[0][price_data][product_data][description]")
            .unwrap();
        assert_eq!(description.len(), MAX_DESCRIPTION_LEN);
    }

    #[test]
    fn checkout_params_pass_placeholder_urls_through() {
        let params = checkout_form_params(&request());
        assert!(param(&params, "success_url")
            .unwrap()
            .contains("{CHECKOUT_SESSION_ID}"));
        assert!(param(&params, "cancel_url")
            .unwrap()
            .contains("{CHECKOUT_SESSION_ID}"));
    }

    #[test]
    fn verify_webhook_accepts_properly_signed_payload() {
        let secret = "whsec_gateway_test";
        let gateway = StripeGateway::new(StripeGatewayConfig::new("sk_test_key", secret));

        let payload = r#"{"id":"evt_1","type":"checkout.session.completed","created":1704067200,"data":{"object":{}},"livemode":false,"api_version":"2023-10-16"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(secret, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let event = gateway.verify_webhook(payload.as_bytes(), &header).unwrap();
        assert_eq!(event.id, "evt_1");
    }

    #[test]
    fn verify_webhook_rejects_wrong_secret() {
        let gateway =
            StripeGateway::new(StripeGatewayConfig::new("sk_test_key", "whsec_right"));

        let payload = r#"{"id":"evt_1"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature("whsec_wrong", timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = gateway.verify_webhook(payload.as_bytes(), &header);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }
}
