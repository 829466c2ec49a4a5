//! Stripe API object types used by the gateway adapter.
//!
//! Only the fields the purchase flow reads are captured; everything else in
//! Stripe's schema is ignored by serde.

use serde::{Deserialize, Serialize};

/// Stripe Checkout Session object, as returned by the sessions API and
/// carried in `checkout.session.completed` events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSessionObject {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Hosted checkout URL (present while the session is open).
    pub url: Option<String>,

    /// Session payment status (paid, unpaid, no_payment_required).
    pub payment_status: Option<String>,

    /// Payment intent id, once the session has one.
    pub payment_intent: Option<String>,

    /// When the session expires (Unix timestamp).
    pub expires_at: Option<i64>,

    /// Custom metadata attached at session creation.
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_create_response() {
        let json = r#"{
            "id": "cs_test_a1b2",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_a1b2",
            "payment_status": "unpaid",
            "payment_intent": null,
            "expires_at": 1704153600,
            "metadata": {"purchase_id": "7e6f"}
        }"#;

        let session: StripeCheckoutSessionObject = serde_json::from_str(json).unwrap();

        assert_eq!(session.id, "cs_test_a1b2");
        assert!(session.url.is_some());
        assert_eq!(session.payment_status.as_deref(), Some("unpaid"));
        assert!(session.payment_intent.is_none());
        assert_eq!(session.metadata.get("purchase_id").unwrap(), "7e6f");
    }

    #[test]
    fn deserializes_retrieve_response_with_intent() {
        let json = r#"{
            "id": "cs_test_paid",
            "payment_status": "paid",
            "payment_intent": "pi_3abc"
        }"#;

        let session: StripeCheckoutSessionObject = serde_json::from_str(json).unwrap();

        assert_eq!(session.payment_status.as_deref(), Some("paid"));
        assert_eq!(session.payment_intent.as_deref(), Some("pi_3abc"));
        assert!(session.url.is_none());
        assert!(session.metadata.is_empty());
    }
}
