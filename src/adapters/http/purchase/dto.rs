//! HTTP DTOs for purchase endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::purchase::{Purchase, PurchaseStatus};

/// Request to initiate a package purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePurchaseRequest {
    /// Buyer email, pre-filled on the hosted checkout page.
    pub email: String,

    /// Date the price is resolved for; defaults to today.
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,

    /// Free-form note, at most 500 characters.
    #[serde(default)]
    pub note: Option<String>,
}

/// Response for successful checkout initiation.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub purchase_id: String,
    pub session_id: String,
    pub checkout_url: String,
    pub amount: i64,
    pub status: PurchaseStatus,
}

/// Purchase view returned by the return and admin endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub id: String,
    pub user_id: String,
    pub package_id: String,
    pub amount: i64,
    pub status: PurchaseStatus,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Purchase> for PurchaseResponse {
    fn from(purchase: &Purchase) -> Self {
        Self {
            id: purchase.id.to_string(),
            user_id: purchase.user_id.to_string(),
            package_id: purchase.package_id.to_string(),
            amount: purchase.amount.as_minor(),
            status: purchase.status,
            checkout_session_id: purchase.checkout_session_id.clone(),
            payment_intent_id: purchase.payment_intent_id.clone(),
            created_at: purchase.created_at.as_datetime().to_rfc3339(),
            updated_at: purchase.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Query parameters for the return and cancel redirects.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Request to overwrite a purchase's status (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSetStatusRequest {
    pub status: PurchaseStatus,
    #[serde(default)]
    pub note: Option<String>,
}
