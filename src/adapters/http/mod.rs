//! HTTP adapter - thin axum surface over the application handlers.

pub mod catalog;
pub mod purchase;

use axum::Router;
use serde::Serialize;

use catalog::CatalogAppState;
use purchase::PurchaseAppState;

/// Standard error body returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Complete API router.
///
/// # Routes
///
/// - `GET  /packages/{id}/availability` - per-day prices over a range
/// - `POST /packages/{id}/purchase` - initiate checkout (authenticated)
/// - `GET  /purchase/success?session_id` - synchronous return path
/// - `GET  /purchase/cancel?session_id` - explicit cancellation
/// - `PUT  /admin/purchases/{id}/status` - admin override (admin role)
/// - `POST /stripe/webhook` - signed provider events
pub fn api_router(catalog_state: CatalogAppState, purchase_state: PurchaseAppState) -> Router {
    Router::new()
        .merge(catalog::routes::catalog_router().with_state(catalog_state))
        .merge(purchase::routes::purchase_router().with_state(purchase_state))
}
