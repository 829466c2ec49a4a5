//! Axum router for purchase endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use super::handlers::{
    admin_set_status, handle_stripe_webhook, initiate_purchase, purchase_cancel,
    purchase_success, PurchaseAppState,
};

/// Buyer-facing purchase routes.
///
/// - `POST /packages/{id}/purchase` - initiate checkout (authenticated)
/// - `GET  /purchase/success?session_id` - return from hosted checkout
/// - `GET  /purchase/cancel?session_id` - abandoned checkout
pub fn purchase_routes() -> Router<PurchaseAppState> {
    Router::new()
        .route("/packages/:id/purchase", post(initiate_purchase))
        .route("/purchase/success", get(purchase_success))
        .route("/purchase/cancel", get(purchase_cancel))
}

/// Admin routes (admin role header required).
///
/// - `PUT /admin/purchases/{id}/status` - status override / refund
pub fn admin_routes() -> Router<PurchaseAppState> {
    Router::new().route("/admin/purchases/:id/status", put(admin_set_status))
}

/// Webhook routes. Separate from the buyer routes because webhooks carry no
/// user identity; they are authenticated by signature.
///
/// - `POST /stripe/webhook`
pub fn webhook_routes() -> Router<PurchaseAppState> {
    Router::new().route("/stripe/webhook", post(handle_stripe_webhook))
}

/// Complete purchase module router.
pub fn purchase_router() -> Router<PurchaseAppState> {
    Router::new()
        .merge(purchase_routes())
        .merge(admin_routes())
        .merge(webhook_routes())
}
