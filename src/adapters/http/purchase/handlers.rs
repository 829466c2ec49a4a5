//! HTTP handlers for purchase endpoints.
//!
//! These handlers connect axum routes to the application layer. Caller
//! identity arrives pre-authorized from the fronting auth layer via
//! headers; the admin endpoints additionally require an admin role header.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::application::handlers::purchase::{
    AdminSetStatusCommand, AdminSetStatusHandler, CancelPurchaseCommand, CancelPurchaseHandler,
    CheckoutUrls, HandlePaymentWebhookHandler, InitiatePurchaseCommand, InitiatePurchaseHandler,
    ReconcileReturnCommand, ReconcileReturnHandler,
};
use crate::domain::foundation::{PackageId, PurchaseId, UserId};
use crate::domain::purchase::PurchaseError;
use crate::ports::{PackageRepository, PaymentGateway, PurchaseRepository, WebhookEventRepository};

use super::dto::{
    AdminSetStatusRequest, CheckoutResponse, InitiatePurchaseRequest, PurchaseResponse,
    SessionQuery,
};
use crate::adapters::http::ErrorResponse;

/// Upper bound for the buyer note.
const MAX_NOTE_LEN: usize = 500;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for purchase endpoints.
#[derive(Clone)]
pub struct PurchaseAppState {
    pub packages: Arc<dyn PackageRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub checkout_urls: CheckoutUrls,
    pub currency: String,
}

impl PurchaseAppState {
    pub fn initiate_handler(&self) -> InitiatePurchaseHandler {
        InitiatePurchaseHandler::new(
            self.packages.clone(),
            self.purchases.clone(),
            self.gateway.clone(),
            self.checkout_urls.clone(),
            self.currency.clone(),
        )
    }

    pub fn reconcile_return_handler(&self) -> ReconcileReturnHandler {
        ReconcileReturnHandler::new(self.purchases.clone(), self.gateway.clone())
    }

    pub fn cancel_handler(&self) -> CancelPurchaseHandler {
        CancelPurchaseHandler::new(self.purchases.clone())
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.gateway.clone(),
            self.webhook_events.clone(),
            self.purchases.clone(),
        )
    }

    pub fn admin_set_status_handler(&self) -> AdminSetStatusHandler {
        AdminSetStatusHandler::new(self.purchases.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Caller Identity Extractors
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user identity supplied by the fronting auth layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection for a missing or malformed identity header.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

fn user_id_from_headers(headers: &axum::http::HeaderMap) -> Option<UserId> {
    headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id =
                user_id_from_headers(&parts.headers).ok_or(AuthenticationRequired)?;
            Ok(AuthenticatedUser { user_id })
        })
    }
}

/// Admin identity: an authenticated user whose role header carries an admin
/// role. The role decision itself is made by the calling layer; this
/// extractor only refuses non-admin callers.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: UserId,
}

/// Rejection for callers without an admin role.
pub struct AdminRequired;

impl IntoResponse for AdminRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("FORBIDDEN", "Admin role required");
        (StatusCode::FORBIDDEN, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = user_id_from_headers(&parts.headers)
                .ok_or_else(|| AuthenticationRequired.into_response())?;

            let role = parts
                .headers
                .get("X-User-Role")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if !matches!(role, "admin" | "super_admin") {
                return Err(AdminRequired.into_response());
            }

            Ok(AdminUser { user_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper converting purchase errors to HTTP responses.
pub struct PurchaseApiError(PurchaseError);

impl From<PurchaseError> for PurchaseApiError {
    fn from(err: PurchaseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PurchaseApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Route Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /packages/{id}/purchase - initiate checkout
pub async fn initiate_purchase(
    State(state): State<PurchaseAppState>,
    user: AuthenticatedUser,
    Path(package_id): Path<Uuid>,
    Json(request): Json<InitiatePurchaseRequest>,
) -> Result<impl IntoResponse, axum::response::Response> {
    if request
        .note
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_NOTE_LEN)
    {
        let error = ErrorResponse::new("VALIDATION_FAILED", "Note exceeds 500 characters");
        return Err((StatusCode::BAD_REQUEST, Json(error)).into_response());
    }

    let handler = state.initiate_handler();
    let cmd = InitiatePurchaseCommand {
        user_id: user.user_id,
        email: request.email,
        package_id: PackageId::from_uuid(package_id),
        purchase_date: request.purchase_date,
        note: request.note,
    };

    let result = handler
        .handle(cmd)
        .await
        .map_err(|e| PurchaseApiError::from(e).into_response())?;

    let response = CheckoutResponse {
        purchase_id: result.purchase.id.to_string(),
        session_id: result
            .purchase
            .checkout_session_id
            .clone()
            .unwrap_or_default(),
        checkout_url: result.checkout_url,
        amount: result.purchase.amount.as_minor(),
        status: result.purchase.status,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /purchase/success?session_id - synchronous return path
pub async fn purchase_success(
    State(state): State<PurchaseAppState>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, axum::response::Response> {
    let Some(session_id) = query.session_id.filter(|s| !s.is_empty()) else {
        let error = ErrorResponse::new("INVALID_SESSION", "Invalid payment session");
        return Err((StatusCode::BAD_REQUEST, Json(error)).into_response());
    };

    let handler = state.reconcile_return_handler();
    let purchase = handler
        .handle(ReconcileReturnCommand { session_id })
        .await
        .map_err(|e| PurchaseApiError::from(e).into_response())?;

    Ok(Json(PurchaseResponse::from(&purchase)))
}

/// GET /purchase/cancel?session_id - explicit cancellation
pub async fn purchase_cancel(
    State(state): State<PurchaseAppState>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, PurchaseApiError> {
    if let Some(session_id) = query.session_id.filter(|s| !s.is_empty()) {
        state
            .cancel_handler()
            .handle(CancelPurchaseCommand { session_id })
            .await?;
    }

    Ok(Json(serde_json::json!({ "status": "cancelled" })))
}

/// PUT /admin/purchases/{id}/status - admin status override
pub async fn admin_set_status(
    State(state): State<PurchaseAppState>,
    admin: AdminUser,
    Path(purchase_id): Path<Uuid>,
    Json(request): Json<AdminSetStatusRequest>,
) -> Result<impl IntoResponse, PurchaseApiError> {
    let handler = state.admin_set_status_handler();
    let cmd = AdminSetStatusCommand {
        purchase_id: PurchaseId::from_uuid(purchase_id),
        new_status: request.status,
        admin_id: admin.user_id,
        note: request.note,
    };

    let purchase = handler.handle(cmd).await?;

    Ok(Json(PurchaseResponse::from(&purchase)))
}

/// POST /stripe/webhook - signed provider events
///
/// Signature or payload failures yield a client error with no state
/// mutation; acknowledged events (including unknown purchases) return 200
/// so the provider stops retrying.
pub async fn handle_stripe_webhook(
    State(state): State<PurchaseAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> axum::response::Response {
    let Some(signature) = headers.get("Stripe-Signature").and_then(|v| v.to_str().ok())
    else {
        let error = ErrorResponse::new("MISSING_SIGNATURE", "Missing Stripe-Signature header");
        return (StatusCode::BAD_REQUEST, Json(error)).into_response();
    };

    let handler = state.webhook_handler();
    match handler.handle(&body, signature).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "success" })),
        )
            .into_response(),
        Err(err) => {
            let status = err.status_code();
            if status == StatusCode::OK {
                // Acknowledged without processing (ignored / unknown
                // purchase reference).
                return (
                    StatusCode::OK,
                    Json(serde_json::json!({ "status": "ignored" })),
                )
                    .into_response();
            }
            tracing::warn!(error = %err, "webhook rejected");
            let error = ErrorResponse::new("WEBHOOK_ERROR", err.to_string());
            (status, Json(error)).into_response()
        }
    }
}
