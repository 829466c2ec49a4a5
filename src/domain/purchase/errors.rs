//! Purchase lifecycle error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors surfaced by the purchase lifecycle operations.
///
/// Every variant resolves to a defined purchase state plus a reported,
/// recoverable error; none of these should ever reach the end user as an
/// unhandled fault.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// The package is inactive, deleted, or has no applicable price rule
    /// for the requested date. User-facing and recoverable.
    #[error("Price not available for this package")]
    PricingUnavailable,

    /// The package reference does not exist.
    #[error("Package not found")]
    PackageNotFound,

    /// No purchase matches the given correlation id. Stale and unknown
    /// sessions land here; callers surface a message, not a fault.
    #[error("Purchase not found")]
    PurchaseNotFound,

    /// The gateway call during initiation failed. The purchase has already
    /// been marked failed with the error captured in its event log; the
    /// user may retry with a fresh initiation.
    #[error("Failed to initiate payment: {0}")]
    GatewaySession(String),

    /// Concurrent writers exhausted the optimistic update retries.
    #[error("Purchase was modified concurrently")]
    Conflict,

    /// Persistence failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl PurchaseError {
    /// Maps the error to the HTTP status the thin transport layer returns.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PurchaseError::PricingUnavailable => StatusCode::UNPROCESSABLE_ENTITY,
            PurchaseError::PackageNotFound | PurchaseError::PurchaseNotFound => {
                StatusCode::NOT_FOUND
            }
            PurchaseError::GatewaySession(_) => StatusCode::BAD_GATEWAY,
            PurchaseError::Conflict => StatusCode::CONFLICT,
            PurchaseError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PurchaseError::PricingUnavailable => "PRICING_UNAVAILABLE",
            PurchaseError::PackageNotFound => "PACKAGE_NOT_FOUND",
            PurchaseError::PurchaseNotFound => "PURCHASE_NOT_FOUND",
            PurchaseError::GatewaySession(_) => "GATEWAY_SESSION_ERROR",
            PurchaseError::Conflict => "CONFLICT",
            PurchaseError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DomainError> for PurchaseError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PurchaseNotFound => PurchaseError::PurchaseNotFound,
            ErrorCode::PackageNotFound => PurchaseError::PackageNotFound,
            ErrorCode::PricingUnavailable => PurchaseError::PricingUnavailable,
            ErrorCode::VersionConflict => PurchaseError::Conflict,
            _ => PurchaseError::Database(err.to_string()),
        }
    }
}
