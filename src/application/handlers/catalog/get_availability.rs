//! GetAvailabilityHandler - per-day pricing over a calendar range.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::catalog::{PricingError, RangeQuote};
use crate::domain::foundation::PackageId;
use crate::ports::PackageRepository;

/// Query for a package's per-day prices over an inclusive date range.
#[derive(Debug, Clone)]
pub struct GetAvailabilityQuery {
    pub package_id: PackageId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Errors from the availability query.
#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Package not found")]
    PackageNotFound,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Database error: {0}")]
    Database(String),
}

impl AvailabilityError {
    /// HTTP status for the thin transport layer.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AvailabilityError::PackageNotFound => StatusCode::NOT_FOUND,
            AvailabilityError::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AvailabilityError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Handler resolving a calendar of per-day quotes for a package.
pub struct GetAvailabilityHandler {
    packages: Arc<dyn PackageRepository>,
}

impl GetAvailabilityHandler {
    pub fn new(packages: Arc<dyn PackageRepository>) -> Self {
        Self { packages }
    }

    pub async fn handle(&self, query: GetAvailabilityQuery) -> Result<RangeQuote, AvailabilityError> {
        let package = self
            .packages
            .find_by_id(&query.package_id)
            .await
            .map_err(|e| AvailabilityError::Database(e.to_string()))?
            .ok_or(AvailabilityError::PackageNotFound)?;

        Ok(package.resolve_range(query.start_date, query.end_date)?)
    }
}
