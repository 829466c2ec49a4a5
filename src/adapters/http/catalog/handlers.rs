//! HTTP handlers for catalog endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::application::handlers::catalog::{
    AvailabilityError, GetAvailabilityHandler, GetAvailabilityQuery,
};
use crate::domain::foundation::PackageId;
use crate::ports::PackageRepository;

use super::dto::{AvailabilityParams, AvailabilityResponse};
use crate::adapters::http::ErrorResponse;

/// Shared state for catalog endpoints.
#[derive(Clone)]
pub struct CatalogAppState {
    pub packages: Arc<dyn PackageRepository>,
}

impl CatalogAppState {
    pub fn availability_handler(&self) -> GetAvailabilityHandler {
        GetAvailabilityHandler::new(self.packages.clone())
    }
}

/// API error wrapper converting availability errors to HTTP responses.
pub struct CatalogApiError(AvailabilityError);

impl From<AvailabilityError> for CatalogApiError {
    fn from(err: AvailabilityError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> axum::response::Response {
        let code = match &self.0 {
            AvailabilityError::PackageNotFound => "PACKAGE_NOT_FOUND",
            AvailabilityError::Pricing(_) => "INVALID_DATE_RANGE",
            AvailabilityError::Database(_) => "INTERNAL_ERROR",
        };
        let body = ErrorResponse::new(code, self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}

/// GET /packages/{id}/availability?start_date&end_date
pub async fn get_availability(
    State(state): State<CatalogAppState>,
    Path(package_id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<impl IntoResponse, CatalogApiError> {
    let handler = state.availability_handler();
    let query = GetAvailabilityQuery {
        package_id: PackageId::from_uuid(package_id),
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let range = handler.handle(query).await?;

    Ok((StatusCode::OK, Json(AvailabilityResponse::from(range))))
}
