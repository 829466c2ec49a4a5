//! Axum router for catalog endpoints.

use axum::routing::get;
use axum::Router;

use super::handlers::{get_availability, CatalogAppState};

/// Catalog routes.
///
/// - `GET /packages/{id}/availability` - per-day prices for a date range
pub fn catalog_router() -> Router<CatalogAppState> {
    Router::new().route("/packages/:id/availability", get(get_availability))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::purchase::testing::{
        money, standard_package, InMemoryPackageRepository,
    };
    use crate::domain::catalog::PriceRule;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn availability_endpoint_returns_daily_quotes() {
        let mut package = standard_package();
        package.price_rules.push(
            PriceRule::date_range(package.id, money(50000), date(2025, 12, 24), date(2025, 12, 26))
                .unwrap(),
        );
        let package_id = package.id;
        let app = catalog_router().with_state(CatalogAppState {
            packages: Arc::new(InMemoryPackageRepository::with_package(package)),
        });

        let uri = format!(
            "/packages/{}/availability?start_date=2025-12-22&end_date=2025-12-28",
            package_id
        );
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["total_days"], 7);
        assert_eq!(json["dates"].as_array().unwrap().len(), 7);
        assert_eq!(json["dates"][2]["price_type"], "special");
        assert_eq!(json["dates"][2]["price"], 50000);
        assert_eq!(json["dates"][2]["available"], true);
    }

    #[tokio::test]
    async fn availability_rejects_inverted_range() {
        let package = standard_package();
        let package_id = package.id;
        let app = catalog_router().with_state(CatalogAppState {
            packages: Arc::new(InMemoryPackageRepository::with_package(package)),
        });

        let uri = format!(
            "/packages/{}/availability?start_date=2025-12-28&end_date=2025-12-22",
            package_id
        );
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_DATE_RANGE");
    }

    #[tokio::test]
    async fn availability_for_unknown_package_is_404() {
        let app = catalog_router().with_state(CatalogAppState {
            packages: Arc::new(InMemoryPackageRepository::new()),
        });

        let uri = format!(
            "/packages/{}/availability?start_date=2025-12-22&end_date=2025-12-23",
            uuid::Uuid::new_v4()
        );
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
