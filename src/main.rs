//! Trailpass server binary.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use trailpass::adapters::http::{api_router, catalog::CatalogAppState, purchase::PurchaseAppState};
use trailpass::adapters::postgres::{
    PostgresPackageRepository, PostgresPurchaseRepository, PostgresWebhookEventRepository,
};
use trailpass::adapters::stripe::{StripeGateway, StripeGatewayConfig};
use trailpass::application::handlers::purchase::CheckoutUrls;
use trailpass::config::AppConfig;
use trailpass::ports::{PackageRepository, PaymentGateway, PurchaseRepository, WebhookEventRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let packages: Arc<dyn PackageRepository> =
        Arc::new(PostgresPackageRepository::new(pool.clone()));
    let purchases: Arc<dyn PurchaseRepository> =
        Arc::new(PostgresPurchaseRepository::new(pool.clone()));
    let webhook_events: Arc<dyn WebhookEventRepository> =
        Arc::new(PostgresWebhookEventRepository::new(pool.clone()));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(StripeGatewayConfig::new(
        config.payment.stripe_api_key.clone(),
        config.payment.stripe_webhook_secret.clone(),
    )));

    let catalog_state = CatalogAppState {
        packages: packages.clone(),
    };
    let purchase_state = PurchaseAppState {
        packages,
        purchases,
        webhook_events,
        gateway,
        checkout_urls: CheckoutUrls {
            success_url: config.payment.success_url.clone(),
            cancel_url: config.payment.cancel_url.clone(),
        },
        currency: config.payment.currency.clone(),
    };

    let app = api_router(catalog_state, purchase_state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, test_mode = config.payment.is_test_mode(), "trailpass listening");

    axum::serve(listener, app).await?;

    Ok(())
}
