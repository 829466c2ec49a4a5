//! PostgreSQL adapters - sqlx implementations of the repository ports.

mod package_repository;
mod purchase_repository;
mod webhook_event_repository;

pub use package_repository::PostgresPackageRepository;
pub use purchase_repository::PostgresPurchaseRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
