//! Ports - the async trait seams between the domain and the outside world.

mod package_repository;
mod payment_gateway;
mod purchase_repository;
mod webhook_event_repository;

pub use package_repository::PackageRepository;
pub use payment_gateway::{
    CheckoutSession, CreateCheckoutRequest, GatewayError, GatewayErrorCode, GatewaySession,
    PaymentGateway, SessionPaymentStatus,
};
pub use purchase_repository::{PurchaseRepository, UpdateResult};
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
