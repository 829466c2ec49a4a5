//! Purchase lifecycle handlers.
//!
//! Each reconciliation path performs a per-purchase transactional
//! read-modify-write: load the row, apply the domain transition, write
//! conditionally on the loaded version, and on conflict re-read and
//! re-apply. Correctness comes from the data layer, not from in-process
//! serialization; the loops here are bounded because one of the racing
//! writers always makes progress.

mod admin_set_status;
mod cancel_purchase;
mod handle_payment_webhook;
mod initiate_purchase;
mod reconcile_return;

pub use admin_set_status::{AdminSetStatusCommand, AdminSetStatusHandler};
pub use cancel_purchase::{CancelPurchaseCommand, CancelPurchaseHandler};
pub use handle_payment_webhook::{HandlePaymentWebhookHandler, PurchaseWebhookDispatcher};
pub use initiate_purchase::{
    CheckoutUrls, InitiatePurchaseCommand, InitiatePurchaseHandler, InitiatePurchaseResult,
};
pub use reconcile_return::{ReconcileReturnCommand, ReconcileReturnHandler};

/// Bounded retries for the optimistic read-modify-write loops.
pub(crate) const MAX_UPDATE_RETRIES: u32 = 3;
