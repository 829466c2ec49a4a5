//! PurchaseRepository port - persistent storage for purchases.
//!
//! The update contract carries the optimistic-concurrency rule the
//! reconciliation paths rely on: two concurrent read-modify-write cycles on
//! the same purchase can never silently lose one writer's changes. The
//! loser gets `VersionConflict`, re-reads, and re-applies.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PurchaseId};
use crate::domain::purchase::Purchase;

/// Outcome of a conditional update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The row matched the expected version and was written; the stored
    /// version is now `expected_version + 1`.
    Updated,

    /// Another writer got there first; nothing was written.
    VersionConflict,
}

/// Port for storing and retrieving purchases.
///
/// Purchases are never deleted; they only move through status transitions.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Persist a freshly initiated purchase.
    async fn create(&self, purchase: &Purchase) -> Result<(), DomainError>;

    /// Find a purchase by id.
    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError>;

    /// Find a purchase by its gateway checkout session id.
    async fn find_by_session_id(&self, session_id: &str)
        -> Result<Option<Purchase>, DomainError>;

    /// Find a purchase by its gateway payment transaction id.
    async fn find_by_payment_intent_id(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Purchase>, DomainError>;

    /// Write the purchase's mutable state, conditional on the stored row
    /// still carrying `expected_version`.
    ///
    /// The event log is written whole; because every writer re-reads before
    /// re-applying, concurrent appends all survive.
    async fn update(
        &self,
        purchase: &Purchase,
        expected_version: i32,
    ) -> Result<UpdateResult, DomainError>;
}
