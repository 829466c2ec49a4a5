//! Typed payment event log entries.
//!
//! Each purchase carries an append-only sequence of these records covering
//! everything payment-related that happened to it: status transitions,
//! gateway session snapshots, failure reasons, cancellations, and admin
//! overrides. The log is audit data; reconciliation decisions read only the
//! purchase status, so duplicate entries from concurrent writers are
//! harmless.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::status::PurchaseStatus;

/// One entry of a purchase's payment event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentEvent {
    /// Context captured when checkout was initiated: the requested date,
    /// the category the price resolved under, and the buyer's note.
    InitiationDetails {
        purchase_date: chrono::NaiveDate,
        price_category: String,
        note: Option<String>,
        at: Timestamp,
    },

    /// The checkout session the gateway issued for this purchase.
    CheckoutSessionCreated {
        session_id: String,
        at: Timestamp,
    },

    /// A status transition made by a reconciliation path.
    StatusUpdate {
        from: PurchaseStatus,
        to: PurchaseStatus,
        at: Timestamp,
    },

    /// Authoritative session state fetched from the gateway.
    GatewaySnapshot {
        session: serde_json::Value,
        at: Timestamp,
    },

    /// Why a payment failed, as reported by the gateway or recorded during
    /// session creation.
    FailureReason { reason: String, at: Timestamp },

    /// The user abandoned checkout.
    CancellationMarker { at: Timestamp },

    /// An admin overwrote the status directly.
    AdminOverride {
        admin_id: UserId,
        status: PurchaseStatus,
        note: Option<String>,
        at: Timestamp,
    },
}

impl PaymentEvent {
    /// When the event was recorded.
    pub fn at(&self) -> Timestamp {
        match self {
            PaymentEvent::InitiationDetails { at, .. }
            | PaymentEvent::CheckoutSessionCreated { at, .. }
            | PaymentEvent::StatusUpdate { at, .. }
            | PaymentEvent::GatewaySnapshot { at, .. }
            | PaymentEvent::FailureReason { at, .. }
            | PaymentEvent::CancellationMarker { at }
            | PaymentEvent::AdminOverride { at, .. } => *at,
        }
    }
}
