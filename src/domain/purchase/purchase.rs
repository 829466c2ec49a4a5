//! Purchase aggregate - one customer's transactional record for a package.
//!
//! The aggregate owns the monotonicity rule that keeps concurrent
//! reconciliation paths consistent: automatic transitions only ever move a
//! purchase from `Pending` toward `Completed` or `Failed`, and a purchase
//! that reached `Completed` is never set back to `Pending` by anything but
//! an explicit admin override.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, PackageId, PurchaseId, Timestamp, UserId};

use super::events::PaymentEvent;
use super::status::PurchaseStatus;

/// Authoritative payment outcome reported by the gateway, via either the
/// synchronous return path or the asynchronous webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// The session was paid.
    Paid { payment_intent: Option<String> },

    /// The payment failed.
    Failed { reason: String },

    /// The session exists but has not been paid yet.
    StillPending,
}

/// A customer's purchase of one package instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase identifier; doubles as the correlation token passed to the
    /// gateway at session creation.
    pub id: PurchaseId,

    /// Buying user.
    pub user_id: UserId,

    /// Purchased package.
    pub package_id: PackageId,

    /// Amount charged, snapshotted from the pricing resolver at initiation.
    /// Never recomputed afterwards, whatever the gateway later reports.
    pub amount: Money,

    /// Gateway checkout session id, once a session was created.
    pub checkout_session_id: Option<String>,

    /// Gateway payment transaction id, once known.
    pub payment_intent_id: Option<String>,

    /// Lifecycle status.
    pub status: PurchaseStatus,

    /// Append-only payment event log.
    pub events: Vec<PaymentEvent>,

    /// When the purchase was initiated.
    pub created_at: Timestamp,

    /// When the purchase was last modified.
    pub updated_at: Timestamp,

    /// Optimistic concurrency version, incremented by the repository on
    /// every successful update.
    pub version: i32,
}

impl Purchase {
    /// Creates a pending purchase with the resolved price snapshot.
    pub fn initiate(user_id: UserId, package_id: PackageId, amount: Money) -> Self {
        let now = Timestamp::now();
        Self {
            id: PurchaseId::new(),
            user_id,
            package_id,
            amount,
            checkout_session_id: None,
            payment_intent_id: None,
            status: PurchaseStatus::Pending,
            events: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Records the initiation context: requested date, resolved price
    /// category, and the buyer's optional note.
    pub fn record_initiation_details(
        &mut self,
        purchase_date: chrono::NaiveDate,
        price_category: impl Into<String>,
        note: Option<String>,
    ) {
        self.events.push(PaymentEvent::InitiationDetails {
            purchase_date,
            price_category: price_category.into(),
            note,
            at: Timestamp::now(),
        });
        self.touch();
    }

    /// Records the checkout session the gateway issued for this purchase.
    pub fn record_checkout_session(&mut self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        self.checkout_session_id = Some(session_id.clone());
        self.events.push(PaymentEvent::CheckoutSessionCreated {
            session_id,
            at: Timestamp::now(),
        });
        self.touch();
    }

    /// Marks the purchase failed after a gateway error during session
    /// creation. The purchase must never be left silently pending when the
    /// gateway call errored.
    pub fn mark_initiation_failed(&mut self, reason: impl Into<String>) {
        self.events.push(PaymentEvent::FailureReason {
            reason: reason.into(),
            at: Timestamp::now(),
        });
        self.set_status(PurchaseStatus::Failed);
    }

    /// Appends an authoritative gateway session snapshot to the event log.
    pub fn record_gateway_snapshot(&mut self, session: serde_json::Value) {
        self.events.push(PaymentEvent::GatewaySnapshot {
            session,
            at: Timestamp::now(),
        });
        self.touch();
    }

    /// Applies a gateway-reported outcome under the monotonic rule.
    ///
    /// Only a `Pending` purchase changes status; settled purchases absorb
    /// duplicate or late reports without regressing. The payment intent id
    /// is recorded whenever it becomes known, including on duplicates.
    ///
    /// Returns true if the status changed.
    pub fn apply_gateway_outcome(&mut self, outcome: GatewayOutcome) -> bool {
        match outcome {
            GatewayOutcome::Paid { payment_intent } => {
                if let Some(intent) = payment_intent {
                    if self.payment_intent_id.is_none() {
                        self.payment_intent_id = Some(intent);
                        self.touch();
                    }
                }
                if self.status == PurchaseStatus::Pending {
                    self.set_status(PurchaseStatus::Completed);
                    true
                } else {
                    false
                }
            }
            GatewayOutcome::Failed { reason } => {
                if self.status == PurchaseStatus::Pending {
                    self.events.push(PaymentEvent::FailureReason {
                        reason,
                        at: Timestamp::now(),
                    });
                    self.set_status(PurchaseStatus::Failed);
                    true
                } else {
                    false
                }
            }
            GatewayOutcome::StillPending => false,
        }
    }

    /// Records an explicit user cancellation: a pending purchase becomes
    /// `Failed` with a cancellation marker. A purchase the webhook already
    /// settled is left untouched.
    ///
    /// Returns true if the status changed.
    pub fn cancel(&mut self) -> bool {
        if self.status != PurchaseStatus::Pending {
            return false;
        }
        self.events.push(PaymentEvent::CancellationMarker {
            at: Timestamp::now(),
        });
        self.set_status(PurchaseStatus::Failed);
        true
    }

    /// Admin override: unconditionally overwrites the status (any
    /// transition permitted) and appends an audit entry.
    pub fn admin_override(
        &mut self,
        admin_id: UserId,
        status: PurchaseStatus,
        note: Option<String>,
    ) {
        self.events.push(PaymentEvent::AdminOverride {
            admin_id,
            status,
            note,
            at: Timestamp::now(),
        });
        self.status = status;
        self.touch();
    }

    fn set_status(&mut self, to: PurchaseStatus) {
        self.events.push(PaymentEvent::StatusUpdate {
            from: self.status,
            to,
            at: Timestamp::now(),
        });
        self.status = to;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(minor: i64) -> Money {
        Money::from_minor(minor).unwrap()
    }

    fn pending_purchase() -> Purchase {
        Purchase::initiate(UserId::new(), PackageId::new(), money(12000))
    }

    fn status_updates(purchase: &Purchase) -> Vec<(PurchaseStatus, PurchaseStatus)> {
        purchase
            .events
            .iter()
            .filter_map(|e| match e {
                PaymentEvent::StatusUpdate { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    // ══════════════════════════════════════════════════════════════
    // Initiation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn initiate_creates_pending_with_amount_snapshot() {
        let purchase = pending_purchase();

        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert_eq!(purchase.amount, money(12000));
        assert!(purchase.checkout_session_id.is_none());
        assert!(purchase.events.is_empty());
        assert_eq!(purchase.version, 0);
    }

    #[test]
    fn record_checkout_session_stores_id_and_logs() {
        let mut purchase = pending_purchase();
        purchase.record_checkout_session("cs_test_abc");

        assert_eq!(purchase.checkout_session_id.as_deref(), Some("cs_test_abc"));
        assert!(matches!(
            purchase.events.last(),
            Some(PaymentEvent::CheckoutSessionCreated { session_id, .. }) if session_id == "cs_test_abc"
        ));
        assert_eq!(purchase.status, PurchaseStatus::Pending);
    }

    #[test]
    fn initiation_failure_marks_failed_with_reason() {
        let mut purchase = pending_purchase();
        purchase.mark_initiation_failed("gateway timeout");

        assert_eq!(purchase.status, PurchaseStatus::Failed);
        assert!(purchase.events.iter().any(|e| matches!(
            e,
            PaymentEvent::FailureReason { reason, .. } if reason == "gateway timeout"
        )));
    }

    // ══════════════════════════════════════════════════════════════
    // Gateway Outcome Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn paid_outcome_completes_pending_purchase() {
        let mut purchase = pending_purchase();

        let changed = purchase.apply_gateway_outcome(GatewayOutcome::Paid {
            payment_intent: Some("pi_123".to_string()),
        });

        assert!(changed);
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert_eq!(purchase.payment_intent_id.as_deref(), Some("pi_123"));
        assert_eq!(
            status_updates(&purchase),
            vec![(PurchaseStatus::Pending, PurchaseStatus::Completed)]
        );
    }

    #[test]
    fn duplicate_paid_outcome_is_idempotent() {
        let mut purchase = pending_purchase();
        purchase.apply_gateway_outcome(GatewayOutcome::Paid {
            payment_intent: Some("pi_123".to_string()),
        });

        let changed = purchase.apply_gateway_outcome(GatewayOutcome::Paid {
            payment_intent: Some("pi_123".to_string()),
        });

        assert!(!changed);
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        // Exactly one status transition recorded.
        assert_eq!(status_updates(&purchase).len(), 1);
    }

    #[test]
    fn failed_outcome_records_reason() {
        let mut purchase = pending_purchase();

        let changed = purchase.apply_gateway_outcome(GatewayOutcome::Failed {
            reason: "Unknown".to_string(),
        });

        assert!(changed);
        assert_eq!(purchase.status, PurchaseStatus::Failed);
        assert!(purchase.events.iter().any(|e| matches!(
            e,
            PaymentEvent::FailureReason { reason, .. } if reason == "Unknown"
        )));
    }

    #[test]
    fn completed_purchase_absorbs_late_failure_report() {
        let mut purchase = pending_purchase();
        purchase.apply_gateway_outcome(GatewayOutcome::Paid { payment_intent: None });

        let changed = purchase.apply_gateway_outcome(GatewayOutcome::Failed {
            reason: "late delivery".to_string(),
        });

        assert!(!changed);
        assert_eq!(purchase.status, PurchaseStatus::Completed);
    }

    #[test]
    fn failed_purchase_absorbs_late_paid_report_but_keeps_intent() {
        let mut purchase = pending_purchase();
        purchase.cancel();

        let changed = purchase.apply_gateway_outcome(GatewayOutcome::Paid {
            payment_intent: Some("pi_late".to_string()),
        });

        assert!(!changed);
        assert_eq!(purchase.status, PurchaseStatus::Failed);
        // The transaction id is still worth keeping for the audit trail.
        assert_eq!(purchase.payment_intent_id.as_deref(), Some("pi_late"));
    }

    #[test]
    fn still_pending_outcome_changes_nothing() {
        let mut purchase = pending_purchase();
        let changed = purchase.apply_gateway_outcome(GatewayOutcome::StillPending);

        assert!(!changed);
        assert_eq!(purchase.status, PurchaseStatus::Pending);
    }

    #[test]
    fn amount_snapshot_survives_the_whole_lifecycle() {
        let mut purchase = Purchase::initiate(UserId::new(), PackageId::new(), money(12000));
        purchase.record_checkout_session("cs_1");
        purchase.record_gateway_snapshot(serde_json::json!({
            "id": "cs_1",
            // Gateway reports a different "current" price; the snapshot
            // must not move.
            "amount_total": 99900,
        }));
        purchase.apply_gateway_outcome(GatewayOutcome::Paid {
            payment_intent: Some("pi_1".to_string()),
        });

        assert_eq!(purchase.amount, money(12000));
    }

    // ══════════════════════════════════════════════════════════════
    // Cancellation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn cancel_fails_pending_purchase_with_marker() {
        let mut purchase = pending_purchase();

        assert!(purchase.cancel());
        assert_eq!(purchase.status, PurchaseStatus::Failed);
        assert!(purchase
            .events
            .iter()
            .any(|e| matches!(e, PaymentEvent::CancellationMarker { .. })));
    }

    #[test]
    fn cancel_after_completion_is_a_no_op() {
        let mut purchase = pending_purchase();
        purchase.apply_gateway_outcome(GatewayOutcome::Paid { payment_intent: None });

        assert!(!purchase.cancel());
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert!(!purchase
            .events
            .iter()
            .any(|e| matches!(e, PaymentEvent::CancellationMarker { .. })));
    }

    // ══════════════════════════════════════════════════════════════
    // Admin Override Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn admin_override_refunds_completed_purchase() {
        let mut purchase = pending_purchase();
        purchase.apply_gateway_outcome(GatewayOutcome::Paid { payment_intent: None });

        let admin = UserId::new();
        purchase.admin_override(admin, PurchaseStatus::Refunded, Some("customer request".into()));

        assert_eq!(purchase.status, PurchaseStatus::Refunded);
        assert!(purchase.events.iter().any(|e| matches!(
            e,
            PaymentEvent::AdminOverride { admin_id, status: PurchaseStatus::Refunded, note: Some(n), .. }
                if *admin_id == admin && n == "customer request"
        )));
    }

    #[test]
    fn admin_override_permits_any_transition() {
        let mut purchase = pending_purchase();
        purchase.cancel();
        assert_eq!(purchase.status, PurchaseStatus::Failed);

        // Admins may resurrect a failed purchase back to pending.
        purchase.admin_override(UserId::new(), PurchaseStatus::Pending, None);
        assert_eq!(purchase.status, PurchaseStatus::Pending);
    }
}
