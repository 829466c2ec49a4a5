//! Purchase status state machine.
//!
//! Defines the payment lifecycle states and the transitions the automatic
//! reconciliation paths are allowed to make. Admin overrides bypass the
//! machine deliberately (see `Purchase::admin_override`).

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Payment lifecycle status of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Checkout initiated, payment outcome unknown.
    Pending,

    /// Payment confirmed by the gateway.
    Completed,

    /// Payment failed, was cancelled, or session creation errored.
    Failed,

    /// Completed purchase refunded by an admin.
    Refunded,
}

impl PurchaseStatus {
    /// Returns true for states the automatic reconciliation paths never
    /// leave: `Failed` and `Refunded` change only via admin override.
    pub fn is_settled(&self) -> bool {
        matches!(self, PurchaseStatus::Failed | PurchaseStatus::Refunded)
    }
}

impl StateMachine for PurchaseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PurchaseStatus::*;
        matches!(
            (self, target),
            // From PENDING - either reconciliation path settles it
            (Pending, Completed)
                | (Pending, Failed)
            // From COMPLETED - refund is an explicit admin action
                | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PurchaseStatus::*;
        match self {
            Pending => vec![Completed, Failed],
            Completed => vec![Refunded],
            Failed => vec![],
            Refunded => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_complete() {
        let result = PurchaseStatus::Pending.transition_to(PurchaseStatus::Completed);
        assert_eq!(result, Ok(PurchaseStatus::Completed));
    }

    #[test]
    fn pending_can_fail() {
        let result = PurchaseStatus::Pending.transition_to(PurchaseStatus::Failed);
        assert_eq!(result, Ok(PurchaseStatus::Failed));
    }

    #[test]
    fn completed_can_be_refunded() {
        let result = PurchaseStatus::Completed.transition_to(PurchaseStatus::Refunded);
        assert_eq!(result, Ok(PurchaseStatus::Refunded));
    }

    #[test]
    fn completed_cannot_regress_to_pending() {
        assert!(!PurchaseStatus::Completed.can_transition_to(&PurchaseStatus::Pending));
        assert!(PurchaseStatus::Completed
            .transition_to(PurchaseStatus::Pending)
            .is_err());
    }

    #[test]
    fn failed_is_terminal_for_automatic_paths() {
        assert!(PurchaseStatus::Failed.is_terminal());
        assert!(PurchaseStatus::Failed.is_settled());
    }

    #[test]
    fn refunded_is_terminal() {
        assert!(PurchaseStatus::Refunded.is_terminal());
        assert!(PurchaseStatus::Refunded.is_settled());
    }

    #[test]
    fn pending_cannot_jump_to_refunded() {
        assert!(PurchaseStatus::Pending
            .transition_to(PurchaseStatus::Refunded)
            .is_err());
    }

    #[test]
    fn valid_transitions_are_consistent_with_can_transition_to() {
        for status in [
            PurchaseStatus::Pending,
            PurchaseStatus::Completed,
            PurchaseStatus::Failed,
            PurchaseStatus::Refunded,
        ] {
            for valid_target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&valid_target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    valid_target
                );
            }
        }
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::Refunded).unwrap(),
            "\"refunded\""
        );
    }
}
