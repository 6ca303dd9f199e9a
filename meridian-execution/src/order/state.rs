use serde::{Deserialize, Serialize};

/// Order lifecycle state (§3): `NEW → PENDING_SUBMIT → SUBMITTED →
/// (PARTIALLY_FILLED|CANCELED|REJECTED|EXPIRED|FILLED)`. Terminal states are immutable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum OrderStatus {
    New,
    PendingSubmit,
    Submitted,
    PartiallyFilled,
    Canceled,
    Rejected,
    Expired,
    Filled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Rejected | Self::Expired | Self::Filled
        )
    }

    /// Returns `true` if a transition from `self` to `next` is permitted by the state machine.
    ///
    /// Re-applying the current state (idempotent duplicate update) is always permitted and is a
    /// no-op from the caller's perspective.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Self::New, Self::PendingSubmit)
                | (Self::New, Self::Canceled)
                | (Self::PendingSubmit, Self::Submitted)
                | (Self::PendingSubmit, Self::Rejected)
                | (Self::Submitted, Self::PartiallyFilled)
                | (Self::Submitted, Self::Canceled)
                | (Self::Submitted, Self::Rejected)
                | (Self::Submitted, Self::Expired)
                | (Self::Submitted, Self::Filled)
                | (Self::PartiallyFilled, Self::PartiallyFilled)
                | (Self::PartiallyFilled, Self::Canceled)
                | (Self::PartiallyFilled, Self::Expired)
                | (Self::PartiallyFilled, Self::Filled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_reject_further_transitions() {
        assert!(!OrderStatus::Filled.can_transition_to(OrderStatus::Canceled));
        assert!(!OrderStatus::Rejected.can_transition_to(OrderStatus::Submitted));
    }

    #[test]
    fn happy_path_is_permitted() {
        assert!(OrderStatus::New.can_transition_to(OrderStatus::PendingSubmit));
        assert!(OrderStatus::PendingSubmit.can_transition_to(OrderStatus::Submitted));
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::PartiallyFilled));
        assert!(OrderStatus::PartiallyFilled.can_transition_to(OrderStatus::Filled));
    }

    #[test]
    fn duplicate_update_is_a_idempotent_no_op() {
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::Submitted));
    }

    #[test]
    fn skipping_pending_submit_is_rejected() {
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Submitted));
    }
}
