//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// Where a checkout session currently stands.
///
/// State transitions:
/// ```text
/// Idle ──► LoadingCart ──► CartReady ──► ApplyingCoupon ──┬──► CartReady
///                              │                          └──► CouponError
///                              └──► CreatingOrder ──► AwaitingGatewayResult ──► Verifying ──┬──► Success
///                                                                                          └──► Failed
/// ```
///
/// A dismissed gateway returns `AwaitingGatewayResult` to `CartReady`. A
/// failed load returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Nothing loaded yet, or the last load failed.
    #[default]
    Idle,

    /// The checkout summary is being fetched.
    LoadingCart,

    /// A summary (or the absence of a cart) is known.
    CartReady,

    /// A coupon code is being validated.
    ApplyingCoupon,

    /// The last coupon was rejected.
    CouponError,

    /// The backend is creating a payment order.
    CreatingOrder,

    /// The gateway widget is open.
    AwaitingGatewayResult,

    /// The gateway response is being verified.
    Verifying,

    /// Payment verified and enrollment granted (terminal for the payment).
    Success,

    /// Verification failed (terminal for the payment).
    Failed,
}

impl CheckoutState {
    /// Returns true while an order-creation/verification cycle is running.
    pub fn is_payment_in_flight(&self) -> bool {
        matches!(
            self,
            CheckoutState::CreatingOrder
                | CheckoutState::AwaitingGatewayResult
                | CheckoutState::Verifying
        )
    }

    /// Returns true if a coupon may be applied or removed.
    pub fn can_change_coupon(&self) -> bool {
        matches!(
            self,
            CheckoutState::CartReady
                | CheckoutState::CouponError
                | CheckoutState::Success
                | CheckoutState::Failed
        )
    }

    /// Returns true if the payment cycle has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Success | CheckoutState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "Idle",
            CheckoutState::LoadingCart => "LoadingCart",
            CheckoutState::CartReady => "CartReady",
            CheckoutState::ApplyingCoupon => "ApplyingCoupon",
            CheckoutState::CouponError => "CouponError",
            CheckoutState::CreatingOrder => "CreatingOrder",
            CheckoutState::AwaitingGatewayResult => "AwaitingGatewayResult",
            CheckoutState::Verifying => "Verifying",
            CheckoutState::Success => "Success",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coupon state shown next to the coupon input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CouponStatus {
    /// No coupon active.
    #[default]
    None,

    /// The backend reports this code as applied.
    Applied(String),

    /// The backend rejected `code` with `message`.
    Rejected { code: String, message: String },
}

impl CouponStatus {
    /// The active coupon code, if any.
    pub fn applied(&self) -> Option<&str> {
        match self {
            CouponStatus::Applied(code) => Some(code),
            _ => None,
        }
    }

    /// The rejection message, if the last attempt failed.
    pub fn rejection(&self) -> Option<&str> {
        match self {
            CouponStatus::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CheckoutState; 10] = [
        CheckoutState::Idle,
        CheckoutState::LoadingCart,
        CheckoutState::CartReady,
        CheckoutState::ApplyingCoupon,
        CheckoutState::CouponError,
        CheckoutState::CreatingOrder,
        CheckoutState::AwaitingGatewayResult,
        CheckoutState::Verifying,
        CheckoutState::Success,
        CheckoutState::Failed,
    ];

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(CheckoutState::default(), CheckoutState::Idle);
    }

    #[test]
    fn test_payment_in_flight() {
        let in_flight: Vec<_> = ALL.iter().filter(|s| s.is_payment_in_flight()).collect();
        assert_eq!(
            in_flight,
            vec![
                &CheckoutState::CreatingOrder,
                &CheckoutState::AwaitingGatewayResult,
                &CheckoutState::Verifying,
            ]
        );
    }

    #[test]
    fn test_can_change_coupon() {
        assert!(CheckoutState::CartReady.can_change_coupon());
        assert!(CheckoutState::CouponError.can_change_coupon());
        assert!(!CheckoutState::Idle.can_change_coupon());
        assert!(!CheckoutState::ApplyingCoupon.can_change_coupon());
        assert!(!CheckoutState::AwaitingGatewayResult.can_change_coupon());
    }

    #[test]
    fn test_in_flight_states_block_coupon_changes() {
        for state in ALL.iter().filter(|s| s.is_payment_in_flight()) {
            assert!(!state.can_change_coupon(), "{state} allows coupon changes");
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(CheckoutState::Success.is_terminal());
        assert!(CheckoutState::Failed.is_terminal());
        assert!(!CheckoutState::CartReady.is_terminal());
        assert!(!CheckoutState::Verifying.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CheckoutState::Idle.to_string(), "Idle");
        assert_eq!(
            CheckoutState::AwaitingGatewayResult.to_string(),
            "AwaitingGatewayResult"
        );
        assert_eq!(CheckoutState::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_coupon_status_accessors() {
        assert_eq!(CouponStatus::None.applied(), None);
        assert_eq!(CouponStatus::Applied("SAVE".into()).applied(), Some("SAVE"));
        let rejected = CouponStatus::Rejected {
            code: "OLD".into(),
            message: "Invalid or expired coupon.".into(),
        };
        assert_eq!(rejected.applied(), None);
        assert_eq!(rejected.rejection(), Some("Invalid or expired coupon."));
    }
}
