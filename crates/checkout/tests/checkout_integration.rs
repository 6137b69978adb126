//! Integration tests for the checkout coordinator.

use backend::{AuthToken, CartApi, InMemoryBackend, Operation};
use checkout::{
    CheckoutCoordinator, CheckoutError, CheckoutSettings, CheckoutState, CouponStatus,
    PaymentOutcome, ScriptedGateway,
};
use common::CourseId;
use domain::{Amount, NoticeLevel};

type TestCoordinator = CheckoutCoordinator<InMemoryBackend, ScriptedGateway>;

struct TestHarness {
    checkout: TestCoordinator,
    backend: InMemoryBackend,
    gateway: ScriptedGateway,
    token: AuthToken,
    course_id: CourseId,
}

fn rupees(value: i64) -> Amount {
    Amount::from_parts(value * 100, 2)
}

impl TestHarness {
    /// One user with one course of the given price in the cart.
    async fn with_price(price: Amount) -> Self {
        let backend = InMemoryBackend::new();
        let token = backend.seed_user("Asha", "Rao", "asha@example.com").await;
        let course_id = backend.seed_course("Rust in Production", price).await;
        backend.add_to_cart(&token, course_id).await.unwrap();
        backend.seed_coupon("SAVE100", rupees(100)).await;
        backend.seed_coupon("SAVE150", rupees(150)).await;

        let gateway = ScriptedGateway::new();
        let settings = CheckoutSettings {
            key_id: "rzp_test_key".to_string(),
            ..CheckoutSettings::default()
        };
        let checkout = CheckoutCoordinator::new(
            backend.clone(),
            gateway.clone(),
            settings,
            Some(token.clone()),
        );

        Self {
            checkout,
            backend,
            gateway,
            token,
            course_id,
        }
    }

    async fn new() -> Self {
        let mut h = Self::with_price(rupees(1000)).await;
        h.checkout.load().await.unwrap();
        h
    }

    fn error_notices(&mut self) -> Vec<String> {
        self.checkout
            .take_notices()
            .into_iter()
            .filter(|n| n.is_error())
            .map(|n| n.message)
            .collect()
    }
}

#[tokio::test]
async fn test_happy_path_enrolls_and_reloads() {
    let mut h = TestHarness::new().await;
    assert!(h.checkout.can_pay());

    let outcome = h.checkout.initiate_payment().await.unwrap();
    assert!(matches!(outcome, PaymentOutcome::Enrolled(_)));
    assert_eq!(h.checkout.state(), CheckoutState::Success);
    assert!(h.backend.is_enrolled(&h.token, h.course_id).await);

    let summary = h.checkout.summary().unwrap();
    assert_eq!(summary.checkout_price, Amount::zero());
    assert!(!h.checkout.can_pay());

    let notices = h.checkout.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(
        notices[0].message,
        "Payment successful! You've been enrolled in your courses."
    );
    assert_eq!(h.backend.call_count(Operation::CreateOrder).await, 1);
    assert_eq!(h.backend.call_count(Operation::VerifyPayment).await, 1);
}

#[tokio::test]
async fn test_gateway_receives_order_and_minor_units() {
    let mut h = TestHarness::with_price(Amount::from_parts(49950, 2)).await;
    h.checkout.load().await.unwrap();
    h.checkout.initiate_payment().await.unwrap();

    let opened = h.gateway.opened().await;
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].amount, 49950);
    assert_eq!(opened[0].key, "rzp_test_key");
    assert!(opened[0].order_id.starts_with("order_"));
}

#[tokio::test]
async fn test_half_paisa_rounds_up() {
    let mut h = TestHarness::with_price(Amount::from_parts(499505, 3)).await;
    h.checkout.load().await.unwrap();
    h.checkout.initiate_payment().await.unwrap();

    let opened = h.gateway.opened().await;
    assert_eq!(opened[0].amount, 49951);
}

#[tokio::test]
async fn test_applied_coupon_is_reported() {
    let mut h = TestHarness::new().await;
    h.checkout.apply_coupon(" SAVE100 ").await.unwrap();

    assert_eq!(h.checkout.coupon(), &CouponStatus::Applied("SAVE100".into()));
    assert_eq!(h.checkout.coupon_input(), "SAVE100");
    let summary = h.checkout.summary().unwrap();
    assert_eq!(summary.applied_coupon(), Some("SAVE100"));
    assert_eq!(summary.checkout_price, rupees(900));
}

#[tokio::test]
async fn test_second_coupon_replaces_first() {
    let mut h = TestHarness::new().await;
    h.checkout.apply_coupon("SAVE100").await.unwrap();
    h.checkout.apply_coupon("SAVE150").await.unwrap();

    let summary = h.checkout.summary().unwrap();
    assert_eq!(summary.applied_coupon(), Some("SAVE150"));
    assert_eq!(summary.coupon_amount, rupees(150));
    assert_eq!(summary.checkout_price, rupees(850));
}

#[tokio::test]
async fn test_reload_keeps_applied_coupon() {
    let mut h = TestHarness::new().await;
    h.checkout.apply_coupon("SAVE100").await.unwrap();
    h.checkout.load().await.unwrap();

    assert_eq!(h.checkout.summary().unwrap().applied_coupon(), Some("SAVE100"));
}

#[tokio::test]
async fn test_rejected_coupon_resets_to_plain_summary() {
    let plain = TestHarness::new().await;
    let expected = plain.checkout.summary().cloned();

    let mut h = TestHarness::new().await;
    h.checkout.apply_coupon("SAVE100").await.unwrap();
    let err = h.checkout.apply_coupon("EXPIRED").await.unwrap_err();

    assert!(matches!(err, CheckoutError::CouponRejected(_)));
    assert_eq!(err.to_string(), "Invalid or expired coupon.");
    assert_eq!(h.checkout.state(), CheckoutState::CouponError);
    assert_eq!(h.checkout.coupon().rejection(), Some("Invalid or expired coupon."));
    assert_eq!(h.checkout.summary().cloned(), expected);
    assert_eq!(h.error_notices(), vec!["Invalid or expired coupon.".to_string()]);
    // plain load, the apply reload, then the reset reload
    assert_eq!(h.backend.call_count(Operation::CheckoutSummary).await, 3);
}

#[tokio::test]
async fn test_coupon_server_message_is_surfaced() {
    let mut h = TestHarness::new().await;
    h.backend
        .set_failure(Operation::ApplyCoupon, 400, Some("Coupon usage limit reached"))
        .await;

    let err = h.checkout.apply_coupon("SAVE100").await.unwrap_err();
    assert_eq!(err.to_string(), "Coupon usage limit reached");

    h.checkout.set_coupon_input("SAVE150");
    assert_eq!(h.checkout.coupon(), &CouponStatus::None);
}

#[tokio::test]
async fn test_remove_coupon_reloads_without_code() {
    let mut h = TestHarness::new().await;
    h.checkout.apply_coupon("SAVE150").await.unwrap();
    h.checkout.remove_coupon().await.unwrap();

    assert_eq!(h.checkout.coupon_input(), "");
    assert_eq!(h.checkout.coupon(), &CouponStatus::None);
    let summary = h.checkout.summary().unwrap();
    assert_eq!(summary.applied_coupon(), None);
    assert_eq!(summary.checkout_price, rupees(1000));
}

#[tokio::test]
async fn test_order_uses_applied_coupon() {
    let mut h = TestHarness::new().await;
    h.checkout.apply_coupon("SAVE150").await.unwrap();
    h.checkout.initiate_payment().await.unwrap();

    let opened = h.gateway.opened().await;
    assert_eq!(opened[0].amount, 85000);
    assert_eq!(h.checkout.coupon(), &CouponStatus::None);
}

#[tokio::test]
async fn test_dismissal_is_clean() {
    let mut h = TestHarness::new().await;
    h.gateway.dismiss_next().await;

    let outcome = h.checkout.initiate_payment().await.unwrap();
    assert_eq!(outcome, PaymentOutcome::Dismissed);
    assert_eq!(h.checkout.state(), CheckoutState::CartReady);
    assert!(h.checkout.can_pay());
    assert!(h.checkout.take_notices().is_empty());
    assert_eq!(h.backend.call_count(Operation::VerifyPayment).await, 0);
    assert!(!h.backend.is_enrolled(&h.token, h.course_id).await);
}

#[tokio::test]
async fn test_pay_again_after_dismissal() {
    let mut h = TestHarness::new().await;
    h.gateway.dismiss_next().await;
    h.checkout.initiate_payment().await.unwrap();

    let outcome = h.checkout.initiate_payment().await.unwrap();
    assert!(matches!(outcome, PaymentOutcome::Enrolled(_)));
    assert_eq!(h.backend.call_count(Operation::CreateOrder).await, 2);
}

#[tokio::test]
async fn test_verification_failure_never_recreates_order() {
    let mut h = TestHarness::new().await;
    h.backend
        .set_failure(Operation::VerifyPayment, 500, Some("Signature mismatch"))
        .await;

    let err = h.checkout.initiate_payment().await.unwrap_err();
    assert!(matches!(err, CheckoutError::Verification(_)));
    assert_eq!(
        err.to_string(),
        "Payment verification failed. Please contact support. Error: Signature mismatch"
    );
    assert_eq!(h.checkout.state(), CheckoutState::Failed);
    assert!(!h.checkout.state().is_payment_in_flight());
    assert_eq!(h.backend.call_count(Operation::CreateOrder).await, 1);
    assert_eq!(h.backend.call_count(Operation::VerifyPayment).await, 1);
    assert_eq!(h.error_notices().len(), 1);
}

#[tokio::test]
async fn test_order_failure_keeps_gateway_closed() {
    let mut h = TestHarness::new().await;
    h.backend
        .set_failure(Operation::CreateOrder, 500, Some("Gateway account suspended"))
        .await;

    let err = h.checkout.initiate_payment().await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderCreation(_)));
    assert_eq!(
        err.to_string(),
        "Error creating order: Failed to create payment order. Status: 500. Response: Gateway account suspended"
    );
    assert_eq!(h.checkout.state(), CheckoutState::CartReady);
    assert_eq!(h.gateway.open_count().await, 0);
    assert_eq!(h.error_notices().len(), 1);
}

#[tokio::test]
async fn test_missing_order_id_aborts() {
    let mut h = TestHarness::new().await;
    h.backend.set_omit_order_id(true).await;

    let err = h.checkout.initiate_payment().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error creating order: Backend did not return a valid order ID."
    );
    assert!(h.checkout.can_pay());
    assert_eq!(h.gateway.open_count().await, 0);
}

#[tokio::test]
async fn test_gateway_unavailable_resets_in_flight() {
    let mut h = TestHarness::new().await;
    h.gateway.fail_next("script not loaded").await;

    let err = h.checkout.initiate_payment().await.unwrap_err();
    assert!(matches!(err, CheckoutError::GatewayUnavailable(_)));
    assert_eq!(h.checkout.state(), CheckoutState::CartReady);
    assert_eq!(
        h.error_notices(),
        vec!["Could not initialize payment gateway. Please try again.".to_string()]
    );
}

#[tokio::test]
async fn test_pay_now_blocked_without_cart() {
    let backend = InMemoryBackend::new();
    let token = backend.seed_user("Ravi", "Iyer", "ravi@example.com").await;
    let gateway = ScriptedGateway::new();
    let mut checkout = CheckoutCoordinator::new(
        backend.clone(),
        gateway.clone(),
        CheckoutSettings::default(),
        Some(token),
    );
    checkout.load().await.unwrap();

    assert!(!checkout.can_pay());
    let err = checkout.initiate_payment().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot process payment. Please ensure you are logged in and have items in your cart."
    );
    assert_eq!(backend.call_count(Operation::CreateOrder).await, 0);
    assert_eq!(gateway.open_count().await, 0);
}
