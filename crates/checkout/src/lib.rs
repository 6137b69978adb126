//! Checkout and payment coordination.
//!
//! Drives a user from a confirmed cart to an enrollment:
//! 1. Load the coupon-aware checkout summary
//! 2. Optionally apply (or remove) a coupon
//! 3. Create a payment order on the backend
//! 4. Open the payment gateway widget
//! 5. Verify the gateway's response and reload the cart
//!
//! Nothing is retried automatically. Every failure ends the current
//! operation and leaves the coordinator ready for the user to start again.

pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod state;

pub use coordinator::{CheckoutCoordinator, CheckoutSettings, PaymentMethod, PaymentOutcome};
pub use error::{CheckoutError, GatewayError, Result};
pub use gateway::{GatewayOptions, GatewayOutcome, PaymentGateway, Prefill, ScriptedGateway};
pub use state::{CheckoutState, CouponStatus};
