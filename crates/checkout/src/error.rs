//! Checkout error types.

use backend::BackendError;
use domain::DomainError;
use thiserror::Error;

use crate::state::CheckoutState;

/// Errors that can end a checkout operation.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No session token is available.
    #[error("Please log in to complete your checkout.")]
    NotAuthenticated,

    /// The checkout summary could not be loaded.
    #[error("{0}")]
    Load(String),

    /// The backend rejected a coupon code.
    #[error("{0}")]
    CouponRejected(String),

    /// Payment was requested while its preconditions did not hold.
    #[error("{0}")]
    PaymentBlocked(String),

    /// No order was obtained; the gateway never opened.
    #[error("Error creating order: {0}")]
    OrderCreation(String),

    /// The gateway reported a payment the backend would not verify.
    #[error("{0}")]
    Verification(String),

    /// The gateway widget could not be opened.
    #[error("Could not initialize payment gateway. Please try again. ({0})")]
    GatewayUnavailable(#[from] GatewayError),

    /// The operation is not allowed in the current state.
    #[error("Invalid checkout state: expected {expected}, actual {actual}")]
    InvalidState {
        expected: &'static str,
        actual: CheckoutState,
    },

    /// Local validation failed before any request was made.
    #[error("{0}")]
    Validation(#[from] DomainError),

    /// Backend error outside the flows above.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Failures reported by a payment gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway client is not loaded or not configured.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway produced a response that could not be read.
    #[error("malformed gateway response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Reading the gateway's answer failed.
    #[error("gateway I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
