//! Payment order and gateway response payloads.

use serde::{Deserialize, Serialize};

/// An order created by the backend for the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    /// Opaque identifier used to open the gateway widget.
    pub id: String,
    /// Amount in minor units, when the backend reports it.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// The payload the gateway hands to its success handler.
///
/// Forwarded verbatim to the verification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayResponse(serde_json::Value);

impl GatewayResponse {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The raw payload.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// The order id echoed back by the gateway, if present.
    pub fn order_id(&self) -> Option<&str> {
        self.0.get("razorpay_order_id").and_then(|v| v.as_str())
    }

    /// The gateway's payment id, if present.
    pub fn payment_id(&self) -> Option<&str> {
        self.0.get("razorpay_payment_id").and_then(|v| v.as_str())
    }
}
