//! Payment gateway trait and a scripted implementation.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use backend::GatewayResponse;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::GatewayError;

/// Customer details pre-filled in the gateway widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
}

/// Configuration handed to the gateway widget when it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayOptions {
    /// Public key identifier of the merchant account.
    pub key: String,
    /// Payable amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub prefill: Prefill,
}

/// How the user left the gateway widget.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome {
    /// The gateway reported a payment; its response must be verified.
    Completed(GatewayResponse),

    /// The user closed the widget without paying.
    Dismissed,
}

/// A third-party payment widget.
///
/// `open` resolves once the user either completes the payment or dismisses
/// the widget.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens the widget for an order.
    async fn open(&self, options: &GatewayOptions) -> Result<GatewayOutcome, GatewayError>;
}

#[async_trait]
impl<G: PaymentGateway + ?Sized> PaymentGateway for Arc<G> {
    async fn open(&self, options: &GatewayOptions) -> Result<GatewayOutcome, GatewayError> {
        (**self).open(options).await
    }
}

#[derive(Debug)]
enum Script {
    Approve,
    Respond(GatewayResponse),
    Dismiss,
    Fail(String),
}

#[derive(Debug, Default)]
struct ScriptedState {
    script: VecDeque<Script>,
    opened: Vec<GatewayOptions>,
    next_payment: u32,
}

/// Gateway that plays back queued outcomes, for tests.
///
/// With nothing queued it approves the payment for whatever order it was
/// opened with.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedGateway {
    /// Creates a gateway that approves every payment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an approval for the next opening.
    pub async fn approve_next(&self) {
        self.state.lock().await.script.push_back(Script::Approve);
    }

    /// Queues a fixed response for the next opening.
    pub async fn respond_next(&self, response: GatewayResponse) {
        self.state
            .lock()
            .await
            .script
            .push_back(Script::Respond(response));
    }

    /// Queues a dismissal for the next opening.
    pub async fn dismiss_next(&self) {
        self.state.lock().await.script.push_back(Script::Dismiss);
    }

    /// Queues a failure to open.
    pub async fn fail_next(&self, reason: &str) {
        self.state
            .lock()
            .await
            .script
            .push_back(Script::Fail(reason.to_string()));
    }

    /// Options of every opening so far.
    pub async fn opened(&self) -> Vec<GatewayOptions> {
        self.state.lock().await.opened.clone()
    }

    /// Number of times the widget was opened.
    pub async fn open_count(&self) -> usize {
        self.state.lock().await.opened.len()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn open(&self, options: &GatewayOptions) -> Result<GatewayOutcome, GatewayError> {
        let mut state = self.state.lock().await;
        state.opened.push(options.clone());

        match state.script.pop_front().unwrap_or(Script::Approve) {
            Script::Approve => {
                state.next_payment += 1;
                Ok(GatewayOutcome::Completed(GatewayResponse::new(
                    serde_json::json!({
                        "razorpay_payment_id": format!("pay_{:04}", state.next_payment),
                        "razorpay_order_id": options.order_id,
                        "razorpay_signature": "scripted",
                    }),
                )))
            }
            Script::Respond(response) => Ok(GatewayOutcome::Completed(response)),
            Script::Dismiss => Ok(GatewayOutcome::Dismissed),
            Script::Fail(reason) => Err(GatewayError::Unavailable(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(order_id: &str) -> GatewayOptions {
        GatewayOptions {
            key: "key".into(),
            amount: 49950,
            currency: "INR".into(),
            name: "E-Learning Platform".into(),
            description: "Enrollment for courses".into(),
            order_id: order_id.into(),
            prefill: Prefill::default(),
        }
    }

    #[tokio::test]
    async fn test_default_approves_for_order() {
        let gateway = ScriptedGateway::new();
        let outcome = gateway.open(&options("order_1")).await.unwrap();

        let GatewayOutcome::Completed(response) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(response.order_id(), Some("order_1"));
        assert_eq!(response.payment_id(), Some("pay_0001"));
        assert_eq!(gateway.open_count().await, 1);
    }

    #[tokio::test]
    async fn test_script_is_played_in_order() {
        let gateway = ScriptedGateway::new();
        gateway.dismiss_next().await;
        gateway.fail_next("script blocked").await;

        let first = gateway.open(&options("order_1")).await.unwrap();
        assert_eq!(first, GatewayOutcome::Dismissed);

        let second = gateway.open(&options("order_2")).await;
        assert!(matches!(second, Err(GatewayError::Unavailable(_))));

        let third = gateway.open(&options("order_3")).await.unwrap();
        assert!(matches!(third, GatewayOutcome::Completed(_)));

        let opened = gateway.opened().await;
        assert_eq!(opened.len(), 3);
        assert_eq!(opened[2].order_id, "order_3");
    }

    #[test]
    fn test_options_serialize_with_widget_field_names() {
        let json = serde_json::to_value(options("order_9")).unwrap();
        assert_eq!(json["order_id"], "order_9");
        assert_eq!(json["amount"], 49950);
        assert_eq!(json["prefill"]["email"], "");
    }
}
