//! Checkout coordinator: cart summary, coupons and the payment handshake.

use backend::{AuthToken, BackendError, CartApi, GatewayResponse, PaymentApi, TokenSource};
use common::{FlowId, preview};
use domain::{CartLookup, CheckoutSummary, DomainError, Notice};

use crate::error::{CheckoutError, Result};
use crate::gateway::{GatewayOptions, GatewayOutcome, PaymentGateway, Prefill};
use crate::state::{CheckoutState, CouponStatus};

const PAYMENT_BLOCKED: &str =
    "Cannot process payment. Please ensure you are logged in and have items in your cart.";
const PAYMENT_SUCCESS: &str = "Payment successful! You've been enrolled in your courses.";
const LOAD_NETWORK_ERROR: &str = "A network error occurred.";
const COUPON_REJECTED: &str = "Invalid or expired coupon.";
const VERIFY_NETWORK_ERROR: &str = "A network error occurred during payment verification.";

/// Merchant settings used to configure the gateway widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub key_id: String,
    pub currency: String,
    pub merchant_name: String,
    pub description: String,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            currency: "INR".to_string(),
            merchant_name: "E-Learning Platform".to_string(),
            description: "Enrollment for courses".to_string(),
        }
    }
}

/// Payment methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// UPI, cards and netbanking through the gateway widget.
    Gateway,
}

/// How a payment attempt ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Verified; the backend's confirmation text is attached.
    Enrolled(String),

    /// The user closed the widget.
    Dismissed,
}

/// Orchestrates one checkout session.
///
/// Operations take `&mut self`, so a session never has two mutating
/// requests outstanding. Every surfaced message is also queued as a
/// [`Notice`] for the front-end to display.
pub struct CheckoutCoordinator<B, G>
where
    B: CartApi + PaymentApi,
    G: PaymentGateway,
{
    backend: B,
    gateway: G,
    settings: CheckoutSettings,
    tokens: TokenSource,
    flow_id: FlowId,
    state: CheckoutState,
    summary: Option<CheckoutSummary>,
    coupon: CouponStatus,
    coupon_input: String,
    payment_method: Option<PaymentMethod>,
    load_error: Option<String>,
    notices: Vec<Notice>,
}

impl<B, G> CheckoutCoordinator<B, G>
where
    B: CartApi + PaymentApi,
    G: PaymentGateway,
{
    /// Creates a coordinator. The gateway payment method is preselected.
    ///
    /// The token is read from `tokens` on every operation.
    pub fn new(
        backend: B,
        gateway: G,
        settings: CheckoutSettings,
        tokens: impl Into<TokenSource>,
    ) -> Self {
        Self {
            backend,
            gateway,
            settings,
            tokens: tokens.into(),
            flow_id: FlowId::new(),
            state: CheckoutState::Idle,
            summary: None,
            coupon: CouponStatus::None,
            coupon_input: String::new(),
            payment_method: Some(PaymentMethod::Gateway),
            load_error: None,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    /// The last loaded summary. `None` means no cart.
    pub fn summary(&self) -> Option<&CheckoutSummary> {
        self.summary.as_ref()
    }

    pub fn coupon(&self) -> &CouponStatus {
        &self.coupon
    }

    pub fn coupon_input(&self) -> &str {
        &self.coupon_input
    }

    /// Page-level message from the last failed load.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_present()
    }

    /// Pins the session token, replacing the current source.
    pub fn set_token(&mut self, token: Option<AuthToken>) {
        self.tokens = TokenSource::fixed(token);
        if !self.tokens.is_present() {
            self.summary = None;
            self.coupon = CouponStatus::None;
            self.state = CheckoutState::Idle;
        }
    }

    pub fn select_payment_method(&mut self, method: Option<PaymentMethod>) {
        self.payment_method = method;
    }

    /// Edits the coupon input, clearing any previous rejection.
    pub fn set_coupon_input(&mut self, input: &str) {
        self.coupon_input = input.to_string();
        if matches!(self.coupon, CouponStatus::Rejected { .. }) {
            self.coupon = CouponStatus::None;
        }
    }

    /// Returns and clears the queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether the "Pay Now" control is enabled.
    ///
    /// Requires a session, a loaded cart, a selected payment method, a
    /// positive payable total and no payment already in flight.
    pub fn can_pay(&self) -> bool {
        self.tokens.is_present()
            && self.payment_method.is_some()
            && !self.state.is_payment_in_flight()
            && self
                .summary
                .as_ref()
                .is_some_and(|s| s.checkout_price.is_positive())
    }

    /// Loads the checkout summary, keeping the applied coupon if any.
    #[tracing::instrument(skip(self), fields(flow_id = %self.flow_id))]
    pub async fn load(&mut self) -> Result<()> {
        let coupon = self.coupon.applied().map(str::to_string);
        self.fetch_summary(coupon.as_deref()).await
    }

    /// Validates `code` and reloads the summary with it applied.
    ///
    /// A new code replaces the active one. On rejection the summary is
    /// reloaded without any coupon.
    #[tracing::instrument(skip(self), fields(flow_id = %self.flow_id))]
    pub async fn apply_coupon(&mut self, code: &str) -> Result<()> {
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(DomainError::Required {
                field: "couponCode",
            }
            .into());
        }
        let token = self.tokens.current().ok_or(CheckoutError::NotAuthenticated)?;
        self.ensure_coupon_change_allowed()?;

        self.coupon_input = code.clone();
        self.state = CheckoutState::ApplyingCoupon;

        match self.backend.apply_coupon(&token, &code).await {
            Ok(()) => {
                tracing::info!(coupon = %code, "coupon accepted");
                self.fetch_summary(Some(&code)).await
            }
            Err(e) => {
                let message = match &e {
                    BackendError::Network(_) => "Failed to apply coupon.".to_string(),
                    other => other.server_message().unwrap_or(COUPON_REJECTED).to_string(),
                };
                tracing::warn!(coupon = %code, error = %e, "coupon rejected");
                metrics::counter!("checkout_coupon_rejected_total").increment(1);

                // Whatever the backend applied before is discarded too.
                if let Err(reload) = self.fetch_summary(None).await {
                    tracing::warn!(error = %reload, "reload after coupon rejection failed");
                } else {
                    self.state = CheckoutState::CouponError;
                }
                self.coupon = CouponStatus::Rejected {
                    code: code.clone(),
                    message: message.clone(),
                };
                self.coupon_input = code;
                self.notices.push(Notice::error(message.clone()));
                Err(CheckoutError::CouponRejected(message))
            }
        }
    }

    /// Clears the coupon input and reloads the summary without a coupon.
    #[tracing::instrument(skip(self), fields(flow_id = %self.flow_id))]
    pub async fn remove_coupon(&mut self) -> Result<()> {
        self.ensure_coupon_change_allowed()?;
        self.coupon_input.clear();
        self.coupon = CouponStatus::None;
        self.fetch_summary(None).await
    }

    /// Runs one order-creation, gateway and verification cycle.
    #[tracing::instrument(skip(self), fields(flow_id = %self.flow_id))]
    pub async fn initiate_payment(&mut self) -> Result<PaymentOutcome> {
        let ready = match (self.tokens.current(), &self.summary) {
            (Some(token), Some(summary))
                if !self.state.is_payment_in_flight() && self.payment_method.is_some() =>
            {
                Some((token, summary.clone()))
            }
            _ => None,
        };
        let Some((token, summary)) = ready else {
            tracing::warn!(state = %self.state, "payment blocked");
            self.notices.push(Notice::warning(PAYMENT_BLOCKED));
            return Err(CheckoutError::PaymentBlocked(PAYMENT_BLOCKED.to_string()));
        };

        metrics::counter!("checkout_payments_initiated_total").increment(1);
        self.state = CheckoutState::CreatingOrder;

        let order_id = match self.create_order(&token, &summary).await {
            Ok(order_id) => order_id,
            Err(message) => {
                self.state = CheckoutState::CartReady;
                metrics::counter!("checkout_payments_failed_total", "stage" => "order")
                    .increment(1);
                let error = CheckoutError::OrderCreation(message);
                self.notices.push(Notice::error(error.to_string()));
                return Err(error);
            }
        };

        let options = self.gateway_options(&summary, order_id)?;
        tracing::info!(order_id = %options.order_id, amount = options.amount, "opening payment gateway");
        self.state = CheckoutState::AwaitingGatewayResult;

        match self.gateway.open(&options).await {
            Ok(GatewayOutcome::Completed(response)) => self.handle_gateway_result(response).await,
            Ok(GatewayOutcome::Dismissed) => {
                self.handle_dismissal();
                Ok(PaymentOutcome::Dismissed)
            }
            Err(e) => {
                tracing::error!(error = %e, "payment gateway failed to open");
                self.state = CheckoutState::CartReady;
                metrics::counter!("checkout_payments_failed_total", "stage" => "gateway")
                    .increment(1);
                let error = CheckoutError::GatewayUnavailable(e);
                self.notices.push(Notice::error(
                    "Could not initialize payment gateway. Please try again.",
                ));
                Err(error)
            }
        }
    }

    /// Verifies a gateway response and reloads the cart on success.
    ///
    /// Only valid while the gateway is open. A failed verification is never
    /// followed by another order creation.
    #[tracing::instrument(skip(self, response), fields(flow_id = %self.flow_id))]
    pub async fn handle_gateway_result(
        &mut self,
        response: GatewayResponse,
    ) -> Result<PaymentOutcome> {
        if self.state != CheckoutState::AwaitingGatewayResult {
            return Err(CheckoutError::InvalidState {
                expected: "AwaitingGatewayResult",
                actual: self.state,
            });
        }
        let token = self.tokens.current().ok_or(CheckoutError::NotAuthenticated)?;
        self.state = CheckoutState::Verifying;

        match self.backend.verify_payment(&token, &response).await {
            Ok(confirmation) => {
                tracing::info!(payment_id = ?response.payment_id(), "payment verified");
                metrics::counter!("checkout_payments_verified_total").increment(1);
                self.notices.push(Notice::success(PAYMENT_SUCCESS));
                self.coupon = CouponStatus::None;
                self.coupon_input.clear();
                if let Err(e) = self.fetch_summary(None).await {
                    tracing::warn!(error = %e, "reload after payment failed");
                }
                self.state = CheckoutState::Success;
                Ok(PaymentOutcome::Enrolled(confirmation))
            }
            Err(e) => {
                let message = if e.is_network() {
                    VERIFY_NETWORK_ERROR.to_string()
                } else {
                    format!(
                        "Payment verification failed. Please contact support. Error: {}",
                        preview(e.server_message().unwrap_or_default())
                    )
                };
                tracing::error!(error = %e, payment_id = ?response.payment_id(), "payment verification failed");
                metrics::counter!("checkout_payments_failed_total", "stage" => "verification")
                    .increment(1);
                self.state = CheckoutState::Failed;
                self.notices.push(Notice::error(message.clone()));
                Err(CheckoutError::Verification(message))
            }
        }
    }

    /// Handles the user closing the gateway widget. Not an error.
    pub fn handle_dismissal(&mut self) {
        if self.state != CheckoutState::AwaitingGatewayResult {
            tracing::debug!(state = %self.state, "dismissal outside a payment ignored");
            return;
        }
        tracing::info!(flow_id = %self.flow_id, "payment widget closed by user");
        metrics::counter!("checkout_payments_dismissed_total").increment(1);
        self.state = CheckoutState::CartReady;
    }

    fn ensure_coupon_change_allowed(&self) -> Result<()> {
        if self.state.can_change_coupon() {
            return Ok(());
        }
        Err(CheckoutError::InvalidState {
            expected: "CartReady",
            actual: self.state,
        })
    }

    async fn fetch_summary(&mut self, coupon_code: Option<&str>) -> Result<()> {
        let Some(token) = self.tokens.current() else {
            let error = CheckoutError::NotAuthenticated;
            self.load_error = Some(error.to_string());
            return Err(error);
        };
        self.state = CheckoutState::LoadingCart;
        self.load_error = None;

        match self.backend.checkout_summary(&token, coupon_code).await {
            Ok(CartLookup::Found(summary)) => {
                match summary.applied_coupon() {
                    Some(code) => {
                        self.coupon = CouponStatus::Applied(code.to_string());
                        self.coupon_input = code.to_string();
                    }
                    None => {
                        self.coupon = CouponStatus::None;
                        if coupon_code.is_none() {
                            self.coupon_input.clear();
                        }
                    }
                }
                tracing::debug!(total = %summary.checkout_price, "checkout summary loaded");
                self.summary = Some(summary);
                self.state = CheckoutState::CartReady;
                Ok(())
            }
            Ok(CartLookup::Empty) => {
                tracing::debug!("no cart to check out");
                self.summary = None;
                self.state = CheckoutState::CartReady;
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    BackendError::Network(_) => LOAD_NETWORK_ERROR.to_string(),
                    other => match (other.server_message(), other.status()) {
                        (Some(message), _) => message.to_string(),
                        (None, Some(status)) => format!("Failed to fetch cart: {status}"),
                        (None, None) => LOAD_NETWORK_ERROR.to_string(),
                    },
                };
                tracing::error!(error = %e, "error fetching checkout summary");
                self.summary = None;
                self.state = CheckoutState::Idle;
                self.load_error = Some(message.clone());
                Err(CheckoutError::Load(message))
            }
        }
    }

    /// Creates the backend order. Errors are returned as user-facing text.
    async fn create_order(
        &self,
        token: &AuthToken,
        summary: &CheckoutSummary,
    ) -> std::result::Result<String, String> {
        match self
            .backend
            .create_order(token, summary.applied_coupon())
            .await
        {
            Ok(order) if !order.id.is_empty() => Ok(order.id),
            Ok(_) | Err(BackendError::MissingField(_)) => {
                tracing::error!("order response carried no id");
                Err("Backend did not return a valid order ID.".to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "error creating payment order");
                Err(match e.status() {
                    Some(status) if !e.is_network() => format!(
                        "Failed to create payment order. Status: {status}. Response: {}",
                        preview(e.server_message().unwrap_or_default())
                    ),
                    _ => e.to_string(),
                })
            }
        }
    }

    fn gateway_options(
        &mut self,
        summary: &CheckoutSummary,
        order_id: String,
    ) -> Result<GatewayOptions> {
        let amount = match summary.checkout_price.to_minor_units() {
            Ok(amount) => amount,
            Err(e) => {
                self.state = CheckoutState::CartReady;
                return Err(e.into());
            }
        };
        let user = summary.user.clone().unwrap_or_default();
        Ok(GatewayOptions {
            key: self.settings.key_id.clone(),
            amount,
            currency: self.settings.currency.clone(),
            name: self.settings.merchant_name.clone(),
            description: self.settings.description.clone(),
            order_id,
            prefill: Prefill {
                name: user.name.unwrap_or_default(),
                email: user.email.unwrap_or_default(),
            },
        })
    }
}
