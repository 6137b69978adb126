//! Cart view.

use backend::{BackendError, CartApi, TokenSource};
use common::{CartItemId, CourseId};
use domain::{Amount, Cart, CartLookup, Notice};

use crate::error::{AppError, Result, request_message};

const LOGIN_TO_VIEW: &str = "Please log in to view your cart.";
const LOGIN_TO_ADD: &str = "You need to be logged in to add courses to your cart.";
const LOGIN_TO_CHECKOUT: &str = "Please log in to proceed to checkout.";

/// The signed-in user's cart as last reported by the backend.
///
/// Totals are shown exactly as the server sent them.
pub struct CartView<B: CartApi> {
    backend: B,
    tokens: TokenSource,
    cart: Option<Cart>,
    error: Option<String>,
    notices: Vec<Notice>,
}

impl<B: CartApi> CartView<B> {
    /// The token is read from `tokens` on every request.
    pub fn new(backend: B, tokens: impl Into<TokenSource>) -> Self {
        Self {
            backend,
            tokens: tokens.into(),
            cart: None,
            error: None,
            notices: Vec::new(),
        }
    }

    /// The loaded cart. `None` means the user has no cart yet.
    pub fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Server total of the loaded cart.
    pub fn total(&self) -> Option<Amount> {
        self.cart.as_ref().map(|c| c.total_price)
    }

    pub fn is_empty(&self) -> bool {
        self.cart.as_ref().is_none_or(Cart::is_empty)
    }

    /// Page-level message from the last failed load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        self.error = None;
        let Some(token) = self.tokens.current() else {
            self.error = Some(LOGIN_TO_VIEW.to_string());
            return Err(AppError::NotAuthenticated(LOGIN_TO_VIEW));
        };
        match self.backend.get_cart(&token).await {
            Ok(CartLookup::Found(cart)) => {
                tracing::debug!(items = cart.cart_items.len(), total = %cart.total_price, "cart loaded");
                self.cart = Some(cart);
                Ok(())
            }
            Ok(CartLookup::Empty) => {
                self.cart = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching cart");
                let message = if e.is_network() {
                    "A network error occurred.".to_string()
                } else {
                    request_message(&e, "Failed to fetch cart")
                };
                self.error = Some(message.clone());
                Err(AppError::Request(message))
            }
        }
    }

    /// Adds a course to the cart.
    #[tracing::instrument(skip(self, title))]
    pub async fn add(&mut self, course_id: CourseId, title: &str) -> Result<()> {
        let token = self
            .tokens
            .current()
            .ok_or(AppError::NotAuthenticated(LOGIN_TO_ADD))?;
        match self.backend.add_to_cart(&token, course_id).await {
            Ok(()) => {
                tracing::info!(%course_id, "course added to cart");
                self.notices.push(Notice::success(format!(
                    "Course \"{title}\" added to cart successfully!"
                )));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "error adding to cart");
                let message = match &e {
                    BackendError::Unauthorized => {
                        "Authentication failed. Please log in again.".to_string()
                    }
                    BackendError::Network(_) => {
                        "A network error occurred while adding to cart.".to_string()
                    }
                    _ => format!(
                        "Failed to add course to cart: {}",
                        request_message(&e, "Server returned status")
                    ),
                };
                Err(self.fail(message))
            }
        }
    }

    /// Removes a line and reloads the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&mut self, item_id: CartItemId) -> Result<()> {
        let token = self
            .tokens
            .current()
            .ok_or(AppError::NotAuthenticated(LOGIN_TO_VIEW))?;
        match self.backend.remove_cart_item(&token, item_id).await {
            Ok(()) => {
                self.notices.push(Notice::success("Course removed from cart."));
                self.load().await
            }
            Err(e) => {
                tracing::error!(error = %e, "error removing cart item");
                let message = if e.is_network() {
                    "A network error occurred while removing the course.".to_string()
                } else {
                    format!(
                        "Failed to remove course: {}",
                        request_message(&e, "Status")
                    )
                };
                Err(self.fail(message))
            }
        }
    }

    /// Guard for the "proceed to checkout" action.
    pub fn ensure_can_checkout(&self) -> Result<()> {
        if !self.tokens.is_present() {
            return Err(AppError::NotAuthenticated(LOGIN_TO_CHECKOUT));
        }
        Ok(())
    }

    fn fail(&mut self, message: String) -> AppError {
        self.notices.push(Notice::error(message.clone()));
        AppError::Request(message)
    }
}
