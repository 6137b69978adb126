//! Cart and checkout summary as reported by the backend.

use common::{CartItemId, UserId};
use serde::{Deserialize, Serialize};

use crate::course::Course;
use crate::money::Amount;

/// The owner of a cart, as embedded in cart responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub course: Course,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// A user's cart.
///
/// `total_price` is computed server-side and displayed as-is; the client
/// never recomputes it from `subtotal` and `discount_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: i64,
    #[serde(default)]
    pub user: Option<CartUser>,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Amount,
    #[serde(default)]
    pub discount_amount: Amount,
    #[serde(default)]
    pub total_price: Amount,
}

impl Cart {
    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.cart_items.is_empty()
    }

    /// Returns true if the given course is already in the cart.
    pub fn contains_course(&self, course_id: common::CourseId) -> bool {
        self.cart_items.iter().any(|item| item.course.id == course_id)
    }
}

/// Coupon-aware snapshot of a cart at checkout time.
///
/// At most one coupon is active: `coupon_code_applied` names it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    #[serde(default)]
    pub user: Option<CartUser>,
    #[serde(default)]
    pub cart_total: Amount,
    /// Final payable amount.
    #[serde(default)]
    pub checkout_price: Amount,
    #[serde(default)]
    pub tax_gst: Amount,
    #[serde(default)]
    pub coupon_amount: Amount,
    #[serde(default)]
    pub coupon_code_applied: Option<String>,
}

impl CheckoutSummary {
    /// Returns the applied coupon code, treating an empty string as none.
    pub fn applied_coupon(&self) -> Option<&str> {
        self.coupon_code_applied
            .as_deref()
            .filter(|code| !code.is_empty())
    }
}

/// Outcome of a cart lookup.
///
/// A backend 404 without an error message means the user simply has no
/// cart yet. That is `Empty`, distinct from a genuine not-found error.
#[derive(Debug, Clone, PartialEq)]
pub enum CartLookup<T> {
    Found(T),
    Empty,
}

impl<T> CartLookup<T> {
    /// Converts into an `Option`, mapping `Empty` to `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            CartLookup::Found(value) => Some(value),
            CartLookup::Empty => None,
        }
    }

    /// Returns a reference to the found value.
    pub fn as_found(&self) -> Option<&T> {
        match self {
            CartLookup::Found(value) => Some(value),
            CartLookup::Empty => None,
        }
    }
}
