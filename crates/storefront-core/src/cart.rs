//! Shopping cart types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::product::{format_price, Product, ProductId};

/// Key of the virtual cart that resolves to the signed-in user's cart.
pub const CURRENT_USER_CART_ID: i64 = -1;

/// Identifier of a cart item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CartItemId(pub String);

impl From<&str> for CartItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CartItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for CartItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCartItem {
    pub id: CartItemId,

    pub product_id: ProductId,

    pub quantity: u32,

    /// Expanded product, present when the query asked for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

impl ShoppingCartItem {
    pub fn new(id: impl Into<CartItemId>, product: Product, quantity: u32) -> Self {
        Self {
            id: id.into(),
            product_id: product.id.clone(),
            quantity,
            product: Some(product),
        }
    }

    /// Price of this line, zero when the product was not expanded.
    pub fn line_total(&self) -> Decimal {
        self.product
            .as_ref()
            .map(|p| p.price * Decimal::from(self.quantity))
            .unwrap_or(Decimal::ZERO)
    }
}

/// The current user's cart.
///
/// Totals are computed from the items on every call, so a cart can never
/// report a total that disagrees with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCart {
    pub id: i64,

    #[serde(default)]
    pub items: Vec<ShoppingCartItem>,
}

impl Default for ShoppingCart {
    fn default() -> Self {
        Self::empty()
    }
}

impl ShoppingCart {
    /// An empty cart for the current user.
    pub fn empty() -> Self {
        Self {
            id: CURRENT_USER_CART_ID,
            items: Vec::new(),
        }
    }

    pub fn with_items(items: Vec<ShoppingCartItem>) -> Self {
        Self {
            id: CURRENT_USER_CART_ID,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &CartItemId) -> Option<&ShoppingCartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub(crate) fn currency_code(&self) -> &str {
        self.items
            .iter()
            .filter_map(|i| i.product.as_ref())
            .map(|p| p.currency_code.as_str())
            .next()
            .unwrap_or("")
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(ShoppingCartItem::line_total).sum()
    }

    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Subtotal text for the cart footer.
    pub fn formatted_total(&self) -> String {
        format_price(self.total(), self.currency_code())
    }

    /// Text shown in place of the list when the cart holds nothing.
    pub fn empty_list_text(&self) -> Option<&'static str> {
        (self.total_quantity() == 0).then_some("Your shopping cart is empty.")
    }
}

// =============================================================================
// Tests
// =============================================================================
