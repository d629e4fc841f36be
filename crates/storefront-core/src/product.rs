//! Catalog types: products, reviews and images.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable product identifier (the entity key on the service).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Stock Availability
// =============================================================================

/// Stock level reported by the service.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum StockAvailability {
    #[default]
    InStock,
    LowStock,
    OutOfStock,
}

/// Semantic color a screen uses to tint stock text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticColor {
    Positive,
    Critical,
    Negative,
}

impl StockAvailability {
    /// Numeric code used by the service for this level.
    pub fn code(self) -> i64 {
        match self {
            StockAvailability::InStock => 1,
            StockAvailability::LowStock => 2,
            StockAvailability::OutOfStock => 3,
        }
    }

    /// Parse the service's numeric code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(StockAvailability::InStock),
            2 => Some(StockAvailability::LowStock),
            3 => Some(StockAvailability::OutOfStock),
            _ => None,
        }
    }

    /// Display text for list rows.
    pub fn item_text(self) -> &'static str {
        match self {
            StockAvailability::InStock => "In Stock",
            StockAvailability::LowStock => "Low Stock",
            StockAvailability::OutOfStock => "Out of Stock",
        }
    }

    pub fn color(self) -> SemanticColor {
        match self {
            StockAvailability::InStock => SemanticColor::Positive,
            StockAvailability::LowStock => SemanticColor::Critical,
            StockAvailability::OutOfStock => SemanticColor::Negative,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// An image attached to a product. Only the reference is modeled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: String,
    pub url: String,
}

/// A customer review, owned by its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,

    /// Number of customers who marked this review helpful.
    pub helpful_count: i64,

    #[serde(default)]
    pub comment: String,
}

/// A product as returned by the service.
///
/// Products are immutable once fetched. A re-fetch replaces the whole value,
/// so relations that were not expanded by the query are simply empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub price: Decimal,

    pub currency_code: String,

    #[serde(default)]
    pub main_category_name: String,

    #[serde(default)]
    pub stock_availability: StockAvailability,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_image: Option<ProductImage>,

    #[serde(default)]
    pub images: Vec<ProductImage>,

    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Product {
    /// Create a product with the fields every row needs.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            currency_code: currency_code.into(),
            main_category_name: String::new(),
            stock_availability: StockAvailability::InStock,
            primary_image: None,
            images: Vec::new(),
            reviews: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.main_category_name = category.into();
        self
    }

    pub fn with_stock(mut self, stock: StockAvailability) -> Self {
        self.stock_availability = stock;
        self
    }

    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn with_images(mut self, images: Vec<ProductImage>) -> Self {
        self.primary_image = images.first().cloned();
        self.images = images;
        self
    }

    /// Price with its currency, e.g. `"12.50 EUR"`.
    pub fn formatted_price(&self) -> String {
        format_price(self.price, &self.currency_code)
    }
}

/// Render an amount with two decimals followed by the currency code.
pub fn format_price(amount: Decimal, currency_code: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if currency_code.is_empty() {
        format!("{:.2}", rounded)
    } else {
        format!("{:.2} {}", rounded, currency_code)
    }
}

// =============================================================================
// Tests
// =============================================================================
