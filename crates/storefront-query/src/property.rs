//! Entity, property and relation vocabulary of the data service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity types exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    Review,
    ProductImage,
    ShoppingCart,
    ShoppingCartItem,
}

impl EntityKind {
    /// Name of the entity set this kind is served from.
    pub fn entity_set(self) -> &'static str {
        match self {
            EntityKind::Product => "Products",
            EntityKind::Review => "Reviews",
            EntityKind::ProductImage => "ProductImages",
            EntityKind::ShoppingCart => "ShoppingCarts",
            EntityKind::ShoppingCartItem => "ShoppingCartItems",
        }
    }

    pub fn key_property(self) -> Property {
        match self {
            EntityKind::Product => Property::ProductId,
            EntityKind::Review => Property::ReviewId,
            EntityKind::ProductImage => Property::ImageId,
            EntityKind::ShoppingCart => Property::ShoppingCartId,
            EntityKind::ShoppingCartItem => Property::ShoppingCartItemId,
        }
    }
}

/// A structural property of one entity kind.
///
/// Declaration order is the order properties appear in a rendered `$select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Property {
    ProductId,
    ProductName,
    ProductDescription,
    ProductPrice,
    ProductCurrencyCode,
    ProductMainCategoryName,
    ProductStockAvailability,

    ReviewId,
    ReviewHelpfulCount,
    ReviewComment,

    ImageId,
    ImageUrl,

    ShoppingCartId,

    ShoppingCartItemId,
    ShoppingCartItemProductId,
    ShoppingCartItemQuantity,
}

impl Property {
    pub fn entity(self) -> EntityKind {
        use Property::*;
        match self {
            ProductId
            | ProductName
            | ProductDescription
            | ProductPrice
            | ProductCurrencyCode
            | ProductMainCategoryName
            | ProductStockAvailability => EntityKind::Product,
            ReviewId | ReviewHelpfulCount | ReviewComment => EntityKind::Review,
            ImageId | ImageUrl => EntityKind::ProductImage,
            ShoppingCartId => EntityKind::ShoppingCart,
            ShoppingCartItemId | ShoppingCartItemProductId | ShoppingCartItemQuantity => {
                EntityKind::ShoppingCartItem
            }
        }
    }

    /// Wire name of the property.
    pub fn name(self) -> &'static str {
        use Property::*;
        match self {
            ProductId | ReviewId | ImageId | ShoppingCartId | ShoppingCartItemId => "Id",
            ProductName => "Name",
            ProductDescription => "Description",
            ProductPrice => "Price",
            ProductCurrencyCode => "CurrencyCode",
            ProductMainCategoryName => "MainCategoryName",
            ProductStockAvailability => "StockAvailability",
            ReviewHelpfulCount => "HelpfulCount",
            ReviewComment => "Comment",
            ImageUrl => "Url",
            ShoppingCartItemProductId => "ProductId",
            ShoppingCartItemQuantity => "Quantity",
        }
    }
}

/// A navigation property from one entity kind to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    ProductPrimaryImage,
    ProductImages,
    ProductReviews,
    ShoppingCartItems,
    ShoppingCartItemProduct,
}

impl Relation {
    pub fn source(self) -> EntityKind {
        match self {
            Relation::ProductPrimaryImage | Relation::ProductImages | Relation::ProductReviews => {
                EntityKind::Product
            }
            Relation::ShoppingCartItems => EntityKind::ShoppingCart,
            Relation::ShoppingCartItemProduct => EntityKind::ShoppingCartItem,
        }
    }

    pub fn target(self) -> EntityKind {
        match self {
            Relation::ProductPrimaryImage | Relation::ProductImages => EntityKind::ProductImage,
            Relation::ProductReviews => EntityKind::Review,
            Relation::ShoppingCartItems => EntityKind::ShoppingCartItem,
            Relation::ShoppingCartItemProduct => EntityKind::Product,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Relation::ProductPrimaryImage => "PrimaryImage",
            Relation::ProductImages => "Images",
            Relation::ProductReviews => "Reviews",
            Relation::ShoppingCartItems => "ShoppingCartItems",
            Relation::ShoppingCartItemProduct => "Product",
        }
    }
}

/// A primitive property value, used for keys, predicates and ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Decimal(Decimal),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl fmt::Display for Value {
    /// OData literal form. Decimals render without trailing zeros, so equal
    /// values render the same whatever their scale.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v.normalize()),
            Value::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
        }
    }
}
