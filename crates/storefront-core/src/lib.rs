//! Core types for the storefront.
//!
//! This crate contains the shared data structures used across all storefront crates:
//! - Product, Review and image types for the catalog
//! - Shopping cart and cart item types
//! - Price formatting
//! - Configuration types
//! - Error types

mod cart;
mod config;
mod error;
mod product;

pub use cart::{CartItemId, ShoppingCart, ShoppingCartItem, CURRENT_USER_CART_ID};
pub use config::{
    config_dir, config_path, load_config, load_config_from, DetailConfig, LoggingConfig,
    SearchConfig, ServiceConfig, ShopConfig,
};
pub use error::{ConfigError, ErrorKind, ShopError};
pub use product::{
    format_price, Product, ProductId, ProductImage, Review, SemanticColor, StockAvailability,
};

/// Re-exported so downstream crates share one decimal type for prices.
pub use rust_decimal::Decimal;
