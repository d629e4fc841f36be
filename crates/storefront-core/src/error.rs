//! Error types for the storefront.

use thiserror::Error;

/// Failures surfaced to the presentation layer.
///
/// Every gateway failure is converted into one of these at the component
/// boundary. Screens only need `kind()` and `user_message()`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShopError {
    /// Gateway unreachable or timed out.
    #[error("Network failure: {0}")]
    Network(String),

    /// Backend returned an error payload.
    #[error("Server failure: {0}")]
    Server(String),

    /// Successful response without the expected record.
    #[error("No data: {0}")]
    NoData(String),

    /// Checkout was requested for a cart without items.
    #[error("Shopping cart is empty")]
    EmptyCart,

    /// The owning screen was torn down before the operation completed.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse classification of a [`ShopError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Server,
    NoData,
    Precondition,
    Cancelled,
}

impl ShopError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShopError::Network(_) => ErrorKind::Network,
            ShopError::Server(_) => ErrorKind::Server,
            ShopError::NoData(_) => ErrorKind::NoData,
            ShopError::EmptyCart => ErrorKind::Precondition,
            ShopError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Human-readable text for an alert.
    pub fn user_message(&self) -> String {
        format!("Operation failed, reason: {}", self)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}
