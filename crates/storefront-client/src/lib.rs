//! Storefront controllers and the plumbing they share.
//!
//! This crate sits between a presentation layer and the remote data service:
//! - [`Gateway`] abstracts the service; [`TimeoutGateway`] bounds each call
//! - [`CartReconciler`] keeps the cart consistent across mutations
//! - [`ProductList`], [`ProductDetail`] and [`CartCounter`] back the screens
//! - [`Debouncer`], [`RequestSequence`] and [`CartSignal`] are the concurrency
//!   primitives they are built on
//! - [`ShopContext`] wires everything together
//!
//! ## Ordering
//!
//! Each controller issues a ticket from its [`RequestSequence`] before a
//! request goes out. Only the response holding the newest ticket may update
//! state; older ones come back as [`Outcome::Discarded`].

pub mod cart;
pub mod catalog;
pub mod context;
pub mod counter;
pub mod debounce;
pub mod detail;
pub mod gateway;
pub mod logging;
pub mod sequence;
pub mod signal;

pub use cart::{CartPhase, CartReconciler, CartRow};
pub use catalog::ProductList;
pub use context::ShopContext;
pub use counter::CartCounter;
pub use debounce::Debouncer;
pub use detail::ProductDetail;
pub use gateway::{Gateway, GatewayFuture, TimeoutGateway};
pub use logging::init_tracing;
pub use sequence::{Outcome, RequestSequence, Ticket};
pub use signal::{CartSignal, CartSubscription};
