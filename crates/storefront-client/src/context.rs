//! Shared dependencies for every screen.

use std::sync::Arc;
use storefront_core::{ProductId, ShopConfig};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::cart::CartReconciler;
use crate::catalog::ProductList;
use crate::counter::CartCounter;
use crate::detail::ProductDetail;
use crate::gateway::{Gateway, TimeoutGateway};
use crate::signal::CartSignal;

/// Explicit dependency container handed to each screen.
///
/// Holds the gateway, the cart-changed signal and the configuration, and
/// builds controllers wired to them. Each controller gets a child of the
/// context's cancellation token, so [`ShopContext::shutdown`] stops all of
/// them at once. Cloning shares everything.
#[derive(Clone)]
pub struct ShopContext {
    gateway: Arc<dyn Gateway>,
    signal: CartSignal,
    config: Arc<ShopConfig>,
    runtime: Option<Handle>,
    shutdown: CancellationToken,
}

impl ShopContext {
    /// Wrap `gateway` with the configured request timeout.
    pub fn new(gateway: Arc<dyn Gateway>, config: ShopConfig) -> Self {
        let timeout = config.service.timeout();
        tracing::info!(
            "Storefront context created (service: {}, timeout: {:?})",
            config.service.root_url.as_deref().unwrap_or("<unset>"),
            timeout
        );
        Self {
            gateway: Arc::new(TimeoutGateway::new(gateway, timeout)),
            signal: CartSignal::new(),
            config: Arc::new(config),
            runtime: Handle::try_current().ok(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Runtime for background work, when the context is built outside one.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn cart_signal(&self) -> &CartSignal {
        &self.signal
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn product_list(&self) -> Arc<ProductList> {
        let list = ProductList::new(
            self.gateway.clone(),
            self.signal.clone(),
            self.config.search.debounce(),
        )
        .with_cancellation(self.shutdown.child_token());
        let list = match &self.runtime {
            Some(handle) => list.with_runtime(handle.clone()),
            None => list,
        };
        Arc::new(list)
    }

    pub fn product_detail(&self, product_id: impl Into<ProductId>) -> ProductDetail {
        ProductDetail::new(
            product_id.into(),
            self.config.detail.top_reviews,
            self.gateway.clone(),
            self.signal.clone(),
        )
        .with_cancellation(self.shutdown.child_token())
    }

    pub fn shopping_cart(&self) -> CartReconciler {
        CartReconciler::new(self.gateway.clone(), self.signal.clone())
            .with_cancellation(self.shutdown.child_token())
    }

    pub fn cart_counter(&self) -> Arc<CartCounter> {
        let counter = CartCounter::new(self.gateway.clone(), self.signal.clone())
            .with_cancellation(self.shutdown.child_token());
        Arc::new(counter)
    }

    /// Cancel every controller built from this context.
    pub fn shutdown(&self) {
        tracing::info!("Storefront context shutting down");
        self.shutdown.cancel();
    }
}
