//! Product list screen state.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{Product, ShopError};
use storefront_query::FilterModel;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::debounce::Debouncer;
use crate::gateway::{cancellable, Gateway};
use crate::sequence::{Outcome, RequestSequence};
use crate::signal::CartSignal;

#[derive(Debug, Default)]
struct ListState {
    filter: FilterModel,
    products: Vec<Product>,
    loading: bool,
    last_error: Option<ShopError>,
}

/// Owns the product list, its filter model and search-as-you-type.
///
/// Shared as `Arc<ProductList>` so debounced searches can reach it. The
/// debounced task holds only a weak reference; dropping the list drops any
/// pending search.
pub struct ProductList {
    gateway: Arc<dyn Gateway>,
    signal: CartSignal,
    debouncer: Debouncer,
    sequence: RequestSequence,
    state: Mutex<ListState>,
    cancel: CancellationToken,
}

impl ProductList {
    pub fn new(gateway: Arc<dyn Gateway>, signal: CartSignal, debounce: Duration) -> Self {
        Self {
            gateway,
            signal,
            debouncer: Debouncer::new(debounce),
            sequence: RequestSequence::new(),
            state: Mutex::new(ListState::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run debounced searches on `handle`, for callers outside the runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.debouncer = Debouncer::new(self.debouncer.window()).with_handle(handle);
        self
    }

    pub fn products(&self) -> Vec<Product> {
        self.state.lock().products.clone()
    }

    pub fn filter(&self) -> FilterModel {
        self.state.lock().filter.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn last_error(&self) -> Option<ShopError> {
        self.state.lock().last_error.clone()
    }

    /// "1 Product" or "n Products".
    pub fn product_count_text(&self) -> String {
        match self.state.lock().products.len() {
            1 => "1 Product".to_string(),
            n => format!("{} Products", n),
        }
    }

    pub fn filter_button_title(&self) -> String {
        self.state.lock().filter.filter_button_title()
    }

    /// Fetch the list for the current filter model.
    ///
    /// A failure keeps the last list that loaded.
    pub async fn load(&self) -> Result<Outcome, ShopError> {
        let (ticket, query) = {
            let mut state = self.state.lock();
            state.loading = true;
            (self.sequence.issue(), state.filter.to_query())
        };
        tracing::debug!("Loading products: {}", query);

        let result = cancellable(&self.cancel, self.gateway.fetch_products(query)).await;
        if self.cancel.is_cancelled() {
            return Err(ShopError::Cancelled);
        }

        let mut state = self.state.lock();
        if !self.sequence.is_current(ticket) {
            tracing::debug!("Discarding superseded product list response {:?}", ticket);
            return Ok(Outcome::Discarded);
        }
        state.loading = false;

        match result {
            Ok(products) => {
                tracing::debug!("Loaded {} products", products.len());
                state.products = products;
                state.last_error = None;
                Ok(Outcome::Applied)
            }
            Err(e) => {
                tracing::warn!("Failed to load products: {}", e);
                state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Search as the user types. Only the last text of a burst is searched.
    pub fn search_text_changed(self: &Arc<Self>, text: impl Into<String>) {
        let text = text.into();
        let list = Arc::downgrade(self);
        self.debouncer.schedule(move || async move {
            let Some(list) = list.upgrade() else {
                return;
            };
            list.state.lock().filter.set_search_text(&text);
            if let Err(e) = list.load().await {
                tracing::warn!("Search for {:?} failed: {}", text, e);
            }
        });
    }

    /// Replace the filter model, e.g. when the filter screen is confirmed.
    pub async fn apply_filter(&self, filter: FilterModel) -> Result<Outcome, ShopError> {
        {
            let mut state = self.state.lock();
            if state.filter == filter {
                return Ok(Outcome::Unchanged);
            }
            state.filter = filter;
        }
        self.load().await
    }

    pub async fn add_to_cart(&self, product: &Product) -> Result<String, ShopError> {
        add_product_to_cart(self.gateway.as_ref(), &self.signal, &self.cancel, product).await
    }

    /// Drop any pending search and stop applying results.
    pub fn teardown(&self) {
        tracing::debug!("Tearing down product list");
        self.debouncer.cancel();
        self.cancel.cancel();
    }
}

/// Add one unit of `product` and announce the cart change.
///
/// Returns the confirmation text for the user.
pub(crate) async fn add_product_to_cart(
    gateway: &dyn Gateway,
    signal: &CartSignal,
    cancel: &CancellationToken,
    product: &Product,
) -> Result<String, ShopError> {
    tracing::debug!("Adding product {} ({}) to shopping cart", product.name, product.id);

    match cancellable(cancel, gateway.add_to_cart(product.id.clone())).await {
        Ok(item) => {
            tracing::debug!("Cart item {} now has quantity {}", item.id, item.quantity);
            signal.notify();
            Ok(format!("{} added to cart.", product.name))
        }
        Err(e) => {
            tracing::warn!("Failed to add {} to cart: {}", product.id, e);
            Err(e)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
