//! Gateway to the remote data service.
//!
//! Controllers never talk to the transport directly. They hand a
//! [`DataQuery`] or a mutation to a [`Gateway`] and get a future back, which
//! lets tests swap in [`fake::InMemoryGateway`] or a mockall mock.
//!
//! Every method captures its arguments before returning, so the returned
//! future is `'static` and can be raced, cancelled or dropped freely.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{Product, ProductId, ShopError, ShoppingCart, ShoppingCartItem};
use storefront_query::DataQuery;
use tokio_util::sync::CancellationToken;

/// Future returned by every gateway operation.
pub type GatewayFuture<T> = BoxFuture<'static, Result<T, ShopError>>;

// =============================================================================
// Gateway Trait
// =============================================================================

/// Operations the storefront needs from the data service.
///
/// Implementations map transport failures to [`ShopError::Network`] and
/// error payloads to [`ShopError::Server`].
#[cfg_attr(test, mockall::automock)]
pub trait Gateway: Send + Sync {
    /// Read products matching `query`.
    fn fetch_products(&self, query: DataQuery) -> GatewayFuture<Vec<Product>>;

    /// Read carts matching `query`. The current user's cart is keyed `-1`.
    fn fetch_shopping_carts(&self, query: DataQuery) -> GatewayFuture<Vec<ShoppingCart>>;

    /// Persist the item's quantity.
    fn update_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()>;

    fn delete_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()>;

    /// Add one unit of a product to the current user's cart.
    ///
    /// The service merges into an existing line for the same product.
    fn add_to_cart(&self, product_id: ProductId) -> GatewayFuture<ShoppingCartItem>;

    /// Place an order for the whole cart. Returns the carts after checkout.
    fn checkout(&self) -> GatewayFuture<Vec<ShoppingCart>>;
}

impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    fn fetch_products(&self, query: DataQuery) -> GatewayFuture<Vec<Product>> {
        (**self).fetch_products(query)
    }

    fn fetch_shopping_carts(&self, query: DataQuery) -> GatewayFuture<Vec<ShoppingCart>> {
        (**self).fetch_shopping_carts(query)
    }

    fn update_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()> {
        (**self).update_cart_item(item)
    }

    fn delete_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()> {
        (**self).delete_cart_item(item)
    }

    fn add_to_cart(&self, product_id: ProductId) -> GatewayFuture<ShoppingCartItem> {
        (**self).add_to_cart(product_id)
    }

    fn checkout(&self) -> GatewayFuture<Vec<ShoppingCart>> {
        (**self).checkout()
    }
}

/// Race `fut` against `token`. Cancellation wins ties.
pub(crate) async fn cancellable<T>(
    token: &CancellationToken,
    fut: GatewayFuture<T>,
) -> Result<T, ShopError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ShopError::Cancelled),
        result = fut => result,
    }
}

// =============================================================================
// Timeout Gateway
// =============================================================================

/// Wraps another gateway and fails any call that outlives `timeout`.
pub struct TimeoutGateway<G> {
    inner: G,
    timeout: Duration,
}

impl<G: Gateway> TimeoutGateway<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn guard<T: Send + 'static>(&self, fut: GatewayFuture<T>) -> GatewayFuture<T> {
        let timeout = self.timeout;
        Box::pin(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Gateway request timed out after {:?}", timeout);
                    Err(ShopError::Network(format!(
                        "request timed out after {} ms",
                        timeout.as_millis()
                    )))
                }
            }
        })
    }
}

impl<G: Gateway> Gateway for TimeoutGateway<G> {
    fn fetch_products(&self, query: DataQuery) -> GatewayFuture<Vec<Product>> {
        self.guard(self.inner.fetch_products(query))
    }

    fn fetch_shopping_carts(&self, query: DataQuery) -> GatewayFuture<Vec<ShoppingCart>> {
        self.guard(self.inner.fetch_shopping_carts(query))
    }

    fn update_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()> {
        self.guard(self.inner.update_cart_item(item))
    }

    fn delete_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()> {
        self.guard(self.inner.delete_cart_item(item))
    }

    fn add_to_cart(&self, product_id: ProductId) -> GatewayFuture<ShoppingCartItem> {
        self.guard(self.inner.add_to_cart(product_id))
    }

    fn checkout(&self) -> GatewayFuture<Vec<ShoppingCart>> {
        self.guard(self.inner.checkout())
    }
}

// =============================================================================
// In-Memory Gateway (for testing)
// =============================================================================

#[cfg(test)]
pub mod fake {
    //! A gateway backed by in-memory products and one cart.
    //!
    //! Reads snapshot the data at call time, so a slow response carries the
    //! state from when it was issued. Delays and failures are queued per
    //! operation and consumed one call at a time.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use storefront_core::CartItemId;
    use storefront_query::Relation;

    /// Which gateway operation a call was.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Call {
        FetchProducts,
        FetchShoppingCarts,
        UpdateCartItem,
        DeleteCartItem,
        AddToCart,
        Checkout,
    }

    #[derive(Default)]
    pub struct InMemoryGateway {
        products: Mutex<Vec<Product>>,
        cart: Mutex<Vec<ShoppingCartItem>>,
        delays: Mutex<HashMap<Call, VecDeque<Duration>>>,
        failures: Mutex<HashMap<Call, VecDeque<ShopError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl InMemoryGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_products(self, products: Vec<Product>) -> Self {
            *self.products.lock() = products;
            self
        }

        pub fn with_cart(self, items: Vec<ShoppingCartItem>) -> Self {
            *self.cart.lock() = items;
            self
        }

        /// Replace the server-side catalog.
        pub fn set_products(&self, products: Vec<Product>) {
            *self.products.lock() = products;
        }

        /// Replace the server-side cart.
        pub fn set_cart(&self, items: Vec<ShoppingCartItem>) {
            *self.cart.lock() = items;
        }

        pub fn cart_items(&self) -> Vec<ShoppingCartItem> {
            self.cart.lock().clone()
        }

        /// Delay the next call of `call` by `delay`.
        pub fn delay_next(&self, call: Call, delay: Duration) {
            self.delays.lock().entry(call).or_default().push_back(delay);
        }

        /// Fail the next call of `call` with `error`.
        pub fn fail_next(&self, call: Call, error: ShopError) {
            self.failures.lock().entry(call).or_default().push_back(error);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self, call: Call) -> usize {
            self.calls.lock().iter().filter(|c| **c == call).count()
        }

        fn begin(&self, call: Call) -> (Option<Duration>, Option<ShopError>) {
            self.calls.lock().push(call);
            let delay = self.delays.lock().get_mut(&call).and_then(|q| q.pop_front());
            let failure = self.failures.lock().get_mut(&call).and_then(|q| q.pop_front());
            (delay, failure)
        }

        fn current_cart(&self) -> ShoppingCart {
            ShoppingCart::with_items(self.cart.lock().clone())
        }
    }

    fn respond<T: Send + 'static>(
        delay: Option<Duration>,
        result: Result<T, ShopError>,
    ) -> GatewayFuture<T> {
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn shape_product(query: &DataQuery, mut product: Product) -> Product {
        if query.expansion(Relation::ProductPrimaryImage).is_none() {
            product.primary_image = None;
        }
        product.images = match query.expansion(Relation::ProductImages) {
            Some(sub) => sub.apply(product.images),
            None => Vec::new(),
        };
        product.reviews = match query.expansion(Relation::ProductReviews) {
            Some(sub) => sub.apply(product.reviews),
            None => Vec::new(),
        };
        product
    }

    fn shape_cart(query: &DataQuery, mut cart: ShoppingCart) -> ShoppingCart {
        cart.items = match query.expansion(Relation::ShoppingCartItems) {
            Some(items_query) => items_query
                .apply(cart.items)
                .into_iter()
                .map(|mut item| {
                    item.product = match items_query.expansion(Relation::ShoppingCartItemProduct) {
                        Some(product_query) => {
                            item.product.map(|p| shape_product(product_query, p))
                        }
                        None => None,
                    };
                    item
                })
                .collect(),
            None => Vec::new(),
        };
        cart
    }

    fn missing_item(id: &CartItemId) -> ShopError {
        ShopError::Server(format!("cart item {} does not exist", id))
    }

    impl Gateway for InMemoryGateway {
        fn fetch_products(&self, query: DataQuery) -> GatewayFuture<Vec<Product>> {
            let (delay, failure) = self.begin(Call::FetchProducts);
            let result = match failure {
                Some(e) => Err(e),
                None => Ok(query
                    .apply(self.products.lock().clone())
                    .into_iter()
                    .map(|p| shape_product(&query, p))
                    .collect()),
            };
            respond(delay, result)
        }

        fn fetch_shopping_carts(&self, query: DataQuery) -> GatewayFuture<Vec<ShoppingCart>> {
            let (delay, failure) = self.begin(Call::FetchShoppingCarts);
            let result = match failure {
                Some(e) => Err(e),
                None => Ok(query
                    .apply(vec![self.current_cart()])
                    .into_iter()
                    .map(|c| shape_cart(&query, c))
                    .collect()),
            };
            respond(delay, result)
        }

        fn update_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()> {
            let (delay, failure) = self.begin(Call::UpdateCartItem);
            let result = match failure {
                Some(e) => Err(e),
                None => {
                    let mut cart = self.cart.lock();
                    match cart.iter_mut().find(|i| i.id == item.id) {
                        Some(existing) => {
                            existing.quantity = item.quantity;
                            Ok(())
                        }
                        None => Err(missing_item(&item.id)),
                    }
                }
            };
            respond(delay, result)
        }

        fn delete_cart_item(&self, item: ShoppingCartItem) -> GatewayFuture<()> {
            let (delay, failure) = self.begin(Call::DeleteCartItem);
            let result = match failure {
                Some(e) => Err(e),
                None => {
                    let mut cart = self.cart.lock();
                    let before = cart.len();
                    cart.retain(|i| i.id != item.id);
                    if cart.len() < before {
                        Ok(())
                    } else {
                        Err(missing_item(&item.id))
                    }
                }
            };
            respond(delay, result)
        }

        fn add_to_cart(&self, product_id: ProductId) -> GatewayFuture<ShoppingCartItem> {
            let (delay, failure) = self.begin(Call::AddToCart);
            let result = match failure {
                Some(e) => Err(e),
                None => {
                    let product = self.products.lock().iter().find(|p| p.id == product_id).cloned();
                    let mut cart = self.cart.lock();
                    let existing = cart.iter().position(|i| i.product_id == product_id);
                    match (existing, product) {
                        (Some(index), _) => {
                            cart[index].quantity += 1;
                            Ok(cart[index].clone())
                        }
                        (None, Some(product)) => {
                            let item =
                                ShoppingCartItem::new(uuid::Uuid::new_v4().to_string(), product, 1);
                            cart.push(item.clone());
                            Ok(item)
                        }
                        (None, None) => Err(ShopError::Server(format!(
                            "product {} does not exist",
                            product_id
                        ))),
                    }
                }
            };
            respond(delay, result)
        }

        fn checkout(&self) -> GatewayFuture<Vec<ShoppingCart>> {
            let (delay, failure) = self.begin(Call::Checkout);
            let result = match failure {
                Some(e) => Err(e),
                None => {
                    let mut cart = self.cart.lock();
                    if cart.is_empty() {
                        Err(ShopError::Server("cannot check out an empty cart".to_string()))
                    } else {
                        cart.clear();
                        Ok(vec![ShoppingCart::empty()])
                    }
                }
            };
            respond(delay, result)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::fake::{Call, InMemoryGateway};
    use super::*;
    use storefront_core::{Decimal, Review};
    use storefront_query::queries;

    fn review(id: &str, helpful_count: i64) -> Review {
        Review {
            id: id.to_string(),
            helpful_count,
            comment: format!("review {}", id),
        }
    }

    fn notebook() -> Product {
        Product::new("HT-1000", "Notebook Basic 15", Decimal::new(956, 0), "EUR")
            .with_reviews(vec![review("r1", 2), review("r2", 9), review("r3", 5)])
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_network_failure() {
        let fake = Arc::new(InMemoryGateway::new());
        fake.delay_next(Call::FetchProducts, Duration::from_secs(10));
        let gateway = TimeoutGateway::new(fake, Duration::from_secs(1));

        let result = gateway.fetch_products(queries::product_list()).await;
        assert!(matches!(result, Err(ShopError::Network(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_passes_fast_results_through() {
        let fake = Arc::new(InMemoryGateway::new().with_products(vec![notebook()]));
        fake.delay_next(Call::FetchProducts, Duration::from_millis(50));
        let gateway = TimeoutGateway::new(fake, Duration::from_secs(1));

        let products = gateway.fetch_products(queries::product_list()).await.unwrap();
        assert_eq!(products.len(), 1);
    }

    #[tokio::test]
    async fn test_fake_applies_review_subquery() {
        let gateway = InMemoryGateway::new().with_products(vec![notebook()]);
        let query = queries::product_detail(&ProductId::from("HT-1000"), 2);

        let products = gateway.fetch_products(query).await.unwrap();
        let ids: Vec<_> = products[0].reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3"]);
    }

    #[tokio::test]
    async fn test_fake_list_query_omits_reviews() {
        let gateway = InMemoryGateway::new().with_products(vec![notebook()]);
        let products = gateway.fetch_products(queries::product_list()).await.unwrap();
        assert!(products[0].reviews.is_empty());
    }

    #[tokio::test]
    async fn test_fake_add_to_cart_merges_lines() {
        let gateway = InMemoryGateway::new().with_products(vec![notebook()]);
        let first = gateway.add_to_cart("HT-1000".into()).await.unwrap();
        let second = gateway.add_to_cart("HT-1000".into()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 2);
        assert_eq!(gateway.cart_items().len(), 1);
    }

    #[tokio::test]
    async fn test_fake_injected_failure_leaves_state() {
        let gateway = InMemoryGateway::new().with_products(vec![notebook()]);
        gateway.fail_next(Call::AddToCart, ShopError::Server("boom".into()));

        assert!(gateway.add_to_cart("HT-1000".into()).await.is_err());
        assert!(gateway.cart_items().is_empty());
        assert_eq!(gateway.call_count(Call::AddToCart), 1);
    }

    #[tokio::test]
    async fn test_cancellable_prefers_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let gateway = InMemoryGateway::new();

        let result = cancellable(&token, gateway.checkout()).await;
        assert_eq!(result, Err(ShopError::Cancelled));
    }
}
