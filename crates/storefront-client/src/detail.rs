//! Product detail screen state.

use parking_lot::Mutex;
use std::sync::Arc;
use storefront_core::{Product, ProductId, ShopError};
use storefront_query::queries;
use tokio_util::sync::CancellationToken;

use crate::catalog::add_product_to_cart;
use crate::gateway::{cancellable, Gateway};
use crate::sequence::{Outcome, RequestSequence};
use crate::signal::CartSignal;

#[derive(Debug, Default)]
struct DetailState {
    product: Option<Product>,
    last_error: Option<ShopError>,
}

/// One product with its images and most helpful reviews.
pub struct ProductDetail {
    product_id: ProductId,
    top_reviews: usize,
    gateway: Arc<dyn Gateway>,
    signal: CartSignal,
    sequence: RequestSequence,
    state: Mutex<DetailState>,
    cancel: CancellationToken,
}

impl ProductDetail {
    pub fn new(
        product_id: ProductId,
        top_reviews: usize,
        gateway: Arc<dyn Gateway>,
        signal: CartSignal,
    ) -> Self {
        Self {
            product_id,
            top_reviews,
            gateway,
            signal,
            sequence: RequestSequence::new(),
            state: Mutex::new(DetailState::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product(&self) -> Option<Product> {
        self.state.lock().product.clone()
    }

    pub fn last_error(&self) -> Option<ShopError> {
        self.state.lock().last_error.clone()
    }

    /// Navigation title, the product name once loaded.
    pub fn title(&self) -> Option<String> {
        self.state.lock().product.as_ref().map(|p| p.name.clone())
    }

    /// Fetch the product. A response without the product is `NoData`.
    pub async fn load(&self) -> Result<Outcome, ShopError> {
        let ticket = self.sequence.issue();
        let query = queries::product_detail(&self.product_id, self.top_reviews);
        tracing::debug!("Loading product {}", self.product_id);

        let result = cancellable(&self.cancel, self.gateway.fetch_products(query)).await;
        if self.cancel.is_cancelled() {
            return Err(ShopError::Cancelled);
        }

        let mut state = self.state.lock();
        if !self.sequence.is_current(ticket) {
            tracing::debug!("Discarding superseded product response {:?}", ticket);
            return Ok(Outcome::Discarded);
        }

        let product = result.and_then(|products| {
            products
                .into_iter()
                .next()
                .ok_or_else(|| ShopError::NoData(format!("product {}", self.product_id)))
        });

        match product {
            Ok(product) => {
                state.product = Some(product);
                state.last_error = None;
                Ok(Outcome::Applied)
            }
            Err(e) => {
                tracing::warn!("Failed to load product {}: {}", self.product_id, e);
                state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Add the loaded product to the cart.
    pub async fn add_to_cart(&self) -> Result<String, ShopError> {
        let product = self
            .product()
            .ok_or_else(|| ShopError::NoData(format!("product {}", self.product_id)))?;
        add_product_to_cart(self.gateway.as_ref(), &self.signal, &self.cancel, &product).await
    }

    pub fn teardown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::{Call, InMemoryGateway};
    use std::time::Duration;
    use storefront_core::{Decimal, ProductImage, Review};

    fn review(id: &str, helpful_count: i64) -> Review {
        Review {
            id: id.to_string(),
            helpful_count,
            comment: String::new(),
        }
    }

    fn image(id: &str) -> ProductImage {
        ProductImage {
            id: id.to_string(),
            url: format!("/img/{}.jpg", id),
        }
    }

    fn notebook() -> Product {
        Product::new("HT-1000", "Notebook Basic 15", Decimal::from(956), "EUR")
            .with_images(vec![image("i1"), image("i2")])
            .with_reviews(vec![
                review("a", 10),
                review("b", 3),
                review("c", 10),
                review("d", 7),
                review("e", 1),
            ])
    }

    fn detail(id: &str) -> (Arc<InMemoryGateway>, ProductDetail) {
        let fake = Arc::new(InMemoryGateway::new().with_products(vec![notebook()]));
        let detail = ProductDetail::new(id.into(), 3, fake.clone(), CartSignal::new());
        (fake, detail)
    }

    #[tokio::test]
    async fn test_load_keeps_top_reviews_in_fetch_order() {
        let (_fake, detail) = detail("HT-1000");
        assert_eq!(detail.load().await, Ok(Outcome::Applied));

        let product = detail.product().unwrap();
        let ids: Vec<_> = product.reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(product.images.len(), 2);
        assert_eq!(detail.title().as_deref(), Some("Notebook Basic 15"));
    }

    #[tokio::test]
    async fn test_missing_product_is_no_data() {
        let (_fake, detail) = detail("HT-9999");
        let result = detail.load().await;
        assert!(matches!(result, Err(ShopError::NoData(_))));
        assert!(detail.product().is_none());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_product() {
        let (fake, detail) = detail("HT-1000");
        detail.load().await.unwrap();

        fake.fail_next(Call::FetchProducts, ShopError::Server("maintenance".into()));
        assert!(detail.load().await.is_err());
        assert!(detail.product().is_some());
        assert_eq!(detail.last_error(), Some(ShopError::Server("maintenance".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_load_response_is_discarded() {
        let (fake, detail) = detail("HT-1000");

        // First load answers slowly with the product as it was.
        fake.delay_next(Call::FetchProducts, Duration::from_millis(100));
        let first = detail.load();

        let second = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            fake.set_products(vec![notebook().with_description("Refreshed")]);
            fake.delay_next(Call::FetchProducts, Duration::from_millis(10));
            detail.load().await
        };

        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, Ok(Outcome::Discarded));
        assert_eq!(second, Ok(Outcome::Applied));
        assert_eq!(detail.product().unwrap().description, "Refreshed");
    }

    #[tokio::test]
    async fn test_add_to_cart_requires_loaded_product() {
        let (fake, detail) = detail("HT-1000");
        assert!(matches!(detail.add_to_cart().await, Err(ShopError::NoData(_))));
        assert_eq!(fake.call_count(Call::AddToCart), 0);

        detail.load().await.unwrap();
        let message = detail.add_to_cart().await.unwrap();
        assert_eq!(message, "Notebook Basic 15 added to cart.");
        assert_eq!(fake.cart_items()[0].quantity, 1);
    }
}
