//! Cart badge that follows the cart-changed signal.

use parking_lot::Mutex;
use std::sync::Arc;
use storefront_core::{ShopError, ShoppingCart};
use storefront_query::queries;
use tokio_util::sync::CancellationToken;

use crate::gateway::{cancellable, Gateway};
use crate::sequence::{Outcome, RequestSequence};
use crate::signal::CartSignal;

/// Total quantity of items in the current user's cart.
///
/// The count is always re-fetched; the signal carries no payload.
pub struct CartCounter {
    gateway: Arc<dyn Gateway>,
    signal: CartSignal,
    sequence: RequestSequence,
    count: Mutex<u64>,
    cancel: CancellationToken,
}

impl CartCounter {
    pub fn new(gateway: Arc<dyn Gateway>, signal: CartSignal) -> Self {
        Self {
            gateway,
            signal,
            sequence: RequestSequence::new(),
            count: Mutex::new(0),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn count(&self) -> u64 {
        *self.count.lock()
    }

    /// Badge text, `None` when the cart is empty.
    pub fn badge_text(&self) -> Option<String> {
        match self.count() {
            0 => None,
            n => Some(n.to_string()),
        }
    }

    pub async fn refresh(&self) -> Result<Outcome, ShopError> {
        let ticket = self.sequence.issue();
        let result = cancellable(
            &self.cancel,
            self.gateway.fetch_shopping_carts(queries::cart_item_count()),
        )
        .await;
        if self.cancel.is_cancelled() {
            return Err(ShopError::Cancelled);
        }
        if !self.sequence.is_current(ticket) {
            return Ok(Outcome::Discarded);
        }

        let carts = result.map_err(|e| {
            tracing::warn!("Failed to count cart items: {}", e);
            e
        })?;
        let count = carts.first().map(ShoppingCart::total_quantity).unwrap_or(0);
        tracing::debug!("Cart item count: {}", count);
        *self.count.lock() = count;
        Ok(Outcome::Applied)
    }

    /// Count once, then recount on every cart change until cancelled.
    pub async fn run(self: Arc<Self>) {
        let mut changes = self.signal.subscribe();
        if let Err(e) = self.refresh().await {
            tracing::warn!("Initial cart count failed: {}", e);
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                changed = changes.changed() => {
                    if !changed {
                        break;
                    }
                    if let Err(e) = self.refresh().await {
                        tracing::warn!("Cart count refresh failed: {}", e);
                    }
                }
            }
        }
        tracing::debug!("Cart counter stopped");
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
    use storefront_core::{Decimal, Product, ShoppingCartItem};

    fn line(id: &str, quantity: u32) -> ShoppingCartItem {
        let product = Product::new(format!("P-{}", id), "Product", Decimal::ONE, "EUR");
        ShoppingCartItem::new(id, product, quantity)
    }

    #[tokio::test]
    async fn test_refresh_sums_quantities() {
        let fake = Arc::new(InMemoryGateway::new().with_cart(vec![line("1", 2), line("2", 3)]));
        let counter = CartCounter::new(fake, CartSignal::new());

        assert_eq!(counter.badge_text(), None);
        counter.refresh().await.unwrap();
        assert_eq!(counter.count(), 5);
        assert_eq!(counter.badge_text().as_deref(), Some("5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recounts_on_cart_change() {
        let fake = Arc::new(InMemoryGateway::new().with_cart(vec![line("1", 1)]));
        let signal = CartSignal::new();
        let counter = Arc::new(CartCounter::new(fake.clone(), signal.clone()));
        let task = tokio::spawn(counter.clone().run());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.count(), 1);

        fake.set_cart(vec![line("1", 1), line("2", 4)]);
        signal.notify();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.count(), 5);
        assert_eq!(fake.call_count(Call::FetchShoppingCarts), 2);

        counter.teardown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_failed_refresh() {
        let fake = Arc::new(InMemoryGateway::new().with_cart(vec![line("1", 2)]));
        let signal = CartSignal::new();
        let counter = Arc::new(CartCounter::new(fake.clone(), signal.clone()));
        fake.fail_next(Call::FetchShoppingCarts, ShopError::Network("offline".into()));
        let task = tokio::spawn(counter.clone().run());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.count(), 0);

        signal.notify();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.count(), 2);

        counter.teardown();
        task.await.unwrap();
    }
}
