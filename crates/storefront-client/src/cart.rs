//! Cart reconciliation.
//!
//! The [`CartReconciler`] keeps the displayed cart consistent with the
//! server. It never edits rows on its own authority: every mutation is sent
//! first and followed by a wholesale refetch. While a mutation is in flight
//! the affected row shows the pending quantity or a deletion flag, which are
//! reset on every reconciliation.
//!
//! ```text
//! Idle ──refresh──▶ Loading ──▶ Loaded ──mutate──▶ Mutating ──▶ Loaded
//!                      │                              │
//!                      └──────────▶ Failed ◀──────────┘
//! ```

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storefront_core::{CartItemId, ShopError, ShoppingCart, ShoppingCartItem};
use storefront_query::queries;
use tokio_util::sync::CancellationToken;

use crate::gateway::{cancellable, Gateway};
use crate::sequence::{Outcome, RequestSequence};
use crate::signal::CartSignal;

/// Lifecycle of the cart screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Mutating,
    Failed,
}

/// A cart line as the presentation layer should draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    pub item: ShoppingCartItem,

    /// Pending quantity if an update is in flight, else the confirmed one.
    pub displayed_quantity: u32,

    /// A delete for this row has been sent but not reconciled.
    pub deletion_requested: bool,
}

#[derive(Debug, Default)]
struct CartState {
    phase: CartPhase,
    snapshot: Option<ShoppingCart>,
    pending_quantities: HashMap<CartItemId, u32>,
    deletion_requested: HashSet<CartItemId>,
    last_error: Option<ShopError>,
}

impl CartState {
    fn fail(&mut self, error: &ShopError) {
        self.phase = CartPhase::Failed;
        self.last_error = Some(error.clone());
    }

    fn replace(&mut self, cart: ShoppingCart) {
        self.snapshot = Some(cart);
        self.pending_quantities.clear();
        self.deletion_requested.clear();
        self.phase = CartPhase::Loaded;
        self.last_error = None;
    }
}

// =============================================================================
// CartReconciler
// =============================================================================

/// Owns the cart snapshot and every cart mutation.
pub struct CartReconciler {
    gateway: Arc<dyn Gateway>,
    signal: CartSignal,
    sequence: RequestSequence,
    state: Mutex<CartState>,
    cancel: CancellationToken,
}

impl CartReconciler {
    pub fn new(gateway: Arc<dyn Gateway>, signal: CartSignal) -> Self {
        Self {
            gateway,
            signal,
            sequence: RequestSequence::new(),
            state: Mutex::new(CartState::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Tie this reconciler's lifetime to `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    pub fn phase(&self) -> CartPhase {
        self.state.lock().phase
    }

    /// Last reconciled cart, `None` before the first successful refresh.
    pub fn snapshot(&self) -> Option<ShoppingCart> {
        self.state.lock().snapshot.clone()
    }

    pub fn last_error(&self) -> Option<ShopError> {
        self.state.lock().last_error.clone()
    }

    pub fn rows(&self) -> Vec<CartRow> {
        let state = self.state.lock();
        let Some(cart) = state.snapshot.as_ref() else {
            return Vec::new();
        };
        cart.items
            .iter()
            .map(|item| CartRow {
                displayed_quantity: state
                    .pending_quantities
                    .get(&item.id)
                    .copied()
                    .unwrap_or(item.quantity),
                deletion_requested: state.deletion_requested.contains(&item.id),
                item: item.clone(),
            })
            .collect()
    }

    /// Quantity to display for `id`: pending if an update is in flight.
    pub fn displayed_quantity(&self, id: &CartItemId) -> Option<u32> {
        let state = self.state.lock();
        let confirmed = state.snapshot.as_ref()?.item(id)?.quantity;
        Some(state.pending_quantities.get(id).copied().unwrap_or(confirmed))
    }

    pub fn is_deletion_requested(&self, id: &CartItemId) -> bool {
        self.state.lock().deletion_requested.contains(id)
    }

    /// Whether the checkout button should be enabled.
    pub fn can_checkout(&self) -> bool {
        let state = self.state.lock();
        state.snapshot.as_ref().is_some_and(|cart| !cart.is_empty())
    }

    /// Subtotal text for the footer.
    pub fn footer_text(&self) -> Option<String> {
        self.state.lock().snapshot.as_ref().map(ShoppingCart::formatted_total)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Fetch the cart and replace the snapshot wholesale.
    pub async fn refresh(&self) -> Result<Outcome, ShopError> {
        let ticket = self.sequence.issue();
        {
            let mut state = self.state.lock();
            if state.phase != CartPhase::Mutating {
                state.phase = CartPhase::Loading;
            }
        }
        tracing::debug!("Refreshing shopping cart, ticket: {:?}", ticket);

        let result = cancellable(
            &self.cancel,
            self.gateway.fetch_shopping_carts(queries::shopping_cart()),
        )
        .await;
        if self.cancel.is_cancelled() {
            return Err(ShopError::Cancelled);
        }

        {
            let mut state = self.state.lock();
            if !self.sequence.is_current(ticket) {
                match &result {
                    Ok(_) => tracing::debug!("Discarding superseded cart response {:?}", ticket),
                    Err(e) => tracing::warn!("Superseded cart refresh failed: {}", e),
                }
                return Ok(Outcome::Discarded);
            }

            match result {
                Ok(carts) => {
                    let cart = carts.into_iter().next().unwrap_or_else(ShoppingCart::empty);
                    tracing::debug!("Cart reconciled with {} items", cart.items.len());
                    state.replace(cart);
                }
                Err(e) => {
                    tracing::warn!("Failed to load shopping cart: {}", e);
                    state.fail(&e);
                    return Err(e);
                }
            }
        }

        self.signal.notify();
        Ok(Outcome::Applied)
    }

    /// Change the quantity of one line.
    ///
    /// Sends nothing when `quantity` equals the confirmed quantity.
    pub async fn set_item_quantity(
        &self,
        id: &CartItemId,
        quantity: u32,
    ) -> Result<Outcome, ShopError> {
        let update = {
            let mut state = self.state.lock();
            let item = state
                .snapshot
                .as_ref()
                .and_then(|cart| cart.item(id))
                .cloned()
                .ok_or_else(|| ShopError::NoData(format!("cart item {}", id)))?;

            if item.quantity == quantity {
                state.pending_quantities.remove(id);
                return Ok(Outcome::Unchanged);
            }

            state.pending_quantities.insert(id.clone(), quantity);
            state.phase = CartPhase::Mutating;
            ShoppingCartItem { quantity, ..item }
        };
        tracing::debug!("Updating cart item {} to quantity {}", id, quantity);

        let result = cancellable(&self.cancel, self.gateway.update_cart_item(update)).await;
        if self.cancel.is_cancelled() {
            return Err(ShopError::Cancelled);
        }

        match result {
            Ok(()) => {
                {
                    let mut state = self.state.lock();
                    let confirmed = state
                        .snapshot
                        .as_mut()
                        .and_then(|cart| cart.items.iter_mut().find(|i| &i.id == id));
                    if let Some(item) = confirmed {
                        item.quantity = quantity;
                    }
                    if state.pending_quantities.get(id) == Some(&quantity) {
                        state.pending_quantities.remove(id);
                    }
                }
                self.signal.notify();
                self.refresh().await
            }
            Err(e) => {
                tracing::warn!("Failed to update cart item {}: {}", id, e);
                let mut state = self.state.lock();
                if state.pending_quantities.get(id) == Some(&quantity) {
                    state.pending_quantities.remove(id);
                }
                state.fail(&e);
                Err(e)
            }
        }
    }

    /// Delete one line. The row stays until the following refresh drops it.
    pub async fn delete_item(&self, id: &CartItemId) -> Result<Outcome, ShopError> {
        let item = {
            let mut state = self.state.lock();
            let item = state
                .snapshot
                .as_ref()
                .and_then(|cart| cart.item(id))
                .cloned()
                .ok_or_else(|| ShopError::NoData(format!("cart item {}", id)))?;
            state.deletion_requested.insert(id.clone());
            state.phase = CartPhase::Mutating;
            item
        };
        tracing::debug!("Deleting cart item {}", id);

        let result = cancellable(&self.cancel, self.gateway.delete_cart_item(item)).await;
        if self.cancel.is_cancelled() {
            return Err(ShopError::Cancelled);
        }

        match result {
            Ok(()) => {
                self.signal.notify();
                self.refresh().await
            }
            Err(e) => {
                tracing::warn!("Failed to delete cart item {}: {}", id, e);
                let mut state = self.state.lock();
                state.deletion_requested.remove(id);
                state.fail(&e);
                Err(e)
            }
        }
    }

    /// Order everything in the cart.
    ///
    /// Refused with [`ShopError::EmptyCart`] before any gateway call when
    /// the cart holds no items.
    pub async fn checkout(&self) -> Result<Outcome, ShopError> {
        {
            let mut state = self.state.lock();
            if !state.snapshot.as_ref().is_some_and(|cart| !cart.is_empty()) {
                tracing::warn!("Checkout refused: shopping cart is empty");
                return Err(ShopError::EmptyCart);
            }
            state.phase = CartPhase::Mutating;
        }
        // Supersedes any refresh still in flight.
        let ticket = self.sequence.issue();
        tracing::debug!("Checking out shopping cart, ticket: {:?}", ticket);

        let result = cancellable(&self.cancel, self.gateway.checkout()).await;
        if self.cancel.is_cancelled() {
            return Err(ShopError::Cancelled);
        }

        let outcome = {
            let mut state = self.state.lock();
            match result {
                Err(e) => {
                    tracing::warn!("Checkout failed: {}", e);
                    state.fail(&e);
                    return Err(e);
                }
                Ok(_) if self.sequence.is_current(ticket) => {
                    state.replace(ShoppingCart::empty());
                    Outcome::Applied
                }
                Ok(_) => {
                    tracing::debug!("Checkout result superseded by a newer refresh");
                    Outcome::Discarded
                }
            }
        };

        tracing::info!("Checkout completed");
        self.signal.notify();
        Ok(outcome)
    }

    /// Stop applying results. Requests in flight resolve to `Cancelled`.
    pub fn teardown(&self) {
        tracing::debug!("Tearing down cart reconciler");
        self.cancel.cancel();
    }
}

// =============================================================================
// Tests
// =============================================================================
