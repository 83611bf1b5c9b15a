//! Cart page controller.
//!
//! Loads are ticketed like the admin product list: a response that arrives
//! after a newer load started is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hexmart_core::ui::{ActionKey, ActionTracker, ToastController};
use tokio::sync::watch;
use tracing::instrument;

use super::normalize::{CartItem, normalize_cart};
use super::totals::CartTotals;
use crate::api::{CartLine, StorefrontApi};

pub const LOAD_FAILED: &str = "載入購物車失敗";
pub const QTY_UPDATED: &str = "已更新數量";
pub const QTY_UPDATE_FAILED: &str = "更新數量失敗";
pub const ITEM_REMOVED: &str = "已刪除項目";
pub const REMOVE_FAILED: &str = "刪除失敗";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartState {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Last load failed; the previous items are still shown.
    Failed,
}

/// What the cart page renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    pub state: CartState,
    pub items: Arc<Vec<CartItem>>,
    pub totals: CartTotals,
    /// Header badge: sum of quantities.
    pub item_count: u32,
}

impl CartSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The cart view.
pub struct CartView<S> {
    api: Arc<S>,
    snapshot: Arc<watch::Sender<CartSnapshot>>,
    ticket: Arc<AtomicU64>,
    tracker: ActionTracker,
    toasts: ToastController,
}

impl<S> Clone for CartView<S> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            snapshot: Arc::clone(&self.snapshot),
            ticket: Arc::clone(&self.ticket),
            tracker: self.tracker.clone(),
            toasts: self.toasts.clone(),
        }
    }
}

impl<S: StorefrontApi> CartView<S> {
    #[must_use]
    pub fn new(api: Arc<S>, tracker: ActionTracker, toasts: ToastController) -> Self {
        let (tx, _rx) = watch::channel(CartSnapshot::default());
        Self {
            api,
            snapshot: Arc::new(tx),
            ticket: Arc::new(AtomicU64::new(0)),
            tracker,
            toasts,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshot.subscribe()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.snapshot.borrow().item_count
    }

    #[must_use]
    pub const fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn toasts(&self) -> &ToastController {
        &self.toasts
    }

    /// Fetch and normalize the cart.
    ///
    /// On failure the previous items stay and an error toast is shown.
    #[instrument(skip(self))]
    pub async fn load(&self) {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot
            .send_modify(|snapshot| snapshot.state = CartState::Loading);

        let result = self.api.cart().await;

        if self.ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "Discarding stale cart response");
            return;
        }

        match result {
            Ok(body) => {
                let items = normalize_cart(&body);
                let totals = CartTotals::from_items(&items);
                let item_count = items.iter().fold(0_u32, |sum, item| sum.saturating_add(item.qty));
                tracing::debug!(lines = items.len(), item_count, "Cart loaded");
                self.snapshot.send_replace(CartSnapshot {
                    state: CartState::Loaded,
                    items: Arc::new(items),
                    totals,
                    item_count,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load cart");
                self.toasts.error(LOAD_FAILED);
                self.snapshot
                    .send_modify(|snapshot| snapshot.state = CartState::Failed);
            }
        }
    }

    /// Set a line's quantity (at least 1) and reload.
    #[instrument(skip(self, item), fields(cart_item = %item.id))]
    pub async fn change_qty(&self, item: &CartItem, qty: i64) -> bool {
        let key = ActionKey::CartQty(item.id.to_string());
        if self.tracker.is_loading(&key) {
            return false;
        }

        let line = CartLine {
            product_id: item.product_id(),
            qty: clamp_qty(qty),
        };
        let result = self
            .tracker
            .run_tracked(&key, self.api.update_cart_item(&item.id, &line))
            .await;

        match result {
            Ok(_) => {
                self.toasts.success(QTY_UPDATED);
                self.load().await;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to update cart quantity");
                self.toasts.error(QTY_UPDATE_FAILED);
                false
            }
        }
    }

    /// Delete a line and reload.
    #[instrument(skip(self, item), fields(cart_item = %item.id))]
    pub async fn remove(&self, item: &CartItem) -> bool {
        let key = ActionKey::CartRemove(item.id.to_string());
        if self.tracker.is_loading(&key) {
            return false;
        }

        let result = self
            .tracker
            .run_tracked(&key, self.api.remove_cart_item(&item.id))
            .await;

        match result {
            Ok(_) => {
                self.toasts.success(ITEM_REMOVED);
                self.load().await;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to remove cart item");
                self.toasts.error(REMOVE_FAILED);
                false
            }
        }
    }
}

/// Quantities below 1 become 1.
#[must_use]
pub fn clamp_qty(qty: i64) -> u32 {
    u32::try_from(qty.max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::testing::FakeStore;

    fn view(store: &FakeStore) -> CartView<FakeStore> {
        CartView::new(
            Arc::new(store.clone()),
            ActionTracker::new(),
            ToastController::default(),
        )
    }

    fn two_line_cart() -> serde_json::Value {
        json!({"data": {"carts": [
            {"id": "c1", "product_id": "p1", "qty": 2, "product": {"title": "Tea", "price": 600}},
            {"id": "c2", "product_id": "p2", "qty": 1, "product": {"title": "Mug", "price": 300}}
        ]}})
    }

    #[tokio::test]
    async fn test_load_normalizes_and_totals() {
        let store = FakeStore::new().with_cart(two_line_cart());
        let cart = view(&store);
        cart.load().await;

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.state, CartState::Loaded);
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.totals.subtotal, Decimal::from(1500));
        assert_eq!(snapshot.totals.shipping, Decimal::from(120));
        assert_eq!(snapshot.totals.total, Decimal::from(1620));
        assert_eq!(cart.item_count(), 3);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_items_and_toasts() {
        let store = FakeStore::new().with_cart(two_line_cart());
        let cart = view(&store);
        cart.load().await;

        store.fail_cart(Some(500));
        cart.load().await;

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.state, CartState::Failed);
        assert_eq!(snapshot.items.len(), 2);
        let toast = cart.toasts().current().unwrap();
        assert!(toast.is_error());
        assert_eq!(toast.message, LOAD_FAILED);
    }

    #[tokio::test]
    async fn test_change_qty_clamps_to_one() {
        let store = FakeStore::new().with_cart(two_line_cart());
        let cart = view(&store);
        cart.load().await;
        let item = cart.snapshot().items[0].clone();

        assert!(cart.change_qty(&item, 0).await);
        assert!(cart.change_qty(&item, -5).await);

        let sent = store.cart_updates();
        assert_eq!(sent.len(), 2);
        for (id, line) in sent {
            assert_eq!(id.as_str(), "c1");
            assert_eq!(line.qty, 1);
            assert_eq!(line.product_id, Some(json!("p1")));
        }
        assert_eq!(cart.toasts().current().unwrap().message, QTY_UPDATED);
        assert_eq!(store.count("cart get"), 3);
    }

    #[tokio::test]
    async fn test_change_qty_failure() {
        let store = FakeStore::new().with_cart(two_line_cart());
        let cart = view(&store);
        cart.load().await;
        let item = cart.snapshot().items[0].clone();

        store.fail_mutations(Some(400));
        assert!(!cart.change_qty(&item, 3).await);
        assert_eq!(cart.toasts().current().unwrap().message, QTY_UPDATE_FAILED);
        assert_eq!(store.count("cart get"), 1);
        assert!(!cart.tracker().is_loading(&ActionKey::CartQty("c1".to_string())));
    }

    #[tokio::test]
    async fn test_remove_reloads() {
        let store = FakeStore::new().with_cart(two_line_cart());
        let cart = view(&store);
        cart.load().await;
        let item = cart.snapshot().items[1].clone();

        assert!(cart.remove(&item).await);
        assert!(store.calls().contains(&"cart delete c2".to_string()));
        assert_eq!(cart.toasts().current().unwrap().message, ITEM_REMOVED);
        assert_eq!(store.count("cart get"), 2);

        store.fail_mutations(Some(404));
        assert!(!cart.remove(&item).await);
        assert_eq!(cart.toasts().current().unwrap().message, REMOVE_FAILED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cart_response_is_discarded() {
        let store = FakeStore::new().with_cart(json!({"carts": [{"id": "old", "qty": 1}]}));
        let cart = view(&store);

        store.delay_cart(Duration::from_millis(200));
        let slow = tokio::spawn({
            let cart = cart.clone();
            async move { cart.load().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        store.delay_cart(Duration::ZERO);
        store.set_cart(json!({"carts": [{"id": "new", "qty": 5}]}));
        cart.load().await;
        assert_eq!(cart.snapshot().items[0].id.as_str(), "new");

        slow.await.unwrap();
        assert_eq!(cart.snapshot().items[0].id.as_str(), "new");
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_clamp_qty() {
        assert_eq!(clamp_qty(0), 1);
        assert_eq!(clamp_qty(-5), 1);
        assert_eq!(clamp_qty(7), 7);
        assert_eq!(clamp_qty(i64::MAX), u32::MAX);
    }
}
