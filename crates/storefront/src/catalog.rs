//! Public product catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hexmart_core::ui::{ActionKey, ActionTracker, ToastController};
use hexmart_core::{Product, ProductId, ProductPage};
use tokio::sync::watch;
use tracing::instrument;

use crate::api::{CartLine, StorefrontApi};
use crate::cart::CartView;

pub const ADDED_TO_CART: &str = "已加入購物車";
pub const ADD_TO_CART_FAILED: &str = "加入購物車失敗";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogState {
    #[default]
    Idle,
    Fetching,
    Loaded,
    Failed,
}

/// What the catalog page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub state: CatalogState,
    pub page: Arc<ProductPage>,
    pub requested_page: u32,
    pub category: Option<String>,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self {
            state: CatalogState::Idle,
            page: Arc::new(ProductPage::default()),
            requested_page: 1,
            category: None,
        }
    }
}

/// Catalog page controller.
pub struct CatalogView<S> {
    api: Arc<S>,
    snapshot: Arc<watch::Sender<CatalogSnapshot>>,
    ticket: Arc<AtomicU64>,
    tracker: ActionTracker,
    toasts: ToastController,
    cart: Option<CartView<S>>,
}

impl<S> Clone for CatalogView<S> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            snapshot: Arc::clone(&self.snapshot),
            ticket: Arc::clone(&self.ticket),
            tracker: self.tracker.clone(),
            toasts: self.toasts.clone(),
            cart: self.cart.clone(),
        }
    }
}

impl<S: StorefrontApi> CatalogView<S> {
    #[must_use]
    pub fn new(api: Arc<S>, tracker: ActionTracker, toasts: ToastController) -> Self {
        let (tx, _rx) = watch::channel(CatalogSnapshot::default());
        Self {
            api,
            snapshot: Arc::new(tx),
            ticket: Arc::new(AtomicU64::new(0)),
            tracker,
            toasts,
            cart: None,
        }
    }

    /// Reload `cart` after every successful add, keeping its badge current.
    #[must_use]
    pub fn with_cart(mut self, cart: CartView<S>) -> Self {
        self.cart = Some(cart);
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.snapshot.subscribe()
    }

    #[must_use]
    pub const fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn toasts(&self) -> &ToastController {
        &self.toasts
    }

    /// Fetch the requested page in the selected category.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let mut request = (1, None);
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = CatalogState::Fetching;
            request = (snapshot.requested_page, snapshot.category.clone());
        });
        let (page, category) = request;

        let result = self.api.list_products(page, category.as_deref()).await;

        if self.ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, page, "Discarding stale catalog page");
            return;
        }

        match result {
            Ok(loaded) => {
                self.snapshot.send_modify(|snapshot| {
                    if loaded.pagination.current_page > 0 {
                        snapshot.requested_page = loaded.pagination.current_page;
                    }
                    snapshot.page = loaded;
                    snapshot.state = CatalogState::Loaded;
                });
            }
            Err(e) => {
                tracing::error!(page, error = %e, "Failed to load catalog");
                self.snapshot
                    .send_modify(|snapshot| snapshot.state = CatalogState::Failed);
            }
        }
    }

    /// Move to `page`. Same no-op rules as the admin list.
    pub async fn change_page(&self, page: u32) -> bool {
        let accepted = self.snapshot.send_if_modified(|snapshot| {
            let pagination = &snapshot.page.pagination;
            let out_of_range = pagination.total_pages > 0 && !pagination.contains(page);
            if page == 0 || page == snapshot.requested_page || out_of_range {
                return false;
            }
            snapshot.requested_page = page;
            true
        });
        if accepted {
            self.refresh().await;
        }
        accepted
    }

    /// Switch category (or clear it) and fetch its first page.
    pub async fn set_category(&self, category: Option<String>) {
        let category = category.filter(|c| !c.trim().is_empty());
        self.snapshot.send_modify(|snapshot| {
            snapshot.category = category;
            snapshot.requested_page = 1;
        });
        self.refresh().await;
    }

    /// One product's detail. Failures are logged and yield `None`.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn detail(&self, id: &ProductId) -> Option<Product> {
        match self.api.product(id).await {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load product");
                None
            }
        }
    }

    /// Add `qty` (at least 1) of a product to the cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: &ProductId, qty: i64) -> bool {
        let key = ActionKey::CartAdd(product_id.to_string());
        if self.tracker.is_loading(&key) {
            return false;
        }

        let line = CartLine {
            product_id: Some(serde_json::Value::String(product_id.to_string())),
            qty: crate::cart::view::clamp_qty(qty),
        };
        let result = self
            .tracker
            .run_tracked(&key, self.api.add_to_cart(&line))
            .await;

        match result {
            Ok(_) => {
                self.toasts.success(ADDED_TO_CART);
                if let Some(cart) = &self.cart {
                    cart.load().await;
                }
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to add to cart");
                self.toasts.error(ADD_TO_CART_FAILED);
                false
            }
        }
    }
}
