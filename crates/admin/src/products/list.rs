//! Paged product list.
//!
//! The controller owns one published [`ListSnapshot`]. A successful fetch
//! swaps products and pagination in a single `Arc<ProductPage>`, so observers
//! never see one without the other. Each fetch takes a ticket; only the
//! newest ticket may publish.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hexmart_core::ProductPage;
use tokio::sync::watch;
use tracing::instrument;

use crate::api::AdminApi;

/// Fetch lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListState {
    #[default]
    Idle,
    Fetching,
    Loaded,
    /// The last fetch failed; the previous page is still shown.
    Failed,
}

/// What the list view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub state: ListState,
    pub page: Arc<ProductPage>,
    /// Page the next fetch asks for.
    pub requested_page: u32,
}

impl Default for ListSnapshot {
    fn default() -> Self {
        Self {
            state: ListState::Idle,
            page: Arc::new(ProductPage::default()),
            requested_page: 1,
        }
    }
}

impl ListSnapshot {
    /// Whether a page has ever been loaded into this snapshot.
    #[must_use]
    pub fn has_page(&self) -> bool {
        self.page.pagination.total_pages > 0
    }
}

/// Product list + pagination controller.
pub struct ProductListController<A> {
    api: Arc<A>,
    snapshot: Arc<watch::Sender<ListSnapshot>>,
    ticket: Arc<AtomicU64>,
}

impl<A> Clone for ProductListController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            snapshot: Arc::clone(&self.snapshot),
            ticket: Arc::clone(&self.ticket),
        }
    }
}

impl<A: AdminApi> ProductListController<A> {
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        let (tx, _rx) = watch::channel(ListSnapshot::default());
        Self {
            api,
            snapshot: Arc::new(tx),
            ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshot.subscribe()
    }

    /// Fetch the requested page and publish it if no newer fetch started.
    ///
    /// Failures are logged and leave the previous page in place.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let mut page = 1;
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = ListState::Fetching;
            page = snapshot.requested_page;
        });

        let result = self.api.list_products(page).await;

        if self.ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, page, "Discarding stale product page");
            return;
        }

        match result {
            Ok(loaded) => {
                tracing::debug!(
                    page,
                    products = loaded.products.len(),
                    total_pages = loaded.pagination.total_pages,
                    "Product page loaded"
                );
                self.snapshot.send_modify(|snapshot| {
                    if loaded.pagination.current_page > 0 {
                        snapshot.requested_page = loaded.pagination.current_page;
                    }
                    snapshot.page = Arc::new(loaded);
                    snapshot.state = ListState::Loaded;
                });
            }
            Err(e) => {
                tracing::error!(page, error = %e, "Failed to load products");
                self.snapshot.send_modify(|snapshot| snapshot.state = ListState::Failed);
            }
        }
    }

    /// Move to `page` and fetch it.
    ///
    /// Returns `false` without fetching when `page` is already the current
    /// page, or when a loaded pagination block says it does not exist.
    pub async fn change_page(&self, page: u32) -> bool {
        let accepted = self.snapshot.send_if_modified(|snapshot| {
            let out_of_range = snapshot.has_page() && !snapshot.page.pagination.contains(page);
            if page == snapshot.requested_page || page == 0 || out_of_range {
                return false;
            }
            snapshot.requested_page = page;
            true
        });

        if accepted {
            self.refresh().await;
        } else {
            tracing::debug!(page, "Page change ignored");
        }
        accepted
    }

    /// Drop everything shown and make in-flight fetches stale.
    pub fn reset(&self) {
        self.ticket.fetch_add(1, Ordering::SeqCst);
        self.snapshot.send_replace(ListSnapshot::default());
    }
}
