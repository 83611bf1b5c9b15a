//! Public catalog: paging, category filter, response cache and add-to-cart.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use hexmart_core::ProductId;
use hexmart_core::ui::{ActionTracker, ToastController};
use hexmart_integration_tests::FakeBackend;
use hexmart_storefront::catalog::{ADD_TO_CART_FAILED, ADDED_TO_CART};
use hexmart_storefront::{
    CartView, CatalogState, CatalogView, StorefrontApi, StorefrontClient,
};
use serde_json::json;

fn seeded() -> [(&'static str, &'static str); 5] {
    [
        ("Oolong", "茶葉"),
        ("Green", "茶葉"),
        ("Mug", "器具"),
        ("Black", "茶葉"),
        ("Pot", "器具"),
    ]
}

fn catalog(client: Arc<StorefrontClient>) -> CatalogView<StorefrontClient> {
    CatalogView::new(client, ActionTracker::new(), ToastController::default())
}

#[tokio::test]
async fn test_category_filter_and_paging() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&seeded());
    let view = catalog(Arc::new(backend.storefront()));

    view.set_category(Some("茶葉".to_string())).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.state, CatalogState::Loaded);
    assert_eq!(snapshot.page.pagination.total_pages, 2);
    let titles: Vec<_> = snapshot.page.products.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Oolong", "Green"]);

    assert!(view.change_page(2).await);
    let snapshot = view.snapshot();
    assert_eq!(snapshot.page.products[0].title, "Black");
    assert!(!view.change_page(3).await);

    let request = backend.requests().pop().unwrap();
    assert_eq!(request.path, "products");
    assert_eq!(request.query.as_deref(), Some("page=2&category=%E8%8C%B6%E8%91%89"));

    view.set_category(None).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.requested_page, 1);
    assert_eq!(snapshot.page.pagination.total_pages, 3);
}

#[tokio::test]
async fn test_catalog_responses_are_cached() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&seeded());
    let client = backend.storefront();

    let first = client.list_products(1, None).await.unwrap();
    let second = client.list_products(1, None).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(backend.count("GET", "products"), 1);

    client.list_products(1, Some("器具")).await.unwrap();
    assert_eq!(backend.count("GET", "products"), 2);

    let id = ProductId::new("p-3");
    assert_eq!(client.product(&id).await.unwrap().title, "Mug");
    assert_eq!(client.product(&id).await.unwrap().title, "Mug");
    assert_eq!(backend.count("GET", "product/p-3"), 1);

    client.invalidate_catalog();
    client.list_products(1, None).await.unwrap();
    assert_eq!(backend.count("GET", "products"), 3);
}

#[tokio::test]
async fn test_missing_product_detail_is_none() {
    let backend = FakeBackend::start().await;
    let view = catalog(Arc::new(backend.storefront()));

    assert!(view.detail(&ProductId::new("p-404")).await.is_none());
}

#[tokio::test]
async fn test_add_to_cart_posts_line_and_refreshes_badge() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&seeded());
    backend.set_cart(json!({
        "data": { "carts": [{ "id": "c-1", "product_id": "p-1", "qty": 2, "product": { "title": "Oolong", "price": 400 } }] }
    }));

    let client = Arc::new(backend.storefront());
    let toasts = ToastController::default();
    let tracker = ActionTracker::new();
    let cart = CartView::new(Arc::clone(&client), tracker.clone(), toasts.clone());
    let view = CatalogView::new(client, tracker, toasts).with_cart(cart.clone());

    assert!(view.add_to_cart(&ProductId::new("p-1"), 0).await);

    let payload = backend.payloads().pop().unwrap();
    assert_eq!(payload.method, "POST");
    assert_eq!(payload.path, "cart");
    assert_eq!(payload.body, json!({ "data": { "product_id": "p-1", "qty": 1 } }));
    assert_eq!(view.toasts().current().unwrap().message, ADDED_TO_CART);
    assert_eq!(cart.item_count(), 2);
}

#[tokio::test]
async fn test_add_to_cart_failure_toasts() {
    let backend = FakeBackend::start().await;
    backend.fail_cart_mutations();
    let view = catalog(Arc::new(backend.storefront()));

    assert!(!view.add_to_cart(&ProductId::new("p-1"), 2).await);

    let toast = view.toasts().current().unwrap();
    assert!(toast.is_error());
    assert_eq!(toast.message, ADD_TO_CART_FAILED);
    assert_eq!(backend.count("GET", "cart"), 0);
}
