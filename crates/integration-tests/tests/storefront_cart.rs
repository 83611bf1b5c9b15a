//! Cart view against the fake backend.
//!
//! The cart endpoint's response shape has varied between backend versions;
//! each known envelope must load into the same lines.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use hexmart_core::ui::{ActionTracker, ToastController};
use hexmart_integration_tests::FakeBackend;
use hexmart_storefront::cart::view::{ITEM_REMOVED, LOAD_FAILED, QTY_UPDATE_FAILED, QTY_UPDATED};
use hexmart_storefront::{CartState, CartView, StorefrontClient};
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn cart(backend: &FakeBackend) -> CartView<StorefrontClient> {
    CartView::new(
        Arc::new(backend.storefront()),
        ActionTracker::new(),
        ToastController::default(),
    )
}

fn lines() -> Value {
    json!([
        {
            "id": "c-1",
            "product_id": "p-1",
            "qty": 2,
            "product": { "title": "Oolong", "price": 400, "imageUrl": "https://img.example/oolong.png" }
        },
        {
            "id": "c-2",
            "product_id": "p-2",
            "quantity": "3",
            "title": "Mug",
            "price": "250"
        }
    ])
}

// =============================================================================
// Envelopes
// =============================================================================

#[tokio::test]
async fn test_each_envelope_loads_the_same_lines() {
    let backend = FakeBackend::start().await;
    let bodies = [
        json!({ "success": true, "data": { "carts": lines(), "total": 1550 } }),
        json!({ "success": true, "carts": lines() }),
        json!({ "success": true, "cart": lines() }),
    ];

    for body in bodies {
        backend.set_cart(body.clone());
        let view = cart(&backend);
        view.load().await;

        let snapshot = view.snapshot();
        assert_eq!(snapshot.state, CartState::Loaded, "{body}");
        let summary: Vec<_> = snapshot
            .items
            .iter()
            .map(|item| (item.id.to_string(), item.title.clone(), item.qty))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("c-1".to_string(), "Oolong".to_string(), 2),
                ("c-2".to_string(), "Mug".to_string(), 3),
            ],
            "{body}"
        );
        assert_eq!(snapshot.items[0].image_url, "https://img.example/oolong.png");
        assert_eq!(snapshot.item_count, 5);
        assert_eq!(snapshot.totals.subtotal, Decimal::from(1550));
        assert_eq!(snapshot.totals.shipping, Decimal::from(120));
        assert_eq!(snapshot.totals.total, Decimal::from(1670));
    }
}

#[tokio::test]
async fn test_unknown_shape_is_an_empty_cart() {
    let backend = FakeBackend::start().await;
    backend.set_cart(json!({ "success": true, "items": lines() }));
    let view = cart(&backend);

    view.load().await;

    let snapshot = view.snapshot();
    assert_eq!(snapshot.state, CartState::Loaded);
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.totals.total, Decimal::ZERO);
}

#[tokio::test]
async fn test_free_shipping_from_threshold() {
    let backend = FakeBackend::start().await;
    backend.set_cart(json!({
        "carts": [{ "id": "c-1", "product": { "title": "Gift box", "price": 1000 }, "qty": 2 }]
    }));
    let view = cart(&backend);

    view.load().await;

    let totals = view.snapshot().totals;
    assert_eq!(totals.subtotal, Decimal::from(2000));
    assert_eq!(totals.shipping, Decimal::from(120));

    backend.set_cart(json!({
        "carts": [{ "id": "c-1", "product": { "title": "Gift box", "price": 2001 }, "qty": 1 }]
    }));
    view.load().await;
    let totals = view.snapshot().totals;
    assert_eq!(totals.shipping, Decimal::ZERO);
    assert_eq!(totals.total, Decimal::from(2001));
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_change_qty_clamps_and_sends_product_id() {
    let backend = FakeBackend::start().await;
    backend.set_cart(json!({ "data": { "carts": lines() } }));
    let view = cart(&backend);
    view.load().await;
    let item = view.snapshot().items[0].clone();

    assert!(view.change_qty(&item, -5).await);

    let payload = backend.payloads().pop().unwrap();
    assert_eq!(payload.method, "PUT");
    assert_eq!(payload.path, "cart/c-1");
    assert_eq!(payload.body, json!({ "data": { "product_id": "p-1", "qty": 1 } }));
    assert_eq!(backend.count("GET", "cart"), 2);
}

#[tokio::test]
async fn test_remove_reloads_cart() {
    let backend = FakeBackend::start().await;
    backend.set_cart(json!({ "carts": lines() }));
    let view = cart(&backend);
    view.load().await;
    let item = view.snapshot().items[1].clone();

    assert!(view.remove(&item).await);

    assert_eq!(backend.count("DELETE", "cart/c-2"), 1);
    assert_eq!(backend.count("GET", "cart"), 2);
    assert_eq!(view.toasts().current().unwrap().message, ITEM_REMOVED);
    assert!(!view.tracker().is_loading(&hexmart_core::ui::ActionKey::CartRemove("c-2".to_string())));
}

#[tokio::test]
async fn test_failed_update_keeps_lines_and_shows_error() {
    let backend = FakeBackend::start().await;
    backend.set_cart(json!({ "carts": lines() }));
    backend.fail_cart_mutations();
    let view = cart(&backend);
    view.load().await;
    let item = view.snapshot().items[0].clone();

    assert!(!view.change_qty(&item, 4).await);

    let toast = view.toasts().current().unwrap();
    assert!(toast.is_error());
    assert_eq!(toast.message, QTY_UPDATE_FAILED);
    assert_eq!(view.snapshot().items[0].qty, 2);
    assert_eq!(backend.count("GET", "cart"), 1);
}

#[tokio::test]
async fn test_no_content_acks_reload_the_cart() {
    let backend = FakeBackend::start().await;
    backend.set_cart(json!({ "carts": lines() }));
    backend.ack_with_no_content();
    let view = cart(&backend);
    view.load().await;
    let item = view.snapshot().items[0].clone();

    assert!(view.change_qty(&item, 3).await);
    assert_eq!(view.toasts().current().unwrap().message, QTY_UPDATED);
    assert!(view.remove(&item).await);
    assert_eq!(view.toasts().current().unwrap().message, ITEM_REMOVED);
    assert_eq!(backend.count("GET", "cart"), 3);
}

#[tokio::test]
async fn test_unreachable_backend_marks_cart_failed() {
    let backend = FakeBackend::start().await;
    let client = backend.storefront();
    drop(backend);
    let view = CartView::new(
        Arc::new(client),
        ActionTracker::new(),
        ToastController::default(),
    );

    view.load().await;

    assert_eq!(view.snapshot().state, CartState::Failed);
    assert_eq!(view.toasts().current().unwrap().message, LOAD_FAILED);
}
