//! Cart commands.

use std::sync::Arc;

use hexmart_core::ui::{ActionTracker, ToastController};
use hexmart_core::{ProductId, format_amount};
use hexmart_storefront::cart::view::{
    ITEM_REMOVED, LOAD_FAILED, QTY_UPDATE_FAILED, QTY_UPDATED, REMOVE_FAILED,
};
use hexmart_storefront::catalog::{ADD_TO_CART_FAILED, ADDED_TO_CART};
use hexmart_storefront::{CartItem, CartState, CartView, CatalogView, StorefrontClient};

use super::{CliError, connect, toast_text};

fn cart_view(client: Arc<StorefrontClient>, toasts: ToastController) -> CartView<StorefrontClient> {
    CartView::new(client, ActionTracker::new(), toasts)
}

/// Load the cart, failing with the view's error toast.
async fn loaded_cart() -> Result<CartView<StorefrontClient>, CliError> {
    let client = Arc::new(StorefrontClient::new(connect()?));
    let cart = cart_view(client, ToastController::default());
    cart.load().await;
    if cart.snapshot().state == CartState::Failed {
        return Err(CliError::Rejected(toast_text(cart.toasts(), LOAD_FAILED)));
    }
    Ok(cart)
}

fn find_line(cart: &CartView<StorefrontClient>, id: &str) -> Result<CartItem, CliError> {
    cart.snapshot()
        .items
        .iter()
        .find(|item| item.id.as_str() == id)
        .cloned()
        .ok_or_else(|| CliError::CartLineNotFound(id.to_string()))
}

fn log_cart(cart: &CartView<StorefrontClient>) {
    let snapshot = cart.snapshot();
    if snapshot.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }
    for item in snapshot.items.iter() {
        tracing::info!(
            "{}  {} × {}  {}  = {}",
            item.id,
            item.title,
            item.qty,
            format_amount(item.price),
            format_amount(item.line_total())
        );
    }
    let totals = snapshot.totals;
    tracing::info!("Items: {}", snapshot.item_count);
    tracing::info!("Subtotal: {}", format_amount(totals.subtotal));
    tracing::info!("Shipping: {}", format_amount(totals.shipping));
    tracing::info!("Total: {}", format_amount(totals.total));
}

/// Show cart lines and totals.
pub async fn show() -> Result<(), CliError> {
    let cart = loaded_cart().await?;
    log_cart(&cart);
    Ok(())
}

/// Add `qty` of a product.
pub async fn add(product_id: &str, qty: i64) -> Result<(), CliError> {
    let client = Arc::new(StorefrontClient::new(connect()?));
    let toasts = ToastController::default();
    let cart = cart_view(Arc::clone(&client), toasts.clone());
    let catalog = CatalogView::new(client, cart.tracker().clone(), toasts).with_cart(cart.clone());

    if !catalog.add_to_cart(&ProductId::new(product_id), qty).await {
        return Err(CliError::Rejected(toast_text(catalog.toasts(), ADD_TO_CART_FAILED)));
    }
    tracing::info!("{}", toast_text(catalog.toasts(), ADDED_TO_CART));
    log_cart(&cart);
    Ok(())
}

/// Set a cart line's quantity. Values below 1 are sent as 1.
pub async fn change_qty(id: &str, qty: i64) -> Result<(), CliError> {
    let cart = loaded_cart().await?;
    let item = find_line(&cart, id)?;
    if !cart.change_qty(&item, qty).await {
        return Err(CliError::Rejected(toast_text(cart.toasts(), QTY_UPDATE_FAILED)));
    }
    tracing::info!("{}", toast_text(cart.toasts(), QTY_UPDATED));
    log_cart(&cart);
    Ok(())
}

/// Remove a cart line.
pub async fn remove(id: &str) -> Result<(), CliError> {
    let cart = loaded_cart().await?;
    let item = find_line(&cart, id)?;
    if !cart.remove(&item).await {
        return Err(CliError::Rejected(toast_text(cart.toasts(), REMOVE_FAILED)));
    }
    tracing::info!("{}", toast_text(cart.toasts(), ITEM_REMOVED));
    log_cart(&cart);
    Ok(())
}
