//! Public catalog commands.

use std::sync::Arc;

use hexmart_core::ui::{ActionTracker, ToastController};
use hexmart_core::{ProductId, format_amount};
use hexmart_storefront::{CatalogState, CatalogView, StorefrontClient};

use super::{CliError, connect};

/// Build the catalog view over the environment's backend.
pub fn catalog() -> Result<CatalogView<StorefrontClient>, CliError> {
    let client = StorefrontClient::new(connect()?);
    Ok(CatalogView::new(
        Arc::new(client),
        ActionTracker::new(),
        ToastController::default(),
    ))
}

/// List one page of the public catalog, optionally within a category.
pub async fn list(page: u32, category: Option<String>) -> Result<(), CliError> {
    let catalog = catalog()?;
    catalog.set_category(category).await;
    if page != 1 && !catalog.change_page(page).await {
        tracing::warn!(page, "No such page, showing page 1");
    }

    let snapshot = catalog.snapshot();
    if snapshot.state == CatalogState::Failed {
        return Err(CliError::Rejected("Failed to load catalog".to_string()));
    }

    let pagination = &snapshot.page.pagination;
    match &snapshot.category {
        Some(category) => tracing::info!(
            "{category}: page {} of {}",
            pagination.current_page,
            pagination.total_pages
        ),
        None => tracing::info!("Page {} of {}", pagination.current_page, pagination.total_pages),
    }
    for product in &snapshot.page.products {
        tracing::info!(
            "{}  {}  {} / {}",
            product.id,
            product.title,
            format_amount(product.price),
            product.unit
        );
    }
    Ok(())
}

/// Show one product's detail.
pub async fn show(id: &str) -> Result<(), CliError> {
    let catalog = catalog()?;
    let product = catalog
        .detail(&ProductId::new(id))
        .await
        .ok_or_else(|| CliError::ProductNotFound(id.to_string()))?;

    tracing::info!("{} ({})", product.title, product.category);
    tracing::info!(
        "{} / {} (was {})",
        format_amount(product.price),
        product.unit,
        format_amount(product.origin_price)
    );
    if let Some(rating) = product.rating {
        tracing::info!("{}", "★".repeat(usize::from(rating.stars())));
    }
    if !product.description.is_empty() {
        tracing::info!("{}", product.description);
    }
    if !product.content.is_empty() {
        tracing::info!("{}", product.content);
    }
    for url in std::iter::once(&product.image_url)
        .chain(product.images_url.iter().flatten())
        .filter(|url| !url.is_empty())
    {
        tracing::info!("image: {url}");
    }
    Ok(())
}
