//! Admin product commands.

use std::path::{Path, PathBuf};

use hexmart_admin::products::editor;
use hexmart_admin::{AdminClient, AdminConsole, ListState};
use hexmart_api::UploadFile;
use hexmart_core::{Product, ProductField, ProductId, format_amount};

use super::auth::signed_in_console;
use super::{CliError, toast_text};
use crate::ProductFields;

/// List one page of the admin catalog.
pub async fn list(page: u32) -> Result<(), CliError> {
    let console = signed_in_console().await?;
    if page != 1 && !console.change_page(page).await {
        tracing::warn!(page, "No such page, showing page 1");
    }

    let snapshot = console.products();
    if snapshot.state == ListState::Failed {
        return Err(CliError::Rejected("Failed to load products".to_string()));
    }

    let pagination = &snapshot.page.pagination;
    tracing::info!(
        "Page {} of {}",
        pagination.current_page,
        pagination.total_pages
    );
    for product in &snapshot.page.products {
        log_product(product);
    }
    Ok(())
}

/// Create a product from the given fields.
pub async fn create(fields: &ProductFields) -> Result<(), CliError> {
    let console = signed_in_console().await?;
    console.open_create();
    fill(&console, fields).await?;
    save(&console).await
}

/// Edit the product `id`, changing only the given fields.
pub async fn edit(id: &str, fields: &ProductFields) -> Result<(), CliError> {
    let console = signed_in_console().await?;
    let product = find(&console, &ProductId::new(id)).await?;
    console.open_edit(&product);
    fill(&console, fields).await?;
    save(&console).await
}

/// Delete the product `id`.
pub async fn delete(id: &str) -> Result<(), CliError> {
    let console = signed_in_console().await?;
    let product = find(&console, &ProductId::new(id)).await?;

    console.request_delete(&product);
    if let Some(title) = console.delete_dialog().title() {
        tracing::info!("{title}");
    }
    if console.confirm_delete().await {
        tracing::info!("{}", toast_text(console.toasts(), hexmart_admin::console::DELETE_SUCCESS));
        Ok(())
    } else {
        console.cancel_delete();
        Err(CliError::Rejected(format!("Failed to delete {id}")))
    }
}

/// Upload an image and print where it is hosted.
pub async fn upload(path: &Path, mime: Option<String>) -> Result<(), CliError> {
    let console = signed_in_console().await?;
    let file = read_upload(path, mime)?;
    let client = console.api();
    match editor::upload_image(client.as_ref(), file).await {
        Some(url) => {
            tracing::info!("{url}");
            Ok(())
        }
        None => Err(CliError::Rejected(format!(
            "Upload of {} failed",
            path.display()
        ))),
    }
}

/// Apply each given flag to the open form, in form order.
async fn fill(console: &AdminConsole<AdminClient>, fields: &ProductFields) -> Result<(), CliError> {
    let inputs = [
        (ProductField::Title, &fields.title),
        (ProductField::Category, &fields.category),
        (ProductField::Unit, &fields.unit),
        (ProductField::OriginPrice, &fields.origin_price),
        (ProductField::Price, &fields.price),
        (ProductField::Description, &fields.description),
        (ProductField::Content, &fields.content),
        (ProductField::IsEnabled, &fields.enabled),
        (ProductField::ImageUrl, &fields.image_url),
    ];
    for (field, value) in inputs {
        if let Some(value) = value {
            console.edit_field(field.name(), value)?;
        }
    }

    if let Some(stars) = fields.rating {
        console.set_rating(stars)?;
    }
    if fields.remove_last_image {
        console.remove_last_image()?;
    }
    for path in &fields.add_images {
        let file = read_upload(path, None)?;
        if !console.add_image(file).await {
            return Err(CliError::Rejected(format!(
                "Upload of {} failed",
                path.display()
            )));
        }
    }
    Ok(())
}

async fn save(console: &AdminConsole<AdminClient>) -> Result<(), CliError> {
    if console.submit().await {
        tracing::info!("{}", toast_text(console.toasts(), hexmart_admin::console::EDIT_SUCCESS));
        Ok(())
    } else {
        Err(CliError::Rejected(toast_text(
            console.toasts(),
            hexmart_admin::console::ACTION_FAILED,
        )))
    }
}

/// Walk the admin list page by page until `id` turns up.
async fn find(console: &AdminConsole<AdminClient>, id: &ProductId) -> Result<Product, CliError> {
    loop {
        let snapshot = console.products();
        if let Some(product) = snapshot.page.products.iter().find(|p| &p.id == id) {
            return Ok(product.clone());
        }
        let Some(next) = snapshot.page.pagination.next() else {
            return Err(CliError::ProductNotFound(id.to_string()));
        };
        if !console.change_page(next).await || console.products().state == ListState::Failed {
            return Err(CliError::ProductNotFound(id.to_string()));
        }
    }
}

fn read_upload(path: &Path, mime: Option<String>) -> Result<UploadFile, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: PathBuf::from(path),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(UploadFile {
        file_name,
        mime,
        bytes,
    })
}

fn log_product(product: &Product) {
    let enabled = if product.is_enabled.is_enabled() { "on" } else { "off" };
    tracing::info!(
        "{}  {}  [{}]  {} (was {})  {}",
        product.id,
        product.title,
        product.category,
        format_amount(product.price),
        format_amount(product.origin_price),
        enabled
    );
}
