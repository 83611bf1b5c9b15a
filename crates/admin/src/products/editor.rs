//! Product edit form state.
//!
//! The editor owns a private draft. Each edit produces a new draft, replaces
//! the editor's copy and hands it to the owner's change callback; the source
//! [`Product`] is never touched.

use std::fmt;
use std::sync::Arc;

use hexmart_api::UploadFile;
use hexmart_core::{EnabledFlag, Product, ProductDraft, ProductField, ProductId, Rating, RatingError};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use crate::api::AdminApi;

/// Whether the form creates a new product or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(ProductId),
}

/// Rejected form input. The draft is unchanged when one of these is returned.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("{field} expects a number, got {input:?}")]
    InvalidNumber { field: ProductField, input: String },
    #[error("{field} expects a checked/unchecked value, got {input:?}")]
    InvalidFlag { field: ProductField, input: String },
    #[error("{0} is not a checkbox")]
    NotCheckbox(ProductField),
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error("No product form is open")]
    Closed,
}

/// Receives every new draft.
pub type ChangeCallback = Arc<dyn Fn(&ProductDraft) + Send + Sync>;

/// Modal form for creating or editing a product.
#[derive(Clone)]
pub struct ProductEditor {
    mode: EditorMode,
    draft: ProductDraft,
    on_change: Option<ChangeCallback>,
}

impl ProductEditor {
    /// Blank form for a new product.
    #[must_use]
    pub fn create() -> Self {
        Self {
            mode: EditorMode::Create,
            draft: ProductDraft::empty(),
            on_change: None,
        }
    }

    /// Form seeded with a full copy of `product`.
    #[must_use]
    pub fn edit(product: &Product) -> Self {
        Self {
            mode: EditorMode::Edit(product.id.clone()),
            draft: ProductDraft::from_product(product),
            on_change: None,
        }
    }

    /// Register the owner's change callback.
    #[must_use]
    pub fn on_change(mut self, callback: ChangeCallback) -> Self {
        self.on_change = Some(callback);
        self
    }

    #[must_use]
    pub const fn mode(&self) -> &EditorMode {
        &self.mode
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Edit(_))
    }

    #[must_use]
    pub const fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    /// Set a text or numeric field from raw input.
    ///
    /// Numeric fields read `""` as blank. Checkbox fields accept
    /// `1`/`0`, `true`/`false` and `on`/`off`.
    ///
    /// # Errors
    ///
    /// Returns `FormError` for input the field cannot hold.
    pub fn set_field(&mut self, field: ProductField, input: &str) -> Result<(), FormError> {
        if field.is_checkbox() {
            let checked = parse_checked(input).ok_or_else(|| FormError::InvalidFlag {
                field,
                input: input.to_string(),
            })?;
            return self.set_checked(field, checked);
        }

        let mut next = self.draft.clone();
        if field.is_numeric() {
            let amount = parse_number(input).ok_or_else(|| FormError::InvalidNumber {
                field,
                input: input.to_string(),
            })?;
            match field {
                ProductField::OriginPrice => next.origin_price = amount,
                _ => next.price = amount,
            }
        } else {
            let value = input.to_string();
            match field {
                ProductField::Title => next.title = value,
                ProductField::Category => next.category = value,
                ProductField::Unit => next.unit = value,
                ProductField::Description => next.description = value,
                ProductField::Content => next.content = value,
                ProductField::ImageUrl => next.image_url = value,
                ProductField::OriginPrice | ProductField::Price | ProductField::IsEnabled => {}
            }
        }
        self.commit(next);
        Ok(())
    }

    /// Set a field by its input name (`title`, `origin_price`, …).
    ///
    /// # Errors
    ///
    /// Returns `FormError::UnknownField` for a name the form does not have.
    pub fn set_named(&mut self, name: &str, input: &str) -> Result<(), FormError> {
        let field = name
            .parse::<ProductField>()
            .map_err(|_| FormError::UnknownField(name.to_string()))?;
        self.set_field(field, input)
    }

    /// Toggle a checkbox field.
    ///
    /// # Errors
    ///
    /// Returns `FormError::NotCheckbox` for non-checkbox fields.
    pub fn set_checked(&mut self, field: ProductField, checked: bool) -> Result<(), FormError> {
        if !field.is_checkbox() {
            return Err(FormError::NotCheckbox(field));
        }
        let mut next = self.draft.clone();
        next.is_enabled = EnabledFlag::from_checked(checked);
        self.commit(next);
        Ok(())
    }

    /// Star rating, 1 through 5.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Rating` for anything outside 1..=5.
    pub fn set_rating(&mut self, stars: i64) -> Result<(), FormError> {
        let rating = Rating::new(stars)?;
        let mut next = self.draft.clone();
        next.rating = Some(rating);
        self.commit(next);
        Ok(())
    }

    /// Append a secondary image URL.
    pub fn push_image(&mut self, url: impl Into<String>) {
        let mut next = self.draft.clone();
        next.images_url.push(url.into());
        self.commit(next);
    }

    /// Remove the last secondary image. Does nothing when there are none.
    pub fn remove_last_image(&mut self) {
        if self.draft.images_url.is_empty() {
            return;
        }
        let mut next = self.draft.clone();
        next.images_url.pop();
        self.commit(next);
    }

    fn commit(&mut self, next: ProductDraft) {
        self.draft = next;
        if let Some(callback) = &self.on_change {
            callback(&self.draft);
        }
    }
}

impl fmt::Debug for ProductEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductEditor")
            .field("mode", &self.mode)
            .field("draft", &self.draft)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Upload an image for the form.
///
/// Returns the hosted URL when the backend reports success. Failures are
/// logged and yield `None`.
#[instrument(skip(api, file), fields(file_name = %file.file_name))]
pub async fn upload_image<A: AdminApi>(api: &A, file: UploadFile) -> Option<String> {
    match api.upload_image(file).await {
        Ok(response) if response.success => {
            if response.image_url.is_none() {
                tracing::error!("Upload succeeded without an image URL");
            }
            response.image_url
        }
        Ok(_) => {
            tracing::error!("Upload rejected by backend");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Image upload failed");
            None
        }
    }
}

/// `""` is blank; anything else must parse as a number.
fn parse_number(input: &str) -> Option<Option<Decimal>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    trimmed
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
        .map(Some)
}

fn parse_checked(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}
