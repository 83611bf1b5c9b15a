//! "Are you sure?" dialog in front of product deletion.

use std::sync::{Arc, Mutex, PoisonError};

use hexmart_core::Product;
use hexmart_core::ui::Modal;

/// Dialog title for deleting a product called `title`.
#[must_use]
pub fn confirmation_title(title: &str) -> String {
    format!("是否要刪除「{title}」")
}

/// The product awaiting confirmation plus the dialog's visibility.
#[derive(Clone, Default)]
pub struct DeleteConfirmation {
    target: Arc<Mutex<Option<Product>>>,
    modal: Modal,
}

impl DeleteConfirmation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for confirmation before deleting `product`.
    pub fn request(&self, product: &Product) {
        *self.lock() = Some(product.clone());
        self.modal.open();
    }

    /// Product the open dialog refers to.
    #[must_use]
    pub fn target(&self) -> Option<Product> {
        self.lock().clone()
    }

    /// Title of the open dialog.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.lock().as_ref().map(|product| confirmation_title(&product.title))
    }

    /// Close the dialog and forget the target.
    pub fn dismiss(&self) {
        self.lock().take();
        self.modal.close();
    }

    #[must_use]
    pub const fn modal(&self) -> &Modal {
        &self.modal
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Product>> {
        self.target.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
