//! Product management: the paged list and the edit form.

pub mod editor;
pub mod list;

pub use editor::{ChangeCallback, EditorMode, FormError, ProductEditor};
pub use list::{ListSnapshot, ListState, ProductListController};
