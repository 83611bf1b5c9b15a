//! Hexmart Admin - Headless product-catalog console.
//!
//! The console is a set of state containers driven by async methods; a view
//! layer (the `hexmart` CLI, or any UI) renders their published snapshots.
//!
//! # Modules
//!
//! - [`api`] - The [`AdminApi`] seam and its HTTP implementation
//! - [`auth`] - Sign-in, session verification and logout
//! - [`products`] - Paged product list and the product edit form
//! - [`confirm`] - Delete confirmation dialog
//! - [`console`] - [`AdminConsole`], wiring all of the above with toasts and loading flags

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod confirm;
pub mod console;
pub mod products;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AdminApi, AdminClient};
pub use auth::{AuthError, LoginGrant, LoginMessage};
pub use console::{AdminConsole, ConsoleView, Screen};
pub use products::{EditorMode, FormError, ListSnapshot, ListState, ProductEditor, ProductListController};
