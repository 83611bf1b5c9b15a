//! Hexmart Storefront - Headless public catalog and cart.
//!
//! # Modules
//!
//! - [`api`] - The [`StorefrontApi`] seam and its cached HTTP implementation
//! - [`catalog`] - Paged public catalog with add-to-cart
//! - [`cart`] - Cart normalization, totals and the cart view

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{CartLine, StorefrontApi, StorefrontClient};
pub use cart::{CartItem, CartSnapshot, CartState, CartTotals, CartView};
pub use catalog::{CatalogSnapshot, CatalogState, CatalogView};
