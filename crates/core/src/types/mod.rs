//! Core types for Hexmart.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod pagination;
pub mod price;
pub mod product;
pub mod rating;

pub use credential::Credentials;
pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::Pagination;
pub use price::{format_amount, parse_amount};
pub use product::{EnabledFlag, Product, ProductDraft, ProductField, ProductPage};
pub use rating::{Rating, RatingError};
