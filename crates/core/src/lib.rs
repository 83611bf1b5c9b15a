//! Hexmart Core - Shared types and view-state primitives.
//!
//! This crate provides what every Hexmart component agrees on:
//! - `admin` - Product-catalog console controllers
//! - `storefront` - Public catalog and cart controllers
//! - `cli` - Terminal front end driving both
//!
//! # Architecture
//!
//! The core crate holds no I/O and no HTTP client. The [`ui`] primitives only
//! keep state and notify observers; whoever calls the backend brackets its
//! calls with them.
//!
//! # Modules
//!
//! - [`types`] - Product, draft, pagination, ids, ratings and credentials
//! - [`ui`] - Action tracker, toast slot and modal handle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod ui;

pub use types::*;
