//! Hexmart API - Client for the pre-existing REST backend.
//!
//! Every data operation in Hexmart is a direct HTTP call to the backend.
//! This crate owns the transport:
//!
//! - [`config`] - Base URL, API path segment, cookie name and timeouts from the environment
//! - [`client`] - [`ApiClient`], which resolves endpoints, attaches the session token and decodes JSON
//! - [`error`] - [`ApiError`], the taxonomy every controller matches on
//! - [`response`] - [`ActionResponse`], the `{success, message}` acknowledgement
//! - [`session`] - [`SessionStore`], the token cookie with its server-supplied expiry
//!
//! Endpoint-specific calls live with their callers (`hexmart-admin`,
//! `hexmart-storefront`), which wrap [`ApiClient`] behind their own traits.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod response;
pub mod session;

pub use client::{ApiClient, UploadFile};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use response::ActionResponse;
pub use session::{SessionCookie, SessionError, SessionStore};
