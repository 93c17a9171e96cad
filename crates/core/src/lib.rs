//! Foodbook Core - Shared types library.
//!
//! This crate provides the facet model and pure search helpers used by the
//! storefront:
//! - `storefront` - Public-facing catalog and search site
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Facet model, search request/response shapes, type-safe IDs
//! - [`request`] - Search request composition
//! - [`pagination`] - Page-number windowing for the results pager

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pagination;
pub mod request;
pub mod types;

pub use types::*;
