//! Hugscape Core - Shared domain records.
//!
//! This crate provides the records exchanged between the storefront client
//! core and whatever presentation layer sits on top of it:
//! - `storefront` - Cart, catalog and session state managers
//! - `cli` - Command-line driver for those state managers
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs plus the product and user records served by the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
