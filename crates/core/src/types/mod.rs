//! Core types for Hugscape.
//!
//! This module provides type-safe wrappers and records for the backend's
//! catalog and account resources.

pub mod id;
pub mod product;
pub mod user;

pub use id::*;
pub use product::Product;
pub use user::{ProfileUpdate, UserProfile};
