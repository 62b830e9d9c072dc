//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront server and the CLI:
//! - `storefront` - JSON storefront with cart/wishlist synchronization
//! - `cli` - Session table migration and backend inspection tools
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! Invariants such as "a stored quantity is never zero" live here so that
//! every layer above gets them for free.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, user names, quantities, prices and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
