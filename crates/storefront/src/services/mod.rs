//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Credential checks against the backend `users` table
//! - `catalog` - Product listing, search and categories
//! - `checkout` - Order creation and order history
//! - `shopper` - Per-request cart, wishlist and session boundary

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod shopper;

pub use shopper::{LoginSummary, Shopper};
