//! Domain models for the storefront.
//!
//! - [`CartLine`]: a cart entry with the product metadata shown to the shopper
//! - [`CurrentUser`]: the identity stored in the session after login

pub mod cart;
pub mod session;

pub use cart::CartLine;
pub use session::{CurrentUser, keys as session_keys};
