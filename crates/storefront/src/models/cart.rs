//! Cart line entries.

use bazaar_core::{Price, ProductId, Quantity};
use serde::{Deserialize, Serialize};

use crate::backend::Product;

/// A cart entry: product id and quantity, joined with the product metadata
/// displayed in the cart.
///
/// The same shape is stored in the guest snapshot and embedded in orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID.
    pub id: ProductId,
    /// Product title at the time the line was built.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Units in the cart, never zero.
    #[serde(default)]
    pub quantity: Quantity,
}

impl CartLine {
    /// Build a line from a product.
    #[must_use]
    pub fn from_product(product: &Product, quantity: Quantity) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.line_total(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let line = CartLine {
            id: ProductId::new(1),
            title: "Mug".to_string(),
            price: Price::from_cents(450),
            image: None,
            quantity: Quantity::new(3).unwrap(),
        };
        assert_eq!(line.line_total(), Price::from_cents(1350));
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let line: CartLine =
            serde_json::from_str(r#"{"id": 1, "title": "Mug", "price": 4.5}"#).unwrap();
        assert_eq!(line.quantity, Quantity::ONE);
    }
}
