//! Catalog inspection.

use bazaar_storefront::services::catalog::{CatalogService, ProductQuery};

use super::{BackendCommandError, connect_backend};

/// Print products, optionally limited to `category`.
///
/// # Errors
///
/// Returns an error if the backend is not configured or the fetch fails.
pub async fn list(category: Option<String>) -> Result<(), BackendCommandError> {
    let client = connect_backend()?;
    let query = ProductQuery {
        search: None,
        category,
    };
    let products = CatalogService::new(&client).list(&query).await?;

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!(
                "{:>6}  {:<40} {:>10}  {}",
                product.id,
                product.title,
                product.price.to_string(),
                product.category.as_deref().unwrap_or("-"),
            );
        }
        println!("{} product(s)", products.len());
    }
    Ok(())
}
