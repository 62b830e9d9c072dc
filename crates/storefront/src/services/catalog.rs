//! Product browsing: search and category filters over the cached catalog.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::backend::{BackendError, Product, RemoteStore};

/// Filters for a product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring of the title.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact category.
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductQuery {
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Catalog queries.
pub struct CatalogService<'a> {
    remote: &'a dyn RemoteStore,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(remote: &'a dyn RemoteStore) -> Self {
        Self { remote }
    }

    /// Products matching `query`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the catalog cannot be fetched.
    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let products = match query.category() {
            Some(category) => self.remote.get_products_by_category(category).await?,
            None => self.remote.get_all_products().await?,
        };

        let Some(term) = query.search_term() else {
            return Ok(products);
        };

        Ok(products
            .into_iter()
            .filter(|p| p.title.to_lowercase().contains(&term))
            .collect())
    }

    /// Distinct category names, sorted.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the catalog cannot be fetched.
    pub async fn categories(&self) -> Result<Vec<String>, BackendError> {
        let products = self.remote.get_all_products().await?;
        let categories: BTreeSet<String> = products.into_iter().filter_map(|p| p.category).collect();
        Ok(categories.into_iter().collect())
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the lookup fails.
    pub async fn get(&self, id: bazaar_core::ProductId) -> Result<Option<Product>, BackendError> {
        self.remote.get_product(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    fn query(search: Option<&str>, category: Option<&str>) -> ProductQuery {
        ProductQuery {
            search: search.map(String::from),
            category: category.map(String::from),
        }
    }

    fn titles(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let backend = InMemoryBackend::demo();
        let products = CatalogService::new(&backend)
            .list(&query(Some("  MUG "), None))
            .await
            .unwrap();
        assert_eq!(titles(&products), vec!["Enamel Camp Mug"]);
    }

    #[tokio::test]
    async fn test_category_and_search_combine() {
        let backend = InMemoryBackend::demo();
        let service = CatalogService::new(&backend);

        let bags = service.list(&query(None, Some("bags"))).await.unwrap();
        assert_eq!(titles(&bags), vec!["Canvas Tote", "Waxed Daypack"]);

        let packs = service
            .list(&query(Some("pack"), Some("bags")))
            .await
            .unwrap();
        assert_eq!(titles(&packs), vec!["Waxed Daypack"]);
    }

    #[tokio::test]
    async fn test_blank_filters_list_everything() {
        let backend = InMemoryBackend::demo();
        let products = CatalogService::new(&backend)
            .list(&query(Some(""), Some(" ")))
            .await
            .unwrap();
        assert_eq!(products.len(), 7);
    }

    #[tokio::test]
    async fn test_categories_sorted_and_distinct() {
        let backend = InMemoryBackend::demo();
        let categories = CatalogService::new(&backend).categories().await.unwrap();
        assert_eq!(categories, vec!["bags", "kitchen", "stationery"]);
    }
}
