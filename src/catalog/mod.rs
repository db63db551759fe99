//! Catalog Module
//!
//! Product and category loading for the shop screens: cache first, network
//! on a miss, with transient network failures retried.

mod client;
mod models;
mod repository;

pub use client::CatalogClient;
pub use models::{Product, Rating};
pub use repository::{CatalogRepository, CATEGORIES_KEY, PRODUCTS_KEY};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;

// == Catalog Source ==
/// Where catalog data comes from when the cache cannot answer.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError>;

    async fn fetch_product(&self, id: u64) -> Result<Product, FetchError>;

    async fn fetch_categories(&self) -> Result<Vec<String>, FetchError>;

    async fn fetch_products_in_category(&self, category: &str) -> Result<Vec<Product>, FetchError>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
        (**self).fetch_products().await
    }

    async fn fetch_product(&self, id: u64) -> Result<Product, FetchError> {
        (**self).fetch_product(id).await
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, FetchError> {
        (**self).fetch_categories().await
    }

    async fn fetch_products_in_category(&self, category: &str) -> Result<Vec<Product>, FetchError> {
        (**self).fetch_products_in_category(category).await
    }
}
