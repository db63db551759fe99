//! Catalog Repository
//!
//! Composes the TTL cache with retrying fetches. A read is served from the
//! cache while the entry is younger than `stale_after`; otherwise the source
//! is queried through a [`RetryExecutor`] and the result written back. If the
//! fetch fails, any unexpired cached copy is returned instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{CatalogSource, Product};
use crate::cache::{CacheService, Clock};
use crate::error::{CacheError, FetchError};
use crate::retry::{RetryExecutor, RetryOptions, RetryState};
use crate::store::KeyValueStore;

/// Cache key for the full product list
pub const PRODUCTS_KEY: &str = "products";

/// Cache key for the category list
pub const CATEGORIES_KEY: &str = "categories";

fn product_key(id: u64) -> String {
    format!("product_{}", id)
}

fn category_key(category: &str) -> String {
    format!("category_{}", category)
}

// == Catalog Repository ==
/// Cache-first access to catalog data.
pub struct CatalogRepository<S, C, Src> {
    cache: Arc<CacheService<S, C>>,
    source: Src,
    retry: RetryOptions<FetchError>,
    stale_after: Duration,
    products: RetryExecutor<Vec<Product>>,
    categories: RetryExecutor<Vec<String>>,
}

impl<S, C, Src> CatalogRepository<S, C, Src>
where
    S: KeyValueStore,
    C: Clock,
    Src: CatalogSource,
{
    // == Constructor ==
    /// Creates a repository over a shared cache.
    ///
    /// # Arguments
    /// * `cache` - The process-wide cache instance
    /// * `source` - Where data comes from on a miss
    /// * `retry` - Backoff applied to every fetch
    /// * `stale_after` - Maximum cache age before a refetch is attempted
    pub fn new(
        cache: Arc<CacheService<S, C>>,
        source: Src,
        retry: RetryOptions<FetchError>,
        stale_after: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            retry,
            stale_after,
            products: RetryExecutor::new(),
            categories: RetryExecutor::new(),
        }
    }

    pub fn cache(&self) -> &Arc<CacheService<S, C>> {
        &self.cache
    }

    /// Observes loading progress of the product list.
    pub fn products_state(&self) -> watch::Receiver<RetryState<Vec<Product>>> {
        self.products.subscribe()
    }

    /// Observes loading progress of the category list.
    pub fn categories_state(&self) -> watch::Receiver<RetryState<Vec<String>>> {
        self.categories.subscribe()
    }

    // == Products ==
    /// Full product list.
    pub async fn products(&self) -> Option<Vec<Product>> {
        self.load(PRODUCTS_KEY, &self.products, || self.source.fetch_products())
            .await
    }

    /// Refetches the product list regardless of cache age.
    pub async fn refresh_products(&self) -> Option<Vec<Product>> {
        self.fetch_and_store(PRODUCTS_KEY, &self.products, || {
            self.source.fetch_products()
        })
        .await
    }

    /// A single product by id.
    pub async fn product(&self, id: u64) -> Option<Product> {
        let executor = RetryExecutor::new();
        self.load(&product_key(id), &executor, || self.source.fetch_product(id))
            .await
    }

    // == Categories ==
    /// All category names.
    pub async fn categories(&self) -> Option<Vec<String>> {
        self.load(CATEGORIES_KEY, &self.categories, || {
            self.source.fetch_categories()
        })
        .await
    }

    /// Products belonging to `category`.
    pub async fn products_in_category(&self, category: &str) -> Option<Vec<Product>> {
        let executor = RetryExecutor::new();
        self.load(&category_key(category), &executor, || {
            self.source.fetch_products_in_category(category)
        })
        .await
    }

    // == Invalidate ==
    /// Drops every cached catalog entry and resets observable loading state.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        self.products.reset();
        self.categories.reset();
        self.cache.clear().await?;
        info!("Catalog cache invalidated");
        Ok(())
    }

    async fn is_fresh(&self, key: &str) -> bool {
        match self.cache.get_cache_age(key).await {
            Some(age) => {
                age <= i64::try_from(self.stale_after.as_millis()).unwrap_or(i64::MAX)
            }
            None => false,
        }
    }

    async fn load<T, F, Fut>(&self, key: &str, executor: &RetryExecutor<T>, fetch: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if self.is_fresh(key).await {
            if let Some(value) = self.cache.get::<T>(key).await {
                debug!("Serving '{}' from cache", key);
                return Some(value);
            }
        }

        if let Some(value) = self.fetch_and_store(key, executor, fetch).await {
            return Some(value);
        }

        // Any unexpired copy; `get` refuses expired entries
        let fallback = self.cache.get::<T>(key).await;
        if fallback.is_some() {
            warn!("Fetch for '{}' failed, serving stale cached copy", key);
        }
        fallback
    }

    async fn fetch_and_store<T, F, Fut>(
        &self,
        key: &str,
        executor: &RetryExecutor<T>,
        fetch: F,
    ) -> Option<T>
    where
        T: Serialize + Clone,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let value = executor.execute_with_retry(fetch, &self.retry).await?;

        if let Err(e) = self.cache.set(key, &value, None).await {
            warn!("Fetched '{}' but could not cache it: {}", key, e);
        }
        Some(value)
    }
}
