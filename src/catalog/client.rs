//! HTTP catalog client
//!
//! Thin reqwest wrapper over a fakestore-style product API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{CatalogSource, Product};
use crate::error::FetchError;

// == Catalog Client ==
/// Fetches catalog data over HTTP. Performs a single request per call;
/// retries are the caller's concern.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    // == Constructor ==
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, FetchError> {
        let url = self.url(segments)?;
        debug!("GET {}", url);

        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
        self.get_json(&["products"]).await
    }

    async fn fetch_product(&self, id: u64) -> Result<Product, FetchError> {
        let id = id.to_string();
        self.get_json(&["products", id.as_str()]).await
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, FetchError> {
        self.get_json(&["products", "categories"]).await
    }

    async fn fetch_products_in_category(&self, category: &str) -> Result<Vec<Product>, FetchError> {
        self.get_json(&["products", "category", category]).await
    }
}
