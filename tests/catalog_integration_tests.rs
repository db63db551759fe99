//! Integration Tests for the Catalog Repository
//!
//! Runs the real HTTP client against a local mock product API and a
//! file-backed cache.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shop_cache::cache::{CacheOptions, CacheService, SystemClock};
use shop_cache::catalog::{CatalogClient, CatalogRepository, Product, PRODUCTS_KEY};
use shop_cache::error::FetchError;
use shop_cache::retry::{RetryOptions, RetryPhase, DEFAULT_EXHAUSTED_MESSAGE};
use shop_cache::store::FileStore;

// == Mock Upstream ==

#[derive(Clone, Default)]
struct Upstream {
    hits: Arc<AtomicU32>,
    /// Number of initial requests answered too slowly
    slow_requests: Arc<AtomicU32>,
}

fn product(id: u64, category: &str) -> Product {
    Product {
        id,
        title: format!("Product {}", id),
        price: 19.99,
        description: "A product".to_string(),
        category: category.to_string(),
        image: format!("https://example.com/{}.jpg", id),
        rating: None,
    }
}

async fn maybe_stall(upstream: &Upstream) {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    let slow = upstream
        .slow_requests
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if slow {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

async fn products_handler(State(upstream): State<Upstream>) -> Json<Vec<Product>> {
    maybe_stall(&upstream).await;
    Json(vec![product(1, "electronics"), product(2, "men's clothing")])
}

async fn product_handler(
    State(upstream): State<Upstream>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, StatusCode> {
    maybe_stall(&upstream).await;
    match id {
        1 | 2 => Ok(Json(product(id, "electronics"))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn categories_handler(State(upstream): State<Upstream>) -> Json<Vec<String>> {
    maybe_stall(&upstream).await;
    Json(vec!["electronics".to_string(), "men's clothing".to_string()])
}

async fn category_handler(
    State(upstream): State<Upstream>,
    Path(name): Path<String>,
) -> Json<Vec<Product>> {
    maybe_stall(&upstream).await;
    Json(vec![product(2, &name)])
}

async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/products", get(products_handler))
        .route("/products/categories", get(categories_handler))
        .route("/products/category/:name", get(category_handler))
        .route("/products/:id", get(product_handler))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Address nothing listens on.
async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// == Helper Functions ==

type Repo = CatalogRepository<FileStore, SystemClock, CatalogClient>;

fn fast_retry() -> RetryOptions<FetchError> {
    RetryOptions::default()
        .with_max_retries(2)
        .with_base_delay(Duration::from_millis(10))
}

async fn create_repo(base_url: &str, cache_file: &std::path::Path) -> Repo {
    let store = FileStore::open(cache_file).await.unwrap();
    let cache = Arc::new(CacheService::new(Arc::new(store), CacheOptions::default()));
    let client = CatalogClient::new(base_url, Duration::from_millis(200)).unwrap();
    CatalogRepository::new(cache, client, fast_retry(), Duration::from_secs(300))
}

// == Tests ==

#[tokio::test]
async fn test_products_fetched_once_then_cached() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = Upstream::default();
    let url = spawn_upstream(upstream.clone()).await;
    let repo = create_repo(&url, &dir.path().join("cache.json")).await;

    let first = repo.products().await.unwrap();
    let second = repo.products().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
    assert_eq!(repo.products_state().borrow().phase, RetryPhase::Succeeded);
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let url = spawn_upstream(Upstream::default()).await;

    {
        let repo = create_repo(&url, &path).await;
        repo.products().await.unwrap();
    }

    // Second process start with the network gone
    let offline = create_repo(&unreachable_url().await, &path).await;
    let products = offline.products().await.unwrap();

    assert_eq!(products[0].id, 1);
    assert!(offline.cache().is_valid(PRODUCTS_KEY).await);
}

#[tokio::test]
async fn test_unreachable_upstream_exhausts_retries() {
    let dir = tempfile::tempdir().unwrap();
    let repo = create_repo(&unreachable_url().await, &dir.path().join("cache.json")).await;

    assert_eq!(repo.products().await, None);

    let state = repo.products_state().borrow().clone();
    assert_eq!(state.phase, RetryPhase::Failed);
    assert_eq!(state.retry_count, 2);
    assert_eq!(state.error.as_deref(), Some(DEFAULT_EXHAUSTED_MESSAGE));
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = Upstream::default();
    upstream.slow_requests.store(1, Ordering::SeqCst);
    let url = spawn_upstream(upstream.clone()).await;
    let repo = create_repo(&url, &dir.path().join("cache.json")).await;

    let categories = repo.categories().await.unwrap();

    assert_eq!(categories, vec!["electronics", "men's clothing"]);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);
    assert_eq!(repo.categories_state().borrow().retry_count, 1);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = Upstream::default();
    let url = spawn_upstream(upstream.clone()).await;
    let repo = create_repo(&url, &dir.path().join("cache.json")).await;

    assert_eq!(repo.product(99).await, None);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);

    assert_eq!(repo.product(2).await.unwrap().id, 2);
}

#[tokio::test]
async fn test_category_names_are_path_encoded() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_upstream(Upstream::default()).await;
    let repo = create_repo(&url, &dir.path().join("cache.json")).await;

    let products = repo.products_in_category("men's clothing").await.unwrap();

    assert_eq!(products[0].category, "men's clothing");
    assert!(repo.cache().is_valid("category_men's clothing").await);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = Upstream::default();
    let url = spawn_upstream(upstream.clone()).await;
    let repo = create_repo(&url, &dir.path().join("cache.json")).await;

    repo.products().await.unwrap();
    repo.invalidate().await.unwrap();
    repo.products().await.unwrap();

    assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);
}
