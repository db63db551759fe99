//! Shop Cache - catalog cache warmer
//!
//! Keeps the on-disk catalog cache fresh so the app can start from it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_cache::cache::CacheService;
use shop_cache::catalog::{CatalogClient, CatalogRepository};
use shop_cache::store::FileStore;
use shop_cache::{spawn_cleanup_task, Config};

/// Main entry point for the catalog cache warmer.
///
/// # Startup Sequence
/// 1. Load `.env` (if present) and initialize tracing
/// 2. Load configuration from environment variables
/// 3. Open the file store and build the cache
/// 4. Start background TTL cleanup task
/// 5. Refresh the catalog on an interval
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shop Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_file={}, default_ttl={}ms, max_retries={}, catalog={}",
        config.cache_file.display(),
        config.default_ttl_ms,
        config.max_retries,
        config.catalog_base_url
    );

    let store = FileStore::open(&config.cache_file)
        .await
        .with_context(|| format!("opening cache file {}", config.cache_file.display()))?;
    let cache = Arc::new(CacheService::new(Arc::new(store), config.cache_options()));
    info!("Cache initialized");

    let cleanup_handle =
        spawn_cleanup_task(cache.clone(), Duration::from_secs(config.cleanup_interval));
    info!("Background cleanup task started");

    let client = CatalogClient::new(
        &config.catalog_base_url,
        Duration::from_secs(config.catalog_timeout),
    )
    .context("building catalog client")?;
    let repository = CatalogRepository::new(
        cache.clone(),
        client,
        config.retry_options(),
        Duration::from_secs(config.stale_after),
    );

    let refresh = async {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.refresh_interval));
        loop {
            ticker.tick().await;
            match repository.products().await {
                Some(products) => info!("Catalog holds {} products", products.len()),
                None => warn!(
                    "Catalog refresh failed: {}",
                    repository
                        .products_state()
                        .borrow()
                        .error
                        .clone()
                        .unwrap_or_default()
                ),
            }
            if let Some(categories) = repository.categories().await {
                info!("Catalog holds {} categories", categories.len());
            }
            let stats = cache.stats();
            info!(
                "Cache stats: hits={}, misses={}, hit_rate={:.2}",
                stats.hits,
                stats.misses,
                stats.hit_rate()
            );
        }
    };

    tokio::select! {
        _ = refresh => {}
        _ = shutdown_signal() => {}
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
